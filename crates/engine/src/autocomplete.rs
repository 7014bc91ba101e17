//! Cancellable suggestion aggregation across completion-capable editors.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use facet_contracts::{ObjectEditor, PropertyDescriptor};

/// Fan-out/fan-in suggestion aggregator.
///
/// Each probe owns a fresh [`CancellationToken`]; issuing a new probe swaps
/// it in and cancels the predecessor, so at most one request publishes
/// results. Results combine as the intersection of every editor's suggestion
/// set, ordered by the first-completed editor's list.
pub struct AutocompleteEngine {
	current: Mutex<Option<CancellationToken>>,
}

impl Default for AutocompleteEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl AutocompleteEngine {
	pub fn new() -> Self {
		Self { current: Mutex::new(None) }
	}

	/// Cancels any in-flight probe without starting a new one.
	pub fn cancel(&self) {
		if let Some(token) = self.current.lock().take() {
			token.cancel();
		}
	}

	/// Issues a probe for `text`, publishing the narrowed suggestion list
	/// after each editor's result arrives. A superseded probe stops
	/// publishing as soon as its cancellation is observed.
	pub async fn probe(
		&self,
		property: &PropertyDescriptor,
		editors: &[Arc<dyn ObjectEditor>],
		text: &str,
		mut publish: impl FnMut(Vec<String>),
	) {
		let token = CancellationToken::new();
		if let Some(previous) = self.current.lock().replace(token.clone()) {
			previous.cancel();
		}

		let mut queries = FuturesUnordered::new();
		for editor in editors {
			let Some(completer) = editor.as_completer() else {
				continue;
			};
			queries.push(completer.completions(property, text, token.clone()));
		}

		// Ordered base list from the first responder, then progressive
		// set-intersection with every later responder.
		let mut base: Vec<String> = Vec::new();
		let mut common: HashSet<String> = HashSet::new();
		let mut first = true;

		while let Some(result) = queries.next().await {
			if token.is_cancelled() {
				return;
			}
			let suggestions = match result {
				Ok(suggestions) => suggestions,
				Err(error) => {
					tracing::warn!(property = %property.id, %error, "autocomplete.query.failed");
					continue;
				}
			};

			if first {
				first = false;
				common = suggestions.iter().cloned().collect();
				base = suggestions;
			} else {
				let arrived: HashSet<String> = suggestions.into_iter().collect();
				common.retain(|suggestion| arrived.contains(suggestion));
			}

			publish(base.iter().filter(|suggestion| common.contains(*suggestion)).cloned().collect());
		}
	}
}
