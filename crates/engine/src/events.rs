//! Per-event aggregated state.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use facet_contracts::{EventDescriptor, ObjectEditor};

/// Aggregated state for one event exposed by every selected editor.
///
/// Structurally a [`PropertyViewModel`](crate::PropertyViewModel) without a
/// value: it carries the intersected editor subset and, for a single
/// selection, the handler names attached on the target.
pub struct EventViewModel {
	descriptor: Arc<EventDescriptor>,
	state: RwLock<EventState>,
	revision: watch::Sender<u64>,
}

struct EventState {
	editors: Vec<Arc<dyn ObjectEditor>>,
	handlers: Vec<String>,
}

impl EventViewModel {
	pub(crate) fn new(descriptor: Arc<EventDescriptor>, editors: Vec<Arc<dyn ObjectEditor>>) -> Arc<Self> {
		let (revision, _) = watch::channel(0);
		Arc::new(Self {
			descriptor,
			state: RwLock::new(EventState { editors, handlers: Vec::new() }),
			revision,
		})
	}

	pub fn descriptor(&self) -> &Arc<EventDescriptor> {
		&self.descriptor
	}

	pub fn name(&self) -> &str {
		&self.descriptor.name
	}

	pub fn editors(&self) -> Vec<Arc<dyn ObjectEditor>> {
		self.state.read().editors.clone()
	}

	pub fn editor_count(&self) -> usize {
		self.state.read().editors.len()
	}

	/// Handler names attached to the event; meaningful only for a single
	/// selection, empty otherwise.
	pub fn handlers(&self) -> Vec<String> {
		self.state.read().handlers.clone()
	}

	pub fn changes(&self) -> watch::Receiver<u64> {
		self.revision.subscribe()
	}

	/// Re-resolves attached handler names from the single live editor.
	pub(crate) async fn resolve_handlers(&self) {
		let editors = self.editors();
		let handlers = match editors.as_slice() {
			[editor] => match editor.event_handlers(&self.descriptor).await {
				Ok(handlers) => handlers,
				Err(error) => {
					tracing::warn!(event = %self.descriptor.id, %error, "event.handlers.failed");
					Vec::new()
				}
			},
			_ => Vec::new(),
		};

		{
			let mut state = self.state.write();
			if state.handlers == handlers {
				return;
			}
			state.handlers = handlers;
		}
		self.bump();
	}

	pub(crate) fn update_editors(&self, removed: &[Arc<dyn ObjectEditor>], added: &[Arc<dyn ObjectEditor>]) {
		{
			let mut state = self.state.write();
			state
				.editors
				.retain(|editor| !removed.iter().any(|gone| Arc::ptr_eq(editor, gone)));
			for editor in added {
				if !state.editors.iter().any(|existing| Arc::ptr_eq(existing, editor)) {
					state.editors.push(Arc::clone(editor));
				}
			}
		}
		self.bump();
	}

	pub(crate) fn clear_editors(&self) {
		{
			let mut state = self.state.write();
			state.editors.clear();
			state.handlers.clear();
		}
		self.bump();
	}

	fn bump(&self) {
		self.revision.send_modify(|revision| *revision += 1);
	}
}
