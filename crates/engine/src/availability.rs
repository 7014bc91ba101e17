//! Constraint-based availability evaluation.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};

use facet_contracts::{ObjectEditor, PropertyDescriptor};

/// Evaluates `descriptor`'s declared constraints against the live editor set.
///
/// Fans out one check per `(editor, constraint)` pair and short-circuits on
/// the first unavailable answer. Vacuously available with no constraints or
/// no constraint-capable editors; a failed check is logged and treated as
/// available so one broken editor cannot hide a property.
pub(crate) async fn evaluate(descriptor: &PropertyDescriptor, editors: &[Arc<dyn ObjectEditor>]) -> bool {
	if descriptor.constraints.is_empty() {
		return true;
	}

	let mut checks = FuturesUnordered::new();
	for editor in editors {
		let Some(evaluator) = editor.as_constrained() else {
			continue;
		};
		for constraint in &descriptor.constraints {
			checks.push(evaluator.is_available(constraint));
		}
	}

	while let Some(result) = checks.next().await {
		match result {
			Ok(true) => {}
			Ok(false) => return false,
			Err(error) => {
				tracing::warn!(property = %descriptor.id, %error, "availability.check.failed");
			}
		}
	}

	true
}
