//! The adapter surface one selected object exposes to the engine.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::descriptor::{
	AvailabilityConstraint, EventDescriptor, KnownPropertyKey, PropertyDescriptor, PropertyId, PropertyVariation,
};
use crate::error::EditorError;
use crate::snapshot::ValueSnapshot;
use crate::target::TargetObject;

/// Change notification emitted by an editor.
#[derive(Debug, Clone)]
pub enum EditorEvent {
	/// A property value changed. `None` is the wildcard: re-check everything.
	PropertyChanged(Option<PropertyId>),
	/// The editor's exposed property or event set changed.
	MembersChanged,
}

/// Adapter bound 1:1 to a [`TargetObject`].
///
/// Implemented by collaborators, consumed by the engine. The engine owns the
/// instance for the lifetime of the target's selection membership and is the
/// only subscriber to its notifications.
#[async_trait]
pub trait ObjectEditor: Send + Sync {
	/// The selected object this editor is bound to.
	fn target(&self) -> &TargetObject;

	/// Display type name of the target.
	fn type_name(&self) -> String;

	/// Current property descriptors, in the editor's declaration order.
	fn properties(&self) -> Vec<Arc<PropertyDescriptor>>;

	/// Current event descriptors.
	fn events(&self) -> Vec<Arc<EventDescriptor>> {
		Vec::new()
	}

	/// Well-known property declarations, empty for most editors.
	fn known_properties(&self) -> Vec<(KnownPropertyKey, PropertyId)> {
		Vec::new()
	}

	/// Subscribes to this editor's change notifications.
	fn subscribe(&self) -> broadcast::Receiver<EditorEvent>;

	/// Reads the current value of `property` under `variation`.
	async fn value(&self, property: &PropertyDescriptor, variation: Option<&PropertyVariation>) -> Result<ValueSnapshot, EditorError>;

	/// Writes `snapshot` to `property`. Implementors are expected to emit a
	/// [`EditorEvent::PropertyChanged`] once the write lands.
	async fn set_value(&self, property: &PropertyDescriptor, snapshot: ValueSnapshot) -> Result<(), EditorError>;

	/// Names of handlers attached to `event` on the target.
	async fn event_handlers(&self, event: &EventDescriptor) -> Result<Vec<String>, EditorError> {
		let _ = event;
		Ok(Vec::new())
	}

	/// Naming capability, when the target can be named.
	fn as_nameable(&self) -> Option<&dyn Nameable> {
		None
	}

	/// Completion capability, when the editor can suggest values.
	fn as_completer(&self) -> Option<&dyn CompleteValues> {
		None
	}

	/// Availability-constraint evaluation capability.
	fn as_constrained(&self) -> Option<&dyn EvaluateConstraints> {
		None
	}

	/// Source-navigation capability.
	fn as_navigator(&self) -> Option<&dyn NavigateToSource> {
		None
	}
}

/// Naming capability of an editor.
#[async_trait]
pub trait Nameable: Send + Sync {
	async fn name(&self) -> Result<Option<String>, EditorError>;
	async fn set_name(&self, name: &str) -> Result<(), EditorError>;
}

/// Value completion capability of an editor.
#[async_trait]
pub trait CompleteValues: Send + Sync {
	/// Suggestions for `probe` typed into `property`'s expression editor.
	///
	/// Implementors should return promptly after `cancel` fires; the engine
	/// discards late results either way.
	async fn completions(
		&self,
		property: &PropertyDescriptor,
		probe: &str,
		cancel: CancellationToken,
	) -> Result<Vec<String>, EditorError>;
}

/// Availability-constraint evaluation capability of an editor.
#[async_trait]
pub trait EvaluateConstraints: Send + Sync {
	async fn is_available(&self, constraint: &AvailabilityConstraint) -> Result<bool, EditorError>;
}

/// Source-navigation capability of an editor.
pub trait NavigateToSource: Send + Sync {
	fn can_navigate(&self) -> bool;
	fn navigate(&self);
}

/// Resolves a selection handle to its editor.
#[async_trait]
pub trait EditorProvider: Send + Sync {
	/// `Ok(None)` and `Err(_)` both mean "no contribution": the target stays
	/// selected but exposes no properties or events.
	async fn object_editor(&self, target: &TargetObject) -> Result<Option<Arc<dyn ObjectEditor>>, EditorError>;
}
