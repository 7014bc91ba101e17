//! Collaborators invoked at the engine's extension points.

use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::PropertyDescriptor;
use crate::editor::{EditorProvider, ObjectEditor};
use crate::error::EditorError;
use crate::snapshot::{BindingRef, ResourceRef};
use crate::value::Value;

/// Pure, synchronous value coercion and validation.
///
/// Applied on top of the engine's per-kind defaults when attached to a
/// descriptor.
pub trait ValueConstrainer: Send + Sync {
	fn coerce(&self, value: Value) -> Value {
		value
	}

	fn is_valid(&self, value: &Value) -> bool {
		let _ = value;
		true
	}
}

/// Container and name for a resource about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSite {
	pub container: String,
	pub name: String,
}

/// Resource storage collaborator.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
	/// Whether new resources can be materialized at all.
	fn can_create_resources(&self) -> bool {
		false
	}

	/// Solicits a container/name for a resource built from `value`.
	/// `None` aborts the creation without error.
	async fn request_site(&self, property: &PropertyDescriptor, value: &Value) -> Option<ResourceSite>;

	/// Materializes a resource holding `value` at `site`.
	async fn create_resource(&self, site: &ResourceSite, value: &Value) -> Result<ResourceRef, EditorError>;
}

/// Binding solicitation collaborator.
#[async_trait]
pub trait BindingProvider: Send + Sync {
	/// Solicits a binding descriptor for `property` on the single live
	/// editor. `None` aborts the creation without error.
	async fn request_binding(&self, property: &PropertyDescriptor, editor: &Arc<dyn ObjectEditor>) -> Option<BindingRef>;
}

/// Everything the engine consumes from the embedding host.
pub struct EditingHost {
	pub editors: Arc<dyn EditorProvider>,
	pub resources: Option<Arc<dyn ResourceProvider>>,
	pub bindings: Option<Arc<dyn BindingProvider>>,
	/// Whether user-typed expressions (and hence autocomplete) are offered.
	pub supports_custom_expressions: bool,
}

impl EditingHost {
	/// Host with only an editor provider wired up.
	pub fn new(editors: Arc<dyn EditorProvider>) -> Self {
		Self { editors, resources: None, bindings: None, supports_custom_expressions: false }
	}
}
