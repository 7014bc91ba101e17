use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque handle for one selected domain entity.
///
/// The core never inspects or mutates the payload. Identity is the identity
/// of the underlying allocation: clones of one handle compare equal, two
/// handles wrapping equal payloads do not.
#[derive(Clone)]
pub struct TargetObject(Arc<dyn Any + Send + Sync>);

impl TargetObject {
	/// Wraps a caller-owned payload into a selection handle.
	pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
		Self(Arc::new(payload))
	}

	/// Borrows the payload back as a concrete type, if it is one.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref()
	}

	fn addr(&self) -> usize {
		Arc::as_ptr(&self.0) as *const () as usize
	}
}

impl PartialEq for TargetObject {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for TargetObject {}

impl Hash for TargetObject {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state);
	}
}

impl fmt::Debug for TargetObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TargetObject").field(&format_args!("{:#x}", self.addr())).finish()
	}
}
