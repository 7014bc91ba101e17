//! Property and event descriptors.
//!
//! Descriptor equality is identity-based per underlying property: distinct
//! editors may hand out distinct descriptor instances for the same logical
//! property, and those must compare equal. Identity lives in [`PropertyId`] /
//! [`EventId`]; every other field is metadata.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::collaborators::ValueConstrainer;
use crate::value::{Value, ValueKind};

/// Identity of one logical property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(Arc<str>);

impl PropertyId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for PropertyId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl fmt::Display for PropertyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Identity of one logical event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(Arc<str>);

impl EventId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for EventId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Semantic key for a well-known property (e.g. a platform's "width").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KnownPropertyKey(Arc<str>);

impl KnownPropertyKey {
	pub fn new(key: impl Into<Arc<str>>) -> Self {
		Self(key.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for KnownPropertyKey {
	fn from(key: &str) -> Self {
		Self::new(key)
	}
}

bitflags! {
	/// Value sources a property supports.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct SourceKinds: u8 {
		const DEFAULT = 1 << 0;
		const LOCAL = 1 << 1;
		const RESOURCE = 1 << 2;
		const BINDING = 1 << 3;
	}
}

/// Declared availability constraint on a property.
///
/// The `key` is interpreted by editors implementing
/// [`EvaluateConstraints`](crate::EvaluateConstraints); the engine only cares
/// about which properties a constraint listens to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AvailabilityConstraint {
	pub key: String,
	pub constraining: Vec<PropertyId>,
}

impl AvailabilityConstraint {
	pub fn new(key: impl Into<String>, constraining: impl IntoIterator<Item = PropertyId>) -> Self {
		Self { key: key.into(), constraining: constraining.into_iter().collect() }
	}
}

/// Declared enumerable value set for a property.
#[derive(Debug, Clone, PartialEq)]
pub struct PredefinedValues {
	/// Display name to value, in declaration order.
	pub values: IndexMap<String, Value>,
	/// Whether values may be combined (flag-like) rather than exclusive.
	pub is_combinable: bool,
	/// Whether only listed values are legal.
	pub is_constrained: bool,
}

/// One axis option of a property variation (e.g. device class, theme).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariationOption {
	pub category: String,
	pub name: String,
}

impl VariationOption {
	pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
		Self { category: category.into(), name: name.into() }
	}
}

/// A concrete variation a value is queried or written under.
pub type PropertyVariation = Vec<VariationOption>;

/// Identity and metadata for one logical property.
#[derive(Clone)]
pub struct PropertyDescriptor {
	pub id: PropertyId,
	pub name: String,
	pub category: String,
	pub kind: ValueKind,
	pub can_write: bool,
	pub sources: SourceKinds,
	/// Variation axis the property can vary along, empty when invariant.
	pub variations: Vec<VariationOption>,
	pub constraints: Vec<AvailabilityConstraint>,
	pub predefined: Option<PredefinedValues>,
	/// Optional caller-supplied coercion/validation hook.
	pub constrainer: Option<Arc<dyn ValueConstrainer>>,
}

impl PropertyDescriptor {
	/// A writable local/default property with no frills.
	pub fn new(id: impl Into<PropertyId>, name: impl Into<String>, kind: ValueKind) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			category: String::new(),
			kind,
			can_write: true,
			sources: SourceKinds::DEFAULT | SourceKinds::LOCAL,
			variations: Vec::new(),
			constraints: Vec::new(),
			predefined: None,
			constrainer: None,
		}
	}
}

impl PartialEq for PropertyDescriptor {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for PropertyDescriptor {}

impl Hash for PropertyDescriptor {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for PropertyDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PropertyDescriptor")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("sources", &self.sources)
			.finish_non_exhaustive()
	}
}

/// Identity and metadata for one logical event.
#[derive(Debug, Clone)]
pub struct EventDescriptor {
	pub id: EventId,
	pub name: String,
}

impl EventDescriptor {
	pub fn new(id: impl Into<EventId>, name: impl Into<String>) -> Self {
		Self { id: id.into(), name: name.into() }
	}
}

impl PartialEq for EventDescriptor {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for EventDescriptor {}

impl Hash for EventDescriptor {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}
