//! Aggregated value snapshots and their source classification.

use crate::value::{Value, ValueKind};

/// Where a property's current value originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
	/// Fixed default declared by the property itself.
	Default,
	/// Locally set literal.
	Local,
	/// Linked to a named resource.
	Resource,
	/// Data-bound.
	Binding,
	/// Explicitly cleared.
	Unset,
	/// Editors disagree; the snapshot is neutral.
	Unknown,
}

/// Reference to a named resource in some container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
	pub container: String,
	pub name: String,
}

impl ResourceRef {
	pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
		Self { container: container.into(), name: name.into() }
	}
}

/// Reference to a binding produced by the binding provider.
///
/// Opaque to the core; the expression is round-tripped to editors unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingRef {
	pub expression: String,
}

impl BindingRef {
	pub fn new(expression: impl Into<String>) -> Self {
		Self { expression: expression.into() }
	}
}

/// Descriptor attached to a snapshot explaining a non-local source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceDescriptor {
	Resource(ResourceRef),
	Binding(BindingRef),
}

/// Aggregated value state for one property across all current editors.
///
/// Snapshots are replaced wholesale; observers never see one with a mix of
/// old and new fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSnapshot {
	pub value: Value,
	pub source: SourceKind,
	pub source_descriptor: Option<SourceDescriptor>,
	pub value_descriptor: Option<SourceDescriptor>,
	pub custom_expression: Option<String>,
}

impl ValueSnapshot {
	/// Neutral snapshot for a freshly constructed or disagreeing property.
	pub fn neutral(kind: ValueKind, source: SourceKind) -> Self {
		Self {
			value: kind.default_value(),
			source,
			source_descriptor: None,
			value_descriptor: None,
			custom_expression: None,
		}
	}

	/// Locally-set literal.
	pub fn local(value: Value) -> Self {
		Self {
			value,
			source: SourceKind::Local,
			source_descriptor: None,
			value_descriptor: None,
			custom_expression: None,
		}
	}

	/// Resource-linked value; the payload is the kind's neutral default until
	/// the editor resolves the resource.
	pub fn resource(kind: ValueKind, resource: ResourceRef) -> Self {
		Self {
			value: kind.default_value(),
			source: SourceKind::Resource,
			source_descriptor: Some(SourceDescriptor::Resource(resource)),
			value_descriptor: None,
			custom_expression: None,
		}
	}

	/// Data-bound value.
	pub fn binding(kind: ValueKind, binding: BindingRef) -> Self {
		Self {
			value: kind.default_value(),
			source: SourceKind::Binding,
			source_descriptor: None,
			value_descriptor: Some(SourceDescriptor::Binding(binding)),
			custom_expression: None,
		}
	}

	/// Explicitly cleared value.
	pub fn unset(kind: ValueKind) -> Self {
		Self::neutral(kind, SourceKind::Unset)
	}

	/// User-typed expression, left to the editor to interpret.
	pub fn expression(kind: ValueKind, expression: impl Into<String>) -> Self {
		Self {
			value: kind.default_value(),
			source: SourceKind::Local,
			source_descriptor: None,
			value_descriptor: None,
			custom_expression: Some(expression.into()),
		}
	}
}
