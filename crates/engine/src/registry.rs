//! Per-kind editing behavior.
//!
//! An explicit registry keyed by [`ValueKind`] picks coercion and validation
//! for a property's view-model, with a distinct branch for descriptors that
//! declare a constrained predefined value set. No payload-type inspection
//! happens at runtime.

use facet_contracts::{PropertyDescriptor, Value, ValueKind};

/// Editing behavior resolved once when a view-model is built.
#[derive(Clone, Copy)]
pub struct KindSpec {
	pub coerce: fn(&PropertyDescriptor, Value) -> Value,
	pub validate: fn(&PropertyDescriptor, &Value) -> bool,
}

/// Resolves the behavior for `descriptor`.
pub fn kind_spec(descriptor: &PropertyDescriptor) -> KindSpec {
	if let Some(predefined) = &descriptor.predefined {
		if predefined.is_constrained && !predefined.is_combinable {
			return KindSpec { coerce: coerce_to_kind, validate: validate_predefined };
		}
	}

	match descriptor.kind {
		ValueKind::Int | ValueKind::Float => KindSpec { coerce: coerce_numeric, validate: validate_kind },
		_ => KindSpec { coerce: coerce_to_kind, validate: validate_kind },
	}
}

/// Mismatched payload kinds collapse to the declared kind's default.
fn coerce_to_kind(descriptor: &PropertyDescriptor, value: Value) -> Value {
	if value.kind() == descriptor.kind {
		value
	} else {
		descriptor.kind.default_value()
	}
}

/// Numeric properties accept either numeric payload and convert.
fn coerce_numeric(descriptor: &PropertyDescriptor, value: Value) -> Value {
	match (descriptor.kind, value) {
		(ValueKind::Int, Value::Float(number)) => Value::Int(number.round() as i64),
		(ValueKind::Float, Value::Int(number)) => Value::Float(number as f64),
		(kind, value) if value.kind() == kind => value,
		(kind, _) => kind.default_value(),
	}
}

fn validate_kind(descriptor: &PropertyDescriptor, value: &Value) -> bool {
	value.kind() == descriptor.kind
}

/// Only values from the declared set are legal.
fn validate_predefined(descriptor: &PropertyDescriptor, value: &Value) -> bool {
	let Some(predefined) = &descriptor.predefined else {
		return validate_kind(descriptor, value);
	};
	predefined.values.values().any(|candidate| candidate == value)
}
