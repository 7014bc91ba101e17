//! Well-known-property index.

use std::collections::HashMap;

use facet_contracts::{KnownPropertyKey, PropertyId};

/// Bidirectional, unique mapping between well-known keys and properties.
///
/// One owned structure holds both directions; every mutation updates them
/// together, so the reverse view can never drift from the forward one.
#[derive(Debug, Default)]
pub struct KnownPropertyIndex {
	forward: HashMap<KnownPropertyKey, PropertyId>,
	reverse: HashMap<PropertyId, KnownPropertyKey>,
}

impl KnownPropertyIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Maps `key` to `property`, displacing any previous pairing of either.
	pub fn insert(&mut self, key: KnownPropertyKey, property: PropertyId) {
		if let Some(previous) = self.forward.insert(key.clone(), property.clone()) {
			self.reverse.remove(&previous);
		}
		if let Some(previous) = self.reverse.insert(property, key) {
			self.forward.remove(&previous);
		}
	}

	/// Drops the entry for a torn-down property, if one exists.
	pub fn remove_property(&mut self, property: &PropertyId) {
		if let Some(key) = self.reverse.remove(property) {
			self.forward.remove(&key);
		}
	}

	pub fn property(&self, key: &KnownPropertyKey) -> Option<&PropertyId> {
		self.forward.get(key)
	}

	pub fn key(&self, property: &PropertyId) -> Option<&KnownPropertyKey> {
		self.reverse.get(property)
	}

	pub fn len(&self) -> usize {
		self.forward.len()
	}

	pub fn is_empty(&self) -> bool {
		self.forward.is_empty()
	}
}
