//! Aggregation engine presenting one editable view over a multi-object
//! selection.
//!
//! The [`PropertiesAggregator`] owns the selection and the member
//! view-models; everything underneath it ([`PropertyViewModel`],
//! [`EventViewModel`]) is reached through it. Collaborator contracts live in
//! `facet-contracts`.

pub mod aggregator;
mod autocomplete;
mod availability;
pub mod events;
mod known;
pub mod property;
mod registry;

#[cfg(test)]
mod testsupport;

pub use aggregator::{AggregateEvent, PropertiesAggregator, SelectionChange};
pub use events::EventViewModel;
pub use property::PropertyViewModel;
