//! Contract types for the aggregated property editing core.
//!
//! Everything here is either a value-like descriptor (descriptors, snapshots,
//! source kinds) or a capability trait the engine consumes but never
//! implements. The engine crate depends on this one; collaborators implement
//! the traits and hand their objects in through [`EditingHost`].

pub mod collaborators;
pub mod descriptor;
pub mod editor;
pub mod error;
pub mod snapshot;
pub mod target;
pub mod value;

pub use collaborators::{BindingProvider, EditingHost, ResourceProvider, ResourceSite, ValueConstrainer};
pub use descriptor::{
	AvailabilityConstraint, EventDescriptor, EventId, KnownPropertyKey, PredefinedValues, PropertyDescriptor, PropertyId,
	PropertyVariation, SourceKinds, VariationOption,
};
pub use editor::{CompleteValues, EditorEvent, EditorProvider, EvaluateConstraints, Nameable, NavigateToSource, ObjectEditor};
pub use error::EditorError;
pub use snapshot::{BindingRef, ResourceRef, SourceDescriptor, SourceKind, ValueSnapshot};
pub use target::TargetObject;
pub use value::{Color, Point, Rect, Size, Thickness, Value, ValueKind};
