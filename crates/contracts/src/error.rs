use std::fmt;

/// Failures reported by editors and collaborators.
///
/// The engine contains these at per-property or per-selection-item
/// granularity; they surface as retrievable error strings, never as aborts of
/// sibling operations.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum EditorError {
	/// The editor does not support the requested operation.
	#[error("unsupported operation: {0}")]
	Unsupported(&'static str),
	/// The property cannot be written.
	#[error("property is read-only")]
	ReadOnly,
	/// The collaborator failed; the message is surfaced verbatim.
	#[error("{0}")]
	Failed(String),
}

impl EditorError {
	/// Generic failure with a formatted message.
	pub fn failed(message: impl fmt::Display) -> Self {
		Self::Failed(message.to_string())
	}
}
