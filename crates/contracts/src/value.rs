//! Property value payloads and their per-kind neutral defaults.

/// Classification tag for property value payloads.
///
/// Every [`PropertyDescriptor`](crate::PropertyDescriptor) declares exactly
/// one kind; the engine's view-model registry keys coercion and validation
/// off it instead of inspecting payload types at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	Bool,
	Int,
	Float,
	Text,
	Color,
	Point,
	Size,
	Rect,
	Thickness,
}

impl ValueKind {
	/// Neutral value for this kind.
	///
	/// Used when editors disagree, when a value is unset, and as the seed for
	/// freshly constructed snapshots. This is an explicit table; there is no
	/// process-wide default cache.
	pub fn default_value(self) -> Value {
		match self {
			Self::Bool => Value::Bool(false),
			Self::Int => Value::Int(0),
			Self::Float => Value::Float(0.0),
			Self::Text => Value::Text(String::new()),
			Self::Color => Value::Color(Color::default()),
			Self::Point => Value::Point(Point::default()),
			Self::Size => Value::Size(Size::default()),
			Self::Rect => Value::Rect(Rect::default()),
			Self::Thickness => Value::Thickness(Thickness::default()),
		}
	}
}

/// RGBA color, straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thickness {
	pub left: f64,
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
}

/// One property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Color(Color),
	Point(Point),
	Size(Size),
	Rect(Rect),
	Thickness(Thickness),
}

impl Value {
	/// The kind tag of this payload.
	pub fn kind(&self) -> ValueKind {
		match self {
			Self::Bool(_) => ValueKind::Bool,
			Self::Int(_) => ValueKind::Int,
			Self::Float(_) => ValueKind::Float,
			Self::Text(_) => ValueKind::Text,
			Self::Color(_) => ValueKind::Color,
			Self::Point(_) => ValueKind::Point,
			Self::Size(_) => ValueKind::Size,
			Self::Rect(_) => ValueKind::Rect,
			Self::Thickness(_) => ValueKind::Thickness,
		}
	}
}

impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<bool> for Value {
	fn from(flag: bool) -> Self {
		Self::Bool(flag)
	}
}

impl From<i64> for Value {
	fn from(number: i64) -> Self {
		Self::Int(number)
	}
}

impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Self::Float(number)
	}
}
