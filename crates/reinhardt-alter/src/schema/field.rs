//! Field definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::FieldValue;

/// Logical field type, independent of the engine's native type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
	Byte,
	ShortInteger,
	Integer,
	BigInteger,
	Boolean,
	Date,
	DateTime,
	Time,
	Float,
	Double,
	Text,
	LongText,
	Blob,
}

impl FieldType {
	pub const ALL: [FieldType; 13] = [
		FieldType::Byte,
		FieldType::ShortInteger,
		FieldType::Integer,
		FieldType::BigInteger,
		FieldType::Boolean,
		FieldType::Date,
		FieldType::DateTime,
		FieldType::Time,
		FieldType::Float,
		FieldType::Double,
		FieldType::Text,
		FieldType::LongText,
		FieldType::Blob,
	];

	pub fn name(&self) -> &'static str {
		match self {
			FieldType::Byte => "Byte",
			FieldType::ShortInteger => "ShortInteger",
			FieldType::Integer => "Integer",
			FieldType::BigInteger => "BigInteger",
			FieldType::Boolean => "Boolean",
			FieldType::Date => "Date",
			FieldType::DateTime => "DateTime",
			FieldType::Time => "Time",
			FieldType::Float => "Float",
			FieldType::Double => "Double",
			FieldType::Text => "Text",
			FieldType::LongText => "LongText",
			FieldType::Blob => "BLOB",
		}
	}

	pub fn is_integer(&self) -> bool {
		matches!(
			self,
			FieldType::Byte | FieldType::ShortInteger | FieldType::Integer | FieldType::BigInteger
		)
	}

	pub fn is_fp(&self) -> bool {
		matches!(self, FieldType::Float | FieldType::Double)
	}

	pub fn is_text(&self) -> bool {
		matches!(self, FieldType::Text | FieldType::LongText)
	}

	pub fn is_auto_increment_allowed(&self) -> bool {
		self.is_integer()
	}

	pub fn supports_visible_decimal_places(&self) -> bool {
		self.is_fp()
	}
}

impl fmt::Display for FieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for FieldType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let wanted = s.trim();
		FieldType::ALL
			.iter()
			.copied()
			.find(|t| t.name().eq_ignore_ascii_case(wanted))
			.ok_or_else(|| format!("unknown field type '{}'", wanted))
	}
}

/// Column constraints of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConstraints {
	pub primary_key: bool,
	pub unique: bool,
	pub not_null: bool,
	/// Empty values (e.g. `''` for text) are rejected; NULL may still be allowed
	pub not_empty: bool,
	pub auto_increment: bool,
	pub indexed: bool,
}

/// A field of a table schema
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::schema::{Field, FieldType};
///
/// let field = Field::new("email", FieldType::Text)
///     .with_max_length(255)
///     .not_null()
///     .with_caption("E-mail");
///
/// assert!(field.constraints.not_null);
/// assert_eq!(field.max_length, Some(255));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub caption: Option<String>,
	pub description: Option<String>,
	pub max_length: Option<u32>,
	pub precision: Option<u32>,
	pub unsigned: bool,
	pub constraints: FieldConstraints,
	pub default_value: Option<FieldValue>,
	pub default_width: Option<u32>,
	pub visible_decimal_places: Option<i32>,
	/// Registered extended (lookup) properties, keyed by lower-cased name
	pub extended: BTreeMap<String, FieldValue>,
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			caption: None,
			description: None,
			max_length: None,
			precision: None,
			unsigned: false,
			constraints: FieldConstraints::default(),
			default_value: None,
			default_width: None,
			visible_decimal_places: None,
			extended: BTreeMap::new(),
		}
	}

	pub fn primary_key(mut self) -> Self {
		self.constraints.primary_key = true;
		self.constraints.not_null = true;
		self
	}

	pub fn auto_increment(mut self) -> Self {
		self.constraints.auto_increment = true;
		self
	}

	pub fn not_null(mut self) -> Self {
		self.constraints.not_null = true;
		self
	}

	pub fn not_empty(mut self) -> Self {
		self.constraints.not_empty = true;
		self
	}

	pub fn unique(mut self) -> Self {
		self.constraints.unique = true;
		self
	}

	pub fn indexed(mut self) -> Self {
		self.constraints.indexed = true;
		self
	}

	pub fn unsigned(mut self) -> Self {
		self.unsigned = true;
		self
	}

	pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
		self.caption = Some(caption.into());
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_max_length(mut self, max_length: u32) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn with_precision(mut self, precision: u32) -> Self {
		self.precision = Some(precision);
		self
	}

	pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
		let value = value.into();
		self.default_value = if value.is_null() { None } else { Some(value) };
		self
	}

	pub fn is_not_null(&self) -> bool {
		self.constraints.not_null
	}

	pub fn is_not_empty(&self) -> bool {
		self.constraints.not_empty
	}
}

impl fmt::Display for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.name, self.field_type)?;
		if let Some(len) = self.max_length {
			write!(f, "({})", len)?;
		}
		if self.unsigned {
			f.write_str(" UNSIGNED")?;
		}
		let c = &self.constraints;
		if c.primary_key {
			f.write_str(" PRIMARY KEY")?;
		}
		if c.auto_increment {
			f.write_str(" AUTOINCREMENT")?;
		}
		if c.unique {
			f.write_str(" UNIQUE")?;
		}
		if c.not_null {
			f.write_str(" NOTNULL")?;
		}
		if c.not_empty {
			f.write_str(" NOTEMPTY")?;
		}
		if c.indexed {
			f.write_str(" INDEXED")?;
		}
		if let Some(default) = &self.default_value {
			write!(f, " DEFAULT={}", default)?;
		}
		Ok(())
	}
}
