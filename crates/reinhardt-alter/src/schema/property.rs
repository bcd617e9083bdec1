//! Field property setter
//!
//! Properties are addressed by name, compared case-insensitively. The set of
//! names accepted here matches the requirement classifier in
//! [`crate::alter::requirements`].

use super::{Field, FieldType, FieldValue};
use crate::error::{AlterTableError, Result};

/// Lookup properties kept in the extended schema rather than the main catalog
pub const EXTENDED_PROPERTIES: &[&str] = &[
	"rowSource",
	"rowSourceType",
	"rowSourceValues",
	"boundColumn",
	"visibleColumn",
	"columnWidths",
	"showColumnHeaders",
	"listRows",
	"limitToList",
	"displayWidget",
];

pub fn is_extended_property(property: &str) -> bool {
	EXTENDED_PROPERTIES
		.iter()
		.any(|p| p.eq_ignore_ascii_case(property))
}

/// Set a single property of `field`
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::schema::{set_field_property, Field, FieldType, FieldValue};
///
/// let mut field = Field::new("price", FieldType::Integer);
/// set_field_property(&mut field, "type", &FieldValue::from("Double")).unwrap();
/// set_field_property(&mut field, "visibleDecimalPlaces", &FieldValue::Int(2)).unwrap();
///
/// assert_eq!(field.field_type, FieldType::Double);
/// assert_eq!(field.visible_decimal_places, Some(2));
/// ```
pub fn set_field_property(field: &mut Field, property: &str, value: &FieldValue) -> Result<()> {
	let key = property.to_ascii_lowercase();
	match key.as_str() {
		"name" => {
			let name = value
				.as_text()
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.ok_or_else(|| AlterTableError::invalid_value(property, value, "expected a non-empty name"))?;
			field.name = name.to_string();
		}
		"type" => {
			let field_type = match value {
				FieldValue::Text(s) => s
					.parse::<FieldType>()
					.map_err(|reason| AlterTableError::invalid_value(property, value, reason))?,
				_ => return Err(AlterTableError::invalid_value(property, value, "expected a type name")),
			};
			field.field_type = field_type;
			if !field_type.is_auto_increment_allowed() {
				field.constraints.auto_increment = false;
			}
			if !field_type.supports_visible_decimal_places() {
				field.visible_decimal_places = None;
			}
		}
		"caption" => field.caption = optional_text(property, value)?,
		"description" => field.description = optional_text(property, value)?,
		"unsigned" => field.unsigned = flag(property, value)?,
		"maxlength" => field.max_length = optional_count(property, value)?,
		"precision" => field.precision = optional_count(property, value)?,
		"defaultvalue" => {
			field.default_value = if value.is_null() {
				None
			} else {
				Some(value.clone())
			};
		}
		"defaultwidth" => field.default_width = optional_count(property, value)?,
		"primarykey" => {
			let on = flag(property, value)?;
			field.constraints.primary_key = on;
			if on {
				field.constraints.not_null = true;
			}
		}
		"unique" => field.constraints.unique = flag(property, value)?,
		"notnull" => field.constraints.not_null = flag(property, value)?,
		"allowempty" => field.constraints.not_empty = !flag(property, value)?,
		"autoincrement" => {
			let on = flag(property, value)?;
			if on && !field.field_type.is_auto_increment_allowed() {
				return Err(AlterTableError::invalid_value(
					property,
					value,
					format!("auto increment is not allowed for type {}", field.field_type),
				));
			}
			field.constraints.auto_increment = on;
		}
		"indexed" => field.constraints.indexed = flag(property, value)?,
		"visibledecimalplaces" => {
			if !field.field_type.supports_visible_decimal_places() {
				return Err(AlterTableError::invalid_value(
					property,
					value,
					format!("type {} has no decimal places", field.field_type),
				));
			}
			field.visible_decimal_places = match value {
				FieldValue::Null => None,
				other => Some(
					other
						.as_int()
						.and_then(|v| i32::try_from(v).ok())
						.ok_or_else(|| AlterTableError::invalid_value(property, value, "expected an integer"))?,
				),
			};
		}
		_ if is_extended_property(&key) => {
			if value.is_null() {
				field.extended.remove(&key);
			} else {
				field.extended.insert(key, value.clone());
			}
		}
		_ => return Err(AlterTableError::UnknownProperty(property.to_string())),
	}
	Ok(())
}

fn flag(property: &str, value: &FieldValue) -> Result<bool> {
	value
		.as_bool()
		.ok_or_else(|| AlterTableError::invalid_value(property, value, "expected a boolean"))
}

fn optional_text(property: &str, value: &FieldValue) -> Result<Option<String>> {
	match value {
		FieldValue::Null => Ok(None),
		FieldValue::Text(s) => Ok(Some(s.clone())),
		_ => Err(AlterTableError::invalid_value(property, value, "expected text")),
	}
}

fn optional_count(property: &str, value: &FieldValue) -> Result<Option<u32>> {
	if value.is_null() {
		return Ok(None);
	}
	value
		.as_int()
		.and_then(|v| u32::try_from(v).ok())
		.map(Some)
		.ok_or_else(|| AlterTableError::invalid_value(property, value, "expected a non-negative integer"))
}
