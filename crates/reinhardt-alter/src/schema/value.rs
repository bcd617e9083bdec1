//! Field values used for property changes, defaults and placeholders

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::FieldType;

/// A dynamically typed field or property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Bytes(Vec<u8>),
	Date(NaiveDate),
	DateTime(NaiveDateTime),
	Time(NaiveTime),
}

impl FieldValue {
	pub fn is_null(&self) -> bool {
		matches!(self, FieldValue::Null)
	}

	/// Interpret the value as a boolean flag
	///
	/// Integers are true when non-zero; text accepts `true`/`false`/`1`/`0`.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			FieldValue::Bool(b) => Some(*b),
			FieldValue::Int(i) => Some(*i != 0),
			FieldValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
				"true" | "1" => Some(true),
				"false" | "0" => Some(false),
				_ => None,
			},
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			FieldValue::Int(i) => Some(*i),
			FieldValue::Bool(b) => Some(i64::from(*b)),
			FieldValue::Text(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			FieldValue::Text(s) => Some(s),
			_ => None,
		}
	}
}

impl fmt::Display for FieldValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldValue::Null => Ok(()),
			FieldValue::Bool(b) => write!(f, "{}", b),
			FieldValue::Int(i) => write!(f, "{}", i),
			FieldValue::Float(v) => write!(f, "{}", v),
			FieldValue::Text(s) => f.write_str(s),
			FieldValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
			FieldValue::Date(d) => write!(f, "{}", d),
			FieldValue::DateTime(dt) => write!(f, "{}", dt),
			FieldValue::Time(t) => write!(f, "{}", t),
		}
	}
}

impl From<bool> for FieldValue {
	fn from(b: bool) -> Self {
		FieldValue::Bool(b)
	}
}

impl From<i64> for FieldValue {
	fn from(i: i64) -> Self {
		FieldValue::Int(i)
	}
}

impl From<i32> for FieldValue {
	fn from(i: i32) -> Self {
		FieldValue::Int(i as i64)
	}
}

impl From<u32> for FieldValue {
	fn from(i: u32) -> Self {
		FieldValue::Int(i as i64)
	}
}

impl From<f64> for FieldValue {
	fn from(v: f64) -> Self {
		FieldValue::Float(v)
	}
}

impl From<&str> for FieldValue {
	fn from(s: &str) -> Self {
		FieldValue::Text(s.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(s: String) -> Self {
		FieldValue::Text(s)
	}
}

impl From<Vec<u8>> for FieldValue {
	fn from(b: Vec<u8>) -> Self {
		FieldValue::Bytes(b)
	}
}

impl From<FieldType> for FieldValue {
	fn from(t: FieldType) -> Self {
		FieldValue::Text(t.to_string())
	}
}

/// Placeholder stored into NOT NULL columns that have no source and no default
///
/// Date and time types have no fixed placeholder; the current local date/time
/// is used instead.
pub fn empty_value_for_type(field_type: FieldType) -> FieldValue {
	match field_type {
		FieldType::Byte
		| FieldType::ShortInteger
		| FieldType::Integer
		| FieldType::BigInteger => FieldValue::Int(0),
		FieldType::Boolean => FieldValue::Bool(false),
		FieldType::Float | FieldType::Double => FieldValue::Float(0.0),
		FieldType::Text | FieldType::LongText => FieldValue::Text(String::new()),
		FieldType::Blob => FieldValue::Bytes(Vec::new()),
		FieldType::Date => FieldValue::Date(chrono::Local::now().date_naive()),
		FieldType::DateTime => FieldValue::DateTime(chrono::Local::now().naive_local()),
		FieldType::Time => FieldValue::Time(chrono::Local::now().time()),
	}
}

/// Placeholder stored into columns that permit NULL but forbid empty values
pub fn not_empty_value_for_type(field_type: FieldType) -> FieldValue {
	match field_type {
		FieldType::Text | FieldType::LongText => FieldValue::Text(" ".to_string()),
		other => empty_value_for_type(other),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(FieldType::Integer, FieldValue::Int(0))]
	#[case(FieldType::Byte, FieldValue::Int(0))]
	#[case(FieldType::Boolean, FieldValue::Bool(false))]
	#[case(FieldType::Double, FieldValue::Float(0.0))]
	#[case(FieldType::Text, FieldValue::Text(String::new()))]
	#[case(FieldType::Blob, FieldValue::Bytes(Vec::new()))]
	fn test_empty_value_for_type(#[case] field_type: FieldType, #[case] expected: FieldValue) {
		assert_eq!(empty_value_for_type(field_type), expected);
	}

	#[test]
	fn test_not_empty_text_placeholder_is_not_empty() {
		let value = not_empty_value_for_type(FieldType::LongText);
		assert_eq!(value, FieldValue::Text(" ".to_string()));
		assert_eq!(not_empty_value_for_type(FieldType::Integer), FieldValue::Int(0));
	}

	#[test]
	fn test_date_placeholders_are_current() {
		let today = chrono::Local::now().date_naive();
		match empty_value_for_type(FieldType::Date) {
			FieldValue::Date(d) => assert!(d >= today),
			other => panic!("unexpected placeholder {:?}", other),
		}
	}

	#[rstest]
	#[case(FieldValue::Bool(true), Some(true))]
	#[case(FieldValue::Int(0), Some(false))]
	#[case(FieldValue::Text("TRUE".into()), Some(true))]
	#[case(FieldValue::Text("maybe".into()), None)]
	#[case(FieldValue::Null, None)]
	fn test_as_bool(#[case] value: FieldValue, #[case] expected: Option<bool>) {
		assert_eq!(value.as_bool(), expected);
	}
}
