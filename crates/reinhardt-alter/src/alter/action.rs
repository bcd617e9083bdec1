//! Requested field edits

use serde::{Deserialize, Serialize};
use std::fmt;

use super::requirements::{AlteringRequirements, classify};
use crate::error::Result;
use crate::schema::{Field, FieldValue};

/// Stable identity of a field across renames
///
/// Assigned once per logical field when actions are authored and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldUid(pub u64);

impl fmt::Display for FieldUid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

impl From<u64> for FieldUid {
	fn from(uid: u64) -> Self {
		Self(uid)
	}
}

/// One requested edit of a table's schema
///
/// `field_name` is the name the field carries at the moment the action runs.
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::alter::{Action, FieldUid};
/// use reinhardt_alter::schema::{Field, FieldType};
///
/// let rename = Action::rename(FieldUid(1), "a", "c");
/// assert!(rename.is_rename());
/// assert_eq!(rename.to_string(), "Rename table field \"a\" to \"c\"");
///
/// let insert = Action::insert(FieldUid(2), 1, Field::new("d", FieldType::Text).not_null());
/// assert_eq!(insert.field_name(), "d");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
	ChangeFieldProperty {
		uid: FieldUid,
		field_name: String,
		property: String,
		value: FieldValue,
	},
	RemoveField {
		uid: FieldUid,
		field_name: String,
	},
	InsertField {
		uid: FieldUid,
		index: usize,
		field: Field,
	},
	MoveFieldPosition {
		uid: FieldUid,
		field_name: String,
		index: usize,
	},
}

impl Action {
	pub fn change_property(
		uid: FieldUid,
		field_name: impl Into<String>,
		property: impl Into<String>,
		value: impl Into<FieldValue>,
	) -> Self {
		Action::ChangeFieldProperty {
			uid,
			field_name: field_name.into(),
			property: property.into(),
			value: value.into(),
		}
	}

	pub fn rename(uid: FieldUid, field_name: impl Into<String>, new_name: impl Into<String>) -> Self {
		Self::change_property(uid, field_name, "name", FieldValue::Text(new_name.into()))
	}

	pub fn remove(uid: FieldUid, field_name: impl Into<String>) -> Self {
		Action::RemoveField {
			uid,
			field_name: field_name.into(),
		}
	}

	pub fn insert(uid: FieldUid, index: usize, field: Field) -> Self {
		Action::InsertField { uid, index, field }
	}

	pub fn move_to(uid: FieldUid, field_name: impl Into<String>, index: usize) -> Self {
		Action::MoveFieldPosition {
			uid,
			field_name: field_name.into(),
			index,
		}
	}

	pub fn uid(&self) -> FieldUid {
		match self {
			Action::ChangeFieldProperty { uid, .. }
			| Action::RemoveField { uid, .. }
			| Action::InsertField { uid, .. }
			| Action::MoveFieldPosition { uid, .. } => *uid,
		}
	}

	pub fn field_name(&self) -> &str {
		match self {
			Action::ChangeFieldProperty { field_name, .. }
			| Action::RemoveField { field_name, .. }
			| Action::MoveFieldPosition { field_name, .. } => field_name,
			Action::InsertField { field, .. } => &field.name,
		}
	}

	pub(crate) fn set_field_name(&mut self, name: &str) {
		match self {
			Action::ChangeFieldProperty { field_name, .. }
			| Action::RemoveField { field_name, .. }
			| Action::MoveFieldPosition { field_name, .. } => *field_name = name.to_string(),
			Action::InsertField { field, .. } => field.name = name.to_string(),
		}
	}

	/// Lower-cased property name of a property change
	pub fn property_key(&self) -> Option<String> {
		match self {
			Action::ChangeFieldProperty { property, .. } => Some(property.to_ascii_lowercase()),
			_ => None,
		}
	}

	pub fn is_rename(&self) -> bool {
		matches!(self, Action::ChangeFieldProperty { property, .. } if property.eq_ignore_ascii_case("name"))
	}

	/// Target name of a rename, without surrounding whitespace
	pub fn new_name(&self) -> Option<&str> {
		match self {
			Action::ChangeFieldProperty { value, .. } if self.is_rename() => value.as_text().map(str::trim),
			_ => None,
		}
	}

	/// A rename whose target equals the current name
	pub fn is_noop_rename(&self) -> bool {
		self.new_name()
			.is_some_and(|new_name| new_name.eq_ignore_ascii_case(self.field_name()))
	}

	pub fn requirements(&self) -> Result<AlteringRequirements> {
		match self {
			Action::ChangeFieldProperty { property, .. } => classify(property),
			Action::RemoveField { .. } | Action::InsertField { .. } => Ok(AlteringRequirements::PHYSICAL),
			Action::MoveFieldPosition { .. } => Ok(AlteringRequirements::MAIN_SCHEMA),
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Action::ChangeFieldProperty { field_name, value, .. } if self.is_rename() => {
				write!(f, "Rename table field \"{}\" to \"{}\"", field_name, value)
			}
			Action::ChangeFieldProperty {
				field_name,
				property,
				value,
				..
			} => write!(
				f,
				"Set \"{}\" property for table field \"{}\" to \"{}\"",
				property, field_name, value
			),
			Action::RemoveField { field_name, .. } => write!(f, "Remove table field \"{}\"", field_name),
			Action::InsertField { index, field, .. } => {
				write!(f, "Insert table field \"{}\" at position {}", field.name, index)
			}
			Action::MoveFieldPosition { field_name, index, .. } => {
				write!(f, "Move table field \"{}\" to position {}", field_name, index)
			}
		}
	}
}

/// An action tagged with its submission order and cached requirements
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAction {
	pub order: usize,
	pub requirements: AlteringRequirements,
	pub action: Action,
}

impl PlannedAction {
	pub fn new(order: usize, action: Action) -> Result<Self> {
		Ok(Self {
			order,
			requirements: action.requirements()?,
			action,
		})
	}

	/// Tag a submitted list, numbering actions by position
	pub fn plan_all<I>(actions: I) -> Result<Vec<Self>>
	where
		I: IntoIterator<Item = Action>,
	{
		actions
			.into_iter()
			.enumerate()
			.map(|(order, action)| Self::new(order, action))
			.collect()
	}

	pub fn uid(&self) -> FieldUid {
		self.action.uid()
	}
}

impl fmt::Display for PlannedAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.order + 1, self.action)
	}
}
