//! Table schema

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::Field;

/// An index over one or more columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
	pub name: String,
	pub columns: Vec<String>,
	pub unique: bool,
}

impl IndexSchema {
	pub fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
		Self {
			name: name.into(),
			columns,
			unique,
		}
	}
}

/// Ordered list of fields plus table-level metadata
///
/// Cloning produces a fully independent copy; the alteration engine mutates a
/// clone and only hands it back once every step has succeeded.
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::schema::{Field, FieldType, TableSchema};
///
/// let mut table = TableSchema::new("users")
///     .with_field(Field::new("id", FieldType::Integer).primary_key())
///     .with_field(Field::new("name", FieldType::Text));
///
/// table.rename_field(1, "full_name");
/// assert_eq!(table.field_index("FULL_NAME"), Some(1));
/// assert_eq!(table.primary_key(), vec!["id"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
	pub name: String,
	pub fields: Vec<Field>,
	pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: Vec::new(),
			indexes: Vec::new(),
		}
	}

	pub fn with_field(mut self, field: Field) -> Self {
		self.fields.push(field);
		self
	}

	pub fn with_index(mut self, index: IndexSchema) -> Self {
		self.indexes.push(index);
		self
	}

	pub fn field_count(&self) -> usize {
		self.fields.len()
	}

	/// Position of the field with the given name (case-insensitive)
	pub fn field_index(&self, name: &str) -> Option<usize> {
		self.fields
			.iter()
			.position(|f| f.name.eq_ignore_ascii_case(name))
	}

	pub fn field(&self, name: &str) -> Option<&Field> {
		self.field_index(name).map(|i| &self.fields[i])
	}

	/// Names of the primary key fields, in field order
	pub fn primary_key(&self) -> Vec<&str> {
		self.fields
			.iter()
			.filter(|f| f.constraints.primary_key)
			.map(|f| f.name.as_str())
			.collect()
	}

	/// Rename the field at `index`, keeping index definitions in sync
	pub fn rename_field(&mut self, index: usize, new_name: impl Into<String>) {
		let new_name = new_name.into();
		let old_name = std::mem::replace(&mut self.fields[index].name, new_name.clone());
		for idx in &mut self.indexes {
			for column in &mut idx.columns {
				if column.eq_ignore_ascii_case(&old_name) {
					*column = new_name.clone();
				}
			}
		}
	}

	/// Insert a field, clamping `index` to the current field count
	///
	/// Returns the position the field was actually inserted at.
	pub fn insert_field(&mut self, index: usize, field: Field) -> usize {
		let index = index.min(self.fields.len());
		self.fields.insert(index, field);
		index
	}

	/// Remove the field at `index`
	///
	/// The column is dropped from every index; indexes left without columns
	/// are dropped as well.
	pub fn remove_field(&mut self, index: usize) -> Field {
		let field = self.fields.remove(index);
		for idx in &mut self.indexes {
			idx.columns.retain(|c| !c.eq_ignore_ascii_case(&field.name));
		}
		self.indexes.retain(|idx| !idx.columns.is_empty());
		field
	}

	/// Move the field at `from` to `to`, clamping `to` to the last position
	///
	/// Returns the final position of the field.
	pub fn move_field(&mut self, from: usize, to: usize) -> usize {
		let field = self.fields.remove(from);
		let to = to.min(self.fields.len());
		self.fields.insert(to, field);
		to
	}

	/// Declared indexes plus one index per `indexed` field
	///
	/// A field index is named `<table>_<field>_idx` and is skipped when the
	/// field is a primary key or a declared index already covers exactly
	/// that column.
	pub fn effective_indexes(&self) -> Vec<IndexSchema> {
		let mut indexes = self.indexes.clone();
		for field in &self.fields {
			if !field.constraints.indexed || field.constraints.primary_key {
				continue;
			}
			let covered = self.indexes.iter().any(|idx| {
				idx.columns.len() == 1 && idx.columns[0].eq_ignore_ascii_case(&field.name)
			});
			if !covered {
				indexes.push(IndexSchema::new(
					format!("{}_{}_idx", self.name, field.name),
					vec![field.name.clone()],
					false,
				));
			}
		}
		indexes
	}

	/// First field name that occurs more than once (case-insensitive)
	pub fn duplicate_field_name(&self) -> Option<&str> {
		let mut seen = HashSet::new();
		self.fields
			.iter()
			.find(|f| !seen.insert(f.name.to_ascii_lowercase()))
			.map(|f| f.name.as_str())
	}
}

impl fmt::Display for TableSchema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "TABLE {}", self.name)?;
		for field in &self.fields {
			writeln!(f, "  {}", field)?;
		}
		for idx in &self.indexes {
			writeln!(
				f,
				"  {}INDEX {} ({})",
				if idx.unique { "UNIQUE " } else { "" },
				idx.name,
				idx.columns.join(", ")
			)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::FieldType;

	fn users() -> TableSchema {
		TableSchema::new("users")
			.with_field(Field::new("id", FieldType::Integer).primary_key())
			.with_field(Field::new("name", FieldType::Text))
			.with_field(Field::new("email", FieldType::Text))
			.with_index(IndexSchema::new(
				"users_name_email",
				vec!["name".into(), "email".into()],
				false,
			))
	}

	#[test]
	fn test_clone_is_independent() {
		let original = users();
		let mut clone = original.clone();
		clone.rename_field(1, "nick");
		clone.remove_field(2);

		assert_eq!(original.fields.len(), 3);
		assert_eq!(original.fields[1].name, "name");
		assert_eq!(clone.fields.len(), 2);
	}

	#[test]
	fn test_rename_updates_indexes() {
		let mut table = users();
		table.rename_field(1, "nick");
		assert_eq!(table.indexes[0].columns, vec!["nick", "email"]);
	}

	#[test]
	fn test_remove_drops_empty_indexes() {
		let mut table = users();
		table.remove_field(1);
		assert_eq!(table.indexes[0].columns, vec!["email"]);
		table.remove_field(1);
		assert!(table.indexes.is_empty());
	}

	#[test]
	fn test_insert_clamps_index() {
		let mut table = users();
		let at = table.insert_field(42, Field::new("age", FieldType::Integer));
		assert_eq!(at, 3);
		assert_eq!(table.fields[3].name, "age");
	}

	#[test]
	fn test_move_field() {
		let mut table = users();
		assert_eq!(table.move_field(2, 0), 0);
		let names: Vec<_> = table.fields.iter().map(|f| f.name.as_str()).collect();
		assert_eq!(names, vec!["email", "id", "name"]);
		assert_eq!(table.move_field(0, 99), 2);
	}

	#[test]
	fn test_effective_indexes_include_indexed_fields() {
		let table = users()
			.with_field(Field::new("age", FieldType::Integer).indexed())
			.with_field(Field::new("code", FieldType::Text).indexed())
			.with_index(IndexSchema::new("users_code", vec!["code".into()], true));

		let names: Vec<_> = table.effective_indexes().into_iter().map(|idx| idx.name).collect();
		assert_eq!(names, vec!["users_name_email", "users_code", "users_age_idx"]);
	}

	#[test]
	fn test_duplicate_field_name_is_case_insensitive() {
		let mut table = users();
		assert_eq!(table.duplicate_field_name(), None);
		table.rename_field(2, "NAME");
		assert_eq!(table.duplicate_field_name(), Some("NAME"));
	}
}
