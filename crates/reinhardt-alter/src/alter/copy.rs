//! Data copy for table rebuilds

use crate::schema::{Field, FieldType, FieldValue, empty_value_for_type, not_empty_value_for_type};

/// Where a destination column takes its values from
#[derive(Debug, Clone, PartialEq)]
pub enum CopySource {
	/// Existing column of the source table
	Column(String),
	/// The column's declared default
	DefaultValue(FieldValue),
	/// Placeholder for NOT NULL columns
	EmptyValue(FieldValue),
	/// Placeholder for columns that permit NULL but not empty values
	NotEmptyValue(FieldValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyColumn {
	pub destination: String,
	pub field_type: FieldType,
	pub source: CopySource,
}

/// `INSERT INTO destination (...) SELECT ... FROM source`
#[derive(Debug, Clone, PartialEq)]
pub struct DataCopyPlan {
	pub source: String,
	pub destination: String,
	pub columns: Vec<CopyColumn>,
}

impl DataCopyPlan {
	/// Build the plan for `fields` of the new table
	///
	/// Each field is paired with the name of the source column it was carried
	/// over from, if any. Columns left without a source receive the engine's
	/// own default.
	///
	/// # Example
	///
	/// ```rust
	/// use reinhardt_alter::alter::{CopySource, DataCopyPlan};
	/// use reinhardt_alter::schema::{Field, FieldType, FieldValue};
	///
	/// let c = Field::new("c", FieldType::Integer);
	/// let d = Field::new("d", FieldType::Text).not_null();
	/// let plan = DataCopyPlan::build("t", "t_temp", [(&c, Some("a")), (&d, None)]);
	///
	/// assert_eq!(plan.columns[0].source, CopySource::Column("a".into()));
	/// assert_eq!(plan.columns[1].source, CopySource::EmptyValue(FieldValue::from("")));
	/// ```
	pub fn build<'a, I>(source: impl Into<String>, destination: impl Into<String>, fields: I) -> Self
	where
		I: IntoIterator<Item = (&'a Field, Option<&'a str>)>,
	{
		let columns = fields
			.into_iter()
			.filter_map(|(field, from)| {
				source_for(field, from).map(|source| CopyColumn {
					destination: field.name.clone(),
					field_type: field.field_type,
					source,
				})
			})
			.collect();
		Self {
			source: source.into(),
			destination: destination.into(),
			columns,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}
}

fn source_for(field: &Field, from: Option<&str>) -> Option<CopySource> {
	if let Some(column) = from {
		return Some(CopySource::Column(column.to_string()));
	}
	// the engine assigns values; placeholders would break uniqueness
	if field.constraints.auto_increment {
		return None;
	}
	if let Some(default) = &field.default_value {
		return Some(CopySource::DefaultValue(default.clone()));
	}
	if field.is_not_null() {
		return Some(CopySource::EmptyValue(empty_value_for_type(field.field_type)));
	}
	if field.is_not_empty() {
		return Some(CopySource::NotEmptyValue(not_empty_value_for_type(field.field_type)));
	}
	None
}
