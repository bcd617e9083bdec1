//! Catalog kept in process memory

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::SchemaCatalog;
use crate::error::{BackendError, BackendResult};
use crate::schema::{Field, FieldValue, TableSchema};

type ExtendedData = BTreeMap<String, BTreeMap<String, FieldValue>>;

/// Table definitions keyed by lower-cased table name
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::backends::MemoryCatalog;
/// use reinhardt_alter::schema::{Field, FieldType, TableSchema};
///
/// let catalog = MemoryCatalog::new();
/// catalog.register(TableSchema::new("users").with_field(Field::new("id", FieldType::Integer)));
/// assert!(catalog.get("USERS").is_some());
/// ```
#[derive(Debug, Default)]
pub struct MemoryCatalog {
	tables: RwLock<HashMap<String, TableSchema>>,
	extended: RwLock<HashMap<String, ExtendedData>>,
}

impl MemoryCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, table: TableSchema) {
		self.tables.write().insert(table.name.to_ascii_lowercase(), table);
	}

	pub fn unregister(&self, name: &str) -> Option<TableSchema> {
		self.extended.write().remove(&name.to_ascii_lowercase());
		self.tables.write().remove(&name.to_ascii_lowercase())
	}

	pub fn get(&self, name: &str) -> Option<TableSchema> {
		self.tables.read().get(&name.to_ascii_lowercase()).cloned()
	}

	/// Extended field data last stored for `table`, keyed by field name
	pub fn extended_schema(&self, table: &str) -> Option<ExtendedData> {
		self.extended.read().get(&table.to_ascii_lowercase()).cloned()
	}
}

#[async_trait]
impl SchemaCatalog for MemoryCatalog {
	async fn table_schema(&self, table: &str) -> BackendResult<Option<TableSchema>> {
		Ok(self.get(table))
	}

	async fn store_field(&self, table: &str, position: usize, field: &Field) -> BackendResult<()> {
		let mut tables = self.tables.write();
		let schema = tables
			.get_mut(&table.to_ascii_lowercase())
			.ok_or_else(|| BackendError::Other(format!("no catalog entry for table \"{}\"", table)))?;
		if let Some(current) = schema.field_index(&field.name) {
			schema.fields.remove(current);
		}
		schema.insert_field(position, field.clone());
		Ok(())
	}

	async fn store_table(&self, table: &TableSchema) -> BackendResult<()> {
		self.register(table.clone());
		Ok(())
	}

	async fn store_extended_schema(&self, table: &TableSchema) -> BackendResult<()> {
		let data: ExtendedData = table
			.fields
			.iter()
			.filter(|f| !f.extended.is_empty() || f.default_width.is_some() || f.visible_decimal_places.is_some())
			.map(|f| {
				let mut props = f.extended.clone();
				if let Some(width) = f.default_width {
					props.insert("defaultwidth".to_string(), FieldValue::from(width));
				}
				if let Some(places) = f.visible_decimal_places {
					props.insert("visibledecimalplaces".to_string(), FieldValue::from(places));
				}
				(f.name.clone(), props)
			})
			.collect();
		self.extended.write().insert(table.name.to_ascii_lowercase(), data);
		Ok(())
	}
}
