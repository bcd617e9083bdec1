//! Test utilities for alteration testing
//!
//! This module provides a recording backend for exercising the alteration
//! engine without a database connection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Connection, MemoryCatalog, SchemaCatalog, SeaQueryGenerator, SqlDialect, SqlGenerator};
use crate::error::{BackendError, BackendResult};
use crate::schema::{Field, TableSchema};

/// Operation of [`MockBackend`] that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
	CreateTable,
	Execute,
	RenameTable,
	DropTable,
	StoreField,
	StoreTable,
}

/// Mock connection and catalog for testing
///
/// Physical tables are tracked by name only. Every write is counted and every
/// statement is recorded, whether it succeeds or fails.
///
/// # Examples
///
/// ```rust
/// use reinhardt_alter::backends::test_utils::{FailPoint, MockBackend};
/// use reinhardt_alter::schema::{Field, FieldType, TableSchema};
///
/// let backend = MockBackend::new()
///     .with_table(TableSchema::new("t").with_field(Field::new("a", FieldType::Integer)))
///     .fail_at(FailPoint::Execute);
///
/// assert!(backend.has_table("t"));
/// assert_eq!(backend.write_count(), 0);
/// ```
pub struct MockBackend {
	generator: SeaQueryGenerator,
	catalog: MemoryCatalog,
	tables: Mutex<HashSet<String>>,
	statements: Mutex<Vec<String>>,
	writes: AtomicUsize,
	fail_points: HashSet<FailPoint>,
	occupied_prefix: Option<String>,
	read_only: bool,
	database_used: bool,
}

impl MockBackend {
	pub fn new() -> Self {
		Self {
			generator: SeaQueryGenerator::new(SqlDialect::Sqlite),
			catalog: MemoryCatalog::new(),
			tables: Mutex::new(HashSet::new()),
			statements: Mutex::new(Vec::new()),
			writes: AtomicUsize::new(0),
			fail_points: HashSet::new(),
			occupied_prefix: None,
			read_only: false,
			database_used: true,
		}
	}

	/// Register `table` both physically and in the catalog
	pub fn with_table(self, table: TableSchema) -> Self {
		self.tables.lock().insert(table.name.to_ascii_lowercase());
		self.catalog.register(table);
		self
	}

	pub fn fail_at(mut self, point: FailPoint) -> Self {
		self.fail_points.insert(point);
		self
	}

	/// Report every table name starting with `prefix` as existing
	pub fn with_occupied_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.occupied_prefix = Some(prefix.into().to_ascii_lowercase());
		self
	}

	pub fn with_read_only(mut self, read_only: bool) -> Self {
		self.read_only = read_only;
		self
	}

	pub fn without_database(mut self) -> Self {
		self.database_used = false;
		self
	}

	pub fn catalog(&self) -> &MemoryCatalog {
		&self.catalog
	}

	pub fn has_table(&self, name: &str) -> bool {
		self.tables.lock().contains(&name.to_ascii_lowercase())
	}

	pub fn tables(&self) -> Vec<String> {
		let mut tables: Vec<String> = self.tables.lock().iter().cloned().collect();
		tables.sort();
		tables
	}

	pub fn statements(&self) -> Vec<String> {
		self.statements.lock().clone()
	}

	/// Number of storage writes attempted so far
	pub fn write_count(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}

	fn record(&self, point: FailPoint, statement: String) -> BackendResult<()> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		self.statements.lock().push(statement.clone());
		if self.fail_points.contains(&point) {
			return Err(BackendError::query(statement, format!("injected {:?} failure", point)));
		}
		Ok(())
	}
}

impl Default for MockBackend {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Connection for MockBackend {
	fn is_read_only(&self) -> bool {
		self.read_only
	}

	fn is_database_used(&self) -> bool {
		self.database_used
	}

	fn sql_generator(&self) -> &dyn SqlGenerator {
		&self.generator
	}

	async fn table_exists(&self, name: &str) -> BackendResult<bool> {
		let name = name.to_ascii_lowercase();
		let occupied = self
			.occupied_prefix
			.as_deref()
			.is_some_and(|prefix| name.starts_with(prefix));
		Ok(occupied || self.tables.lock().contains(&name))
	}

	async fn create_table(&self, table: &TableSchema) -> BackendResult<()> {
		self.record(FailPoint::CreateTable, self.generator.create_table_sql(table))?;
		self.tables.lock().insert(table.name.to_ascii_lowercase());
		Ok(())
	}

	async fn execute(&self, sql: &str) -> BackendResult<u64> {
		self.record(FailPoint::Execute, sql.to_string())?;
		Ok(0)
	}

	async fn rename_table(&self, from: &str, to: &str, replace: bool) -> BackendResult<()> {
		self.record(
			FailPoint::RenameTable,
			format!("RENAME TABLE {} TO {}", from, to),
		)?;
		let mut tables = self.tables.lock();
		let to_key = to.to_ascii_lowercase();
		if tables.contains(&to_key) && !replace {
			return Err(BackendError::Other(format!("table \"{}\" already exists", to)));
		}
		if !tables.remove(&from.to_ascii_lowercase()) {
			return Err(BackendError::Other(format!("no such table: {}", from)));
		}
		tables.insert(to_key);
		Ok(())
	}

	async fn drop_table(&self, name: &str) -> BackendResult<()> {
		self.record(FailPoint::DropTable, format!("DROP TABLE {}", name))?;
		self.tables.lock().remove(&name.to_ascii_lowercase());
		Ok(())
	}
}

#[async_trait]
impl SchemaCatalog for MockBackend {
	async fn table_schema(&self, table: &str) -> BackendResult<Option<TableSchema>> {
		self.catalog.table_schema(table).await
	}

	async fn store_field(&self, table: &str, position: usize, field: &Field) -> BackendResult<()> {
		self.record(
			FailPoint::StoreField,
			format!("STORE FIELD {}.{} AT {}", table, field.name, position),
		)?;
		self.catalog.store_field(table, position, field).await
	}

	async fn store_table(&self, table: &TableSchema) -> BackendResult<()> {
		self.record(FailPoint::StoreTable, format!("STORE TABLE {}", table.name))?;
		self.catalog.store_table(table).await
	}

	async fn store_extended_schema(&self, table: &TableSchema) -> BackendResult<()> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		self.statements
			.lock()
			.push(format!("STORE EXTENDED {}", table.name));
		self.catalog.store_extended_schema(table).await
	}
}
