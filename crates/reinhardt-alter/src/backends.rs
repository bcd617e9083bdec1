//! # Collaborator contracts
//!
//! The alteration engine reaches storage only through the traits in this
//! module:
//!
//! - **[`SchemaCatalog`]**: reads table definitions and persists field, table
//!   and extended metadata
//! - **[`Connection`]**: physical DDL and statement execution
//! - **[`SqlGenerator`]**: identifier quoting, literal formatting and statement
//!   text
//!
//! ## Implementations
//!
//! | Type | Feature Flag | Purpose |
//! |------|--------------|---------|
//! | [`MemoryCatalog`] | - | Catalog kept in process memory |
//! | [`SeaQueryGenerator`] | - | SQL text for SQLite, PostgreSQL and MySQL |
//! | [`SqliteBackend`] | `sqlite` | sqlx-backed SQLite connection |
//! | [`test_utils::MockBackend`] | - | Recording backend with failure injection |

use async_trait::async_trait;

use crate::alter::{CopySource, DataCopyPlan};
use crate::error::BackendResult;
use crate::schema::{Field, FieldType, FieldValue, TableSchema};

pub mod catalog;
pub mod dialect;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod test_utils;

pub use catalog::MemoryCatalog;
pub use dialect::{SeaQueryGenerator, SqlDialect};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

/// Persisted table and field metadata
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
	/// Definition of `table`, `None` when the catalog does not know it
	async fn table_schema(&self, table: &str) -> BackendResult<Option<TableSchema>>;

	/// Write the catalog row of a single field at `position`
	async fn store_field(&self, table: &str, position: usize, field: &Field) -> BackendResult<()>;

	/// Replace the whole definition of a table
	async fn store_table(&self, table: &TableSchema) -> BackendResult<()>;

	/// Write the extended (lookup) data of every field of `table`
	async fn store_extended_schema(&self, table: &TableSchema) -> BackendResult<()>;
}

/// A database connection able to run DDL and statements
#[async_trait]
pub trait Connection: Send + Sync {
	fn is_read_only(&self) -> bool;

	fn is_database_used(&self) -> bool;

	fn sql_generator(&self) -> &dyn SqlGenerator;

	async fn table_exists(&self, name: &str) -> BackendResult<bool>;

	async fn create_table(&self, table: &TableSchema) -> BackendResult<()>;

	/// Execute a statement, returning the number of affected rows
	async fn execute(&self, sql: &str) -> BackendResult<u64>;

	/// Rename `from` to `to`; with `replace`, an existing `to` is dropped first
	async fn rename_table(&self, from: &str, to: &str, replace: bool) -> BackendResult<()>;

	async fn drop_table(&self, name: &str) -> BackendResult<()>;
}

/// Dialect-specific SQL text
pub trait SqlGenerator: Send + Sync {
	fn escape_identifier(&self, identifier: &str) -> String;

	/// Literal for `value` stored into a column of `field_type`
	fn value_to_sql(&self, field_type: FieldType, value: &FieldValue) -> String;

	fn create_table_sql(&self, table: &TableSchema) -> String;

	/// `CREATE INDEX` statements for the indexes of `table`
	fn create_index_sql(&self, table: &TableSchema) -> Vec<String>;

	fn insert_select_sql(&self, plan: &DataCopyPlan) -> String {
		let columns: Vec<String> = plan
			.columns
			.iter()
			.map(|c| self.escape_identifier(&c.destination))
			.collect();
		let sources: Vec<String> = plan
			.columns
			.iter()
			.map(|c| match &c.source {
				CopySource::Column(name) => self.escape_identifier(name),
				CopySource::DefaultValue(value)
				| CopySource::EmptyValue(value)
				| CopySource::NotEmptyValue(value) => self.value_to_sql(c.field_type, value),
			})
			.collect();
		format!(
			"INSERT INTO {} ({}) SELECT {} FROM {}",
			self.escape_identifier(&plan.destination),
			columns.join(", "),
			sources.join(", "),
			self.escape_identifier(&plan.source)
		)
	}
}
