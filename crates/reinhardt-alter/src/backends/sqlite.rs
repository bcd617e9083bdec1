//! SQLite backend built on sqlx

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;

use super::{Connection, MemoryCatalog, SeaQueryGenerator, SqlDialect, SqlGenerator};
use crate::error::{BackendError, BackendResult};
use crate::schema::TableSchema;

/// SQLite connection paired with an in-memory catalog
///
/// The pool holds a single connection so that `sqlite::memory:` refers to one
/// database for the lifetime of the backend. Indexes of a created table are
/// only materialized once the table is renamed into place, because SQLite index
/// names are global to the database and the original table still owns them
/// while a rebuild is in progress.
///
/// # Example
///
/// ```rust,no_run
/// use reinhardt_alter::backends::SqliteBackend;
///
/// # async fn example() {
/// let backend = SqliteBackend::connect("sqlite::memory:").await.unwrap();
/// sqlx::query("CREATE TABLE t (a INTEGER)")
///     .execute(backend.pool())
///     .await
///     .unwrap();
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(example());
/// ```
pub struct SqliteBackend {
	pool: SqlitePool,
	generator: SeaQueryGenerator,
	catalog: MemoryCatalog,
	pending_indexes: Mutex<HashMap<String, TableSchema>>,
	read_only: bool,
}

impl SqliteBackend {
	pub async fn connect(url: &str) -> BackendResult<Self> {
		let pool = SqlitePoolOptions::new()
			.min_connections(1)
			.max_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect(url)
			.await?;
		Ok(Self::from_pool(pool))
	}

	pub fn from_pool(pool: SqlitePool) -> Self {
		Self {
			pool,
			generator: SeaQueryGenerator::new(SqlDialect::Sqlite),
			catalog: MemoryCatalog::new(),
			pending_indexes: Mutex::new(HashMap::new()),
			read_only: false,
		}
	}

	pub fn with_read_only(mut self, read_only: bool) -> Self {
		self.read_only = read_only;
		self
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub fn catalog(&self) -> &MemoryCatalog {
		&self.catalog
	}

	/// Create `table` physically and register it in the catalog
	pub async fn create_registered_table(&self, table: &TableSchema) -> BackendResult<()> {
		let mut statements = vec![self.generator.create_table_sql(table)];
		statements.extend(self.generator.create_index_sql(table));
		for sql in statements {
			self.run(&sql).await?;
		}
		self.catalog.register(table.clone());
		Ok(())
	}

	async fn run(&self, sql: &str) -> BackendResult<u64> {
		tracing::debug!(sql, "executing");
		let result = sqlx::query(sql)
			.execute(&self.pool)
			.await
			.map_err(|e| BackendError::query(sql, e.to_string()))?;
		Ok(result.rows_affected())
	}
}

#[async_trait]
impl Connection for SqliteBackend {
	fn is_read_only(&self) -> bool {
		self.read_only
	}

	fn is_database_used(&self) -> bool {
		!self.pool.is_closed()
	}

	fn sql_generator(&self) -> &dyn SqlGenerator {
		&self.generator
	}

	async fn table_exists(&self, name: &str) -> BackendResult<bool> {
		let count = sqlx::query_scalar::<_, i64>(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
		)
		.bind(name)
		.fetch_one(&self.pool)
		.await?;
		Ok(count > 0)
	}

	async fn create_table(&self, table: &TableSchema) -> BackendResult<()> {
		let sql = self.generator.create_table_sql(table);
		self.run(&sql).await?;
		if !table.effective_indexes().is_empty() {
			self.pending_indexes
				.lock()
				.insert(table.name.to_ascii_lowercase(), table.clone());
		}
		Ok(())
	}

	async fn execute(&self, sql: &str) -> BackendResult<u64> {
		self.run(sql).await
	}

	async fn rename_table(&self, from: &str, to: &str, replace: bool) -> BackendResult<()> {
		let pending = self.pending_indexes.lock().remove(&from.to_ascii_lowercase());
		let mut statements = Vec::new();
		if replace {
			statements.push(format!(
				"DROP TABLE IF EXISTS {}",
				self.generator.escape_identifier(to)
			));
		}
		statements.push(format!(
			"ALTER TABLE {} RENAME TO {}",
			self.generator.escape_identifier(from),
			self.generator.escape_identifier(to)
		));
		if let Some(mut renamed) = pending {
			renamed.name = to.to_string();
			statements.extend(self.generator.create_index_sql(&renamed));
		}

		let mut tx = self.pool.begin().await?;
		for sql in &statements {
			tracing::debug!(sql = sql.as_str(), "executing");
			sqlx::query(sql)
				.execute(&mut *tx)
				.await
				.map_err(|e| BackendError::query(sql.as_str(), e.to_string()))?;
		}
		tx.commit().await?;
		Ok(())
	}

	async fn drop_table(&self, name: &str) -> BackendResult<()> {
		self.pending_indexes.lock().remove(&name.to_ascii_lowercase());
		let sql = format!("DROP TABLE {}", self.generator.escape_identifier(name));
		self.run(&sql).await.map(|_| ())
	}
}
