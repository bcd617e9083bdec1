//! Error types for table alteration
//!
//! The planner never interprets server error codes. Failures reported by a
//! collaborator are wrapped in [`BackendError`] and carried as the `source` of
//! an [`AlterTableError`], so the failing SQL text and the server message reach
//! the caller untouched.

use thiserror::Error;

/// Failure reported by a connection or catalog collaborator
#[derive(Debug, Error)]
pub enum BackendError {
	/// A statement was rejected by the database engine
	#[error("{message} (SQL: {sql})")]
	Query { sql: String, message: String },

	#[cfg(feature = "sqlite")]
	#[error("SQL error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("{0}")]
	Other(String),
}

impl BackendError {
	/// Create a query error carrying the failing SQL text
	pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Query {
			sql: sql.into(),
			message: message.into(),
		}
	}

	/// SQL text of the failing statement, when known
	pub fn sql(&self) -> Option<&str> {
		match self {
			Self::Query { sql, .. } => Some(sql),
			_ => None,
		}
	}
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors surfaced by [`AlterTableHandler::execute`](crate::alter::AlterTableHandler::execute)
#[derive(Debug, Error)]
pub enum AlterTableError {
	#[error("Unknown field property: {0}")]
	UnknownProperty(String),

	#[error("Invalid value {value} for field property \"{property}\": {reason}")]
	InvalidPropertyValue {
		property: String,
		value: String,
		reason: String,
	},

	#[error("Table not found: {0}")]
	TableNotFound(String),

	#[error("Field \"{field}\" not found in table \"{table}\"")]
	FieldNotFound { table: String, field: String },

	#[error("Duplicate field name \"{field}\" in table \"{table}\"")]
	DuplicateFieldName { table: String, field: String },

	#[error("Connection is read-only")]
	ReadOnlyConnection,

	#[error("No database is in use")]
	NoActiveDatabase,

	#[error("Could not find a free temporary name for table \"{table}\" after {attempts} attempts")]
	NameCollision { table: String, attempts: u32 },

	#[error("Could not create table \"{table}\"")]
	PhysicalCreateFailed {
		table: String,
		#[source]
		source: BackendError,
	},

	#[error("Could not copy data into table \"{table}\"")]
	DataCopyFailed {
		table: String,
		sql: String,
		#[source]
		source: BackendError,
	},

	#[error("Could not write catalog data for table \"{table}\"")]
	CatalogWriteFailed {
		table: String,
		#[source]
		source: BackendError,
	},

	#[error("Could not replace table \"{to}\" with \"{from}\"")]
	SwapFailed {
		from: String,
		to: String,
		#[source]
		source: BackendError,
	},

	#[error("Backend error: {0}")]
	Backend(#[from] BackendError),
}

impl AlterTableError {
	pub(crate) fn invalid_value(
		property: impl Into<String>,
		value: impl std::fmt::Display,
		reason: impl Into<String>,
	) -> Self {
		Self::InvalidPropertyValue {
			property: property.into(),
			value: value.to_string(),
			reason: reason.into(),
		}
	}

	/// Whether the error happened after the physical rebuild started
	pub fn is_rebuild_failure(&self) -> bool {
		matches!(
			self,
			Self::PhysicalCreateFailed { .. }
				| Self::DataCopyFailed { .. }
				| Self::SwapFailed { .. }
		)
	}
}

pub type Result<T> = std::result::Result<T, AlterTableError>;
