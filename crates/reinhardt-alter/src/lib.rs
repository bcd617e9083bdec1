//! # Reinhardt Alter
//!
//! Table alteration planning for the Reinhardt database layer.
//!
//! ## Overview
//!
//! Given a table schema and an ordered list of requested edits (rename a field,
//! change a field property, remove, insert or move a field), this crate works
//! out the smallest equivalent set of edits and applies it using the cheapest
//! strategy that is correct:
//!
//! - **In place**: only catalog rows change (captions, defaults, lookup data,
//!   field order)
//! - **Rebuild**: the table is recreated under a temporary name, its rows are
//!   copied with a generated `INSERT ... SELECT`, and the new table replaces the
//!   original
//!
//! ## Quick Example
//!
//! ```rust
//! use reinhardt_alter::prelude::*;
//! use reinhardt_alter::backends::test_utils::MockBackend;
//!
//! # async fn example() {
//! let backend = MockBackend::new().with_table(
//!     TableSchema::new("people")
//!         .with_field(Field::new("id", FieldType::Integer).primary_key())
//!         .with_field(Field::new("name", FieldType::Text)),
//! );
//!
//! let actions = vec![
//!     Action::change_property(FieldUid(2), "name", "caption", "Full name"),
//!     Action::change_property(FieldUid(2), "name", "caption", "Name"),
//! ];
//!
//! let result = reinhardt_alter::alter::execute(&backend, &backend, "people", actions, ExecutionMode::Commit)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.actions_after, 1);
//! assert_eq!(result.strategy, Some(AlterStrategy::InPlace));
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example());
//! ```
//!
//! ## Feature Flags
//!
//! - `sqlite` (default): [`backends::SqliteBackend`] on top of sqlx

pub mod alter;
pub mod backends;
pub mod error;
pub mod schema;
pub mod settings;

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::alter::{
		Action, AlterStrategy, AlterTableHandler, AlterTableResult, AlteringRequirements,
		ExecutionMode, FieldUid,
	};
	pub use crate::backends::{Connection, SchemaCatalog, SqlGenerator};
	pub use crate::error::{AlterTableError, BackendError};
	pub use crate::schema::{Field, FieldType, FieldValue, IndexSchema, TableSchema};
	pub use crate::settings::AlterTableSettings;
}

pub use alter::{AlterTableHandler, ExecutionMode};
pub use error::{AlterTableError, BackendError, Result};
pub use settings::{AlterTableSettings, SettingsError};
