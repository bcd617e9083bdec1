//! # Reinhardt Alter Table
//!
//! Facade over [`reinhardt_alter`], the table alteration planner of the
//! Reinhardt database layer.
//!
//! ## Feature Flags
//!
//! - `sqlite` (default): SQLite backend built on sqlx
//!
//! ## Quick Example
//!
//! ```rust
//! use reinhardt_alter_table::prelude::*;
//!
//! let requirements = reinhardt_alter_table::alter::classify("notNull").unwrap();
//! assert!(requirements.contains(AlteringRequirements::PHYSICAL));
//! ```

pub use reinhardt_alter::*;
