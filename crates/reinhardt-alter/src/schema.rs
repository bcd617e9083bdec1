//! Table and field model
//!
//! [`TableSchema`] is the caller-owned description of a table. The alteration
//! engine clones it, mutates the clone through [`set_field_property`] and the
//! structural helpers on [`TableSchema`], and only hands the clone back once the
//! whole alteration has succeeded.

mod field;
mod property;
mod table;
mod value;

pub use field::{Field, FieldConstraints, FieldType};
pub use property::{EXTENDED_PROPERTIES, is_extended_property, set_field_property};
pub use table::{IndexSchema, TableSchema};
pub use value::{FieldValue, empty_value_for_type, not_empty_value_for_type};
