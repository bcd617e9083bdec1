//! Planning and execution of table alterations
//!
//! Callers describe edits as [`Action`]s keyed by a stable [`FieldUid`]. The
//! list is reduced by [`simplify`], classified through [`classify`], and applied
//! by [`AlterTableHandler`] either in place or through a full table rebuild.

pub mod action;
pub mod copy;
pub mod handler;
pub mod requirements;
pub mod simplify;

pub use action::{Action, FieldUid, PlannedAction};
pub use copy::{CopyColumn, CopySource, DataCopyPlan};
pub use handler::{
	AlterStage, AlterStrategy, AlterTableHandler, AlterTableResult, ExecutionMode, execute,
};
pub use requirements::{AlteringRequirements, aggregate, classify};
pub use simplify::{FieldActions, SimplifiedActions, simplify};
