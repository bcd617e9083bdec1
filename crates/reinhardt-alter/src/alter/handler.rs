//! Execution of table alterations
//!
//! [`AlterTableHandler`] collects actions for one table and executes them:
//!
//! 1. preconditions: writable connection, database in use, table known
//! 2. simplification of the action list and aggregation of requirements
//! 3. mutation of a private clone of the table schema
//! 4. either an in-place catalog update, or a physical rebuild: the new
//!    definition is created under a temporary name, data is copied with a
//!    single `INSERT ... SELECT`, and the temporary table replaces the original
//!
//! The original table is not touched before the final swap. A failure during
//! the rebuild drops the temporary table and leaves the original as it was.

use std::collections::HashSet;

use super::action::{Action, FieldUid, PlannedAction};
use super::copy::DataCopyPlan;
use super::requirements::{AlteringRequirements, aggregate};
use super::simplify::simplify;
use crate::backends::{Connection, SchemaCatalog};
use crate::error::{AlterTableError, Result};
use crate::schema::{TableSchema, set_field_property};
use crate::settings::AlterTableSettings;

/// What [`AlterTableHandler::execute`] is allowed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
	/// Apply the alteration
	#[default]
	Commit,
	/// Plan the alteration and report it without touching storage
	Simulate,
	/// Only estimate the requirements of the submitted actions
	RequirementsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterStrategy {
	/// Catalog rows are rewritten, no DDL
	InPlace,
	/// The table is recreated and its data copied
	Rebuild,
}

impl AlterStrategy {
	pub fn for_requirements(requirements: AlteringRequirements) -> Option<Self> {
		if requirements.is_empty() {
			None
		} else if requirements.contains(AlteringRequirements::PHYSICAL) {
			Some(AlterStrategy::Rebuild)
		} else {
			Some(AlterStrategy::InPlace)
		}
	}
}

/// Progress of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterStage {
	Planning,
	RequirementsComputed,
	SchemaMutated,
	TableCreated,
	DataCopied,
	Swapped,
	Committed,
	Failed,
}

fn enter_stage(table: &str, stage: AlterStage) {
	tracing::debug!(table, stage = ?stage, "alter table stage");
}

/// Outcome of [`AlterTableHandler::execute`]
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableResult {
	pub requirements: AlteringRequirements,
	/// `None` when nothing has to be done or only requirements were computed
	pub strategy: Option<AlterStrategy>,
	/// The resulting schema; `None` for [`ExecutionMode::RequirementsOnly`]
	pub table: Option<TableSchema>,
	/// Planned actions in execution order, e.g. `1: Remove table field "a"`
	pub trace: Vec<String>,
	pub actions_before: usize,
	pub actions_after: usize,
}

/// Collects actions for a table and executes them
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::alter::{Action, AlterStrategy, AlterTableHandler, ExecutionMode, FieldUid};
/// use reinhardt_alter::backends::test_utils::MockBackend;
/// use reinhardt_alter::schema::{Field, FieldType, TableSchema};
///
/// # async fn example() {
/// let backend = MockBackend::new().with_table(
///     TableSchema::new("t")
///         .with_field(Field::new("a", FieldType::Integer))
///         .with_field(Field::new("b", FieldType::Text).not_null()),
/// );
///
/// let handler = AlterTableHandler::new(&backend, &backend)
///     .with_action(Action::rename(FieldUid(1), "a", "c"));
/// let result = handler.execute("t", ExecutionMode::Commit).await.unwrap();
///
/// assert_eq!(result.strategy, Some(AlterStrategy::Rebuild));
/// assert_eq!(result.table.unwrap().fields[0].name, "c");
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(example());
/// ```
pub struct AlterTableHandler<'a> {
	connection: &'a dyn Connection,
	catalog: &'a dyn SchemaCatalog,
	settings: AlterTableSettings,
	actions: Vec<Action>,
}

impl<'a> AlterTableHandler<'a> {
	pub fn new(connection: &'a dyn Connection, catalog: &'a dyn SchemaCatalog) -> Self {
		Self {
			connection,
			catalog,
			settings: AlterTableSettings::default(),
			actions: Vec::new(),
		}
	}

	pub fn with_settings(mut self, settings: AlterTableSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn settings(&self) -> &AlterTableSettings {
		&self.settings
	}

	pub fn add_action(&mut self, action: Action) {
		self.actions.push(action);
	}

	pub fn with_action(mut self, action: Action) -> Self {
		self.add_action(action);
		self
	}

	pub fn actions(&self) -> &[Action] {
		&self.actions
	}

	pub fn remove_action(&mut self, index: usize) -> Option<Action> {
		(index < self.actions.len()).then(|| self.actions.remove(index))
	}

	pub fn clear(&mut self) {
		self.actions.clear();
	}

	pub fn set_actions(&mut self, actions: Vec<Action>) {
		self.actions = actions;
	}

	/// Log the submitted action list
	pub fn debug(&self) {
		tracing::debug!(count = self.actions.len(), "alter table actions");
		for (i, action) in self.actions.iter().enumerate() {
			tracing::debug!("{}: {}", i + 1, action);
		}
	}

	/// Execute the collected actions against `table_name`
	pub async fn execute(&self, table_name: &str, mode: ExecutionMode) -> Result<AlterTableResult> {
		let result = self.run(table_name, mode).await;
		if let Err(err) = &result {
			enter_stage(table_name, AlterStage::Failed);
			tracing::debug!(table = table_name, error = %err, "alter table failed");
		}
		result
	}

	async fn run(&self, table_name: &str, mode: ExecutionMode) -> Result<AlterTableResult> {
		enter_stage(table_name, AlterStage::Planning);
		if self.connection.is_read_only() {
			return Err(AlterTableError::ReadOnlyConnection);
		}
		if !self.connection.is_database_used() {
			return Err(AlterTableError::NoActiveDatabase);
		}
		let table = self
			.catalog
			.table_schema(table_name)
			.await?
			.ok_or_else(|| AlterTableError::TableNotFound(table_name.to_string()))?;

		self.debug();
		let planned = PlannedAction::plan_all(self.actions.iter().cloned())?;
		let actions_before = planned.len();

		if mode == ExecutionMode::RequirementsOnly {
			let requirements = aggregate(planned.iter().map(|p| p.requirements));
			enter_stage(table_name, AlterStage::RequirementsComputed);
			tracing::debug!(table = table_name, %requirements, "requirements estimated");
			return Ok(AlterTableResult {
				requirements,
				strategy: None,
				table: None,
				trace: Vec::new(),
				actions_before,
				actions_after: actions_before,
			});
		}

		let simplified = simplify(planned)?;
		let requirements = simplified.requirements();
		let ordered = simplified.into_ordered();
		let strategy = AlterStrategy::for_requirements(requirements);
		enter_stage(table_name, AlterStage::RequirementsComputed);
		tracing::debug!(
			table = table_name,
			%requirements,
			before = actions_before,
			after = ordered.len(),
			"requirements computed"
		);

		let mut result = AlterTableResult {
			requirements,
			strategy,
			table: None,
			trace: ordered.iter().map(|p| p.to_string()).collect(),
			actions_before,
			actions_after: ordered.len(),
		};

		let Some(strategy) = strategy.filter(|_| mode == ExecutionMode::Commit) else {
			result.table = Some(table);
			return Ok(result);
		};

		let mut mutation = SchemaMutation::new(&table);
		for planned in &ordered {
			mutation.apply(planned)?;
		}
		mutation.finish()?;
		enter_stage(table_name, AlterStage::SchemaMutated);

		let altered = match strategy {
			AlterStrategy::Rebuild => self.rebuild(&table.name, mutation).await?,
			AlterStrategy::InPlace => self.update_in_place(mutation, requirements).await?,
		};
		enter_stage(table_name, AlterStage::Committed);
		result.table = Some(altered);
		Ok(result)
	}

	async fn update_in_place(
		&self,
		mutation: SchemaMutation,
		requirements: AlteringRequirements,
	) -> Result<TableSchema> {
		let table = &mutation.table;
		let mut stored = 0;
		for (position, (field, slot)) in table.fields.iter().zip(&mutation.slots).enumerate() {
			let changed = slot.uid.is_some_and(|uid| mutation.main_changed.contains(&uid));
			let moved = mutation.moved && slot.original_position != Some(position);
			if changed || moved {
				self.catalog
					.store_field(&table.name, position, field)
					.await
					.map_err(|source| AlterTableError::CatalogWriteFailed {
						table: table.name.clone(),
						source,
					})?;
				stored += 1;
			}
		}
		if requirements.intersects(AlteringRequirements::EXTENDED_SCHEMA) {
			self.store_extended(table).await?;
		}
		tracing::info!(table = table.name.as_str(), fields = stored, "table altered in place");
		Ok(mutation.table)
	}

	async fn rebuild(&self, table_name: &str, mutation: SchemaMutation) -> Result<TableSchema> {
		let temp_name = self.temporary_name(table_name).await?;
		let mut temp = mutation.table.clone();
		temp.name = temp_name.clone();

		self.connection
			.create_table(&temp)
			.await
			.map_err(|source| AlterTableError::PhysicalCreateFailed {
				table: temp_name.clone(),
				source,
			})?;
		enter_stage(table_name, AlterStage::TableCreated);

		if let Err(err) = self.copy_and_swap(table_name, &temp_name, &mutation).await {
			self.drop_temporary(&temp_name).await;
			return Err(err);
		}

		let mut altered = mutation.table;
		altered.name = table_name.to_string();
		self.catalog
			.store_table(&altered)
			.await
			.map_err(|source| AlterTableError::CatalogWriteFailed {
				table: table_name.to_string(),
				source,
			})?;
		self.store_extended(&altered).await?;
		tracing::info!(table = table_name, temporary = temp_name.as_str(), "table rebuilt");
		Ok(altered)
	}

	async fn copy_and_swap(&self, table_name: &str, temp_name: &str, mutation: &SchemaMutation) -> Result<()> {
		let plan = mutation.copy_plan(table_name, temp_name);
		if plan.is_empty() {
			tracing::warn!(table = table_name, "no columns to copy; rebuilt table starts empty");
		} else {
			let sql = self.connection.sql_generator().insert_select_sql(&plan);
			tracing::debug!(sql = sql.as_str(), "copying table data");
			self.connection
				.execute(&sql)
				.await
				.map_err(|source| AlterTableError::DataCopyFailed {
					table: temp_name.to_string(),
					sql: sql.clone(),
					source,
				})?;
		}
		enter_stage(table_name, AlterStage::DataCopied);

		self.connection
			.rename_table(temp_name, table_name, true)
			.await
			.map_err(|source| AlterTableError::SwapFailed {
				from: temp_name.to_string(),
				to: table_name.to_string(),
				source,
			})?;
		enter_stage(table_name, AlterStage::Swapped);
		Ok(())
	}

	async fn store_extended(&self, table: &TableSchema) -> Result<()> {
		if !self.settings.store_extended_schema {
			return Ok(());
		}
		self.catalog
			.store_extended_schema(table)
			.await
			.map_err(|source| AlterTableError::CatalogWriteFailed {
				table: table.name.clone(),
				source,
			})
	}

	async fn drop_temporary(&self, temp_name: &str) {
		if let Err(err) = self.connection.drop_table(temp_name).await {
			tracing::warn!(table = temp_name, error = %err, "could not drop temporary table");
		}
	}

	/// Pick a table name known neither to the database nor to the catalog
	async fn temporary_name(&self, table_name: &str) -> Result<String> {
		let attempts = self.settings.max_temp_name_attempts;
		for _ in 0..attempts {
			let candidate = format!(
				"{}{}{:x}",
				table_name,
				self.settings.temp_name_infix,
				rand::random::<u32>()
			);
			if !self.connection.table_exists(&candidate).await?
				&& self.catalog.table_schema(&candidate).await?.is_none()
			{
				return Ok(candidate);
			}
			tracing::debug!(candidate = candidate.as_str(), "temporary table name taken");
		}
		Err(AlterTableError::NameCollision {
			table: table_name.to_string(),
			attempts,
		})
	}
}

/// Execute `actions` against `table_name` with default settings
pub async fn execute(
	connection: &dyn Connection,
	catalog: &dyn SchemaCatalog,
	table_name: &str,
	actions: Vec<Action>,
	mode: ExecutionMode,
) -> Result<AlterTableResult> {
	let mut handler = AlterTableHandler::new(connection, catalog);
	handler.set_actions(actions);
	handler.execute(table_name, mode).await
}

/// Identity of a field position in the altered schema
#[derive(Debug, Clone, PartialEq)]
struct FieldSlot {
	uid: Option<FieldUid>,
	/// Column of the original table the data comes from
	source: Option<String>,
	original_position: Option<usize>,
}

/// Clone of a table schema being altered
///
/// Fields are tracked by UID rather than by name. A UID binds to the first
/// still unbound original field carrying the action's field name; an insert
/// binds the new field directly. `slots` stays parallel to `table.fields`.
#[derive(Debug, Clone)]
struct SchemaMutation {
	table: TableSchema,
	slots: Vec<FieldSlot>,
	main_changed: HashSet<FieldUid>,
	moved: bool,
}

impl SchemaMutation {
	fn new(table: &TableSchema) -> Self {
		let slots = table
			.fields
			.iter()
			.enumerate()
			.map(|(position, field)| FieldSlot {
				uid: None,
				source: Some(field.name.clone()),
				original_position: Some(position),
			})
			.collect();
		Self {
			table: table.clone(),
			slots,
			main_changed: HashSet::new(),
			moved: false,
		}
	}

	fn resolve(&mut self, uid: FieldUid, field_name: &str) -> Result<usize> {
		if let Some(index) = self.slots.iter().position(|s| s.uid == Some(uid)) {
			return Ok(index);
		}
		let index = self
			.table
			.fields
			.iter()
			.zip(&self.slots)
			.position(|(field, slot)| slot.uid.is_none() && field.name.eq_ignore_ascii_case(field_name))
			.ok_or_else(|| AlterTableError::FieldNotFound {
				table: self.table.name.clone(),
				field: field_name.to_string(),
			})?;
		self.slots[index].uid = Some(uid);
		Ok(index)
	}

	fn apply(&mut self, planned: &PlannedAction) -> Result<()> {
		match &planned.action {
			Action::ChangeFieldProperty {
				uid,
				field_name,
				property,
				value,
			} => {
				let index = self.resolve(*uid, field_name)?;
				if planned.action.is_rename() {
					let new_name = planned
						.action
						.new_name()
						.filter(|name| !name.is_empty())
						.ok_or_else(|| AlterTableError::invalid_value(property.as_str(), value, "expected a non-empty name"))?;
					self.table.fields[index].name = new_name.to_string();
				} else {
					set_field_property(&mut self.table.fields[index], property, value)?;
				}
				if planned.requirements.contains(AlteringRequirements::MAIN_SCHEMA) {
					self.main_changed.insert(*uid);
				}
			}
			Action::RemoveField { uid, field_name } => {
				let index = self.resolve(*uid, field_name)?;
				self.table.fields.remove(index);
				self.slots.remove(index);
			}
			Action::InsertField { uid, index, field } => {
				let at = self.table.insert_field(*index, field.clone());
				self.slots.insert(
					at,
					FieldSlot {
						uid: Some(*uid),
						source: None,
						original_position: None,
					},
				);
			}
			Action::MoveFieldPosition {
				uid,
				field_name,
				index,
			} => {
				let from = self.resolve(*uid, field_name)?;
				let to = self.table.move_field(from, *index);
				let slot = self.slots.remove(from);
				self.slots.insert(to, slot);
				self.main_changed.insert(*uid);
				self.moved = true;
			}
		}
		Ok(())
	}

	/// Carry index columns over to the final field names and check the result
	///
	/// Index columns still hold original column names while actions are
	/// applied; the slots map each original column to its final field.
	fn finish(&mut self) -> Result<()> {
		let SchemaMutation { table, slots, .. } = self;
		for idx in &mut table.indexes {
			idx.columns = idx
				.columns
				.iter()
				.filter_map(|column| {
					slots
						.iter()
						.position(|slot| slot.source.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(column)))
						.map(|position| table.fields[position].name.clone())
				})
				.collect();
		}
		table.indexes.retain(|idx| !idx.columns.is_empty());

		match self.table.duplicate_field_name() {
			Some(field) => Err(AlterTableError::DuplicateFieldName {
				table: self.table.name.clone(),
				field: field.to_string(),
			}),
			None => Ok(()),
		}
	}

	fn copy_plan(&self, source: &str, destination: &str) -> DataCopyPlan {
		DataCopyPlan::build(
			source,
			destination,
			self.table
				.fields
				.iter()
				.zip(&self.slots)
				.map(|(field, slot)| (field, slot.source.as_deref())),
		)
	}
}
