//! Alter Table Handler Integration Tests
//!
//! Exercises the execution engine against the recording mock backend:
//! - Normal cases: in-place catalog updates, physical rebuilds, simulate mode
//! - Edge cases: no-op action lists, requirement estimates
//! - Error cases: preconditions, unknown fields and properties
//! - Failure injection: every rebuild step leaves the original table intact

use reinhardt_alter::alter::{
	Action, AlterStrategy, AlterTableHandler, AlteringRequirements, ExecutionMode, FieldUid, execute,
};
use reinhardt_alter::backends::test_utils::{FailPoint, MockBackend};
use reinhardt_alter::schema::{Field, FieldType, FieldValue, IndexSchema, TableSchema};
use reinhardt_alter::{AlterTableError, AlterTableSettings};
use rstest::*;

const A: FieldUid = FieldUid(1);
const B: FieldUid = FieldUid(2);
const D: FieldUid = FieldUid(4);

// ============================================================================
// Fixtures
// ============================================================================

/// `t(a INT, b TEXT NOT NULL)`
#[fixture]
fn table() -> TableSchema {
	TableSchema::new("t")
		.with_field(Field::new("a", FieldType::Integer))
		.with_field(Field::new("b", FieldType::Text).not_null())
}

#[fixture]
fn backend(table: TableSchema) -> MockBackend {
	MockBackend::new().with_table(table)
}

fn temp_tables(backend: &MockBackend) -> Vec<String> {
	backend
		.tables()
		.into_iter()
		.filter(|name| name.starts_with("t_temp"))
		.collect()
}

async fn run(backend: &MockBackend, actions: Vec<Action>) -> reinhardt_alter::Result<reinhardt_alter::alter::AlterTableResult> {
	execute(backend, backend, "t", actions, ExecutionMode::Commit).await
}

// ============================================================================
// Preconditions
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_read_only_connection_is_checked_first() {
	let backend = MockBackend::new().with_read_only(true).without_database();
	let err = run(&backend, vec![Action::remove(A, "a")]).await.unwrap_err();
	assert!(matches!(err, AlterTableError::ReadOnlyConnection));
}

#[rstest]
#[tokio::test]
async fn test_no_active_database() {
	let backend = MockBackend::new().without_database();
	let err = run(&backend, vec![Action::remove(A, "a")]).await.unwrap_err();
	assert!(matches!(err, AlterTableError::NoActiveDatabase));
}

#[rstest]
#[tokio::test]
async fn test_table_not_found() {
	let backend = MockBackend::new();
	let err = run(&backend, vec![Action::remove(A, "a")]).await.unwrap_err();
	assert!(matches!(err, AlterTableError::TableNotFound(ref name) if name == "t"));
	assert_eq!(backend.write_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_unknown_property_fails_before_any_write(backend: MockBackend) {
	let err = run(&backend, vec![Action::change_property(A, "a", "colour", "red")])
		.await
		.unwrap_err();
	assert!(matches!(err, AlterTableError::UnknownProperty(_)));
	assert_eq!(backend.write_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_unknown_field(backend: MockBackend) {
	let err = run(&backend, vec![Action::change_property(A, "zz", "caption", "x")])
		.await
		.unwrap_err();
	assert!(matches!(err, AlterTableError::FieldNotFound { ref field, .. } if field == "zz"));
	assert_eq!(backend.write_count(), 0);
}

// ============================================================================
// No-op, simulate and requirement estimates
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_noop_rename_performs_no_writes(backend: MockBackend, table: TableSchema) {
	let result = run(&backend, vec![Action::rename(A, "a", "b_tmp"), Action::rename(A, "b_tmp", "a")])
		.await
		.unwrap();

	assert!(result.requirements.is_empty());
	assert_eq!(result.strategy, None);
	assert_eq!(result.actions_before, 2);
	assert_eq!(result.actions_after, 0);
	assert_eq!(result.table, Some(table));
	assert_eq!(backend.write_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_simulate_reports_trace_without_writing(backend: MockBackend, table: TableSchema) {
	let result = execute(
		&backend,
		&backend,
		"t",
		vec![
			Action::change_property(A, "a", "caption", "first"),
			Action::rename(A, "a", "c"),
			Action::change_property(A, "c", "caption", "A"),
			Action::remove(B, "b"),
		],
		ExecutionMode::Simulate,
	)
	.await
	.unwrap();

	assert_eq!(result.strategy, Some(AlterStrategy::Rebuild));
	assert_eq!(
		result.trace,
		vec![
			"2: Rename table field \"a\" to \"c\"",
			"3: Set \"caption\" property for table field \"a\" to \"A\"",
			"4: Remove table field \"b\"",
		]
	);
	assert_eq!(result.table, Some(table));
	assert_eq!(backend.write_count(), 0);
	assert!(backend.statements().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_requirements_only_is_conservative(backend: MockBackend) {
	let result = execute(
		&backend,
		&backend,
		"t",
		vec![Action::rename(A, "a", "x"), Action::rename(A, "x", "a")],
		ExecutionMode::RequirementsOnly,
	)
	.await
	.unwrap();

	assert_eq!(
		result.requirements,
		AlteringRequirements::PHYSICAL | AlteringRequirements::MAIN_SCHEMA
	);
	assert_eq!(result.table, None);
	assert_eq!(result.strategy, None);
	assert_eq!(backend.write_count(), 0);
}

// ============================================================================
// In-place updates
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_caption_change_updates_catalog_row_only(backend: MockBackend) {
	let result = run(&backend, vec![Action::change_property(B, "b", "caption", "Bee")])
		.await
		.unwrap();

	assert_eq!(result.strategy, Some(AlterStrategy::InPlace));
	assert_eq!(backend.statements(), vec!["STORE FIELD t.b AT 1"]);
	let stored = backend.catalog().get("t").unwrap();
	assert_eq!(stored.fields[1].caption.as_deref(), Some("Bee"));
	assert!(temp_tables(&backend).is_empty());
}

#[rstest]
#[tokio::test]
async fn test_extended_property_stores_extended_data(backend: MockBackend) {
	let result = run(&backend, vec![Action::change_property(B, "b", "rowSource", "cities")])
		.await
		.unwrap();

	assert_eq!(result.requirements, AlteringRequirements::EXTENDED_SCHEMA);
	assert_eq!(backend.statements(), vec!["STORE EXTENDED t"]);
	let extended = backend.catalog().extended_schema("t").unwrap();
	assert_eq!(extended["b"]["rowsource"], FieldValue::from("cities"));
}

#[rstest]
#[tokio::test]
async fn test_extended_data_respects_settings(backend: MockBackend) {
	let handler = AlterTableHandler::new(&backend, &backend)
		.with_settings(AlterTableSettings::default().with_store_extended_schema(false))
		.with_action(Action::change_property(B, "b", "defaultWidth", 120));
	handler.execute("t", ExecutionMode::Commit).await.unwrap();
	assert_eq!(backend.write_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_move_rewrites_shifted_fields() {
	let backend = MockBackend::new().with_table(
		TableSchema::new("t")
			.with_field(Field::new("a", FieldType::Integer))
			.with_field(Field::new("b", FieldType::Text))
			.with_field(Field::new("c", FieldType::Text)),
	);
	let result = run(&backend, vec![Action::move_to(FieldUid(3), "c", 0)])
		.await
		.unwrap();

	assert_eq!(result.strategy, Some(AlterStrategy::InPlace));
	let stored = backend.catalog().get("t").unwrap();
	let names: Vec<_> = stored.fields.iter().map(|f| f.name.as_str()).collect();
	assert_eq!(names, vec!["c", "a", "b"]);
	assert_eq!(backend.write_count(), 3);
}

#[rstest]
#[tokio::test]
async fn test_catalog_failure_in_place() {
	let backend = MockBackend::new().with_table(table()).fail_at(FailPoint::StoreField);
	let err = run(&backend, vec![Action::change_property(A, "a", "caption", "x")])
		.await
		.unwrap_err();
	assert!(matches!(err, AlterTableError::CatalogWriteFailed { .. }));
}

// ============================================================================
// Rebuilds
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_rename_rebuild_copies_renamed_column(backend: MockBackend) {
	let result = run(&backend, vec![Action::rename(A, "a", "c")]).await.unwrap();

	assert_eq!(result.strategy, Some(AlterStrategy::Rebuild));
	let statements = backend.statements();
	assert!(statements[0].starts_with("CREATE TABLE \"t_temp"), "{:?}", statements);
	let temp = statements[0]
		.trim_start_matches("CREATE TABLE \"")
		.split('"')
		.next()
		.unwrap()
		.to_string();
	assert_eq!(
		statements[1],
		format!("INSERT INTO \"{}\" (\"c\", \"b\") SELECT \"a\", \"b\" FROM \"t\"", temp)
	);
	assert_eq!(statements[2], format!("RENAME TABLE {} TO t", temp));
	assert_eq!(statements[3], "STORE TABLE t");

	assert_eq!(backend.tables(), vec!["t"]);
	let stored = backend.catalog().get("t").unwrap();
	assert_eq!(stored.fields[0].name, "c");
	assert!(backend.catalog().get(&temp).is_none());
}

#[rstest]
#[tokio::test]
async fn test_name_swap_keeps_index_on_its_column() {
	let backend = MockBackend::new().with_table(
		table().with_index(IndexSchema::new("t_a", vec!["a".into()], true)),
	);
	let result = run(
		&backend,
		vec![Action::rename(A, "a", "b"), Action::rename(B, "b", "a")],
	)
	.await
	.unwrap();

	let table = result.table.unwrap();
	let fields: Vec<_> = table.fields.iter().map(|f| (f.name.as_str(), f.field_type)).collect();
	assert_eq!(fields, vec![("b", FieldType::Integer), ("a", FieldType::Text)]);
	assert_eq!(table.indexes[0].columns, vec!["b"]);
	assert_eq!(backend.catalog().get("t").unwrap().indexes[0].columns, vec!["b"]);
}

#[rstest]
#[tokio::test]
async fn test_inserted_not_null_text_gets_empty_placeholder(backend: MockBackend) {
	let result = run(
		&backend,
		vec![Action::insert(D, 2, Field::new("d", FieldType::Text).not_null())],
	)
	.await
	.unwrap();

	let table = result.table.unwrap();
	assert_eq!(table.fields[2].name, "d");
	let insert = &backend.statements()[1];
	assert!(
		insert.ends_with("(\"a\", \"b\", \"d\") SELECT \"a\", \"b\", '' FROM \"t\""),
		"{}",
		insert
	);
}

#[rstest]
#[tokio::test]
async fn test_removed_column_is_not_copied() {
	let backend = MockBackend::new().with_table(
		table().with_index(IndexSchema::new("t_a", vec!["a".into()], false)),
	);
	let result = run(&backend, vec![Action::remove(A, "a")]).await.unwrap();

	let table = result.table.unwrap();
	assert_eq!(table.field_count(), 1);
	assert!(table.indexes.is_empty());
	assert!(backend.statements()[1].ends_with("(\"b\") SELECT \"b\" FROM \"t\""));
}

#[rstest]
#[tokio::test]
async fn test_name_collision_is_bounded() {
	let backend = MockBackend::new().with_table(table()).with_occupied_prefix("t_temp");
	let handler = AlterTableHandler::new(&backend, &backend)
		.with_settings(AlterTableSettings::default().with_max_temp_name_attempts(3))
		.with_action(Action::remove(A, "a"));

	let err = handler.execute("t", ExecutionMode::Commit).await.unwrap_err();
	assert!(matches!(err, AlterTableError::NameCollision { attempts: 3, .. }));
	assert_eq!(backend.write_count(), 0);
}

#[rstest]
#[case(FailPoint::CreateTable)]
#[case(FailPoint::Execute)]
#[case(FailPoint::RenameTable)]
#[tokio::test]
async fn test_rebuild_failure_leaves_original_intact(#[case] point: FailPoint, table: TableSchema) {
	let backend = MockBackend::new().with_table(table.clone()).fail_at(point);
	let err = run(&backend, vec![Action::rename(A, "a", "c")]).await.unwrap_err();

	match point {
		FailPoint::CreateTable => assert!(matches!(err, AlterTableError::PhysicalCreateFailed { .. })),
		FailPoint::Execute => {
			let AlterTableError::DataCopyFailed { sql, .. } = &err else {
				panic!("unexpected error {:?}", err);
			};
			assert!(sql.starts_with("INSERT INTO"));
		}
		_ => assert!(matches!(err, AlterTableError::SwapFailed { .. })),
	}
	assert!(err.is_rebuild_failure());
	assert_eq!(backend.tables(), vec!["t"]);
	assert_eq!(backend.catalog().get("t"), Some(table));
}

#[rstest]
#[tokio::test]
async fn test_failed_cleanup_surfaces_original_error() {
	let backend = MockBackend::new()
		.with_table(table())
		.fail_at(FailPoint::Execute)
		.fail_at(FailPoint::DropTable);
	let err = run(&backend, vec![Action::rename(A, "a", "c")]).await.unwrap_err();

	assert!(matches!(err, AlterTableError::DataCopyFailed { .. }));
	assert!(backend.statements().iter().any(|s| s.starts_with("DROP TABLE t_temp")));
}

#[rstest]
#[tokio::test]
async fn test_catalog_failure_after_swap() {
	let backend = MockBackend::new().with_table(table()).fail_at(FailPoint::StoreTable);
	let err = run(&backend, vec![Action::rename(A, "a", "c")]).await.unwrap_err();

	assert!(matches!(err, AlterTableError::CatalogWriteFailed { .. }));
	assert!(temp_tables(&backend).is_empty());
}

// ============================================================================
// Handler action list
// ============================================================================

#[rstest]
fn test_action_list_management(backend: MockBackend) {
	let mut handler = AlterTableHandler::new(&backend, &backend)
		.with_action(Action::remove(A, "a"))
		.with_action(Action::remove(B, "b"));
	assert_eq!(handler.actions().len(), 2);

	assert_eq!(handler.remove_action(0), Some(Action::remove(A, "a")));
	assert_eq!(handler.remove_action(5), None);
	handler.add_action(Action::move_to(B, "b", 0));
	assert_eq!(handler.actions().len(), 2);

	handler.clear();
	assert!(handler.actions().is_empty());
	handler.set_actions(vec![Action::remove(A, "a")]);
	assert_eq!(handler.actions(), &[Action::remove(A, "a")]);
}
