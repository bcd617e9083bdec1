//! Backward reduction of requested actions
//!
//! The submitted list is walked from last to first. When an action is visited,
//! every later action on the same field is already recorded, so the pass can
//! tell whether the action still matters:
//!
//! - a rename merges with a later rename of the same field into a single hop,
//!   and rewrites the field name recorded by later actions to the name the
//!   field has at the start of the sequence;
//! - a property change is dropped when the field is removed later or when the
//!   same property is set again later;
//! - a remove absorbs every earlier edit of the field;
//! - an insert cancels against a later remove, and otherwise folds later
//!   property changes into its own field definition;
//! - a move is dropped when the field is removed later or moved again later.
//!
//! Renames that end up with equal source and target names are discarded.
//!
//! # Example
//!
//! ```rust
//! use reinhardt_alter::alter::{simplify, Action, FieldUid, PlannedAction};
//!
//! let planned = PlannedAction::plan_all([
//!     Action::rename(FieldUid(1), "a", "b"),
//!     Action::rename(FieldUid(1), "b", "c"),
//!     Action::change_property(FieldUid(1), "c", "caption", "C"),
//! ])
//! .unwrap();
//!
//! let simplified = simplify(planned).unwrap();
//! let ordered = simplified.into_ordered();
//! assert_eq!(ordered.len(), 2);
//! assert_eq!(ordered[0].action.field_name(), "a");
//! assert_eq!(ordered[0].action.new_name(), Some("c"));
//! ```

use std::collections::BTreeMap;

use super::action::{Action, FieldUid, PlannedAction};
use super::requirements::{AlteringRequirements, aggregate};
use crate::error::Result;
use crate::schema::set_field_property;

/// Surviving actions of one field
///
/// Each slot holds at most one action, so the "one survivor per key" rule is
/// enforced by the shape of the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldActions {
	pub remove: Option<PlannedAction>,
	pub insert: Option<PlannedAction>,
	pub rename: Option<PlannedAction>,
	/// Non-name property changes keyed by lower-cased property name
	pub properties: BTreeMap<String, PlannedAction>,
	pub movement: Option<PlannedAction>,
}

impl FieldActions {
	pub fn is_empty(&self) -> bool {
		self.remove.is_none()
			&& self.insert.is_none()
			&& self.rename.is_none()
			&& self.properties.is_empty()
			&& self.movement.is_none()
	}

	pub fn len(&self) -> usize {
		usize::from(self.remove.is_some())
			+ usize::from(self.insert.is_some())
			+ usize::from(self.rename.is_some())
			+ self.properties.len()
			+ usize::from(self.movement.is_some())
	}

	pub fn iter(&self) -> impl Iterator<Item = &PlannedAction> {
		self.remove
			.iter()
			.chain(self.insert.iter())
			.chain(self.rename.iter())
			.chain(self.properties.values())
			.chain(self.movement.iter())
	}

	fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlannedAction> {
		self.remove
			.iter_mut()
			.chain(self.insert.iter_mut())
			.chain(self.rename.iter_mut())
			.chain(self.properties.values_mut())
			.chain(self.movement.iter_mut())
	}

	/// Rewrite the field name of every recorded action except inserts
	fn propagate_name(&mut self, name: &str) {
		for planned in self.iter_mut() {
			if !matches!(planned.action, Action::InsertField { .. }) {
				planned.action.set_field_name(name);
			}
		}
	}
}

/// Result of [`simplify`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimplifiedActions {
	fields: BTreeMap<FieldUid, FieldActions>,
}

impl SimplifiedActions {
	pub fn field(&self, uid: FieldUid) -> Option<&FieldActions> {
		self.fields.get(&uid)
	}

	pub fn fields(&self) -> impl Iterator<Item = (FieldUid, &FieldActions)> {
		self.fields.iter().map(|(uid, actions)| (*uid, actions))
	}

	/// Whether the field is removed from the table altogether
	pub fn is_removed(&self, uid: FieldUid) -> bool {
		self.fields.get(&uid).is_some_and(|f| f.remove.is_some())
	}

	pub fn len(&self) -> usize {
		self.fields.values().map(FieldActions::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn requirements(&self) -> AlteringRequirements {
		aggregate(
			self.fields
				.values()
				.flat_map(|f| f.iter())
				.map(|p| p.requirements),
		)
	}

	/// Surviving actions in submission order
	pub fn into_ordered(self) -> Vec<PlannedAction> {
		let mut ordered: Vec<PlannedAction> = self
			.fields
			.into_values()
			.flat_map(|f| {
				f.remove
					.into_iter()
					.chain(f.insert)
					.chain(f.rename)
					.chain(f.properties.into_values())
					.chain(f.movement)
			})
			.collect();
		ordered.sort_by_key(|p| p.order);
		ordered
	}
}

/// Reduce `actions` to the minimal set with the same end state
///
/// Fails only when a property change cannot be folded into an inserted field
/// definition.
pub fn simplify<I>(actions: I) -> Result<SimplifiedActions>
where
	I: IntoIterator<Item = PlannedAction>,
{
	let mut actions: Vec<PlannedAction> = actions.into_iter().collect();
	actions.sort_by_key(|p| p.order);

	let mut fields: BTreeMap<FieldUid, FieldActions> = BTreeMap::new();
	for planned in actions.into_iter().rev() {
		let uid = planned.uid();
		let record = fields.entry(uid).or_default();
		match &planned.action {
			Action::ChangeFieldProperty { field_name, .. } if planned.action.is_rename() => {
				let source_name = field_name.clone();
				if record.rename.is_some() {
					tracing::debug!(%uid, "merging rename chain");
				} else if record.remove.is_some() {
					tracing::debug!(%uid, "dropping rename of removed field");
				} else {
					record.rename = Some(planned);
				}
				record.propagate_name(&source_name);
			}
			Action::ChangeFieldProperty { .. } => {
				let key = planned.action.property_key().unwrap_or_default();
				if record.remove.is_none() && !record.properties.contains_key(&key) {
					record.properties.insert(key, planned);
				}
			}
			Action::RemoveField { .. } => {
				record.remove = Some(planned);
			}
			Action::InsertField { .. } => {
				if record.remove.take().is_some() {
					tracing::debug!(%uid, "insert cancelled by later remove");
					fields.remove(&uid);
				} else {
					let folded = fold_into_insert(planned, record)?;
					record.insert = Some(folded);
				}
			}
			Action::MoveFieldPosition { .. } => {
				if record.remove.is_none() && record.movement.is_none() {
					record.movement = Some(planned);
				}
			}
		}
	}

	for (uid, record) in fields.iter_mut() {
		if record.rename.as_ref().is_some_and(|r| r.action.is_noop_rename()) {
			tracing::debug!(%uid, "discarding no-op rename");
			record.rename = None;
		}
	}
	fields.retain(|_, record| !record.is_empty());

	for (uid, record) in &fields {
		tracing::debug!(
			%uid,
			actions = ?record.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
			"simplified field actions"
		);
	}

	Ok(SimplifiedActions { fields })
}

/// Apply the recorded property changes to the inserted definition
fn fold_into_insert(mut planned: PlannedAction, record: &mut FieldActions) -> Result<PlannedAction> {
	let mut later: Vec<PlannedAction> = record
		.rename
		.take()
		.into_iter()
		.chain(std::mem::take(&mut record.properties).into_values())
		.collect();
	later.sort_by_key(|p| p.order);

	if let Action::InsertField { field, .. } = &mut planned.action {
		for change in later {
			if let Action::ChangeFieldProperty { property, value, .. } = &change.action {
				set_field_property(field, property, value)?;
			}
		}
	}
	Ok(planned)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{Field, FieldType, FieldValue};

	const A: FieldUid = FieldUid(1);
	const B: FieldUid = FieldUid(2);

	fn run(actions: Vec<Action>) -> SimplifiedActions {
		simplify(PlannedAction::plan_all(actions).unwrap()).unwrap()
	}

	#[test]
	fn test_rename_chain_collapses() {
		let simplified = run(vec![
			Action::rename(A, "a", "b"),
			Action::rename(A, "b", "c"),
			Action::rename(A, "c", "d"),
		]);
		let ordered = simplified.into_ordered();
		assert_eq!(ordered.len(), 1);
		assert_eq!(ordered[0].order, 2);
		assert_eq!(ordered[0].action.field_name(), "a");
		assert_eq!(ordered[0].action.new_name(), Some("d"));
	}

	#[test]
	fn test_rename_round_trip_is_noop() {
		let simplified = run(vec![Action::rename(A, "a", "b"), Action::rename(A, "b", "a")]);
		assert!(simplified.is_empty());
		assert!(simplified.requirements().is_empty());
	}

	#[test]
	fn test_rename_propagates_to_later_actions() {
		let simplified = run(vec![
			Action::rename(A, "a", "b"),
			Action::change_property(A, "b", "caption", "B"),
			Action::move_to(A, "b", 0),
		]);
		for planned in simplified.into_ordered() {
			assert_eq!(planned.action.field_name(), "a");
		}
	}

	#[test]
	fn test_remove_absorbs_earlier_edits() {
		let simplified = run(vec![
			Action::change_property(A, "a", "caption", "x"),
			Action::rename(A, "a", "b"),
			Action::move_to(A, "b", 2),
			Action::change_property(A, "b", "notNull", true),
			Action::remove(A, "b"),
		]);
		assert!(simplified.is_removed(A));
		let ordered = simplified.into_ordered();
		assert_eq!(ordered.len(), 1);
		assert!(matches!(ordered[0].action, Action::RemoveField { ref field_name, .. } if field_name == "a"));
	}

	#[test]
	fn test_insert_then_remove_cancels() {
		let simplified = run(vec![
			Action::insert(A, 0, Field::new("d", FieldType::Text)),
			Action::change_property(A, "d", "caption", "D"),
			Action::remove(A, "d"),
			Action::change_property(B, "b", "caption", "B"),
		]);
		assert!(simplified.field(A).is_none());
		assert!(!simplified.is_removed(A));
		assert_eq!(simplified.len(), 1);
	}

	#[test]
	fn test_insert_folds_later_changes() {
		let simplified = run(vec![
			Action::insert(A, 1, Field::new("n", FieldType::Integer)),
			Action::change_property(A, "n", "type", "Double"),
			Action::change_property(A, "n", "visibleDecimalPlaces", 2),
			Action::rename(A, "n", "price"),
		]);
		let ordered = simplified.into_ordered();
		assert_eq!(ordered.len(), 1);
		match &ordered[0].action {
			Action::InsertField { field, index, .. } => {
				assert_eq!(*index, 1);
				assert_eq!(field.name, "price");
				assert_eq!(field.field_type, FieldType::Double);
				assert_eq!(field.visible_decimal_places, Some(2));
			}
			other => panic!("unexpected action {:?}", other),
		}
	}

	#[test]
	fn test_last_write_wins() {
		let simplified = run(vec![
			Action::change_property(A, "a", "caption", "A"),
			Action::change_property(A, "a", "Caption", "B"),
		]);
		let ordered = simplified.into_ordered();
		assert_eq!(ordered.len(), 1);
		assert!(matches!(
			&ordered[0].action,
			Action::ChangeFieldProperty { value, .. } if *value == FieldValue::from("B")
		));
	}

	#[test]
	fn test_last_move_wins_and_is_not_folded() {
		let simplified = run(vec![
			Action::insert(A, 0, Field::new("d", FieldType::Text)),
			Action::move_to(A, "d", 1),
			Action::move_to(A, "d", 2),
		]);
		let ordered = simplified.into_ordered();
		assert_eq!(ordered.len(), 2);
		assert!(matches!(ordered[1].action, Action::MoveFieldPosition { index: 2, .. }));
	}

	#[test]
	fn test_fold_failure_is_reported() {
		let planned = PlannedAction::plan_all([
			Action::insert(A, 0, Field::new("t", FieldType::Text)),
			Action::change_property(A, "t", "autoIncrement", true),
		])
		.unwrap();
		assert!(simplify(planned).is_err());
	}

	#[test]
	fn test_fields_are_independent() {
		let simplified = run(vec![
			Action::change_property(A, "a", "caption", "x"),
			Action::remove(B, "b"),
		]);
		assert!(!simplified.is_removed(A));
		assert!(simplified.is_removed(B));
		assert_eq!(
			simplified.requirements(),
			AlteringRequirements::MAIN_SCHEMA | AlteringRequirements::PHYSICAL
		);
	}
}
