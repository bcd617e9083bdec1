//! Cost classification of field property changes

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::error::{AlterTableError, Result};
use crate::schema::EXTENDED_PROPERTIES;

/// Set of steps an alteration needs
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::alter::{classify, AlteringRequirements};
///
/// let req = classify("name").unwrap() | classify("caption").unwrap();
/// assert!(req.contains(AlteringRequirements::PHYSICAL));
/// assert!(req.contains(AlteringRequirements::MAIN_SCHEMA));
/// assert!(!req.intersects(AlteringRequirements::EXTENDED_SCHEMA));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AlteringRequirements(u8);

impl AlteringRequirements {
	pub const NONE: Self = Self(0);
	/// DDL is needed; the table gets rebuilt
	pub const PHYSICAL: Self = Self(1);
	/// Existing row values must be reinterpreted
	pub const DATA_CONVERSION: Self = Self(1 << 1);
	/// The field's main catalog row must be rewritten
	pub const MAIN_SCHEMA: Self = Self(1 << 2);
	/// Extended (lookup) field data must be rewritten
	pub const EXTENDED_SCHEMA: Self = Self(1 << 3);
	/// Catalog-only change
	pub const SCHEMA: Self = Self(Self::MAIN_SCHEMA.0 | Self::EXTENDED_SCHEMA.0);

	pub const fn bits(self) -> u8 {
		self.0
	}

	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Whether every flag of `other` is set
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Whether any flag of `other` is set
	pub const fn intersects(self, other: Self) -> bool {
		self.0 & other.0 != 0
	}
}

impl BitOr for AlteringRequirements {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

impl BitOrAssign for AlteringRequirements {
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}

impl fmt::Display for AlteringRequirements {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_empty() {
			return f.write_str("none");
		}
		let names = [
			(Self::PHYSICAL, "physical"),
			(Self::DATA_CONVERSION, "data conversion"),
			(Self::MAIN_SCHEMA, "main schema"),
			(Self::EXTENDED_SCHEMA, "extended schema"),
		];
		let set: Vec<&str> = names
			.iter()
			.filter(|(flag, _)| self.contains(*flag))
			.map(|(_, name)| *name)
			.collect();
		f.write_str(&set.join(" | "))
	}
}

static PROPERTY_REQUIREMENTS: Lazy<HashMap<String, AlteringRequirements>> = Lazy::new(|| {
	use AlteringRequirements as R;

	let physical_conversion = R::PHYSICAL | R::DATA_CONVERSION;
	let mut map: HashMap<String, AlteringRequirements> = [
		("name", R::PHYSICAL | R::MAIN_SCHEMA),
		("type", physical_conversion),
		("unsigned", physical_conversion),
		("maxLength", physical_conversion),
		("precision", physical_conversion),
		("primaryKey", physical_conversion),
		("unique", physical_conversion),
		("notNull", physical_conversion),
		("allowEmpty", R::PHYSICAL | R::MAIN_SCHEMA),
		("autoIncrement", physical_conversion),
		("indexed", physical_conversion),
		("caption", R::MAIN_SCHEMA),
		("description", R::MAIN_SCHEMA),
		("defaultValue", R::MAIN_SCHEMA),
		("defaultWidth", R::EXTENDED_SCHEMA),
		("visibleDecimalPlaces", R::EXTENDED_SCHEMA),
	]
	.into_iter()
	.map(|(name, req)| (name.to_ascii_lowercase(), req))
	.collect();

	for name in EXTENDED_PROPERTIES {
		map.insert(name.to_ascii_lowercase(), R::EXTENDED_SCHEMA);
	}
	map
});

/// Requirements implied by changing `property`
///
/// Fails with [`AlterTableError::UnknownProperty`] when the name is neither a
/// built-in field property nor a registered extended property.
pub fn classify(property: &str) -> Result<AlteringRequirements> {
	match PROPERTY_REQUIREMENTS.get(&property.to_ascii_lowercase()) {
		Some(req) => Ok(*req),
		None => {
			tracing::warn!(property, "unknown field property");
			Err(AlterTableError::UnknownProperty(property.to_string()))
		}
	}
}

/// OR together a sequence of bitmasks
pub fn aggregate<I>(requirements: I) -> AlteringRequirements
where
	I: IntoIterator<Item = AlteringRequirements>,
{
	requirements
		.into_iter()
		.fold(AlteringRequirements::NONE, |acc, r| acc | r)
}
