//! Alteration engine settings

use serde::Deserialize;
use thiserror::Error;

/// Failure while loading [`AlterTableSettings`]
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("Failed to parse alter-table settings: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("Invalid alter-table setting \"{name}\": {reason}")]
	Invalid { name: &'static str, reason: String },
}

/// Settings for [`AlterTableHandler`](crate::alter::AlterTableHandler)
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::AlterTableSettings;
///
/// let settings = AlterTableSettings::from_toml_str(
///     r#"
///     max_temp_name_attempts = 4
///     temp_name_infix = "_rebuild"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(settings.max_temp_name_attempts, 4);
/// assert!(settings.store_extended_schema);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AlterTableSettings {
	/// How many random temporary table names are tried before giving up
	pub max_temp_name_attempts: u32,
	/// Inserted between the table name and the random suffix
	pub temp_name_infix: String,
	/// Whether extended (lookup) field data is written back to the catalog
	pub store_extended_schema: bool,
}

impl Default for AlterTableSettings {
	fn default() -> Self {
		Self {
			max_temp_name_attempts: 16,
			temp_name_infix: "_temp".to_string(),
			store_extended_schema: true,
		}
	}
}

impl AlterTableSettings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_temp_name_attempts(mut self, attempts: u32) -> Self {
		self.max_temp_name_attempts = attempts;
		self
	}

	pub fn with_temp_name_infix(mut self, infix: impl Into<String>) -> Self {
		self.temp_name_infix = infix.into();
		self
	}

	pub fn with_store_extended_schema(mut self, store: bool) -> Self {
		self.store_extended_schema = store;
		self
	}

	/// Parse settings from TOML, filling missing keys with defaults
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.max_temp_name_attempts == 0 {
			return Err(SettingsError::Invalid {
				name: "max_temp_name_attempts",
				reason: "must be at least 1".to_string(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_defaults() {
		let settings = AlterTableSettings::default();
		assert_eq!(settings.max_temp_name_attempts, 16);
		assert_eq!(settings.temp_name_infix, "_temp");
		assert!(settings.store_extended_schema);
	}

	#[test]
	fn test_empty_toml_gives_defaults() {
		assert_eq!(
			AlterTableSettings::from_toml_str("").unwrap(),
			AlterTableSettings::default()
		);
	}

	#[rstest]
	#[case("max_temp_name_attempts = 0")]
	#[case("max_temp_name_attempts = \"many\"")]
	#[case("store_extended_schema = 3")]
	fn test_rejects_bad_settings(#[case] source: &str) {
		assert!(AlterTableSettings::from_toml_str(source).is_err());
	}

	#[test]
	fn test_builders() {
		let settings = AlterTableSettings::new()
			.with_max_temp_name_attempts(2)
			.with_temp_name_infix("_tmp")
			.with_store_extended_schema(false);
		assert_eq!(settings.max_temp_name_attempts, 2);
		assert_eq!(settings.temp_name_infix, "_tmp");
		assert!(!settings.store_extended_schema);
	}
}
