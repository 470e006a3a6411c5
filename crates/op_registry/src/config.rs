//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What `begin` does when a name is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateNamePolicy {
	/// Resolve the existing table; further slots land on it and the
	/// once-per-slot rule still applies.
	#[default]
	Merge,
	/// Create a fresh table and rebind the name to it. The previous table
	/// stays reachable only through the kinds already associated with it.
	Replace,
	/// Treat the second `begin` as a fatal build error.
	Panic,
}

/// Order in which `for_each_trait` visits tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalOrder {
	/// Order of first `begin` per table.
	#[default]
	Registration,
	/// Lexicographic by table name.
	ByName,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OpRegistryConfig {
	pub duplicate_name: DuplicateNamePolicy,
	pub traversal: TraversalOrder,
}

impl OpRegistryConfig {
	/// Parses a TOML document; missing keys keep their defaults.
	pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_uses_defaults() {
		let config = OpRegistryConfig::from_toml("").unwrap();
		assert_eq!(config, OpRegistryConfig::default());
		assert_eq!(config.duplicate_name, DuplicateNamePolicy::Merge);
		assert_eq!(config.traversal, TraversalOrder::Registration);
	}

	#[test]
	fn parses_kebab_case_values() {
		let config = OpRegistryConfig::from_toml(
			r#"
			duplicate-name = "replace"
			traversal = "by-name"
			"#,
		)
		.unwrap();
		assert_eq!(
			config,
			OpRegistryConfig {
				duplicate_name: DuplicateNamePolicy::Replace,
				traversal: TraversalOrder::ByName,
			}
		);
	}

	#[test]
	fn rejects_unknown_keys_and_values() {
		assert!(matches!(
			OpRegistryConfig::from_toml("dedupe = true"),
			Err(ConfigError::Parse(_))
		));
		assert!(matches!(
			OpRegistryConfig::from_toml(r#"duplicate-name = "ignore""#),
			Err(ConfigError::Parse(_))
		));
	}
}
