//! Registry configuration.
//!
//! Configuration is format-neutral serde data; [`RegistryConfig::from_toml_str`] reads
//! the TOML form shipped next to rules data:
//!
//! ```toml
//! [unconstructed]
//! allow_kinds = ["spell"]
//! allow = [{ kind = "class", key = "Wizard" }]
//! ```

use grimoire_primitives::{KeyName, ObjectKind};
use serde::Deserialize;

use crate::error::{Result, UnresolvedReference};

/// Top-level registry configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	/// Which unconstructed references are tolerated during validation.
	pub unconstructed: UnconstructedPolicy,
}

impl RegistryConfig {
	/// Parses configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}
}

/// Allow-list for references that may legitimately stay unresolved.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnconstructedPolicy {
	/// Kinds whose unresolved references are always tolerated.
	pub allow_kinds: Vec<ObjectKind>,
	/// Individual (kind, key) pairs that are tolerated.
	pub allow: Vec<AllowedMiss>,
}

/// One tolerated (kind, key) pair; keys match case-insensitively.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowedMiss {
	pub kind: ObjectKind,
	pub key: String,
}

impl UnconstructedPolicy {
	/// Returns true if `miss` is tolerated.
	pub fn allows(&self, miss: &UnresolvedReference) -> bool {
		self.allow_kinds.contains(&miss.kind)
			|| self
				.allow
				.iter()
				.any(|allowed| allowed.kind == miss.kind && miss.key.matches(&allowed.key))
	}

	/// Returns true if nothing is tolerated.
	pub fn is_empty(&self) -> bool {
		self.allow_kinds.is_empty() && self.allow.is_empty()
	}
}

impl AllowedMiss {
	/// Returns the allowed key as a [`KeyName`].
	pub fn key_name(&self) -> KeyName {
		KeyName::new(&self.key)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_policy() {
		let config = RegistryConfig::from_toml_str(
			r#"
			[unconstructed]
			allow_kinds = ["spell", "weapon_prof"]
			allow = [{ kind = "class", key = "Wizard" }]
			"#,
		)
		.expect("valid config");

		let policy = &config.unconstructed;
		assert_eq!(policy.allow_kinds, vec![ObjectKind::Spell, ObjectKind::WeaponProf]);
		assert_eq!(policy.allow.len(), 1);
		assert_eq!(policy.allow[0].key_name().as_str(), "Wizard");
		assert!(!policy.is_empty());
	}

	#[test]
	fn test_empty_config_is_default() {
		let config = RegistryConfig::from_toml_str("").expect("empty config");
		assert!(config.unconstructed.is_empty());
	}

	#[test]
	fn test_unknown_kind_is_rejected() {
		let err = RegistryConfig::from_toml_str("[unconstructed]\nallow_kinds = [\"psionic\"]\n")
			.expect_err("unknown kind");
		assert!(err.to_string().starts_with("invalid registry config"));
	}
}
