use grimoire_primitives::{Category, KeyName, ObjectKind};
use url::Url;

use crate::context::LoadPhase;

/// Registry error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	/// An active object in the same namespace already holds the key.
	#[error("duplicate key: kind={kind} category={category:?} key={key:?}")]
	DuplicateKey {
		kind: ObjectKind,
		category: Option<Category>,
		key: KeyName,
	},

	/// Objects cannot be keyed by an empty or whitespace-only name.
	#[error("empty key for {kind}")]
	EmptyKey { kind: ObjectKind },

	/// The object belongs to a different namespace than the manufacturer it was added to.
	#[error(
		"{object_kind} {key:?} in category {object_category:?} does not belong to namespace {kind}/{category:?}"
	)]
	NamespaceMismatch {
		kind: ObjectKind,
		category: Option<Category>,
		object_kind: ObjectKind,
		object_category: Option<Category>,
		key: KeyName,
	},

	/// A category operation was applied to an object of a simple kind.
	#[error("{kind} {key:?} does not carry a category")]
	NotCategorized { kind: ObjectKind, key: KeyName },

	/// A global pass was invoked out of the resolve, deferred, derived order.
	#[error("{pass} pass requested while the context is in the {phase} phase")]
	OutOfOrderPass { pass: &'static str, phase: LoadPhase },

	/// One or more owners could not be finished by the derived-object pass.
	///
	/// The pass still processes every other owner before returning this.
	#[error("derived-object pass failed for {} owner(s)", .failures.len())]
	DerivedObjects { failures: Vec<RegistryError> },

	/// Registry configuration could not be parsed.
	#[error("invalid registry config: {0}")]
	Config(#[from] toml::de::Error),
}

/// Convenience alias for registry results.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// A single reference whose target key was never constructed.
///
/// Delivered to an [`crate::UnconstructedValidator`] during resolution and validation;
/// never returned as a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unconstructed reference to {kind} {key:?}{}", origin_suffix(.origin))]
pub struct UnresolvedReference {
	/// Kind the reference expects.
	pub kind: ObjectKind,
	/// Namespace category the reference was requested in.
	pub category: Option<Category>,
	/// Key that was requested.
	pub key: KeyName,
	/// Source that was being loaded when the reference was first requested.
	pub origin: Option<Url>,
}

fn origin_suffix(origin: &Option<Url>) -> String {
	origin
		.as_ref()
		.map(|url| format!(" (requested from {url})"))
		.unwrap_or_default()
}
