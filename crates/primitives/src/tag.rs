use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::FoldedKey;

/// A type label such as `Divine` or `Arcane`.
///
/// Tags compare and hash case-insensitively but display as first written.
#[derive(Clone)]
pub struct TypeTag {
	display: Arc<str>,
	folded: FoldedKey,
}

impl TypeTag {
	/// Creates a tag.
	pub fn new(name: impl AsRef<str>) -> Self {
		let name = name.as_ref();
		Self {
			display: Arc::from(name),
			folded: FoldedKey::new(name),
		}
	}

	/// Tag applied to domain spell lists.
	pub fn divine() -> Self {
		Self::new("Divine")
	}

	/// Returns the tag as first written.
	pub fn as_str(&self) -> &str {
		&self.display
	}
}

impl PartialEq for TypeTag {
	fn eq(&self, other: &Self) -> bool {
		self.folded == other.folded
	}
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.folded.hash(state);
	}
}

impl fmt::Debug for TypeTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TypeTag").field(&&*self.display).finish()
	}
}

impl fmt::Display for TypeTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.display)
	}
}

impl From<&str> for TypeTag {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tags_compare_ignoring_case() {
		assert_eq!(TypeTag::new("divine"), TypeTag::divine());
		assert_eq!(TypeTag::new("ARCANE").to_string(), "ARCANE");
		assert_ne!(TypeTag::new("Arcane"), TypeTag::divine());
	}
}
