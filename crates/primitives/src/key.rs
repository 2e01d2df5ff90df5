use std::fmt;
use std::sync::Arc;

/// Key name as written by the data author.
///
/// Equality is exact; use [`KeyName::folded`] or [`KeyName::matches`] for the
/// case-insensitive comparison the registry indexes by.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyName(Arc<str>);

impl KeyName {
	/// Creates a key name.
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	/// Returns the key as written.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the case-folded lookup form.
	pub fn folded(&self) -> FoldedKey {
		FoldedKey::new(&self.0)
	}

	/// Returns true if `other` names the same key ignoring case.
	pub fn matches(&self, other: &str) -> bool {
		FoldedKey::new(&self.0) == FoldedKey::new(other)
	}

	/// Returns true if the key is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Debug for KeyName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl fmt::Display for KeyName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for KeyName {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl AsRef<str> for KeyName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Case-folded key used for namespace indexing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FoldedKey(Box<str>);

impl FoldedKey {
	/// Folds `raw` to its lookup form.
	pub fn new(raw: &str) -> Self {
		Self(raw.to_lowercase().into_boxed_str())
	}

	/// Returns the folded text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&KeyName> for FoldedKey {
	fn from(key: &KeyName) -> Self {
		key.folded()
	}
}
