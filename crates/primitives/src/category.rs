use std::fmt;
use std::sync::Arc;

/// Open, value-compared tag that partitions objects of one kind into namespaces.
///
/// Two categories are equal when their names are equal; the absence of a category
/// (`Option::None`) is its own distinct partition.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(Arc<str>);

impl Category {
	/// Creates a category with the given name.
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	/// Returns the category name.
	pub fn name(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Category").field(&&*self.0).finish()
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Category {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}
