//! Identity vocabulary shared by the registry: object kinds, categories, keys and type tags.

/// Namespace partition tags.
pub mod category;
/// Case-preserving key names and their folded lookup form.
pub mod key;
/// Stable object kind identifiers and the categorization capability.
pub mod kind;
/// Case-insensitive type labels used by group filters.
pub mod tag;

pub use category::Category;
pub use key::{FoldedKey, KeyName};
pub use kind::{Categorization, ObjectKind, UnknownKind};
pub use tag::TypeTag;
