use std::sync::Arc;

use grimoire_primitives::TypeTag;
use rustc_hash::FxHashMap;
use url::Url;

use super::ObjectRef;
use crate::reference::SingleRef;

/// Attribute key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrKey {
	/// Source the object was constructed from.
	SourceUri,
	/// Short label registered through the abbreviation table.
	Abbreviation,
	/// Spell type of a class, copied onto its derived spell lists as a type tag.
	SpellType,
	/// Link from a domain to its derived spell list.
	DomainSpellList,
	/// Link from a class or sub-class to its derived spell list.
	ClassSpellList,
	/// Whether a class with sub-classes may also be taken as itself.
	AllowBaseClass,
	/// Type tags (list).
	Types,
	/// Sub-classes declared by a class (list).
	SubClasses,
	/// Loader-defined attribute.
	Custom(Arc<str>),
}

impl AttrKey {
	/// Creates a loader-defined key.
	pub fn custom(name: &str) -> Self {
		Self::Custom(Arc::from(name))
	}
}

/// The value of an attribute.
#[derive(Debug, Clone)]
pub enum AttrValue {
	Bool(bool),
	Text(String),
	Uri(Url),
	Type(TypeTag),
	/// Non-owning link to another object.
	Object(ObjectRef),
	/// Deferred link to another object.
	Reference(SingleRef),
}

impl AttrValue {
	/// Returns the boolean value if this is a `Bool` variant.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			AttrValue::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the text if this is a `Text` variant.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttrValue::Text(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the URI if this is a `Uri` variant.
	pub fn as_uri(&self) -> Option<&Url> {
		match self {
			AttrValue::Uri(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the tag if this is a `Type` variant.
	pub fn as_type(&self) -> Option<&TypeTag> {
		match self {
			AttrValue::Type(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the linked object if this is an `Object` variant.
	pub fn as_object(&self) -> Option<&ObjectRef> {
		match self {
			AttrValue::Object(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the reference if this is a `Reference` variant.
	pub fn as_reference(&self) -> Option<&SingleRef> {
		match self {
			AttrValue::Reference(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the variant name of this value.
	pub fn type_name(&self) -> &'static str {
		match self {
			AttrValue::Bool(_) => "bool",
			AttrValue::Text(_) => "text",
			AttrValue::Uri(_) => "uri",
			AttrValue::Type(_) => "type",
			AttrValue::Object(_) => "object",
			AttrValue::Reference(_) => "reference",
		}
	}
}

impl From<bool> for AttrValue {
	fn from(v: bool) -> Self {
		AttrValue::Bool(v)
	}
}

impl From<String> for AttrValue {
	fn from(v: String) -> Self {
		AttrValue::Text(v)
	}
}

impl From<&str> for AttrValue {
	fn from(v: &str) -> Self {
		AttrValue::Text(v.to_string())
	}
}

impl From<Url> for AttrValue {
	fn from(v: Url) -> Self {
		AttrValue::Uri(v)
	}
}

impl From<TypeTag> for AttrValue {
	fn from(v: TypeTag) -> Self {
		AttrValue::Type(v)
	}
}

impl From<ObjectRef> for AttrValue {
	fn from(v: ObjectRef) -> Self {
		AttrValue::Object(v)
	}
}

impl From<SingleRef> for AttrValue {
	fn from(v: SingleRef) -> Self {
		AttrValue::Reference(v)
	}
}

/// Scalar and list attributes of one object.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
	values: FxHashMap<AttrKey, AttrValue>,
	lists: FxHashMap<AttrKey, Vec<AttrValue>>,
}

impl Attributes {
	/// Sets a scalar attribute, returning the previous value.
	pub fn put(&mut self, key: AttrKey, value: impl Into<AttrValue>) -> Option<AttrValue> {
		self.values.insert(key, value.into())
	}

	/// Returns a scalar attribute.
	pub fn get(&self, key: &AttrKey) -> Option<&AttrValue> {
		self.values.get(key)
	}

	/// Removes a scalar attribute.
	pub fn remove(&mut self, key: &AttrKey) -> Option<AttrValue> {
		self.values.remove(key)
	}

	/// Returns a boolean attribute, `false` when absent or not a boolean.
	pub fn flag(&self, key: &AttrKey) -> bool {
		self.get(key).and_then(AttrValue::as_bool).unwrap_or(false)
	}

	/// Appends to a list attribute.
	pub fn add_to_list(&mut self, key: AttrKey, value: impl Into<AttrValue>) {
		self.lists.entry(key).or_default().push(value.into());
	}

	/// Returns a list attribute (empty when absent).
	pub fn list(&self, key: &AttrKey) -> &[AttrValue] {
		self.lists.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Returns true if a list attribute has at least one entry.
	pub fn contains_list(&self, key: &AttrKey) -> bool {
		self.lists.get(key).is_some_and(|list| !list.is_empty())
	}

	/// Removes a list attribute.
	pub fn remove_list(&mut self, key: &AttrKey) -> Vec<AttrValue> {
		self.lists.remove(key).unwrap_or_default()
	}

	/// Returns the type tags stored under [`AttrKey::Types`].
	pub fn types(&self) -> impl Iterator<Item = &TypeTag> + '_ {
		self.list(&AttrKey::Types).iter().filter_map(AttrValue::as_type)
	}
}
