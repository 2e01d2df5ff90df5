//! Domain objects held by manufacturers.
//!
//! # Role
//!
//! A [`DomainObject`] is an opaque record: a kind fixed at construction, a mutable key
//! name, a mutable category (categorized kinds only) and an attribute map used for
//! cross-links. Objects are shared as [`ObjectRef`] handles; identity is the
//! [`ObjectId`] assigned at construction, never the key.
//!
//! # Invariants
//!
//! - Objects of simple kinds never report a category.
//!   - Enforced in: [`DomainObject::with_category`], [`DomainObject::as_categorized`].
//! - Identity survives renames and recategorization.
//!   - Enforced in: [`ObjectId`] assignment (process-wide counter).

mod attrs;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use grimoire_primitives::{Category, FoldedKey, KeyName, ObjectKind, TypeTag};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use url::Url;

pub use self::attrs::{AttrKey, AttrValue, Attributes};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a domain object, stable for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
	fn next() -> Self {
		Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
	}

	/// Returns the raw identifier.
	pub fn as_u64(self) -> u64 {
		self.0
	}
}

/// Shared handle to a domain object.
pub type ObjectRef = Arc<DomainObject>;

struct ObjectState {
	key: KeyName,
	category: Option<Category>,
	attrs: Attributes,
}

/// A registry object identified by kind, optional category and key name.
pub struct DomainObject {
	id: ObjectId,
	kind: ObjectKind,
	state: RwLock<ObjectState>,
}

impl DomainObject {
	/// Creates a detached object with no category.
	pub fn new(kind: ObjectKind, key: &str) -> ObjectRef {
		Self::with_category(kind, None, key)
	}

	/// Creates a detached object in `category`.
	///
	/// The category is dropped for simple kinds.
	pub fn with_category(kind: ObjectKind, category: Option<Category>, key: &str) -> ObjectRef {
		let category = if kind.is_categorized() { category } else { None };
		Arc::new(Self {
			id: ObjectId::next(),
			kind,
			state: RwLock::new(ObjectState {
				key: KeyName::new(key),
				category,
				attrs: Attributes::default(),
			}),
		})
	}

	/// Returns the identity of this object.
	pub fn id(&self) -> ObjectId {
		self.id
	}

	/// Returns the kind of this object.
	pub fn kind(&self) -> ObjectKind {
		self.kind
	}

	/// Returns the key name as written.
	pub fn key_name(&self) -> KeyName {
		self.state.read().key.clone()
	}

	/// Returns the case-folded key used by namespace indices.
	pub fn folded_key(&self) -> FoldedKey {
		self.state.read().key.folded()
	}

	pub(crate) fn set_key_name(&self, key: KeyName) {
		self.state.write().key = key;
	}

	/// Returns the namespace category, always `None` for simple kinds.
	pub fn category(&self) -> Option<Category> {
		self.state.read().category.clone()
	}

	/// Returns the category capability if this object's kind is categorized.
	pub fn as_categorized(&self) -> Option<Categorized<'_>> {
		self.kind.is_categorized().then_some(Categorized(self))
	}

	/// Returns true if both handles point at the same object.
	pub fn same(a: &DomainObject, b: &DomainObject) -> bool {
		a.id == b.id
	}

	/// Borrows the attribute map.
	pub fn attrs(&self) -> MappedRwLockReadGuard<'_, Attributes> {
		RwLockReadGuard::map(self.state.read(), |state| &state.attrs)
	}

	/// Mutably borrows the attribute map.
	pub fn attrs_mut(&self) -> MappedRwLockWriteGuard<'_, Attributes> {
		RwLockWriteGuard::map(self.state.write(), |state| &mut state.attrs)
	}

	/// Sets a scalar attribute, returning the previous value.
	pub fn put(&self, key: AttrKey, value: impl Into<AttrValue>) -> Option<AttrValue> {
		self.attrs_mut().put(key, value)
	}

	/// Returns a clone of a scalar attribute.
	pub fn get(&self, key: &AttrKey) -> Option<AttrValue> {
		self.attrs().get(key).cloned()
	}

	/// Returns a boolean attribute, `false` when absent.
	pub fn flag(&self, key: &AttrKey) -> bool {
		self.attrs().flag(key)
	}

	/// Returns a text attribute.
	pub fn text(&self, key: &AttrKey) -> Option<String> {
		self.attrs().get(key).and_then(AttrValue::as_str).map(str::to_string)
	}

	/// Returns an object-link attribute.
	pub fn object(&self, key: &AttrKey) -> Option<ObjectRef> {
		self.attrs().get(key).and_then(AttrValue::as_object).cloned()
	}

	/// Appends to a list attribute.
	pub fn add_to_list(&self, key: AttrKey, value: impl Into<AttrValue>) {
		self.attrs_mut().add_to_list(key, value);
	}

	/// Returns a clone of a list attribute (empty when absent).
	pub fn list(&self, key: &AttrKey) -> Vec<AttrValue> {
		self.attrs().list(key).to_vec()
	}

	/// Returns true if a list attribute has at least one entry.
	pub fn contains_list(&self, key: &AttrKey) -> bool {
		self.attrs().contains_list(key)
	}

	/// Adds a type tag.
	pub fn add_type(&self, tag: TypeTag) {
		self.add_to_list(AttrKey::Types, tag);
	}

	/// Returns the type tags of this object.
	pub fn types(&self) -> Vec<TypeTag> {
		self.attrs().types().cloned().collect()
	}

	/// Returns true if this object carries every tag in `tags`.
	pub fn has_types(&self, tags: &[TypeTag]) -> bool {
		let attrs = self.attrs();
		tags.iter().all(|tag| attrs.types().any(|own| own == tag))
	}

	/// Returns the source the object was constructed from, if stamped.
	pub fn source_uri(&self) -> Option<Url> {
		self.attrs().get(&AttrKey::SourceUri).and_then(AttrValue::as_uri).cloned()
	}
}

impl fmt::Debug for DomainObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("DomainObject");
		s.field("id", &self.id.0).field("kind", &self.kind);
		match self.state.try_read() {
			Some(state) => s.field("key", &state.key).field("category", &state.category),
			None => s.field("key", &"<locked>"),
		};
		s.finish()
	}
}

/// Category capability of an object whose kind is categorized.
#[derive(Clone, Copy)]
pub struct Categorized<'a>(&'a DomainObject);

impl Categorized<'_> {
	/// Returns the current category.
	pub fn category(&self) -> Option<Category> {
		self.0.category()
	}

	/// Overwrites the category without moving the object between namespaces.
	///
	/// Registered objects should be moved with
	/// [`crate::ReferenceContext::reassociate_category`] instead.
	pub fn set_category(&self, category: Option<Category>) {
		self.0.state.write().category = category;
	}
}
