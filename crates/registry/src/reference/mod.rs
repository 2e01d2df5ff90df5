//! Deferred pointers to registry objects.
//!
//! # Mental Model
//!
//! - A [`SingleRef`] names one object by key. It starts [`RefState::Pending`] when the
//!   target did not exist at request time and is linked by the resolution pass of the
//!   manufacturer that issued it. A [`RefState::Direct`] reference wraps an object
//!   that is already in hand and never needs resolution.
//! - A [`GroupRef`] is a live view over a manufacturer's active objects. It is always
//!   resolved and re-evaluates its filter on every use.
//!
//! # Invariants
//!
//! - A single reference leaves `Pending` at most once.
//!   - Enforced in: [`SingleRef::resolve`].
//! - Resolved references track the object, not the key, so later renames, forgets and
//!   recategorizations never change what they point at.

mod group;

use std::fmt;
use std::sync::Arc;

use grimoire_primitives::{Category, KeyName, ObjectKind};
use parking_lot::RwLock;
use url::Url;

pub use self::group::{GroupFilter, GroupRef};
use crate::error::UnresolvedReference;
use crate::object::{DomainObject, ObjectRef};

/// Namespace and key a single reference was requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTarget {
	pub kind: ObjectKind,
	pub category: Option<Category>,
	pub key: KeyName,
}

/// Resolution state of a [`SingleRef`].
#[derive(Debug, Clone)]
pub enum RefState {
	/// Key recorded, object not yet linked.
	Pending { kind: ObjectKind, key: KeyName },
	/// Linked by key lookup.
	Resolved(ObjectRef),
	/// Wraps an object directly, bypassing key lookup.
	Direct(ObjectRef),
}

struct SingleRefInner {
	target: RefTarget,
	origin: Option<Url>,
	state: RwLock<RefState>,
}

/// Shared deferred pointer to one object.
///
/// Clones share state: resolving one clone resolves all of them.
#[derive(Clone)]
pub struct SingleRef(Arc<SingleRefInner>);

impl SingleRef {
	pub(crate) fn pending(target: RefTarget, origin: Option<Url>) -> Self {
		let state = RefState::Pending {
			kind: target.kind,
			key: target.key.clone(),
		};
		Self::from_parts(target, origin, state)
	}

	pub(crate) fn resolved(target: RefTarget, origin: Option<Url>, obj: ObjectRef) -> Self {
		Self::from_parts(target, origin, RefState::Resolved(obj))
	}

	pub(crate) fn direct(obj: ObjectRef) -> Self {
		let target = RefTarget {
			kind: obj.kind(),
			category: obj.category(),
			key: obj.key_name(),
		};
		Self::from_parts(target, None, RefState::Direct(obj))
	}

	fn from_parts(target: RefTarget, origin: Option<Url>, state: RefState) -> Self {
		Self(Arc::new(SingleRefInner {
			target,
			origin,
			state: RwLock::new(state),
		}))
	}

	/// Returns the namespace and key this reference was requested for.
	pub fn target(&self) -> &RefTarget {
		&self.0.target
	}

	/// Returns the kind this reference points at.
	pub fn kind(&self) -> ObjectKind {
		self.0.target.kind
	}

	/// Returns the requested key.
	pub fn key_name(&self) -> &KeyName {
		&self.0.target.key
	}

	/// Returns the source being loaded when the reference was requested.
	pub fn origin(&self) -> Option<&Url> {
		self.0.origin.as_ref()
	}

	/// Returns a snapshot of the resolution state.
	pub fn state(&self) -> RefState {
		self.0.state.read().clone()
	}

	/// Returns the linked object, if any.
	pub fn get(&self) -> Option<ObjectRef> {
		match &*self.0.state.read() {
			RefState::Pending { .. } => None,
			RefState::Resolved(obj) | RefState::Direct(obj) => Some(obj.clone()),
		}
	}

	/// Returns true once an object is linked.
	pub fn is_resolved(&self) -> bool {
		!matches!(&*self.0.state.read(), RefState::Pending { .. })
	}

	/// Returns true for references created from an object in hand.
	pub fn is_direct(&self) -> bool {
		matches!(&*self.0.state.read(), RefState::Direct(_))
	}

	/// Returns true if both handles share the same reference.
	pub fn ptr_eq(a: &SingleRef, b: &SingleRef) -> bool {
		Arc::ptr_eq(&a.0, &b.0)
	}

	/// Links a pending reference to `obj`.
	///
	/// Returns false, leaving the reference untouched, if it was already linked.
	pub(crate) fn resolve(&self, obj: &ObjectRef) -> bool {
		let mut state = self.0.state.write();
		if let RefState::Resolved(existing) | RefState::Direct(existing) = &*state {
			if !DomainObject::same(existing, obj) {
				tracing::warn!(
					kind = %self.0.target.kind,
					key = %self.0.target.key,
					"reference already resolved to a different object; keeping the first",
				);
			}
			return false;
		}
		*state = RefState::Resolved(obj.clone());
		true
	}

	/// Describes this reference as an unconstructed miss.
	pub fn to_unresolved(&self) -> UnresolvedReference {
		UnresolvedReference {
			kind: self.0.target.kind,
			category: self.0.target.category.clone(),
			key: self.0.target.key.clone(),
			origin: self.0.origin.clone(),
		}
	}
}

impl fmt::Debug for SingleRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match &*self.0.state.read() {
			RefState::Pending { .. } => "pending",
			RefState::Resolved(_) => "resolved",
			RefState::Direct(_) => "direct",
		};
		f.debug_struct("SingleRef")
			.field("kind", &self.0.target.kind)
			.field("category", &self.0.target.category)
			.field("key", &self.0.target.key)
			.field("state", &state)
			.finish()
	}
}

impl fmt::Display for SingleRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.0.target.category {
			Some(category) => write!(f, "CATEGORY={category}|{}", self.0.target.key),
			None => write!(f, "{}", self.0.target.key),
		}
	}
}
