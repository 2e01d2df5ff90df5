//! Per-namespace object store and reference factory.
//!
//! # Purpose
//!
//! A [`Manufacturer`] owns every active object of one (kind, category) namespace,
//! the pending single references issued for keys that did not exist yet, and the keys
//! scheduled for deferred construction.
//!
//! # Mental Model
//!
//! 1. **Loading:** objects are constructed, imported, renamed and forgotten; callers
//!    request references freely, whether or not their targets exist yet.
//! 2. **Resolution:** [`Manufacturer::resolve_references`] links every pending
//!    reference whose key is now active and reports the rest to a validator.
//! 3. **Deferred construction:** [`Manufacturer::build_deferred_objects`] builds keys
//!    requested through [`Manufacturer::construct_if_necessary`] that still do not
//!    exist, linking the references that were waiting on them.
//!
//! # Invariants
//!
//! - Active keys are unique case-insensitively.
//!   - Enforced in: [`Manufacturer::construct_object`], [`Manufacturer::add_object`],
//!     [`Manufacturer::rename_object`].
//!   - Failure symptom: [`RegistryError::DuplicateKey`].
//! - A forgotten object no longer resolves by key.
//!   - Enforced in: [`Manufacturer::forget_object`].
//! - At most one pending reference exists per key.
//!   - Enforced in: [`Manufacturer::get_reference`].
//! - Misses are reported without holding the namespace lock.
//!   - Enforced in: [`Manufacturer::resolve_references`], [`Manufacturer::validate`].

use std::fmt;
use std::sync::Arc;

use grimoire_primitives::{Category, FoldedKey, KeyName, ObjectKind, TypeTag};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashMap};
use url::Url;

use crate::error::{RegistryError, Result};
use crate::object::{DomainObject, ObjectRef};
use crate::reference::{GroupFilter, GroupRef, RefTarget, SingleRef};
use crate::validator::UnconstructedValidator;

#[derive(Default)]
struct ManufacturerState {
	active: FxHashMap<FoldedKey, ObjectRef>,
	pending: FxHashMap<FoldedKey, SingleRef>,
	deferred: IndexMap<FoldedKey, KeyName, FxBuildHasher>,
}

impl ManufacturerState {
	/// Removes the active entry holding `obj`, wherever it is indexed.
	fn remove_identity(&mut self, folded: &FoldedKey, obj: &DomainObject) -> bool {
		if self
			.active
			.get(folded)
			.is_some_and(|existing| DomainObject::same(existing, obj))
		{
			self.active.remove(folded);
			return true;
		}
		let stale = self
			.active
			.iter()
			.find(|(_, existing)| DomainObject::same(existing, obj))
			.map(|(key, _)| key.clone());
		match stale {
			Some(key) => {
				self.active.remove(&key);
				true
			}
			None => false,
		}
	}

	/// Links every pending reference whose key is active.
	fn link_pending(&mut self) -> usize {
		let active = &self.active;
		let before = self.pending.len();
		self.pending.retain(|folded, reference| match active.get(folded) {
			Some(obj) => {
				reference.resolve(obj);
				false
			}
			None => true,
		});
		before - self.pending.len()
	}
}

/// Owns the objects and outstanding references of one (kind, category) namespace.
pub struct Manufacturer {
	kind: ObjectKind,
	category: Option<Category>,
	state: Mutex<ManufacturerState>,
}

impl Manufacturer {
	/// Creates an empty manufacturer. The category is dropped for simple kinds.
	pub fn new(kind: ObjectKind, category: Option<Category>) -> Self {
		let category = if kind.is_categorized() { category } else { None };
		Self {
			kind,
			category,
			state: Mutex::new(ManufacturerState::default()),
		}
	}

	/// Returns the kind of this namespace.
	pub fn kind(&self) -> ObjectKind {
		self.kind
	}

	/// Returns the category of this namespace.
	pub fn category(&self) -> Option<&Category> {
		self.category.as_ref()
	}

	fn target(&self, key: KeyName) -> RefTarget {
		RefTarget {
			kind: self.kind,
			category: self.category.clone(),
			key,
		}
	}

	fn duplicate(&self, key: KeyName) -> RegistryError {
		RegistryError::DuplicateKey {
			kind: self.kind,
			category: self.category.clone(),
			key,
		}
	}

	fn checked_key(&self, key: &str) -> Result<KeyName> {
		let key = KeyName::new(key);
		if key.is_blank() {
			return Err(RegistryError::EmptyKey { kind: self.kind });
		}
		Ok(key)
	}

	/// Constructs and registers a new object.
	///
	/// # Errors
	///
	/// [`RegistryError::DuplicateKey`] if an active object already holds `key`, and
	/// [`RegistryError::EmptyKey`] for blank keys.
	pub fn construct_object(&self, key: &str) -> Result<ObjectRef> {
		let key = self.checked_key(key)?;
		let folded = key.folded();
		let mut state = self.state.lock();
		if state.active.contains_key(&folded) {
			return Err(self.duplicate(key));
		}
		let obj = DomainObject::with_category(self.kind, self.category.clone(), key.as_str());
		state.deferred.shift_remove(&folded);
		state.active.insert(folded, obj.clone());
		tracing::trace!(kind = %self.kind, category = ?self.category, key = %key, "constructed");
		Ok(obj)
	}

	/// Schedules `key` for construction by [`Self::build_deferred_objects`] unless it
	/// is already active or scheduled.
	pub fn construct_if_necessary(&self, key: &str) {
		let key = match self.checked_key(key) {
			Ok(key) => key,
			Err(err) => {
				tracing::warn!(%err, "ignoring deferred construction");
				return;
			}
		};
		let folded = key.folded();
		let mut state = self.state.lock();
		if state.active.contains_key(&folded) || state.deferred.contains_key(&folded) {
			return;
		}
		state.deferred.insert(folded, key);
	}

	/// Returns the active object for `key`, constructing it first if necessary.
	pub fn construct_now_if_necessary(&self, key: &str) -> Result<ObjectRef> {
		let key = self.checked_key(key)?;
		let folded = key.folded();
		let mut state = self.state.lock();
		if let Some(existing) = state.active.get(&folded) {
			return Ok(existing.clone());
		}
		let obj = DomainObject::with_category(self.kind, self.category.clone(), key.as_str());
		state.deferred.shift_remove(&folded);
		state.active.insert(folded, obj.clone());
		Ok(obj)
	}

	/// Returns a reference to `key`.
	///
	/// The reference is already resolved when the object is active; otherwise the
	/// namespace's pending reference for that key is returned, created on first request.
	pub fn get_reference(&self, key: &str) -> SingleRef {
		self.reference_from(key, None)
	}

	pub(crate) fn reference_from(&self, key: &str, origin: Option<Url>) -> SingleRef {
		let key = KeyName::new(key);
		let folded = key.folded();
		let mut state = self.state.lock();
		if let Some(obj) = state.active.get(&folded).cloned() {
			if let Some(pending) = state.pending.remove(&folded) {
				pending.resolve(&obj);
				return pending;
			}
			return SingleRef::resolved(self.target(key), origin, obj);
		}
		state
			.pending
			.entry(folded)
			.or_insert_with(|| SingleRef::pending(self.target(key), origin))
			.clone()
	}

	/// Returns the active object for `key` without constructing anything.
	pub fn get_active_object(&self, key: &str) -> Option<ObjectRef> {
		self.state.lock().active.get(&FoldedKey::new(key)).cloned()
	}

	/// Returns true if an active object holds `key`.
	pub fn contains_object(&self, key: &str) -> bool {
		self.state.lock().active.contains_key(&FoldedKey::new(key))
	}

	/// Returns true if `obj` itself is active here.
	pub fn owns(&self, obj: &DomainObject) -> bool {
		let folded = obj.folded_key();
		let state = self.state.lock();
		state
			.active
			.get(&folded)
			.is_some_and(|existing| DomainObject::same(existing, obj))
			|| state.active.values().any(|existing| DomainObject::same(existing, obj))
	}

	/// Returns a live reference over every active object.
	pub fn get_all_reference(self: &Arc<Self>) -> GroupRef {
		GroupRef::new(self.clone(), GroupFilter::All)
	}

	/// Returns a live reference over active objects carrying all of `tags`.
	pub fn get_type_reference(self: &Arc<Self>, tags: &[TypeTag]) -> GroupRef {
		GroupRef::new(self.clone(), GroupFilter::Types(tags.to_vec()))
	}

	/// Re-keys `obj` to `new_key` and updates its key name.
	///
	/// References already resolved to `obj` keep pointing at it.
	///
	/// # Errors
	///
	/// [`RegistryError::DuplicateKey`] if a different active object holds `new_key`.
	pub fn rename_object(&self, new_key: &str, obj: &ObjectRef) -> Result<()> {
		let new_key = self.checked_key(new_key)?;
		let new_folded = new_key.folded();
		let old_key = obj.key_name();
		let old_folded = old_key.folded();

		let mut state = self.state.lock();
		if let Some(existing) = state.active.get(&new_folded)
			&& !DomainObject::same(existing, obj)
		{
			return Err(self.duplicate(new_key));
		}
		if !state.remove_identity(&old_folded, obj) {
			tracing::warn!(
				kind = %self.kind,
				category = ?self.category,
				old = %old_key,
				new = %new_key,
				"renaming an object this namespace does not hold; registering it",
			);
		}
		obj.set_key_name(new_key);
		state.active.insert(new_folded, obj.clone());
		Ok(())
	}

	/// Registers a pre-built object under its current key.
	///
	/// Adding an object that is already registered here is a no-op.
	///
	/// # Errors
	///
	/// [`RegistryError::NamespaceMismatch`] if the object's kind or category differ from
	/// this namespace, [`RegistryError::DuplicateKey`] if a different object holds its key.
	pub fn add_object(&self, obj: &ObjectRef) -> Result<()> {
		let key = obj.key_name();
		let object_category = obj.category();
		if obj.kind() != self.kind || object_category != self.category {
			return Err(RegistryError::NamespaceMismatch {
				kind: self.kind,
				category: self.category.clone(),
				object_kind: obj.kind(),
				object_category,
				key,
			});
		}
		if key.is_blank() {
			return Err(RegistryError::EmptyKey { kind: self.kind });
		}
		let folded = key.folded();
		let mut state = self.state.lock();
		if let Some(existing) = state.active.get(&folded) {
			if DomainObject::same(existing, obj) {
				return Ok(());
			}
			return Err(self.duplicate(key));
		}
		state.deferred.shift_remove(&folded);
		state.active.insert(folded, obj.clone());
		Ok(())
	}

	/// Removes `obj`, returning whether it was active here.
	///
	/// References already resolved to `obj` are left pointing at it.
	pub fn forget_object(&self, obj: &DomainObject) -> bool {
		let folded = obj.folded_key();
		self.state.lock().remove_identity(&folded, obj)
	}

	/// Links pending references to active objects and reports the rest.
	///
	/// Keys scheduled for deferred construction stay pending without a report. Returns
	/// the number of misses reported to `validator`.
	pub fn resolve_references(&self, validator: &dyn UnconstructedValidator) -> usize {
		let (linked, misses) = {
			let mut state = self.state.lock();
			let linked = state.link_pending();
			let misses: Vec<SingleRef> = state
				.pending
				.iter()
				.filter(|(folded, _)| !state.deferred.contains_key(*folded))
				.map(|(_, reference)| reference.clone())
				.collect();
			(linked, misses)
		};
		for reference in &misses {
			validator.report(&reference.to_unresolved());
		}
		tracing::debug!(
			kind = %self.kind,
			category = ?self.category,
			linked,
			unresolved = misses.len(),
			"resolved references",
		);
		misses.len()
	}

	/// Constructs every scheduled key that is still absent and links the references
	/// waiting on it. Returns the objects built.
	pub fn build_deferred_objects(&self) -> Vec<ObjectRef> {
		let mut state = self.state.lock();
		let deferred = std::mem::take(&mut state.deferred);
		let mut built = Vec::new();
		for (folded, key) in deferred {
			if state.active.contains_key(&folded) {
				continue;
			}
			let obj = DomainObject::with_category(self.kind, self.category.clone(), key.as_str());
			state.active.insert(folded, obj.clone());
			built.push(obj);
		}
		let linked = state.link_pending();
		if !built.is_empty() || linked > 0 {
			tracing::debug!(
				kind = %self.kind,
				category = ?self.category,
				built = built.len(),
				linked,
				"built deferred objects",
			);
		}
		built
	}

	/// Returns every active object in unspecified order.
	pub fn get_all_objects(&self) -> Vec<ObjectRef> {
		self.state.lock().active.values().cloned().collect()
	}

	/// Returns the number of active objects.
	pub fn len(&self) -> usize {
		self.state.lock().active.len()
	}

	/// Returns true if no object is active.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the number of references still pending.
	pub fn pending_count(&self) -> usize {
		self.state.lock().pending.len()
	}

	/// Returns the keys scheduled for deferred construction, in request order.
	pub fn deferred_keys(&self) -> Vec<KeyName> {
		self.state.lock().deferred.values().cloned().collect()
	}

	/// Reports every reference still pending.
	///
	/// Every pending reference is reported even after a failure. Returns false if any
	/// report was not tolerated.
	pub fn validate(&self, validator: &dyn UnconstructedValidator) -> bool {
		let pending: Vec<SingleRef> = self.state.lock().pending.values().cloned().collect();
		let mut all_good = true;
		for reference in pending.iter().filter(|reference| !reference.is_resolved()) {
			all_good &= validator.report(&reference.to_unresolved());
		}
		all_good
	}
}

impl fmt::Debug for Manufacturer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("Manufacturer")
			.field("kind", &self.kind)
			.field("category", &self.category)
			.field("active", &state.active.len())
			.field("pending", &state.pending.len())
			.field("deferred", &state.deferred.len())
			.finish()
	}
}

#[cfg(test)]
mod tests;
