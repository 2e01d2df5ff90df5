//! Reference context: the entry point of the registry.
//!
//! # Purpose
//!
//! [`ReferenceContext`] routes every request to the [`Manufacturer`] of its
//! (kind, category) namespace, keeps the cross-cutting indices (abbreviations and
//! direct references), stamps provenance on constructed objects and drives the global
//! passes that finish a load cycle.
//!
//! # Mental Model
//!
//! 1. **Loading:** loaders construct, import, rename, recategorize and forget objects
//!    and request references whether or not their targets exist yet.
//! 2. **Resolve:** [`ReferenceContext::resolve_references`] links pending references in
//!    every namespace and reports misses to the installed validator.
//! 3. **Deferred:** [`ReferenceContext::build_deferred_objects`] builds objects that
//!    were requested through `construct_if_necessary`.
//! 4. **Derived:** [`ReferenceContext::build_derived_objects`] synthesizes spell and
//!    skill lists and settles sub-classes into their class categories.
//!
//! # Invariants
//!
//! - The three passes run once each, in order.
//!   - Enforced in: `ReferenceContext::enter_pass`.
//!   - Failure symptom: [`RegistryError::OutOfOrderPass`].
//! - Namespaces resolve independently; fan-out order is unspecified and irrelevant.
//! - Direct references are cached by object identity across the whole context.
//!   - Enforced in: [`ReferenceContext::direct_reference`].
//!
//! # Concurrency
//!
//! Tables are individually locked and never held while calling into a manufacturer's
//! resolution or a validator. A context belongs to one load cycle and is never reset.

mod derived;

use std::fmt;
use std::sync::Arc;

use grimoire_primitives::{Category, ObjectKind, TypeTag};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use url::Url;

use crate::abbreviation::AbbreviationTable;
use crate::error::{RegistryError, Result};
use crate::manufacturer::Manufacturer;
use crate::object::{AttrKey, DomainObject, ObjectId, ObjectRef};
use crate::reference::{GroupRef, SingleRef};
use crate::validator::{LoggingValidator, UnconstructedValidator};

/// A (kind, category) namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
	pub kind: ObjectKind,
	pub category: Option<Category>,
}

impl Namespace {
	/// Creates a namespace, dropping the category of simple kinds.
	pub fn new(kind: ObjectKind, category: Option<Category>) -> Self {
		if !kind.is_categorized() && category.is_some() {
			tracing::warn!(%kind, ?category, "category ignored for uncategorized kind");
			return Self { kind, category: None };
		}
		Self { kind, category }
	}

	/// Returns the namespace `obj` currently belongs to.
	pub fn of(obj: &DomainObject) -> Self {
		Self {
			kind: obj.kind(),
			category: obj.category(),
		}
	}
}

/// Progress of a load cycle through the global passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
	/// Objects and references are being loaded.
	Loading,
	/// References have been resolved.
	Resolved,
	/// Deferred objects have been built.
	DeferredBuilt,
	/// Derived objects have been built; the cycle is complete.
	DerivedBuilt,
}

impl fmt::Display for LoadPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Loading => write!(f, "loading"),
			Self::Resolved => write!(f, "resolved"),
			Self::DeferredBuilt => write!(f, "deferred-built"),
			Self::DerivedBuilt => write!(f, "derived-built"),
		}
	}
}

#[derive(Debug, Clone, Default)]
struct Provenance {
	source: Option<Url>,
	extract: Option<Url>,
}

/// Builder for [`ReferenceContext`].
#[derive(Default)]
pub struct ContextBuilder {
	validator: Option<Arc<dyn UnconstructedValidator>>,
	provenance: Provenance,
}

impl ContextBuilder {
	/// Installs the validator the resolution pass reports misses to.
	pub fn validator(mut self, validator: Arc<dyn UnconstructedValidator>) -> Self {
		self.validator = Some(validator);
		self
	}

	/// Sets the initial source location.
	pub fn source_uri(mut self, uri: Url) -> Self {
		self.provenance.source = Some(uri);
		self
	}

	/// Sets the initial extraction location.
	pub fn extract_uri(mut self, uri: Url) -> Self {
		self.provenance.extract = Some(uri);
		self
	}

	/// Builds the context.
	pub fn build(self) -> ReferenceContext {
		ReferenceContext {
			manufacturers: RwLock::default(),
			abbreviations: Mutex::default(),
			direct_refs: Mutex::default(),
			provenance: RwLock::new(self.provenance),
			validator: self.validator.unwrap_or_else(|| Arc::new(LoggingValidator)),
			phase: Mutex::new(LoadPhase::Loading),
		}
	}
}

/// Registry of every object loaded for one ruleset.
pub struct ReferenceContext {
	manufacturers: RwLock<FxHashMap<Namespace, Arc<Manufacturer>>>,
	abbreviations: Mutex<AbbreviationTable>,
	direct_refs: Mutex<FxHashMap<ObjectId, SingleRef>>,
	provenance: RwLock<Provenance>,
	validator: Arc<dyn UnconstructedValidator>,
	phase: Mutex<LoadPhase>,
}

impl Default for ReferenceContext {
	fn default() -> Self {
		Self::new()
	}
}

impl ReferenceContext {
	/// Creates a context that logs unconstructed references.
	pub fn new() -> Self {
		ContextBuilder::default().build()
	}

	/// Creates a context that reports unconstructed references to `validator`.
	pub fn with_validator(validator: Arc<dyn UnconstructedValidator>) -> Self {
		ContextBuilder::default().validator(validator).build()
	}

	/// Returns a builder.
	pub fn builder() -> ContextBuilder {
		ContextBuilder::default()
	}

	/// Returns the current load phase.
	pub fn phase(&self) -> LoadPhase {
		*self.phase.lock()
	}

	fn enter_pass(&self, pass: &'static str, from: LoadPhase, to: LoadPhase) -> Result<()> {
		let mut phase = self.phase.lock();
		if *phase != from {
			return Err(RegistryError::OutOfOrderPass {
				pass,
				phase: *phase,
			});
		}
		*phase = to;
		Ok(())
	}

	/// Returns the manufacturer of the implicit namespace of `kind`.
	pub fn manufacturer(&self, kind: ObjectKind) -> Arc<Manufacturer> {
		self.manufacturer_in(kind, None)
	}

	/// Returns the manufacturer of `(kind, category)`, creating it on first use.
	pub fn manufacturer_in(&self, kind: ObjectKind, category: Option<&Category>) -> Arc<Manufacturer> {
		let namespace = Namespace::new(kind, category.cloned());
		{
			let manufacturers = self.manufacturers.read();
			if let Some(existing) = manufacturers.get(&namespace) {
				return existing.clone();
			}
		}
		self.manufacturers
			.write()
			.entry(namespace)
			.or_insert_with_key(|ns| Arc::new(Manufacturer::new(ns.kind, ns.category.clone())))
			.clone()
	}

	fn existing_manufacturer(&self, namespace: &Namespace) -> Option<Arc<Manufacturer>> {
		self.manufacturers.read().get(namespace).cloned()
	}

	/// Returns every manufacturer created so far, in unspecified order.
	pub fn manufacturers(&self) -> Vec<Arc<Manufacturer>> {
		self.manufacturers.read().values().cloned().collect()
	}

	/// Returns the current source location.
	pub fn source_uri(&self) -> Option<Url> {
		self.provenance.read().source.clone()
	}

	/// Sets the source location stamped on objects constructed from now on.
	pub fn set_source_uri(&self, uri: Option<Url>) {
		self.provenance.write().source = uri;
	}

	/// Returns the current extraction location.
	pub fn extract_uri(&self) -> Option<Url> {
		self.provenance.read().extract.clone()
	}

	/// Sets the extraction location.
	pub fn set_extract_uri(&self, uri: Option<Url>) {
		self.provenance.write().extract = uri;
	}

	fn stamp(&self, obj: &DomainObject) {
		if let Some(uri) = self.source_uri() {
			obj.put(AttrKey::SourceUri, uri);
		}
	}

	/// Constructs an object in the implicit namespace of `kind`.
	///
	/// Categorized kinds are constructed without a category; move them with
	/// [`Self::reassociate_category`] once it is known.
	pub fn construct(&self, kind: ObjectKind, key: &str) -> Result<ObjectRef> {
		self.construct_in(kind, None, key)
	}

	/// Constructs an object in `(kind, category)` and stamps its source location.
	pub fn construct_in(&self, kind: ObjectKind, category: Option<&Category>, key: &str) -> Result<ObjectRef> {
		let obj = self.manufacturer_in(kind, category).construct_object(key)?;
		self.stamp(&obj);
		Ok(obj)
	}

	/// Schedules `key` for construction during [`Self::build_deferred_objects`].
	pub fn construct_if_necessary(&self, kind: ObjectKind, key: &str) {
		self.manufacturer(kind).construct_if_necessary(key);
	}

	/// Returns the active object for `key`, constructing it now if necessary.
	///
	/// Only a freshly constructed object is stamped with the current source location.
	pub fn construct_now_if_necessary(&self, kind: ObjectKind, key: &str) -> Result<ObjectRef> {
		let manufacturer = self.manufacturer(kind);
		if let Some(existing) = manufacturer.get_active_object(key) {
			return Ok(existing);
		}
		let obj = manufacturer.construct_object(key)?;
		self.stamp(&obj);
		Ok(obj)
	}

	/// Returns a single reference to `key` in the implicit namespace of `kind`.
	pub fn reference(&self, kind: ObjectKind, key: &str) -> SingleRef {
		self.reference_in(kind, None, key)
	}

	/// Returns a single reference to `key` in `(kind, category)`.
	pub fn reference_in(&self, kind: ObjectKind, category: Option<&Category>, key: &str) -> SingleRef {
		self.manufacturer_in(kind, category)
			.reference_from(key, self.source_uri())
	}

	/// Returns a live reference over every object of `kind`.
	pub fn all_reference(&self, kind: ObjectKind) -> GroupRef {
		self.manufacturer(kind).get_all_reference()
	}

	/// Returns a live reference over every object of `(kind, category)`.
	pub fn all_reference_in(&self, kind: ObjectKind, category: Option<&Category>) -> GroupRef {
		self.manufacturer_in(kind, category).get_all_reference()
	}

	/// Returns a live reference over objects of `kind` carrying all of `tags`.
	pub fn type_reference(&self, kind: ObjectKind, tags: &[TypeTag]) -> GroupRef {
		self.manufacturer(kind).get_type_reference(tags)
	}

	/// Returns a live reference over objects of `(kind, category)` carrying all of `tags`.
	pub fn type_reference_in(&self, kind: ObjectKind, category: Option<&Category>, tags: &[TypeTag]) -> GroupRef {
		self.manufacturer_in(kind, category).get_type_reference(tags)
	}

	/// Looks up an active object without constructing anything.
	pub fn active_object(&self, kind: ObjectKind, key: &str) -> Option<ObjectRef> {
		self.active_object_in(kind, None, key)
	}

	/// Looks up an active object in `(kind, category)` without constructing anything.
	pub fn active_object_in(&self, kind: ObjectKind, category: Option<&Category>, key: &str) -> Option<ObjectRef> {
		let namespace = Namespace::new(kind, category.cloned());
		self.existing_manufacturer(&namespace)?.get_active_object(key)
	}

	/// Returns true if an active object of `kind` holds `key`.
	pub fn contains_object(&self, kind: ObjectKind, key: &str) -> bool {
		self.active_object(kind, key).is_some()
	}

	/// Returns the active objects of the implicit namespace of `kind`.
	pub fn constructed_objects(&self, kind: ObjectKind) -> Vec<ObjectRef> {
		self.constructed_objects_in(kind, None)
	}

	/// Returns the active objects of `(kind, category)`.
	pub fn constructed_objects_in(&self, kind: ObjectKind, category: Option<&Category>) -> Vec<ObjectRef> {
		let namespace = Namespace::new(kind, category.cloned());
		self.existing_manufacturer(&namespace)
			.map(|m| m.get_all_objects())
			.unwrap_or_default()
	}

	/// Returns every active object of every namespace.
	pub fn all_constructed_objects(&self) -> Vec<ObjectRef> {
		let mut seen = FxHashSet::default();
		let mut all = Vec::new();
		for manufacturer in self.manufacturers() {
			for obj in manufacturer.get_all_objects() {
				if seen.insert(obj.id()) {
					all.push(obj);
				}
			}
		}
		all
	}

	/// Renames `obj` within the namespace it belongs to.
	pub fn reassociate_key(&self, new_key: &str, obj: &ObjectRef) -> Result<()> {
		let namespace = Namespace::of(obj);
		self.manufacturer_in(namespace.kind, namespace.category.as_ref())
			.rename_object(new_key, obj)
	}

	/// Moves a categorized object from its current namespace to `(kind, new_category)`.
	///
	/// Moving to the category the object already has is logged and still performed.
	/// References resolved before the move keep pointing at the object.
	///
	/// # Errors
	///
	/// [`RegistryError::NotCategorized`] for objects of simple kinds, and any error of
	/// adding the object to the new namespace, in which case the object is restored to
	/// its old namespace.
	pub fn reassociate_category(&self, new_category: Option<Category>, obj: &ObjectRef) -> Result<()> {
		let Some(categorized) = obj.as_categorized() else {
			return Err(RegistryError::NotCategorized {
				kind: obj.kind(),
				key: obj.key_name(),
			});
		};
		let old_category = categorized.category();
		if old_category == new_category {
			tracing::warn!(
				kind = %obj.kind(),
				key = %obj.key_name(),
				category = ?old_category,
				"worthless category change",
			);
		}

		let from = self.manufacturer_in(obj.kind(), old_category.as_ref());
		let to = self.manufacturer_in(obj.kind(), new_category.as_ref());
		let was_registered = from.forget_object(obj);
		categorized.set_category(new_category);
		if let Err(err) = to.add_object(obj) {
			categorized.set_category(old_category);
			if was_registered && let Err(restore) = from.add_object(obj) {
				tracing::error!(%restore, "failed to restore object after rejected category change");
			}
			return Err(err);
		}
		Ok(())
	}

	/// Registers a pre-built object in the namespace given by its kind and category.
	pub fn import_object(&self, obj: &ObjectRef) -> Result<()> {
		let namespace = Namespace::of(obj);
		self.manufacturer_in(namespace.kind, namespace.category.as_ref())
			.add_object(obj)
	}

	/// Drops `obj` from the abbreviation table and its namespace.
	///
	/// Returns whether the namespace held it. References already resolved to `obj`
	/// are not invalidated.
	pub fn forget(&self, obj: &ObjectRef) -> bool {
		self.abbreviations.lock().forget(obj);
		self.existing_manufacturer(&Namespace::of(obj))
			.is_some_and(|m| m.forget_object(obj))
	}

	/// Returns the reference wrapping `obj` directly, created on first request.
	pub fn direct_reference(&self, obj: &ObjectRef) -> SingleRef {
		self.direct_refs
			.lock()
			.entry(obj.id())
			.or_insert_with(|| SingleRef::direct(obj.clone()))
			.clone()
	}

	/// Labels `obj` with `label`, replacing any previous mapping on either side.
	pub fn register_abbreviation(&self, obj: &ObjectRef, label: &str) {
		let displaced = self.abbreviations.lock().register(obj, label);
		if let Some(displaced) = displaced {
			displaced.attrs_mut().remove(&AttrKey::Abbreviation);
		}
		obj.put(AttrKey::Abbreviation, label);
	}

	/// Returns the label of `obj`.
	pub fn abbreviation(&self, obj: &DomainObject) -> Option<String> {
		self.abbreviations.lock().abbreviation(obj).map(str::to_string)
	}

	/// Returns the object of `kind` labelled `label`.
	pub fn object_by_abbreviation(&self, kind: ObjectKind, label: &str) -> Option<ObjectRef> {
		self.abbreviations.lock().object(kind, label).cloned()
	}

	/// Links pending references in every namespace, reporting misses to the installed
	/// validator. Returns the number of misses.
	pub fn resolve_references(&self) -> Result<usize> {
		self.enter_pass("resolve", LoadPhase::Loading, LoadPhase::Resolved)?;
		let misses: usize = self
			.manufacturers()
			.iter()
			.map(|m| m.resolve_references(self.validator.as_ref()))
			.sum();
		tracing::debug!(misses, "reference resolution complete");
		Ok(misses)
	}

	/// Builds deferred objects in every namespace. Returns the number built.
	pub fn build_deferred_objects(&self) -> Result<usize> {
		self.enter_pass("deferred", LoadPhase::Resolved, LoadPhase::DeferredBuilt)?;
		let built: usize = self
			.manufacturers()
			.iter()
			.map(|m| m.build_deferred_objects().len())
			.sum();
		tracing::debug!(built, "deferred construction complete");
		Ok(built)
	}

	/// Reports every unresolved reference of every namespace to `validator`.
	///
	/// Returns false if any report was not tolerated.
	pub fn validate(&self, validator: &dyn UnconstructedValidator) -> bool {
		self.manufacturers()
			.iter()
			.fold(true, |all_good, m| m.validate(validator) & all_good)
	}
}

impl fmt::Debug for ReferenceContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReferenceContext")
			.field("namespaces", &self.manufacturers.read().len())
			.field("phase", &self.phase())
			.field("provenance", &*self.provenance.read())
			.finish()
	}
}
