use grimoire_primitives::{Category, ObjectKind, TypeTag};

use super::{LoadPhase, Namespace, ReferenceContext};
use crate::error::{RegistryError, Result};
use crate::object::{AttrKey, AttrValue, DomainObject, ObjectRef};

impl ReferenceContext {
	/// Synthesizes spell and skill lists and settles sub-classes into their class
	/// categories. Runs once, after [`Self::build_deferred_objects`].
	///
	/// - Every domain gets a `Divine` [`ObjectKind::DomainSpellList`] keyed like it.
	/// - Every class gets a [`ObjectKind::ClassSkillList`] and a
	///   [`ObjectKind::ClassSpellList`] keyed like it, the spell list tagged with the
	///   class's spell type.
	/// - Every declared sub-class gets its own lists and moves into the category named
	///   after its class. If the class allows being taken as itself and no sub-class
	///   shares its key, a sub-class keyed like the class is added to that category.
	///
	/// Lists are get-or-construct, so a sub-class keyed like its class shares the
	/// class's lists.
	///
	/// # Errors
	///
	/// A failure for one owner is logged and the pass moves on to the next; every
	/// failure is returned together in [`RegistryError::DerivedObjects`].
	pub fn build_derived_objects(&self) -> Result<()> {
		self.enter_pass("derived", LoadPhase::DeferredBuilt, LoadPhase::DerivedBuilt)?;
		let mut failures = Vec::new();

		let domains = self.constructed_objects(ObjectKind::Domain);
		for domain in &domains {
			if let Err(err) = self.derive_domain(domain) {
				record_failure(&mut failures, domain, err);
			}
		}

		let classes = self.constructed_objects(ObjectKind::Class);
		for class in &classes {
			self.derive_class(class, &mut failures);
		}

		tracing::debug!(
			domains = domains.len(),
			classes = classes.len(),
			failures = failures.len(),
			"derived objects built",
		);
		if failures.is_empty() {
			Ok(())
		} else {
			Err(RegistryError::DerivedObjects { failures })
		}
	}

	fn derive_domain(&self, domain: &ObjectRef) -> Result<()> {
		let list = self.construct_now_if_necessary(ObjectKind::DomainSpellList, domain.key_name().as_str())?;
		add_type_once(&list, TypeTag::divine());
		domain.put(AttrKey::DomainSpellList, list);
		Ok(())
	}

	fn derive_class(&self, class: &ObjectRef, failures: &mut Vec<RegistryError>) {
		let key = class.key_name();
		let spell_type = class.text(&AttrKey::SpellType).map(|t| TypeTag::new(&t));
		if let Err(err) = self.derive_lists(class, spell_type.as_ref()) {
			record_failure(failures, class, err);
		}

		let declared = class.list(&AttrKey::SubClasses);
		if declared.is_empty() {
			return;
		}

		let category = Category::new(key.as_str());
		let mut need_self = class.flag(&AttrKey::AllowBaseClass);
		for value in &declared {
			let Some(sub) = subclass_of(value) else {
				tracing::warn!(
					class = %key,
					value = value.type_name(),
					"ignoring sub-class entry that is not a sub-class object",
				);
				continue;
			};
			if sub.key_name().matches(key.as_str()) {
				need_self = false;
			}
			let settled = self
				.derive_lists(&sub, spell_type.as_ref())
				.and_then(|()| self.settle_subclass(&sub, &category));
			if let Err(err) = settled {
				record_failure(failures, &sub, err);
			}
		}

		if need_self
			&& self
				.active_object_in(ObjectKind::SubClass, Some(&category), key.as_str())
				.is_none()
		{
			match self.construct_in(ObjectKind::SubClass, Some(&category), key.as_str()) {
				Ok(_) => tracing::trace!(class = %key, "constructed base sub-class"),
				Err(err) => record_failure(failures, class, err),
			}
		}
	}

	/// Gets or constructs the skill and spell lists keyed like `owner` and links the
	/// spell list into it.
	fn derive_lists(&self, owner: &ObjectRef, spell_type: Option<&TypeTag>) -> Result<()> {
		let key = owner.key_name();
		self.construct_now_if_necessary(ObjectKind::ClassSkillList, key.as_str())?;
		let spells = self.construct_now_if_necessary(ObjectKind::ClassSpellList, key.as_str())?;
		if let Some(tag) = spell_type {
			add_type_once(&spells, tag.clone());
		}
		owner.put(AttrKey::ClassSpellList, spells);
		Ok(())
	}

	/// Moves `sub` into `category`, registering it if no namespace holds it yet.
	fn settle_subclass(&self, sub: &ObjectRef, category: &Category) -> Result<()> {
		let registered = self
			.existing_manufacturer(&Namespace::of(sub))
			.is_some_and(|m| m.owns(sub));
		if registered {
			if sub.category().as_ref() == Some(category) {
				return Ok(());
			}
			return self.reassociate_category(Some(category.clone()), sub);
		}
		let Some(categorized) = sub.as_categorized() else {
			return self.import_object(sub);
		};
		let old_category = categorized.category();
		categorized.set_category(Some(category.clone()));
		let imported = self.import_object(sub);
		if imported.is_err() {
			categorized.set_category(old_category);
		}
		imported
	}
}

fn record_failure(failures: &mut Vec<RegistryError>, owner: &DomainObject, err: RegistryError) {
	tracing::warn!(
		kind = %owner.kind(),
		key = %owner.key_name(),
		%err,
		"derived objects incomplete",
	);
	failures.push(err);
}

fn subclass_of(value: &AttrValue) -> Option<ObjectRef> {
	let obj = match value {
		AttrValue::Object(obj) => Some(obj.clone()),
		AttrValue::Reference(reference) => reference.get(),
		_ => None,
	}?;
	(obj.kind() == ObjectKind::SubClass).then_some(obj)
}

fn add_type_once(obj: &DomainObject, tag: TypeTag) {
	if !obj.has_types(std::slice::from_ref(&tag)) {
		obj.add_type(tag);
	}
}
