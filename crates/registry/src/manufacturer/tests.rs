use std::sync::Arc;

use grimoire_primitives::{Category, KeyName, ObjectKind, TypeTag};
use pretty_assertions::assert_eq;

use super::Manufacturer;
use crate::error::RegistryError;
use crate::object::DomainObject;
use crate::validator::CollectingValidator;

fn skills() -> Arc<Manufacturer> {
	Arc::new(Manufacturer::new(ObjectKind::Skill, None))
}

fn sorted_keys(m: &Manufacturer) -> Vec<String> {
	let mut keys: Vec<String> = m
		.get_all_objects()
		.iter()
		.map(|obj| obj.key_name().to_string())
		.collect();
	keys.sort();
	keys
}

/// A constructed object is immediately visible and its key cannot be reused.
#[test]
fn test_construct_then_lookup_and_duplicate() {
	let m = skills();
	let climb = m.construct_object("Climb").expect("first construct");

	let found = m.get_active_object("climb").expect("case-insensitive lookup");
	assert!(DomainObject::same(&found, &climb));
	assert_eq!(found.key_name().as_str(), "Climb");

	let err = m.construct_object("CLIMB").expect_err("duplicate key");
	assert!(matches!(
		err,
		RegistryError::DuplicateKey { kind: ObjectKind::Skill, category: None, ref key } if key.as_str() == "CLIMB"
	));
	assert_eq!(m.len(), 1);
}

#[test]
fn test_blank_keys_are_rejected() {
	let m = skills();
	assert!(matches!(m.construct_object("  "), Err(RegistryError::EmptyKey { .. })));
	m.construct_if_necessary("");
	assert!(m.deferred_keys().is_empty());
}

/// Simple kinds ignore a category handed to the manufacturer.
#[test]
fn test_simple_kind_has_no_category() {
	let m = Manufacturer::new(ObjectKind::Spell, Some(Category::new("Arcane")));
	assert_eq!(m.category(), None);
	let light = m.construct_object("Light").expect("construct");
	assert_eq!(light.category(), None);
}

/// Categorized namespaces stamp their category on constructed objects.
#[test]
fn test_categorized_construct_carries_category() {
	let feat = Category::new("FEAT");
	let m = Manufacturer::new(ObjectKind::Ability, Some(feat.clone()));
	let dodge = m.construct_object("Dodge").expect("construct");
	assert_eq!(dodge.category(), Some(feat));
}

#[test]
fn test_construct_now_if_necessary_returns_existing() {
	let m = skills();
	let first = m.construct_now_if_necessary("Swim").expect("construct");
	let second = m.construct_now_if_necessary("swim").expect("existing");
	assert!(DomainObject::same(&first, &second));
	assert_eq!(m.len(), 1);
}

/// Deferred construction is idempotent and skipped for keys that become active.
#[test]
fn test_construct_if_necessary_defers() {
	let m = skills();
	m.construct_object("Jump").expect("construct");
	m.construct_if_necessary("Jump");
	m.construct_if_necessary("Hide");
	m.construct_if_necessary("HIDE");
	m.construct_if_necessary("Listen");
	assert_eq!(m.deferred_keys(), vec![KeyName::new("Hide"), KeyName::new("Listen")]);
	assert!(m.get_active_object("Hide").is_none());

	m.construct_object("Listen").expect("explicit construct wins");
	let built = m.build_deferred_objects();
	assert_eq!(built.len(), 1);
	assert_eq!(built[0].key_name().as_str(), "Hide");
	assert_eq!(sorted_keys(&m), vec!["Hide", "Jump", "Listen"]);
	assert!(m.deferred_keys().is_empty());
}

/// A reference to an existing object is resolved at once.
#[test]
fn test_reference_to_existing_is_resolved() {
	let m = skills();
	let spot = m.construct_object("Spot").expect("construct");
	let r = m.get_reference("SPOT");
	assert!(r.is_resolved());
	assert!(DomainObject::same(&r.get().expect("linked"), &spot));
	assert_eq!(m.pending_count(), 0);
}

/// Pending references are shared per key and linked by the resolution pass.
#[test]
fn test_pending_reference_resolves_after_construct() {
	let m = skills();
	let early = m.get_reference("Tumble");
	let again = m.get_reference("tumble");
	assert!(crate::SingleRef::ptr_eq(&early, &again));
	assert!(!early.is_resolved());

	let tumble = m.construct_object("Tumble").expect("construct");
	let validator = CollectingValidator::new();
	assert_eq!(m.resolve_references(&validator), 0);

	assert!(DomainObject::same(&early.get().expect("resolved"), &tumble));
	assert_eq!(validator.report_count(), 0);
	assert_eq!(m.pending_count(), 0);
}

/// A never-constructed key is reported exactly once and stays pending.
#[test]
fn test_unconstructed_reference_is_reported_once() {
	let m = skills();
	let ghost = m.get_reference("Ghost Sense");
	let _same = m.get_reference("ghost sense");

	let validator = CollectingValidator::new();
	assert_eq!(m.resolve_references(&validator), 1);

	assert!(!ghost.is_resolved());
	let misses = validator.misses();
	assert_eq!(misses.len(), 1);
	assert_eq!(misses[0].key.as_str(), "Ghost Sense");
	assert_eq!(misses[0].kind, ObjectKind::Skill);
}

/// References waiting on deferred keys are not misses; the deferred pass links them.
#[test]
fn test_deferred_keys_satisfy_pending_references() {
	let m = skills();
	let r = m.get_reference("Bluff");
	m.construct_if_necessary("Bluff");

	let validator = CollectingValidator::new();
	assert_eq!(m.resolve_references(&validator), 0);
	assert!(!r.is_resolved());

	m.build_deferred_objects();
	assert!(r.is_resolved());
	assert!(m.validate(&validator));
	assert_eq!(validator.report_count(), 0);
}

/// Renaming re-indexes the object and keeps earlier references on it.
#[test]
fn test_rename_object() {
	let m = skills();
	let old = m.construct_object("Move Silently").expect("construct");
	let before = m.get_reference("Move Silently");

	m.rename_object("Stealth", &old).expect("rename");

	assert_eq!(old.key_name().as_str(), "Stealth");
	assert!(m.get_active_object("Move Silently").is_none());
	assert!(DomainObject::same(&m.get_active_object("stealth").expect("new key"), &old));
	assert!(DomainObject::same(&before.get().expect("still resolved"), &old));

	let after = m.get_reference("Stealth");
	assert!(DomainObject::same(&after.get().expect("resolved"), &old));
}

#[test]
fn test_rename_collision_is_rejected() {
	let m = skills();
	let a = m.construct_object("Appraise").expect("construct");
	m.construct_object("Bluff").expect("construct");

	assert!(matches!(
		m.rename_object("bluff", &a),
		Err(RegistryError::DuplicateKey { .. })
	));
	assert_eq!(a.key_name().as_str(), "Appraise");

	// Changing only the case of its own key is allowed.
	m.rename_object("APPRAISE", &a).expect("case-only rename");
	assert_eq!(sorted_keys(&m), vec!["APPRAISE", "Bluff"]);
}

/// Adding the same object twice is a no-op; a different object with the key is not.
#[test]
fn test_add_object() {
	let m = skills();
	let climb = DomainObject::new(ObjectKind::Skill, "Climb");
	m.add_object(&climb).expect("add");
	m.add_object(&climb).expect("re-add is a no-op");
	assert_eq!(m.len(), 1);

	let impostor = DomainObject::new(ObjectKind::Skill, "climb");
	assert!(matches!(m.add_object(&impostor), Err(RegistryError::DuplicateKey { .. })));

	let spell = DomainObject::new(ObjectKind::Spell, "Climb");
	assert!(matches!(m.add_object(&spell), Err(RegistryError::NamespaceMismatch { .. })));
}

/// Forgotten objects stop resolving by key but earlier references keep them.
#[test]
fn test_forget_object_does_not_cascade() {
	let m = skills();
	let heal = m.construct_object("Heal").expect("construct");
	let r = m.get_reference("Heal");

	assert!(m.forget_object(&heal));
	assert!(!m.forget_object(&heal));
	assert!(m.get_active_object("Heal").is_none());
	assert!(DomainObject::same(&r.get().expect("still resolved"), &heal));

	let replacement = m.construct_object("Heal").expect("key is free again");
	assert!(!DomainObject::same(&replacement, &heal));
}

/// Group references are evaluated at use, not at creation.
#[test]
fn test_group_references_are_live() {
	let m = Arc::new(Manufacturer::new(ObjectKind::Equipment, None));
	let all = m.get_all_reference();
	let weapons = m.get_type_reference(&[TypeTag::new("Weapon")]);
	assert!(all.is_empty());
	assert!(weapons.is_resolved());

	let sword = m.construct_object("Longsword").expect("construct");
	sword.add_type(TypeTag::new("Weapon"));
	sword.add_type(TypeTag::new("Melee"));
	let rope = m.construct_object("Rope").expect("construct");
	rope.add_type(TypeTag::new("Gear"));

	assert_eq!(all.len(), 2);
	assert_eq!(weapons.len(), 1);
	assert!(weapons.contains(&sword));
	assert!(!weapons.contains(&rope));
	assert_eq!(weapons.to_string(), "TYPE=Weapon");

	m.forget_object(&sword);
	assert!(weapons.is_empty());
	assert!(!all.contains(&sword));
}

/// Validation reports every remaining miss rather than stopping at the first.
#[test]
fn test_validate_reports_all_misses() {
	let m = skills();
	m.get_reference("A");
	m.get_reference("B");
	m.get_reference("C");

	let validator = CollectingValidator::new();
	assert!(!m.validate(&validator));
	let mut keys: Vec<String> = validator.misses().iter().map(|miss| miss.key.to_string()).collect();
	keys.sort();
	assert_eq!(keys, vec!["A", "B", "C"]);

	let tolerant = |_: &crate::UnresolvedReference| true;
	assert!(m.validate(&tolerant));
}
