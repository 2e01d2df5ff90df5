//! Integration tests for a full load cycle.
//!
//! These tests drive the public surface the way a rules loader does: construct and
//! cross-reference objects from several sources, run the three passes, then validate
//! against a configured allow-list.

use std::sync::Arc;

use grimoire_registry::{
	AttrKey, Category, CollectingValidator, DomainObject, LoadPhase, ObjectKind, ReferenceContext,
	RegistryConfig, TypeTag,
};
use url::Url;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_full_load_cycle() {
	init_tracing();
	let config = RegistryConfig::from_toml_str(
		r#"
		[unconstructed]
		allow = [{ kind = "deity", key = "Nerull" }]
		"#,
	)
	.unwrap();
	let validator = Arc::new(CollectingValidator::with_policy(config.unconstructed));
	let ctx = ReferenceContext::builder()
		.validator(validator.clone())
		.extract_uri(Url::parse("file:///data/srd.zip").unwrap())
		.build();

	// Classes reference skills and deities that are loaded later (or never).
	ctx.set_source_uri(Some(Url::parse("file:///data/srd/classes.lst").unwrap()));
	let cleric = ctx.construct(ObjectKind::Class, "Cleric").unwrap();
	cleric.put(AttrKey::SpellType, "Divine");
	cleric.put(AttrKey::AllowBaseClass, true);
	let concentration = ctx.reference(ObjectKind::Skill, "Concentration");
	cleric.put(AttrKey::custom("class_skill"), concentration.clone());
	let patron = ctx.reference(ObjectKind::Deity, "Pelor");
	let forbidden = ctx.reference(ObjectKind::Deity, "Nerull");
	let missing = ctx.reference(ObjectKind::Deity, "Vecna");
	let feats = ctx.all_reference_in(ObjectKind::Ability, Some(&Category::new("FEAT")));

	let crusader = DomainObject::new(ObjectKind::SubClass, "Crusader");
	cleric.add_to_list(AttrKey::SubClasses, crusader.clone());
	ctx.construct_if_necessary(ObjectKind::WeaponProf, "Heavy Mace");

	ctx.set_source_uri(Some(Url::parse("file:///data/srd/skills.lst").unwrap()));
	let skill = ctx.construct(ObjectKind::Skill, "concentration").unwrap();
	ctx.register_abbreviation(&skill, "CON");

	ctx.set_source_uri(Some(Url::parse("file:///data/srd/deities.lst").unwrap()));
	ctx.construct(ObjectKind::Deity, "Pelor").unwrap();
	ctx.construct(ObjectKind::Domain, "Sun").unwrap();

	ctx.set_source_uri(Some(Url::parse("file:///data/srd/feats.lst").unwrap()));
	let feat = Category::new("FEAT");
	ctx.construct_in(ObjectKind::Ability, Some(&feat), "Turn Undead").unwrap();
	ctx.construct_in(ObjectKind::Ability, Some(&feat), "Extra Turning").unwrap();
	ctx.set_source_uri(None);

	assert_eq!(ctx.resolve_references().unwrap(), 2);
	assert_eq!(ctx.phase(), LoadPhase::Resolved);
	assert_eq!(ctx.build_deferred_objects().unwrap(), 1);
	ctx.build_derived_objects().unwrap();

	assert!(DomainObject::same(&concentration.get().unwrap(), &skill));
	assert!(patron.is_resolved());
	assert!(!forbidden.is_resolved());
	assert!(!missing.is_resolved());
	assert_eq!(feats.len(), 2);
	assert_eq!(
		skill.source_uri().map(|url| url.to_string()).as_deref(),
		Some("file:///data/srd/skills.lst")
	);
	assert!(ctx.contains_object(ObjectKind::WeaponProf, "heavy mace"));

	// Only the miss outside the allow-list fails validation.
	let misses = validator.misses();
	assert_eq!(misses.len(), 1);
	assert_eq!(misses[0].key.as_str(), "Vecna");
	assert_eq!(
		misses[0].origin.as_ref().map(Url::as_str),
		Some("file:///data/srd/classes.lst")
	);
	assert_eq!(validator.tolerated().len(), 1);

	// Derived objects.
	let sun = ctx.active_object(ObjectKind::Domain, "Sun").unwrap();
	let sun_list = sun.object(&AttrKey::DomainSpellList).unwrap();
	assert!(sun_list.has_types(&[TypeTag::divine()]));
	let clerics = Category::new("Cleric");
	let subs = ctx.constructed_objects_in(ObjectKind::SubClass, Some(&clerics));
	assert_eq!(subs.len(), 2);
	assert!(subs.iter().any(|sub| DomainObject::same(sub, &crusader)));
	assert!(
		ctx.active_object_in(ObjectKind::SubClass, Some(&clerics), "Cleric")
			.is_some()
	);
	assert_eq!(
		ctx.object_by_abbreviation(ObjectKind::Skill, "CON")
			.map(|obj| obj.key_name().to_string())
			.as_deref(),
		Some("concentration")
	);
}

#[test]
fn test_validate_after_cycle_reports_every_miss() {
	init_tracing();
	let ctx = ReferenceContext::with_validator(Arc::new(|_: &grimoire_registry::UnresolvedReference| true));
	for key in ["Orcish", "Draconic", "Sylvan"] {
		ctx.reference(ObjectKind::Language, key);
	}
	ctx.construct(ObjectKind::Language, "Sylvan").unwrap();

	assert_eq!(ctx.resolve_references().unwrap(), 2);
	ctx.build_deferred_objects().unwrap();
	ctx.build_derived_objects().unwrap();

	let collector = CollectingValidator::new();
	assert!(!ctx.validate(&collector));
	let mut keys: Vec<String> = collector.misses().iter().map(|miss| miss.key.to_string()).collect();
	keys.sort();
	assert_eq!(keys, vec!["Draconic", "Orcish"]);
}
