use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether objects of a kind carry their own [`crate::Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Categorization {
	/// Objects live in the single implicit namespace of their kind.
	Simple,
	/// Objects carry a mutable category that selects their namespace.
	Categorized,
}

/// Stable identifier for the runtime type of a registry object.
///
/// Manufacturers are keyed by kind, so adding a variant here is all that is needed
/// to make a new object type constructible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
	/// Feats and other abilities, partitioned by ability category.
	Ability,
	/// Character class.
	Class,
	/// Derived list of class skills, one per class or sub-class.
	ClassSkillList,
	/// Derived list of class spells, one per class or sub-class.
	ClassSpellList,
	/// Deity a character may worship.
	Deity,
	/// Clerical domain granting spells and powers.
	Domain,
	/// Derived list of domain spells, one per domain.
	DomainSpellList,
	/// Gear, weapons and armor.
	Equipment,
	/// Spoken or written language.
	Language,
	/// Character race.
	Race,
	/// Trained skill.
	Skill,
	/// Individual spell.
	Spell,
	/// Class specialization, partitioned by the owning class key.
	SubClass,
	/// Template applied on top of a race.
	Template,
	/// Weapon proficiency.
	WeaponProf,
}

impl ObjectKind {
	/// Every kind, in declaration order.
	pub const ALL: &'static [ObjectKind] = &[
		Self::Ability,
		Self::Class,
		Self::ClassSkillList,
		Self::ClassSpellList,
		Self::Deity,
		Self::Domain,
		Self::DomainSpellList,
		Self::Equipment,
		Self::Language,
		Self::Race,
		Self::Skill,
		Self::Spell,
		Self::SubClass,
		Self::Template,
		Self::WeaponProf,
	];

	/// Returns the categorization capability of this kind.
	pub const fn categorization(self) -> Categorization {
		match self {
			Self::Ability | Self::SubClass => Categorization::Categorized,
			_ => Categorization::Simple,
		}
	}

	/// Returns true if objects of this kind carry a category.
	pub const fn is_categorized(self) -> bool {
		matches!(self.categorization(), Categorization::Categorized)
	}

	/// Returns the snake_case name of this kind.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Ability => "ability",
			Self::Class => "class",
			Self::ClassSkillList => "class_skill_list",
			Self::ClassSpellList => "class_spell_list",
			Self::Deity => "deity",
			Self::Domain => "domain",
			Self::DomainSpellList => "domain_spell_list",
			Self::Equipment => "equipment",
			Self::Language => "language",
			Self::Race => "race",
			Self::Skill => "skill",
			Self::Spell => "spell",
			Self::SubClass => "sub_class",
			Self::Template => "template",
			Self::WeaponProf => "weapon_prof",
		}
	}
}

impl fmt::Display for ObjectKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Error returned when parsing an unknown kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown object kind: {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for ObjectKind {
	type Err = UnknownKind;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.iter()
			.copied()
			.find(|kind| kind.name().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnknownKind(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_name_round_trips_through_from_str() {
		for kind in ObjectKind::ALL {
			assert_eq!(kind.name().parse::<ObjectKind>(), Ok(*kind));
		}
	}

	#[test]
	fn test_from_str_ignores_case() {
		assert_eq!("Sub_Class".parse::<ObjectKind>(), Ok(ObjectKind::SubClass));
		assert!("wizardry".parse::<ObjectKind>().is_err());
	}

	#[test]
	fn test_only_ability_and_sub_class_are_categorized() {
		let categorized: Vec<_> = ObjectKind::ALL
			.iter()
			.filter(|kind| kind.is_categorized())
			.collect();
		assert_eq!(categorized, [&ObjectKind::Ability, &ObjectKind::SubClass]);
	}
}
