use std::fmt;
use std::sync::Arc;

use grimoire_primitives::{Category, ObjectKind, TypeTag};

use crate::manufacturer::Manufacturer;
use crate::object::{DomainObject, ObjectRef};

/// Membership predicate of a [`GroupRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupFilter {
	/// Every active object of the namespace.
	All,
	/// Objects whose type tags are a superset of these.
	Types(Vec<TypeTag>),
}

impl GroupFilter {
	/// Returns true if `obj` passes the filter.
	pub fn matches(&self, obj: &DomainObject) -> bool {
		match self {
			GroupFilter::All => true,
			GroupFilter::Types(tags) => obj.has_types(tags),
		}
	}
}

/// Live view over the active objects of one namespace.
///
/// Membership is computed on every call, so objects constructed after the reference
/// was created are included and forgotten objects drop out.
#[derive(Clone)]
pub struct GroupRef {
	source: Arc<Manufacturer>,
	filter: GroupFilter,
}

impl GroupRef {
	pub(crate) fn new(source: Arc<Manufacturer>, filter: GroupFilter) -> Self {
		Self { source, filter }
	}

	/// Returns the kind of the viewed namespace.
	pub fn kind(&self) -> ObjectKind {
		self.source.kind()
	}

	/// Returns the category of the viewed namespace.
	pub fn category(&self) -> Option<&Category> {
		self.source.category()
	}

	/// Returns the membership predicate.
	pub fn filter(&self) -> &GroupFilter {
		&self.filter
	}

	/// Group references never need resolution.
	pub fn is_resolved(&self) -> bool {
		true
	}

	/// Returns the current members.
	pub fn members(&self) -> Vec<ObjectRef> {
		let mut members = self.source.get_all_objects();
		members.retain(|obj| self.filter.matches(obj));
		members
	}

	/// Returns true if `obj` is currently a member.
	pub fn contains(&self, obj: &DomainObject) -> bool {
		self.source.owns(obj) && self.filter.matches(obj)
	}

	/// Returns the current member count.
	pub fn len(&self) -> usize {
		self.members().len()
	}

	/// Returns true if no object currently matches.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Debug for GroupRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GroupRef")
			.field("kind", &self.source.kind())
			.field("category", &self.source.category())
			.field("filter", &self.filter)
			.finish()
	}
}

impl fmt::Display for GroupRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.filter {
			GroupFilter::All => f.write_str("ALL"),
			GroupFilter::Types(tags) => {
				f.write_str("TYPE=")?;
				for (i, tag) in tags.iter().enumerate() {
					if i > 0 {
						f.write_str(".")?;
					}
					f.write_str(tag.as_str())?;
				}
				Ok(())
			}
		}
	}
}
