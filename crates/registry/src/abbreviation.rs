//! Per-kind bijection between objects and short labels.

use grimoire_primitives::ObjectKind;
use rustc_hash::FxHashMap;

use crate::object::{DomainObject, ObjectId, ObjectRef};

#[derive(Default)]
struct OneToOne {
	labels: FxHashMap<ObjectId, String>,
	objects: FxHashMap<String, ObjectRef>,
}

impl OneToOne {
	/// Maps `obj` to `label`, dropping any previous label of `obj` and any previous
	/// holder of `label`. Returns the displaced holder.
	fn insert(&mut self, obj: &ObjectRef, label: &str) -> Option<ObjectRef> {
		if let Some(old_label) = self.labels.remove(&obj.id()) {
			self.objects.remove(&old_label);
		}
		let displaced = self.objects.insert(label.to_string(), obj.clone());
		if let Some(displaced) = &displaced {
			self.labels.remove(&displaced.id());
		}
		self.labels.insert(obj.id(), label.to_string());
		displaced.filter(|displaced| !DomainObject::same(displaced, obj))
	}

	fn remove(&mut self, obj: &DomainObject) -> Option<String> {
		let label = self.labels.remove(&obj.id())?;
		self.objects.remove(&label);
		Some(label)
	}
}

/// Abbreviation table scoped per object kind.
///
/// Each object has at most one label and each label names at most one object of a
/// kind; registering a label again silently replaces the stale mapping.
#[derive(Default)]
pub struct AbbreviationTable {
	by_kind: FxHashMap<ObjectKind, OneToOne>,
}

impl AbbreviationTable {
	/// Maps `obj` to `label`, returning the object that previously held `label`.
	pub fn register(&mut self, obj: &ObjectRef, label: &str) -> Option<ObjectRef> {
		self.by_kind.entry(obj.kind()).or_default().insert(obj, label)
	}

	/// Returns the label of `obj`.
	pub fn abbreviation(&self, obj: &DomainObject) -> Option<&str> {
		self.by_kind
			.get(&obj.kind())?
			.labels
			.get(&obj.id())
			.map(String::as_str)
	}

	/// Returns the object of `kind` labelled `label`.
	pub fn object(&self, kind: ObjectKind, label: &str) -> Option<&ObjectRef> {
		self.by_kind.get(&kind)?.objects.get(label)
	}

	/// Drops the label of `obj`, returning it.
	pub fn forget(&mut self, obj: &DomainObject) -> Option<String> {
		self.by_kind.get_mut(&obj.kind())?.remove(obj)
	}
}
