//! Callbacks for references whose target was never constructed.
//!
//! Validators are batch collectors: the resolution and validation passes report every
//! miss instead of stopping at the first, so implementations must tolerate being
//! called any number of times per load cycle.

use parking_lot::Mutex;

use crate::config::UnconstructedPolicy;
use crate::error::UnresolvedReference;

/// Receives unresolved single references.
pub trait UnconstructedValidator: Send + Sync {
	/// Records or reports `miss`.
	///
	/// Returns true if the miss is tolerated and should not fail validation.
	fn report(&self, miss: &UnresolvedReference) -> bool;
}

impl<F> UnconstructedValidator for F
where
	F: Fn(&UnresolvedReference) -> bool + Send + Sync,
{
	fn report(&self, miss: &UnresolvedReference) -> bool {
		self(miss)
	}
}

/// Logs every miss at error level and tolerates none.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingValidator;

impl UnconstructedValidator for LoggingValidator {
	fn report(&self, miss: &UnresolvedReference) -> bool {
		tracing::error!(
			kind = %miss.kind,
			category = ?miss.category,
			key = %miss.key,
			origin = ?miss.origin.as_ref().map(|url| url.as_str()),
			"unconstructed reference",
		);
		false
	}
}

/// Collects misses for later reporting, tolerating those allowed by a policy.
#[derive(Debug, Default)]
pub struct CollectingValidator {
	policy: UnconstructedPolicy,
	misses: Mutex<Vec<UnresolvedReference>>,
	tolerated: Mutex<Vec<UnresolvedReference>>,
}

impl CollectingValidator {
	/// Creates a collector that tolerates nothing.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a collector that tolerates misses allowed by `policy`.
	pub fn with_policy(policy: UnconstructedPolicy) -> Self {
		Self {
			policy,
			..Self::default()
		}
	}

	/// Returns the misses that were not tolerated, in report order.
	pub fn misses(&self) -> Vec<UnresolvedReference> {
		self.misses.lock().clone()
	}

	/// Returns the misses the policy tolerated, in report order.
	pub fn tolerated(&self) -> Vec<UnresolvedReference> {
		self.tolerated.lock().clone()
	}

	/// Returns the number of reports received.
	pub fn report_count(&self) -> usize {
		self.misses.lock().len() + self.tolerated.lock().len()
	}

	/// Drains the misses that were not tolerated.
	pub fn take_misses(&self) -> Vec<UnresolvedReference> {
		std::mem::take(&mut *self.misses.lock())
	}
}

impl UnconstructedValidator for CollectingValidator {
	fn report(&self, miss: &UnresolvedReference) -> bool {
		if self.policy.allows(miss) {
			tracing::debug!(kind = %miss.kind, key = %miss.key, "tolerated unconstructed reference");
			self.tolerated.lock().push(miss.clone());
			true
		} else {
			self.misses.lock().push(miss.clone());
			false
		}
	}
}
