//! Typed object registry with lazy reference resolution.
//!
//! Loaders construct rules objects through a [`ReferenceContext`], which routes every
//! request to the [`Manufacturer`] of the object's (kind, category) namespace. Objects
//! may be referenced before they exist: a [`SingleRef`] stays pending until the
//! resolution pass links it, and a [`GroupRef`] is a live view evaluated at use.
//!
//! # Load cycle
//!
//! ```
//! use grimoire_registry::{ObjectKind, ReferenceContext};
//!
//! let ctx = ReferenceContext::new();
//! let pending = ctx.reference(ObjectKind::Skill, "Climb");
//! ctx.construct(ObjectKind::Skill, "Climb")?;
//!
//! ctx.resolve_references()?;
//! ctx.build_deferred_objects()?;
//! ctx.build_derived_objects()?;
//! assert!(pending.is_resolved());
//! # Ok::<(), grimoire_registry::RegistryError>(())
//! ```
//!
//! References whose key is never constructed are reported to an
//! [`UnconstructedValidator`] instead of failing the load.

pub mod abbreviation;
pub mod config;
pub mod context;
pub mod error;
pub mod manufacturer;
pub mod object;
pub mod reference;
pub mod validator;

pub use abbreviation::AbbreviationTable;
pub use config::{AllowedMiss, RegistryConfig, UnconstructedPolicy};
pub use context::{ContextBuilder, LoadPhase, Namespace, ReferenceContext};
pub use error::{RegistryError, Result, UnresolvedReference};
pub use grimoire_primitives::{Category, KeyName, ObjectKind, TypeTag};
pub use manufacturer::Manufacturer;
pub use object::{AttrKey, AttrValue, Attributes, Categorized, DomainObject, ObjectId, ObjectRef};
pub use reference::{GroupFilter, GroupRef, RefState, RefTarget, SingleRef};
pub use validator::{CollectingValidator, LoggingValidator, UnconstructedValidator};
