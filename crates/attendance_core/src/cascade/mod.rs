//! Referential integrity engine.
//!
//! # Responsibility
//! - Declare, per entity kind, which collections depend on it and what a
//!   deletion does to them (`dependents`).
//! - Turn one deletion into the ordered closure of follow-on steps
//!   (`plan_removal`), independent of any storage.
//! - Classify how a user write moves the teacher projection.
//! - Audit a dataset against the referential invariants.
//!
//! # Invariants
//! - Plans list children before the parent they depend on.
//! - Among the children of one parent, participation records come last.
//! - Planning is pure: it reads a `Dataset` and never mutates it.

pub mod integrity;
pub mod plan;
pub mod projection;

pub use integrity::{check_integrity, Violation};
pub use plan::{dependents, plan_removal, CascadeStep, Dependency, OnDelete, RemovalPlan};
pub use projection::{classify_projection, ProjectionChange};
