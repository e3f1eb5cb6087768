//! Core domain logic for the school activity attendance tracker.
//! This crate owns every referential invariant between users, groups,
//! academic years, activities and participation records.

pub mod cascade;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod report;
pub mod seed;
pub mod session;
pub mod store;

pub use cascade::{check_integrity, plan_removal, CascadeStep, RemovalPlan, Violation};
pub use config::{open_adapter, BackendKind, ConfigError, StoreConfig};
pub use error::{AuthError, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    AcademicYear, Activity, Entity, EntityId, EntityKind, Group, NewAcademicYear, NewActivity,
    NewGroup, NewParticipationRecord, NewUser, ParticipationEntry, ParticipationRecord,
    ParticipationStatus, Record, Teacher, User, UserRole, ValidationError,
};
pub use persistence::{
    JsonFileAdapter, MemoryAdapter, PersistenceAdapter, PersistenceError, PersistenceResult,
    SqliteAdapter,
};
pub use session::SessionGate;
pub use store::{ChangeSet, Dataset, EntityStore, Mutation};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
