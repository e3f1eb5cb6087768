//! Persistence adapter contract and storage backends.
//!
//! # Responsibility
//! - Define the boundary through which the entity store reads and writes
//!   durable storage.
//! - Provide three interchangeable backends selected at composition time:
//!   in-memory, JSON documents on disk, and SQLite tables.
//!
//! # Invariants
//! - Adapters never validate business rules; they persist what the store
//!   hands them and report storage failures as `PersistenceError`.
//! - `apply_changes` applies mutations in the order given. Whether the whole
//!   change set is atomic is backend-specific (see each adapter).

pub mod json_file;
pub mod memory;
pub mod sqlite;

use crate::model::{EntityKind, Record};
use crate::store::{ChangeSet, Mutation};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use json_file::JsonFileAdapter;
pub use memory::MemoryAdapter;
pub use sqlite::SqliteAdapter;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Load,
    Insert,
    Update,
    Delete,
    Commit,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Open => "open",
            Self::Load => "load",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Commit => "commit",
        };
        f.write_str(label)
    }
}

/// Single error shape surfaced by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceError {
    /// Collection involved, when the failure is collection-specific.
    pub kind: Option<EntityKind>,
    pub operation: Operation,
    pub message: String,
}

impl PersistenceError {
    pub fn new(kind: Option<EntityKind>, operation: Operation, message: impl Display) -> Self {
        Self {
            kind,
            operation,
            message: message.to_string(),
        }
    }

    pub(crate) fn missing_row(kind: EntityKind, operation: Operation, id: &str) -> Self {
        Self::new(Some(kind), operation, format!("no row with id `{id}`"))
    }

    pub(crate) fn duplicate_row(kind: EntityKind, id: &str) -> Self {
        Self::new(
            Some(kind),
            Operation::Insert,
            format!("row with id `{id}` already exists"),
        )
    }
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Some(kind) => write!(
                f,
                "{} failed on {}: {}",
                self.operation,
                kind.collection_name(),
                self.message
            ),
            None => write!(f, "{} failed: {}", self.operation, self.message),
        }
    }
}

impl Error for PersistenceError {}

/// Storage boundary consumed by the entity store.
///
/// Row-level methods are the required surface; `apply_changes` defaults to
/// issuing them one by one, which is best effort and not atomic. Backends
/// that can do better override it.
pub trait PersistenceAdapter {
    /// Short backend label used in logs.
    fn backend_name(&self) -> &'static str;

    /// Returns the full current collection for one entity kind.
    fn load_collection(&self, kind: EntityKind) -> PersistenceResult<Vec<Record>>;

    fn insert_one(&self, record: &Record) -> PersistenceResult<()>;

    /// Replaces the stored row that has the record's id.
    fn update_one(&self, record: &Record) -> PersistenceResult<()>;

    fn delete_one(&self, kind: EntityKind, id: &str) -> PersistenceResult<()>;

    /// Applies every mutation of one logical operation, in order.
    fn apply_changes(&self, changes: &ChangeSet) -> PersistenceResult<()> {
        for mutation in changes.iter() {
            match mutation {
                Mutation::Insert(record) => self.insert_one(record)?,
                Mutation::Update(record) => self.update_one(record)?,
                Mutation::Delete { kind, id } => self.delete_one(*kind, id)?,
            }
        }
        Ok(())
    }
}

impl<A: PersistenceAdapter + ?Sized> PersistenceAdapter for Box<A> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn load_collection(&self, kind: EntityKind) -> PersistenceResult<Vec<Record>> {
        (**self).load_collection(kind)
    }

    fn insert_one(&self, record: &Record) -> PersistenceResult<()> {
        (**self).insert_one(record)
    }

    fn update_one(&self, record: &Record) -> PersistenceResult<()> {
        (**self).update_one(record)
    }

    fn delete_one(&self, kind: EntityKind, id: &str) -> PersistenceResult<()> {
        (**self).delete_one(kind, id)
    }

    fn apply_changes(&self, changes: &ChangeSet) -> PersistenceResult<()> {
        (**self).apply_changes(changes)
    }
}
