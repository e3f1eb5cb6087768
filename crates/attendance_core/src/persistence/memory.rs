//! Process-local backend; nothing survives the process.
//!
//! `apply_changes` is atomic: the change set is applied to a copy that only
//! replaces the stored state once every mutation succeeded.

use super::{Operation, PersistenceAdapter, PersistenceError, PersistenceResult};
use crate::model::{EntityKind, Record};
use crate::store::{ChangeSet, Dataset, Mutation};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryAdapter {
    state: Mutex<Dataset>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from pre-populated collections.
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            state: Mutex::new(dataset),
        }
    }

    /// Copy of what is currently stored.
    pub fn snapshot(&self) -> PersistenceResult<Dataset> {
        Ok(self.state(Operation::Load)?.clone())
    }

    fn state(&self, operation: Operation) -> PersistenceResult<MutexGuard<'_, Dataset>> {
        self.state
            .lock()
            .map_err(|_| PersistenceError::new(None, operation, "memory state lock poisoned"))
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn load_collection(&self, kind: EntityKind) -> PersistenceResult<Vec<Record>> {
        Ok(self.state(Operation::Load)?.records(kind))
    }

    fn insert_one(&self, record: &Record) -> PersistenceResult<()> {
        self.state(Operation::Insert)?
            .apply_mutation(&Mutation::Insert(record.clone()))
    }

    fn update_one(&self, record: &Record) -> PersistenceResult<()> {
        self.state(Operation::Update)?
            .apply_mutation(&Mutation::Update(record.clone()))
    }

    fn delete_one(&self, kind: EntityKind, id: &str) -> PersistenceResult<()> {
        self.state(Operation::Delete)?.apply_mutation(&Mutation::Delete {
            kind,
            id: id.to_string(),
        })
    }

    fn apply_changes(&self, changes: &ChangeSet) -> PersistenceResult<()> {
        let mut state = self.state(Operation::Commit)?;
        let mut next = state.clone();
        next.apply(changes)?;
        *state = next;
        Ok(())
    }
}
