//! Document backend: one pretty-printed JSON array per collection.
//!
//! # Invariants
//! - Each collection file is replaced through write-to-temp-then-rename, so a
//!   reader never sees a half-written file.
//! - A change set touching several collections is atomic per file only;
//!   files are rewritten in first-touch order, so a failure part way leaves
//!   earlier collections committed.
//! - A missing collection file reads as an empty collection.

use super::{Operation, PersistenceAdapter, PersistenceError, PersistenceResult};
use crate::model::{
    AcademicYear, Activity, Entity, EntityKind, Group, ParticipationRecord, Record, User,
};
use crate::store::{ChangeSet, Dataset, Mutation};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct JsonFileAdapter {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileAdapter {
    /// Uses `dir` as the document root, creating it when missing.
    pub fn open(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|err| {
            PersistenceError::new(
                None,
                Operation::Open,
                format!("cannot create `{}`: {err}", dir.display()),
            )
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document holding one collection.
    pub fn collection_path(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.collection_name()))
    }

    fn guard(&self, operation: Operation) -> PersistenceResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| PersistenceError::new(None, operation, "document write lock poisoned"))
    }

    fn read_rows(&self, kind: EntityKind) -> PersistenceResult<Vec<Record>> {
        let path = self.collection_path(kind);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)
            .map_err(|err| PersistenceError::new(Some(kind), Operation::Load, err))?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        match kind {
            EntityKind::User => decode::<User>(&text),
            EntityKind::Group => decode::<Group>(&text),
            EntityKind::AcademicYear => decode::<AcademicYear>(&text),
            EntityKind::Activity => decode::<Activity>(&text),
            EntityKind::ParticipationRecord => decode::<ParticipationRecord>(&text),
        }
    }

    fn write_rows(&self, kind: EntityKind, records: &[Record]) -> PersistenceResult<()> {
        let rows = records
            .iter()
            .map(row_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| PersistenceError::new(Some(kind), Operation::Commit, err))?;
        let bytes = serde_json::to_vec_pretty(&rows)
            .map_err(|err| PersistenceError::new(Some(kind), Operation::Commit, err))?;

        let path = self.collection_path(kind);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes)
            .and_then(|()| fs::rename(&tmp_path, &path))
            .map_err(|err| PersistenceError::new(Some(kind), Operation::Commit, err))?;

        debug!(
            "event=json_write module=persistence status=ok collection={} rows={}",
            kind.collection_name(),
            records.len()
        );
        Ok(())
    }

    /// Reads one collection, applies `mutations`, and rewrites the file.
    fn rewrite(&self, kind: EntityKind, mutations: &[&Mutation]) -> PersistenceResult<()> {
        let mut data = Dataset::default();
        data.replace_collection(kind, self.read_rows(kind)?)?;
        for mutation in mutations {
            data.apply_mutation(mutation)?;
        }
        self.write_rows(kind, &data.records(kind))
    }
}

impl PersistenceAdapter for JsonFileAdapter {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn load_collection(&self, kind: EntityKind) -> PersistenceResult<Vec<Record>> {
        self.read_rows(kind)
    }

    fn insert_one(&self, record: &Record) -> PersistenceResult<()> {
        let _guard = self.guard(Operation::Insert)?;
        self.rewrite(record.kind(), &[&Mutation::Insert(record.clone())])
    }

    fn update_one(&self, record: &Record) -> PersistenceResult<()> {
        let _guard = self.guard(Operation::Update)?;
        self.rewrite(record.kind(), &[&Mutation::Update(record.clone())])
    }

    fn delete_one(&self, kind: EntityKind, id: &str) -> PersistenceResult<()> {
        let _guard = self.guard(Operation::Delete)?;
        let mutation = Mutation::Delete {
            kind,
            id: id.to_string(),
        };
        self.rewrite(kind, &[&mutation])
    }

    fn apply_changes(&self, changes: &ChangeSet) -> PersistenceResult<()> {
        let _guard = self.guard(Operation::Commit)?;
        for kind in changes.touched_kinds() {
            let mutations: Vec<&Mutation> = changes
                .iter()
                .filter(|mutation| mutation.kind() == kind)
                .collect();
            self.rewrite(kind, &mutations)?;
        }
        Ok(())
    }
}

fn decode<T: Entity + DeserializeOwned>(text: &str) -> PersistenceResult<Vec<Record>> {
    let rows: Vec<T> = serde_json::from_str(text)
        .map_err(|err| PersistenceError::new(Some(T::KIND), Operation::Load, err))?;
    Ok(rows.into_iter().map(Entity::into_record).collect())
}

fn row_value(record: &Record) -> serde_json::Result<Value> {
    match record {
        Record::User(item) => serde_json::to_value(item),
        Record::Group(item) => serde_json::to_value(item),
        Record::AcademicYear(item) => serde_json::to_value(item),
        Record::Activity(item) => serde_json::to_value(item),
        Record::ParticipationRecord(item) => serde_json::to_value(item),
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFileAdapter;
    use crate::model::{EntityKind, Group, Record};
    use crate::persistence::PersistenceAdapter;

    #[test]
    fn missing_file_reads_as_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = JsonFileAdapter::open(dir.path()).unwrap();
        assert!(adapter.load_collection(EntityKind::User).unwrap().is_empty());
    }

    #[test]
    fn rows_are_stored_as_plain_camel_case_objects() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = JsonFileAdapter::open(dir.path()).unwrap();
        adapter
            .insert_one(&Record::Group(Group {
                id: "group-1".to_string(),
                name: "Math".to_string(),
                leader_id: Some("user-1".to_string()),
            }))
            .unwrap();

        let text = std::fs::read_to_string(adapter.collection_path(EntityKind::Group)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["leaderId"], "user-1");
        assert!(value[0].get("kind").is_none());
    }

    #[test]
    fn corrupt_document_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = JsonFileAdapter::open(dir.path()).unwrap();
        std::fs::write(adapter.collection_path(EntityKind::Activity), "{not json").unwrap();

        let err = adapter.load_collection(EntityKind::Activity).unwrap_err();
        assert_eq!(err.kind, Some(EntityKind::Activity));
    }
}
