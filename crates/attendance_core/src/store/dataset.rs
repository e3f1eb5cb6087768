//! In-memory snapshot of every stored collection.

use crate::model::teacher::project;
use crate::model::{
    AcademicYear, Activity, Entity, EntityKind, Group, ParticipationRecord, Record, Teacher, User,
};
use crate::persistence::{Operation, PersistenceError, PersistenceResult};
use crate::store::{ChangeSet, Mutation};
use serde::{Deserialize, Serialize};

/// The five stored collections. The teacher projection is derived on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub academic_years: Vec<AcademicYear>,
    pub activities: Vec<Activity>,
    pub participation_records: Vec<ParticipationRecord>,
}

impl Dataset {
    pub fn get<T: Entity>(&self, id: &str) -> Option<&T> {
        T::collection(self).iter().find(|item| item.id() == id)
    }

    pub fn contains<T: Entity>(&self, id: &str) -> bool {
        self.get::<T>(id).is_some()
    }

    /// Teacher projection over the current users.
    pub fn teachers(&self) -> Vec<Teacher> {
        project(&self.users)
    }

    pub fn len_of(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::User => self.users.len(),
            EntityKind::Group => self.groups.len(),
            EntityKind::AcademicYear => self.academic_years.len(),
            EntityKind::Activity => self.activities.len(),
            EntityKind::ParticipationRecord => self.participation_records.len(),
        }
    }

    /// Type-erased copy of one collection.
    pub fn records(&self, kind: EntityKind) -> Vec<Record> {
        match kind {
            EntityKind::User => erase(&self.users),
            EntityKind::Group => erase(&self.groups),
            EntityKind::AcademicYear => erase(&self.academic_years),
            EntityKind::Activity => erase(&self.activities),
            EntityKind::ParticipationRecord => erase(&self.participation_records),
        }
    }

    /// Replaces one collection with rows read from storage.
    ///
    /// Rejects rows of another kind and duplicate ids.
    pub fn replace_collection(
        &mut self,
        kind: EntityKind,
        records: Vec<Record>,
    ) -> PersistenceResult<()> {
        match kind {
            EntityKind::User => self.users = restore(records)?,
            EntityKind::Group => self.groups = restore(records)?,
            EntityKind::AcademicYear => self.academic_years = restore(records)?,
            EntityKind::Activity => self.activities = restore(records)?,
            EntityKind::ParticipationRecord => self.participation_records = restore(records)?,
        }
        Ok(())
    }

    /// Applies a whole change set; stops at the first failing mutation.
    pub fn apply(&mut self, changes: &ChangeSet) -> PersistenceResult<()> {
        for mutation in changes.iter() {
            self.apply_mutation(mutation)?;
        }
        Ok(())
    }

    pub fn apply_mutation(&mut self, mutation: &Mutation) -> PersistenceResult<()> {
        match mutation {
            Mutation::Insert(record) => match record.clone() {
                Record::User(item) => self.insert_row(item),
                Record::Group(item) => self.insert_row(item),
                Record::AcademicYear(item) => self.insert_row(item),
                Record::Activity(item) => self.insert_row(item),
                Record::ParticipationRecord(item) => self.insert_row(item),
            },
            Mutation::Update(record) => match record.clone() {
                Record::User(item) => self.update_row(item),
                Record::Group(item) => self.update_row(item),
                Record::AcademicYear(item) => self.update_row(item),
                Record::Activity(item) => self.update_row(item),
                Record::ParticipationRecord(item) => self.update_row(item),
            },
            Mutation::Delete { kind, id } => match kind {
                EntityKind::User => self.delete_row::<User>(id),
                EntityKind::Group => self.delete_row::<Group>(id),
                EntityKind::AcademicYear => self.delete_row::<AcademicYear>(id),
                EntityKind::Activity => self.delete_row::<Activity>(id),
                EntityKind::ParticipationRecord => self.delete_row::<ParticipationRecord>(id),
            },
        }
    }

    fn insert_row<T: Entity>(&mut self, item: T) -> PersistenceResult<()> {
        let items = T::collection_mut(self);
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(PersistenceError::duplicate_row(T::KIND, item.id()));
        }
        items.push(item);
        Ok(())
    }

    fn update_row<T: Entity>(&mut self, item: T) -> PersistenceResult<()> {
        let items = T::collection_mut(self);
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(PersistenceError::missing_row(
                T::KIND,
                Operation::Update,
                item.id(),
            )),
        }
    }

    fn delete_row<T: Entity>(&mut self, id: &str) -> PersistenceResult<()> {
        let items = T::collection_mut(self);
        match items.iter().position(|existing| existing.id() == id) {
            Some(index) => {
                items.remove(index);
                Ok(())
            }
            None => Err(PersistenceError::missing_row(T::KIND, Operation::Delete, id)),
        }
    }
}

fn erase<T: Entity>(items: &[T]) -> Vec<Record> {
    items.iter().cloned().map(Entity::into_record).collect()
}

fn restore<T: Entity>(records: Vec<Record>) -> PersistenceResult<Vec<T>> {
    let mut items: Vec<T> = Vec::with_capacity(records.len());
    for record in records {
        let found = record.kind();
        let item = T::from_record(record).ok_or_else(|| {
            PersistenceError::new(
                Some(T::KIND),
                Operation::Load,
                format!("unexpected {found} row in collection"),
            )
        })?;
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(PersistenceError::new(
                Some(T::KIND),
                Operation::Load,
                format!("duplicate id `{}`", item.id()),
            ));
        }
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::Dataset;
    use crate::model::{AcademicYear, EntityKind, Group, Record};
    use crate::persistence::Operation;

    fn group(id: &str) -> Group {
        Group {
            id: id.to_string(),
            name: format!("Group {id}"),
            leader_id: None,
        }
    }

    #[test]
    fn replace_collection_rejects_foreign_rows() {
        let mut dataset = Dataset::default();
        let err = dataset
            .replace_collection(
                EntityKind::Group,
                vec![Record::AcademicYear(AcademicYear {
                    id: "year-1".to_string(),
                    name: "2024".to_string(),
                })],
            )
            .unwrap_err();
        assert_eq!(err.operation, Operation::Load);
        assert_eq!(err.kind, Some(EntityKind::Group));
    }

    #[test]
    fn replace_collection_rejects_duplicate_ids() {
        let mut dataset = Dataset::default();
        let rows = vec![Record::Group(group("g1")), Record::Group(group("g1"))];
        assert!(dataset.replace_collection(EntityKind::Group, rows).is_err());
        assert!(dataset.groups.is_empty());
    }

    #[test]
    fn records_roundtrip_through_replace() {
        let mut source = Dataset::default();
        source.groups = vec![group("g1"), group("g2")];

        let mut copy = Dataset::default();
        copy.replace_collection(EntityKind::Group, source.records(EntityKind::Group))
            .unwrap();
        assert_eq!(copy, source);
        assert_eq!(copy.len_of(EntityKind::Group), 2);
    }
}
