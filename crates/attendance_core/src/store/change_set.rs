//! Ordered row-level mutations produced by one logical store operation.

use crate::model::{Entity, EntityId, EntityKind, Record};
use crate::persistence::PersistenceResult;
use crate::store::Dataset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert(Record),
    Update(Record),
    Delete { kind: EntityKind, id: EntityId },
}

impl Mutation {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Insert(record) | Self::Update(record) => record.kind(),
            Self::Delete { kind, .. } => *kind,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Insert(record) | Self::Update(record) => record.id(),
            Self::Delete { id, .. } => id.as_str(),
        }
    }
}

/// Mutations in commit order. Parents are written before the rows that
/// reference them and children are removed before their parents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.iter()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Collections touched by this change set, in first-touch order.
    pub fn touched_kinds(&self) -> Vec<EntityKind> {
        let mut kinds = Vec::new();
        for mutation in &self.mutations {
            let kind = mutation.kind();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

/// A working copy of the dataset plus the mutations that produced it.
///
/// Every mutation is applied to the copy as it is recorded, so later steps
/// of the same operation observe earlier ones. The copy only replaces the
/// store's state after the adapter confirms the change set.
#[derive(Debug, Clone)]
pub(crate) struct Staged {
    pub(crate) data: Dataset,
    pub(crate) changes: ChangeSet,
}

impl Staged {
    pub(crate) fn new(base: &Dataset) -> Self {
        Self {
            data: base.clone(),
            changes: ChangeSet::new(),
        }
    }

    pub(crate) fn insert<T: Entity>(&mut self, item: T) -> PersistenceResult<()> {
        self.push(Mutation::Insert(item.into_record()))
    }

    pub(crate) fn update<T: Entity>(&mut self, item: T) -> PersistenceResult<()> {
        self.push(Mutation::Update(item.into_record()))
    }

    pub(crate) fn delete(&mut self, kind: EntityKind, id: &str) -> PersistenceResult<()> {
        self.push(Mutation::Delete {
            kind,
            id: id.to_string(),
        })
    }

    pub(crate) fn push(&mut self, mutation: Mutation) -> PersistenceResult<()> {
        self.data.apply_mutation(&mutation)?;
        self.changes.push(mutation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeSet, Mutation, Staged};
    use crate::model::{AcademicYear, EntityKind, Record};
    use crate::store::Dataset;

    fn year(id: &str) -> AcademicYear {
        AcademicYear {
            id: id.to_string(),
            name: id.to_string(),
        }
    }

    #[test]
    fn touched_kinds_follow_first_touch_order() {
        let mut changes = ChangeSet::new();
        changes.push(Mutation::Delete {
            kind: EntityKind::ParticipationRecord,
            id: "pr-1".to_string(),
        });
        changes.push(Mutation::Delete {
            kind: EntityKind::Activity,
            id: "act-1".to_string(),
        });
        changes.push(Mutation::Delete {
            kind: EntityKind::ParticipationRecord,
            id: "pr-2".to_string(),
        });

        assert_eq!(
            changes.touched_kinds(),
            vec![EntityKind::ParticipationRecord, EntityKind::Activity]
        );
    }

    #[test]
    fn staged_mutations_are_visible_to_later_steps() {
        let base = Dataset::default();
        let mut staged = Staged::new(&base);
        staged.insert(year("year-1")).unwrap();
        staged.delete(EntityKind::AcademicYear, "year-1").unwrap();

        assert!(staged.data.academic_years.is_empty());
        assert_eq!(staged.changes.len(), 2);
        assert!(base.academic_years.is_empty());
    }

    #[test]
    fn staged_rejects_delete_of_missing_row() {
        let mut staged = Staged::new(&Dataset::default());
        let err = staged
            .delete(EntityKind::AcademicYear, "year-9")
            .unwrap_err();
        assert_eq!(err.kind, Some(EntityKind::AcademicYear));
        assert!(staged.changes.is_empty());
    }

    #[test]
    fn mutation_reports_kind_and_id() {
        let mutation = Mutation::Update(Record::AcademicYear(year("year-2")));
        assert_eq!(mutation.kind(), EntityKind::AcademicYear);
        assert_eq!(mutation.id(), "year-2");
    }
}
