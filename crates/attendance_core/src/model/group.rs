//! Teacher group model.

use super::{
    non_empty, require_text, Entity, EntityId, EntityKind, GroupId, Record, UserId,
    ValidationError,
};
use crate::store::Dataset;
use serde::{Deserialize, Serialize};

/// Stored group. `leader_id` is cleared, never left dangling, when the
/// leading user is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub leader_id: Option<UserId>,
}

impl NewGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leader_id: None,
        }
    }
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;
    type Draft = NewGroup;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: EntityId, draft: NewGroup) -> Self {
        Self {
            id,
            name: draft.name,
            leader_id: draft.leader_id,
        }
    }

    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.leader_id = non_empty(self.leader_id);
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, EntityKind::Group, "name")
    }

    fn into_record(self) -> Record {
        Record::Group(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Group(item) => Some(item),
            _ => None,
        }
    }

    fn collection(dataset: &Dataset) -> &[Self] {
        &dataset.groups
    }

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
        &mut dataset.groups
    }
}
