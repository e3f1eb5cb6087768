//! Academic year model. A pure grouping scope for activities.

use super::{require_text, AcademicYearId, Entity, EntityId, EntityKind, Record, ValidationError};
use crate::store::Dataset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAcademicYear {
    pub name: String,
}

impl NewAcademicYear {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Entity for AcademicYear {
    const KIND: EntityKind = EntityKind::AcademicYear;
    type Draft = NewAcademicYear;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: EntityId, draft: NewAcademicYear) -> Self {
        Self {
            id,
            name: draft.name,
        }
    }

    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, EntityKind::AcademicYear, "name")
    }

    fn into_record(self) -> Record {
        Record::AcademicYear(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::AcademicYear(item) => Some(item),
            _ => None,
        }
    }

    fn collection(dataset: &Dataset) -> &[Self] {
        &dataset.academic_years
    }

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
        &mut dataset.academic_years
    }
}
