//! Per-activity attendance records.

use super::{
    require_text, ActivityId, Entity, EntityId, EntityKind, ParticipationId, Record, UserId,
    ValidationError,
};
use crate::store::Dataset;
use serde::{Deserialize, Serialize};

/// Attendance status recorded for one teacher at one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    /// Helped organize the activity.
    Organizer,
    Participated,
    Late,
    /// Left before the activity ended.
    LeftEarly,
    Absent,
}

impl ParticipationStatus {
    pub const ALL: [ParticipationStatus; 5] = [
        ParticipationStatus::Organizer,
        ParticipationStatus::Participated,
        ParticipationStatus::Late,
        ParticipationStatus::LeftEarly,
        ParticipationStatus::Absent,
    ];

    /// Human-readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Organizer => "Organizer",
            Self::Participated => "Participated",
            Self::Late => "Late",
            Self::LeftEarly => "Left early",
            Self::Absent => "Absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    pub id: ParticipationId,
    pub teacher_id: UserId,
    pub activity_id: ActivityId,
    pub status: ParticipationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipationRecord {
    pub teacher_id: UserId,
    pub activity_id: ActivityId,
    pub status: ParticipationStatus,
}

/// One row of an attendance batch; the activity is implied by the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationEntry {
    pub teacher_id: UserId,
    pub status: ParticipationStatus,
}

impl ParticipationEntry {
    pub fn new(teacher_id: impl Into<UserId>, status: ParticipationStatus) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            status,
        }
    }
}

impl Entity for ParticipationRecord {
    const KIND: EntityKind = EntityKind::ParticipationRecord;
    type Draft = NewParticipationRecord;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: EntityId, draft: NewParticipationRecord) -> Self {
        Self {
            id,
            teacher_id: draft.teacher_id,
            activity_id: draft.activity_id,
            status: draft.status,
        }
    }

    fn normalized(mut self) -> Self {
        self.teacher_id = self.teacher_id.trim().to_string();
        self.activity_id = self.activity_id.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.teacher_id, EntityKind::ParticipationRecord, "teacherId")?;
        require_text(&self.activity_id, EntityKind::ParticipationRecord, "activityId")
    }

    fn into_record(self) -> Record {
        Record::ParticipationRecord(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::ParticipationRecord(item) => Some(item),
            _ => None,
        }
    }

    fn collection(dataset: &Dataset) -> &[Self] {
        &dataset.participation_records
    }

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
        &mut dataset.participation_records
    }
}
