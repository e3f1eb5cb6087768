//! Entity model for the attendance tracker.
//!
//! # Responsibility
//! - Define the five stored entity kinds and the derived `Teacher` projection.
//! - Provide the `Entity` trait that lets one generic store drive every
//!   collection without losing field-level typing.
//! - Own field-level validation (`ValidationError`).
//!
//! # Invariants
//! - Every stored entity is identified by an opaque string id, unique within
//!   its own collection.
//! - Validation here is field-local; cross-collection references are checked
//!   by the store before any mutation is attempted.

pub mod academic_year;
pub mod activity;
pub mod group;
pub mod participation;
pub mod teacher;
pub mod user;

use crate::store::Dataset;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub use academic_year::{AcademicYear, NewAcademicYear};
pub use activity::{Activity, NewActivity};
pub use group::{Group, NewGroup};
pub use participation::{
    NewParticipationRecord, ParticipationEntry, ParticipationRecord, ParticipationStatus,
};
pub use teacher::Teacher;
pub use user::{NewUser, User, UserRole};

/// Opaque identifier shared by every entity kind.
pub type EntityId = String;
pub type UserId = EntityId;
pub type GroupId = EntityId;
pub type AcademicYearId = EntityId;
pub type ActivityId = EntityId;
pub type ParticipationId = EntityId;

/// Stored entity kinds.
///
/// `Teacher` is deliberately absent: it is a query over `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Group,
    AcademicYear,
    Activity,
    ParticipationRecord,
}

impl EntityKind {
    /// All kinds, parents before the kinds that reference them.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::AcademicYear,
        EntityKind::Group,
        EntityKind::User,
        EntityKind::Activity,
        EntityKind::ParticipationRecord,
    ];

    /// Collection name used by storage backends (table / document name).
    pub fn collection_name(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
            Self::AcademicYear => "academic_years",
            Self::Activity => "activities",
            Self::ParticipationRecord => "participation_records",
        }
    }

    /// Prefix for freshly generated ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::AcademicYear => "year",
            Self::Activity => "act",
            Self::ParticipationRecord => "pr",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::User => "user",
            Self::Group => "group",
            Self::AcademicYear => "academic year",
            Self::Activity => "activity",
            Self::ParticipationRecord => "participation record",
        };
        f.write_str(label)
    }
}

/// Type-erased entity row, the unit exchanged with persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum Record {
    User(User),
    Group(Group),
    AcademicYear(AcademicYear),
    Activity(Activity),
    ParticipationRecord(ParticipationRecord),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Group(_) => EntityKind::Group,
            Self::AcademicYear(_) => EntityKind::AcademicYear,
            Self::Activity(_) => EntityKind::Activity,
            Self::ParticipationRecord(_) => EntityKind::ParticipationRecord,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::User(item) => item.id.as_str(),
            Self::Group(item) => item.id.as_str(),
            Self::AcademicYear(item) => item.id.as_str(),
            Self::Activity(item) => item.id.as_str(),
            Self::ParticipationRecord(item) => item.id.as_str(),
        }
    }
}

/// Shape shared by every stored entity kind.
///
/// The store is generic over this trait, so `add`/`update` work for any
/// collection while each kind keeps its own draft type and validation.
pub trait Entity: Clone + Debug + PartialEq + Sized {
    const KIND: EntityKind;

    /// Entity fields minus the id, as supplied by callers of `add`.
    type Draft;

    fn id(&self) -> &str;

    /// Builds the stored entity from a freshly assigned id and caller fields.
    fn from_draft(id: EntityId, draft: Self::Draft) -> Self;

    /// Canonicalizes caller input (trimming, clearing inapplicable fields).
    fn normalized(self) -> Self {
        self
    }

    /// Merges an incoming replacement with the currently stored value.
    ///
    /// Default is full replacement.
    fn merge_update(self, _existing: &Self) -> Self {
        self
    }

    /// Field-local validation.
    fn validate(&self) -> Result<(), ValidationError>;

    fn into_record(self) -> Record;

    fn from_record(record: Record) -> Option<Self>;

    fn collection(dataset: &Dataset) -> &[Self];

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self>;
}

/// Field-level validation failures, raised before any mutation is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    BlankField {
        kind: EntityKind,
        field: &'static str,
    },
    /// A teacher or group leader account has no group.
    MissingGroup(UserId),
    /// Activity date is not an ISO `YYYY-MM-DD` calendar date.
    InvalidDate(String),
    /// Group leader must hold the `Teacher` or `GroupLeader` role.
    LeaderNotTeacher { group_id: GroupId, user_id: UserId },
    /// Participation can only be recorded for teacher-role users.
    ParticipantNotTeacher(UserId),
    /// The same teacher appears twice in one participation batch.
    DuplicateParticipant(UserId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { kind, field } => write!(f, "{kind} `{field}` must not be blank"),
            Self::MissingGroup(id) => write!(f, "teacher-role user {id} must belong to a group"),
            Self::InvalidDate(value) => {
                write!(f, "activity date `{value}` is not a YYYY-MM-DD calendar date")
            }
            Self::LeaderNotTeacher { group_id, user_id } => write!(
                f,
                "user {user_id} cannot lead group {group_id}: role must be teacher or group leader"
            ),
            Self::ParticipantNotTeacher(id) => {
                write!(f, "user {id} is not a teacher or group leader")
            }
            Self::DuplicateParticipant(id) => {
                write!(f, "teacher {id} appears more than once in the batch")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    value: &str,
    kind: EntityKind,
    field: &'static str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { kind, field });
    }
    Ok(())
}

/// Maps an optional reference where an empty string means "unset".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|inner| inner.trim().to_string())
        .filter(|inner| !inner.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{non_empty, EntityKind, Record};
    use crate::model::AcademicYear;

    #[test]
    fn kind_order_lists_parents_first() {
        let position = |kind| EntityKind::ALL.iter().position(|k| *k == kind).unwrap();
        assert!(position(EntityKind::AcademicYear) < position(EntityKind::Activity));
        assert!(position(EntityKind::Group) < position(EntityKind::User));
        assert!(position(EntityKind::Activity) < position(EntityKind::ParticipationRecord));
        assert!(position(EntityKind::User) < position(EntityKind::ParticipationRecord));
    }

    #[test]
    fn empty_reference_is_treated_as_unset() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" g1 ".to_string())), Some("g1".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn record_exposes_kind_and_id() {
        let record = Record::AcademicYear(AcademicYear {
            id: "year-1".to_string(),
            name: "2024-2025".to_string(),
        });
        assert_eq!(record.kind(), EntityKind::AcademicYear);
        assert_eq!(record.id(), "year-1");
    }
}
