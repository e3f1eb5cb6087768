//! Dataset audit against the referential invariants.

use crate::model::{EntityId, EntityKind};
use crate::store::Dataset;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    DuplicateId {
        kind: EntityKind,
        id: EntityId,
    },
    /// Participation record points at a user that does not exist.
    OrphanedParticipantTeacher {
        record_id: EntityId,
        teacher_id: EntityId,
    },
    /// Participation record points at a user without a teacher role.
    ///
    /// Expected after a teacher is demoted; records are kept in that case.
    ParticipantNotTeacher {
        record_id: EntityId,
        teacher_id: EntityId,
    },
    OrphanedParticipantActivity {
        record_id: EntityId,
        activity_id: EntityId,
    },
    OrphanedActivity {
        activity_id: EntityId,
        academic_year_id: EntityId,
    },
    DanglingGroupLeader {
        group_id: EntityId,
        leader_id: EntityId,
    },
    /// Teacher-role user without a group, or with a group that does not exist.
    UnassignedTeacher {
        user_id: EntityId,
        group_id: Option<EntityId>,
    },
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "duplicate_id",
            Self::OrphanedParticipantTeacher { .. } => "orphaned_participant_teacher",
            Self::ParticipantNotTeacher { .. } => "participant_not_teacher",
            Self::OrphanedParticipantActivity { .. } => "orphaned_participant_activity",
            Self::OrphanedActivity { .. } => "orphaned_activity",
            Self::DanglingGroupLeader { .. } => "dangling_group_leader",
            Self::UnassignedTeacher { .. } => "unassigned_teacher",
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { kind, id } => write!(f, "duplicate {kind} id {id}"),
            Self::OrphanedParticipantTeacher {
                record_id,
                teacher_id,
            } => write!(f, "record {record_id} references missing user {teacher_id}"),
            Self::ParticipantNotTeacher {
                record_id,
                teacher_id,
            } => write!(
                f,
                "record {record_id} references user {teacher_id} without a teacher role"
            ),
            Self::OrphanedParticipantActivity {
                record_id,
                activity_id,
            } => write!(
                f,
                "record {record_id} references missing activity {activity_id}"
            ),
            Self::OrphanedActivity {
                activity_id,
                academic_year_id,
            } => write!(
                f,
                "activity {activity_id} references missing academic year {academic_year_id}"
            ),
            Self::DanglingGroupLeader {
                group_id,
                leader_id,
            } => write!(f, "group {group_id} is led by missing user {leader_id}"),
            Self::UnassignedTeacher { user_id, group_id } => match group_id {
                Some(group_id) => {
                    write!(f, "user {user_id} belongs to missing group {group_id}")
                }
                None => write!(f, "teacher-role user {user_id} has no group"),
            },
        }
    }
}

/// Lists every invariant violation found in `dataset`.
///
/// An empty result means the dataset is referentially consistent.
pub fn check_integrity(dataset: &Dataset) -> Vec<Violation> {
    let mut violations = Vec::new();

    duplicate_ids(
        EntityKind::User,
        dataset.users.iter().map(|item| item.id.as_str()),
        &mut violations,
    );
    duplicate_ids(
        EntityKind::Group,
        dataset.groups.iter().map(|item| item.id.as_str()),
        &mut violations,
    );
    duplicate_ids(
        EntityKind::AcademicYear,
        dataset.academic_years.iter().map(|item| item.id.as_str()),
        &mut violations,
    );
    duplicate_ids(
        EntityKind::Activity,
        dataset.activities.iter().map(|item| item.id.as_str()),
        &mut violations,
    );
    duplicate_ids(
        EntityKind::ParticipationRecord,
        dataset.participation_records.iter().map(|item| item.id.as_str()),
        &mut violations,
    );

    for record in &dataset.participation_records {
        match dataset.users.iter().find(|user| user.id == record.teacher_id) {
            None => violations.push(Violation::OrphanedParticipantTeacher {
                record_id: record.id.clone(),
                teacher_id: record.teacher_id.clone(),
            }),
            Some(user) if !user.role.is_teacher() => {
                violations.push(Violation::ParticipantNotTeacher {
                    record_id: record.id.clone(),
                    teacher_id: record.teacher_id.clone(),
                })
            }
            Some(_) => {}
        }
        if !dataset
            .activities
            .iter()
            .any(|activity| activity.id == record.activity_id)
        {
            violations.push(Violation::OrphanedParticipantActivity {
                record_id: record.id.clone(),
                activity_id: record.activity_id.clone(),
            });
        }
    }

    for activity in &dataset.activities {
        if !dataset
            .academic_years
            .iter()
            .any(|year| year.id == activity.academic_year_id)
        {
            violations.push(Violation::OrphanedActivity {
                activity_id: activity.id.clone(),
                academic_year_id: activity.academic_year_id.clone(),
            });
        }
    }

    for group in &dataset.groups {
        if let Some(leader_id) = &group.leader_id {
            if !dataset.users.iter().any(|user| &user.id == leader_id) {
                violations.push(Violation::DanglingGroupLeader {
                    group_id: group.id.clone(),
                    leader_id: leader_id.clone(),
                });
            }
        }
    }

    for user in dataset.users.iter().filter(|user| user.role.is_teacher()) {
        let assigned = user
            .group_id
            .as_ref()
            .is_some_and(|group_id| dataset.groups.iter().any(|group| &group.id == group_id));
        if !assigned {
            violations.push(Violation::UnassignedTeacher {
                user_id: user.id.clone(),
                group_id: user.group_id.clone(),
            });
        }
    }

    violations
}

fn duplicate_ids<'a>(
    kind: EntityKind,
    ids: impl Iterator<Item = &'a str>,
    violations: &mut Vec<Violation>,
) {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            violations.push(Violation::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}
