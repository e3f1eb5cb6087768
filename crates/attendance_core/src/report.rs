//! Read-only participation reports over a dataset snapshot.
//!
//! # Responsibility
//! - Personal history for one teacher-role user.
//! - Per-teacher status totals across one academic year.
//! - Per-activity roster and per-group attendance sheets.
//!
//! # Invariants
//! - Reports never mutate the dataset.
//! - Rows referencing missing entities still appear, with `None` names.

use crate::error::{StoreError, StoreResult};
use crate::model::{
    AcademicYear, Activity, EntityId, EntityKind, Group, ParticipationStatus, User,
};
use crate::store::Dataset;
use serde::Serialize;

/// One line of a teacher's own participation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub record_id: EntityId,
    pub activity_id: EntityId,
    pub activity_name: Option<String>,
    pub activity_date: Option<String>,
    pub academic_year_name: Option<String>,
    pub status: ParticipationStatus,
}

/// Number of records per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub organizer: usize,
    pub participated: usize,
    pub late: usize,
    pub left_early: usize,
    pub absent: usize,
}

impl StatusCounts {
    pub fn get(&self, status: ParticipationStatus) -> usize {
        match status {
            ParticipationStatus::Organizer => self.organizer,
            ParticipationStatus::Participated => self.participated,
            ParticipationStatus::Late => self.late,
            ParticipationStatus::LeftEarly => self.left_early,
            ParticipationStatus::Absent => self.absent,
        }
    }

    pub fn total(&self) -> usize {
        ParticipationStatus::ALL
            .iter()
            .map(|status| self.get(*status))
            .sum()
    }

    fn bump(&mut self, status: ParticipationStatus) {
        let slot = match status {
            ParticipationStatus::Organizer => &mut self.organizer,
            ParticipationStatus::Participated => &mut self.participated,
            ParticipationStatus::Late => &mut self.late,
            ParticipationStatus::LeftEarly => &mut self.left_early,
            ParticipationStatus::Absent => &mut self.absent,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub teacher_id: EntityId,
    pub teacher_name: String,
    pub group_name: Option<String>,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    pub record_id: EntityId,
    pub teacher_id: EntityId,
    pub teacher_name: Option<String>,
    pub group_name: Option<String>,
    pub status: ParticipationStatus,
}

/// Attendance of one group member at one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAttendanceRow {
    pub teacher_id: EntityId,
    pub teacher_name: String,
    pub status: ParticipationStatus,
    /// `false` when no record exists and `status` is the Absent default.
    pub recorded: bool,
}

/// Participation history of one user, newest activity first.
pub fn teacher_history(dataset: &Dataset, user_id: &str) -> StoreResult<Vec<HistoryEntry>> {
    if !dataset.contains::<User>(user_id) {
        return Err(StoreError::not_found(EntityKind::User, user_id));
    }

    let mut entries: Vec<HistoryEntry> = dataset
        .participation_records
        .iter()
        .filter(|record| record.teacher_id == user_id)
        .map(|record| {
            let activity = dataset.get::<Activity>(&record.activity_id);
            let year = activity.and_then(|activity| {
                dataset.get::<AcademicYear>(&activity.academic_year_id)
            });
            HistoryEntry {
                record_id: record.id.clone(),
                activity_id: record.activity_id.clone(),
                activity_name: activity.map(|activity| activity.name.clone()),
                activity_date: activity.map(|activity| activity.date.clone()),
                academic_year_name: year.map(|year| year.name.clone()),
                status: record.status,
            }
        })
        .collect();

    // ISO dates order lexicographically; undated entries sort last.
    entries.sort_by(|left, right| right.activity_date.cmp(&left.activity_date));
    Ok(entries)
}

/// Status totals per teacher-role user across one academic year.
///
/// Every teacher appears, including those without records. Rows are ordered
/// by group name, then teacher name.
pub fn year_summary(dataset: &Dataset, academic_year_id: &str) -> StoreResult<Vec<SummaryRow>> {
    if !dataset.contains::<AcademicYear>(academic_year_id) {
        return Err(StoreError::not_found(
            EntityKind::AcademicYear,
            academic_year_id,
        ));
    }

    let activity_ids: Vec<&str> = dataset
        .activities
        .iter()
        .filter(|activity| activity.academic_year_id == academic_year_id)
        .map(|activity| activity.id.as_str())
        .collect();

    let mut rows: Vec<SummaryRow> = dataset
        .teachers()
        .into_iter()
        .map(|teacher| {
            let mut counts = StatusCounts::default();
            dataset
                .participation_records
                .iter()
                .filter(|record| {
                    record.teacher_id == teacher.id
                        && activity_ids.contains(&record.activity_id.as_str())
                })
                .for_each(|record| counts.bump(record.status));
            SummaryRow {
                group_name: group_name(dataset, teacher.group_id.as_deref()),
                teacher_id: teacher.id,
                teacher_name: teacher.name,
                counts,
            }
        })
        .collect();

    rows.sort_by(|left, right| {
        left.group_name
            .cmp(&right.group_name)
            .then_with(|| left.teacher_name.cmp(&right.teacher_name))
    });
    Ok(rows)
}

/// Every record of one activity, ordered by group name, then teacher name.
pub fn activity_report(dataset: &Dataset, activity_id: &str) -> StoreResult<Vec<ActivityRow>> {
    if !dataset.contains::<Activity>(activity_id) {
        return Err(StoreError::not_found(EntityKind::Activity, activity_id));
    }

    let mut rows: Vec<ActivityRow> = dataset
        .participation_records
        .iter()
        .filter(|record| record.activity_id == activity_id)
        .map(|record| {
            let user = dataset.get::<User>(&record.teacher_id);
            ActivityRow {
                record_id: record.id.clone(),
                teacher_id: record.teacher_id.clone(),
                teacher_name: user.map(|user| user.name.clone()),
                group_name: group_name(dataset, user.and_then(|user| user.group_id.as_deref())),
                status: record.status,
            }
        })
        .collect();

    rows.sort_by(|left, right| {
        left.group_name
            .cmp(&right.group_name)
            .then_with(|| left.teacher_name.cmp(&right.teacher_name))
    });
    Ok(rows)
}

/// Attendance sheet of one group at one activity.
///
/// Members without a record are reported as `Absent` with `recorded = false`.
pub fn group_attendance(
    dataset: &Dataset,
    group_id: &str,
    activity_id: &str,
) -> StoreResult<Vec<GroupAttendanceRow>> {
    if !dataset.contains::<Group>(group_id) {
        return Err(StoreError::not_found(EntityKind::Group, group_id));
    }
    if !dataset.contains::<Activity>(activity_id) {
        return Err(StoreError::not_found(EntityKind::Activity, activity_id));
    }

    let rows = dataset
        .teachers()
        .into_iter()
        .filter(|teacher| teacher.group_id.as_deref() == Some(group_id))
        .map(|teacher| {
            let record = dataset
                .participation_records
                .iter()
                .find(|record| record.teacher_id == teacher.id && record.activity_id == activity_id);
            GroupAttendanceRow {
                status: record.map_or(ParticipationStatus::Absent, |record| record.status),
                recorded: record.is_some(),
                teacher_id: teacher.id,
                teacher_name: teacher.name,
            }
        })
        .collect();
    Ok(rows)
}

fn group_name(dataset: &Dataset, group_id: Option<&str>) -> Option<String> {
    group_id
        .and_then(|id| dataset.get::<Group>(id))
        .map(|group| group.name.clone())
}

#[cfg(test)]
mod tests {
    use super::StatusCounts;
    use crate::model::ParticipationStatus;

    #[test]
    fn status_counts_total_every_bucket() {
        let mut counts = StatusCounts::default();
        counts.bump(ParticipationStatus::Late);
        counts.bump(ParticipationStatus::Late);
        counts.bump(ParticipationStatus::Organizer);

        assert_eq!(counts.get(ParticipationStatus::Late), 2);
        assert_eq!(counts.get(ParticipationStatus::Absent), 0);
        assert_eq!(counts.total(), 3);
    }
}
