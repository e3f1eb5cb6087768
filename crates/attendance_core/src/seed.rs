//! Demo dataset used to initialize an empty backend.
//!
//! Rows are emitted parents first. Groups are inserted without a leader and
//! get one once their members exist, so the SQLite backend can enforce
//! foreign keys while seeding.

use crate::model::{
    AcademicYear, Activity, Group, ParticipationRecord, ParticipationStatus, Record, User,
    UserRole,
};
use crate::store::{ChangeSet, Dataset, Mutation};

pub const DEMO_PASSWORD: &str = "123";

/// The demo collections as they look once seeding finished.
pub fn demo_dataset() -> Dataset {
    Dataset {
        users: vec![
            user("user-admin", "Admin User", UserRole::Admin, None),
            user("user-leader-1", "Math Group Leader", UserRole::GroupLeader, Some("group-1")),
            user("user-leader-2", "Literature Group Leader", UserRole::GroupLeader, Some("group-2")),
            user("user-teacher-1", "Alex Nguyen", UserRole::Teacher, Some("group-1")),
            user("user-teacher-2", "Bea Tran", UserRole::Teacher, Some("group-1")),
            user("user-teacher-3", "Chris Le", UserRole::Teacher, Some("group-2")),
            user("user-teacher-4", "Dana Pham", UserRole::Teacher, Some("group-2")),
            user("user-teacher-5", "Emma Hoang", UserRole::Teacher, Some("group-3")),
        ],
        groups: vec![
            group("group-1", "Math and Computing", "user-leader-1"),
            group("group-2", "Literature", "user-leader-2"),
            group("group-3", "Foreign Languages", "user-teacher-5"),
        ],
        academic_years: vec![
            year("year-1", "School year 2023-2024"),
            year("year-2", "School year 2024-2025"),
        ],
        activities: vec![
            activity("act-1", "September staff meeting", "2023-09-05", "year-1"),
            activity("act-2", "Professional training", "2023-10-20", "year-1"),
            activity("act-3", "Teachers' Day ceremony", "2023-11-20", "year-1"),
            activity("act-4", "Opening staff meeting", "2024-09-05", "year-2"),
        ],
        participation_records: vec![
            record("pr-1", "user-teacher-1", "act-1", ParticipationStatus::Participated),
            record("pr-2", "user-teacher-2", "act-1", ParticipationStatus::Late),
            record("pr-3", "user-teacher-3", "act-1", ParticipationStatus::Participated),
            record("pr-4", "user-teacher-4", "act-1", ParticipationStatus::Absent),
            record("pr-5", "user-teacher-1", "act-2", ParticipationStatus::Organizer),
            record("pr-6", "user-teacher-2", "act-2", ParticipationStatus::Participated),
            record("pr-7", "user-teacher-3", "act-2", ParticipationStatus::Participated),
            record("pr-8", "user-teacher-4", "act-2", ParticipationStatus::LeftEarly),
            record("pr-9", "user-teacher-1", "act-3", ParticipationStatus::Participated),
        ],
    }
}

/// Mutations that turn an empty backend into `demo_dataset()`.
pub fn demo_changes() -> ChangeSet {
    let data = demo_dataset();
    let mut changes = ChangeSet::new();

    for year in data.academic_years {
        changes.push(Mutation::Insert(Record::AcademicYear(year)));
    }
    for group in &data.groups {
        changes.push(Mutation::Insert(Record::Group(Group {
            leader_id: None,
            ..group.clone()
        })));
    }
    for user in data.users {
        changes.push(Mutation::Insert(Record::User(user)));
    }
    for group in data.groups.into_iter().filter(|group| group.leader_id.is_some()) {
        changes.push(Mutation::Update(Record::Group(group)));
    }
    for activity in data.activities {
        changes.push(Mutation::Insert(Record::Activity(activity)));
    }
    for record in data.participation_records {
        changes.push(Mutation::Insert(Record::ParticipationRecord(record)));
    }
    changes
}

fn user(id: &str, name: &str, role: UserRole, group_id: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        role,
        password: DEMO_PASSWORD.to_string(),
        group_id: group_id.map(str::to_string),
    }
}

fn group(id: &str, name: &str, leader_id: &str) -> Group {
    Group {
        id: id.to_string(),
        name: name.to_string(),
        leader_id: Some(leader_id.to_string()),
    }
}

fn year(id: &str, name: &str) -> AcademicYear {
    AcademicYear {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn activity(id: &str, name: &str, date: &str, academic_year_id: &str) -> Activity {
    Activity {
        id: id.to_string(),
        name: name.to_string(),
        date: date.to_string(),
        academic_year_id: academic_year_id.to_string(),
    }
}

fn record(
    id: &str,
    teacher_id: &str,
    activity_id: &str,
    status: ParticipationStatus,
) -> ParticipationRecord {
    ParticipationRecord {
        id: id.to_string(),
        teacher_id: teacher_id.to_string(),
        activity_id: activity_id.to_string(),
        status,
    }
}
