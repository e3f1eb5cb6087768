//! Relational backend on SQLite tables.
//!
//! # Responsibility
//! - Map each entity kind to one table and each mutation to one statement.
//! - Run a whole change set inside one immediate transaction.
//!
//! # Invariants
//! - Connections are opened through `db::open_db*`, so foreign keys are
//!   enforced and the schema is migrated before any row is touched.
//! - A failed change set rolls back completely.
//! - Read paths reject invalid persisted enum values instead of masking them.

use super::{Operation, PersistenceAdapter, PersistenceError, PersistenceResult};
use crate::db::{open_db, open_db_in_memory};
use crate::model::{
    AcademicYear, Activity, EntityKind, Group, ParticipationRecord, ParticipationStatus, Record,
    User, UserRole,
};
use crate::store::{ChangeSet, Mutation};
use log::{debug, error};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

pub struct SqliteAdapter {
    conn: Mutex<Connection>,
}

impl SqliteAdapter {
    /// Opens (or creates) a database file with the current schema.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Private in-memory database; useful for tests and throwaway sessions.
    pub fn open_in_memory() -> PersistenceResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self, operation: Operation) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::new(None, operation, "sqlite connection lock poisoned"))
    }
}

impl PersistenceAdapter for SqliteAdapter {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn load_collection(&self, kind: EntityKind) -> PersistenceResult<Vec<Record>> {
        let conn = self.conn(Operation::Load)?;
        let sql = match kind {
            EntityKind::User => {
                "SELECT id, name, role, password, group_id FROM users ORDER BY rowid"
            }
            EntityKind::Group => "SELECT id, name, leader_id FROM teacher_groups ORDER BY rowid",
            EntityKind::AcademicYear => "SELECT id, name FROM academic_years ORDER BY rowid",
            EntityKind::Activity => {
                "SELECT id, name, date, academic_year_id FROM activities ORDER BY rowid"
            }
            EntityKind::ParticipationRecord => {
                "SELECT id, teacher_id, activity_id, status FROM participation_records ORDER BY rowid"
            }
        };

        let load_error = |err: rusqlite::Error| PersistenceError::new(Some(kind), Operation::Load, err);
        let mut stmt = conn.prepare(sql).map_err(load_error)?;
        let mut rows = stmt.query([]).map_err(load_error)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(load_error)? {
            records.push(parse_row(kind, row)?);
        }
        Ok(records)
    }

    fn insert_one(&self, record: &Record) -> PersistenceResult<()> {
        let conn = self.conn(Operation::Insert)?;
        write_mutation(&conn, &Mutation::Insert(record.clone()))
    }

    fn update_one(&self, record: &Record) -> PersistenceResult<()> {
        let conn = self.conn(Operation::Update)?;
        write_mutation(&conn, &Mutation::Update(record.clone()))
    }

    fn delete_one(&self, kind: EntityKind, id: &str) -> PersistenceResult<()> {
        let conn = self.conn(Operation::Delete)?;
        write_mutation(
            &conn,
            &Mutation::Delete {
                kind,
                id: id.to_string(),
            },
        )
    }

    fn apply_changes(&self, changes: &ChangeSet) -> PersistenceResult<()> {
        let started_at = Instant::now();
        let conn = self.conn(Operation::Commit)?;
        let commit_error = |err: rusqlite::Error| PersistenceError::new(None, Operation::Commit, err);

        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)
            .map_err(commit_error)?;
        for mutation in changes.iter() {
            if let Err(err) = write_mutation(&tx, mutation) {
                error!(
                    "event=sqlite_commit module=persistence status=rollback mutations={} duration_ms={} error={}",
                    changes.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        }
        tx.commit().map_err(commit_error)?;

        debug!(
            "event=sqlite_commit module=persistence status=ok mutations={} duration_ms={}",
            changes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Group => "teacher_groups",
        EntityKind::AcademicYear => "academic_years",
        EntityKind::Activity => "activities",
        EntityKind::ParticipationRecord => "participation_records",
    }
}

fn write_mutation(conn: &Connection, mutation: &Mutation) -> PersistenceResult<()> {
    let kind = mutation.kind();
    let (operation, result) = match mutation {
        Mutation::Insert(record) => (Operation::Insert, insert_row(conn, record)),
        Mutation::Update(record) => (Operation::Update, update_row(conn, record)),
        Mutation::Delete { kind, id } => (
            Operation::Delete,
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", table_name(*kind)),
                params![id],
            ),
        ),
    };

    match result {
        Ok(0) if operation != Operation::Insert => Err(PersistenceError::missing_row(
            kind,
            operation,
            mutation.id(),
        )),
        Ok(_) => Ok(()),
        Err(err) => Err(PersistenceError::new(Some(kind), operation, err)),
    }
}

fn insert_row(conn: &Connection, record: &Record) -> rusqlite::Result<usize> {
    match record {
        Record::User(user) => conn.execute(
            "INSERT INTO users (id, name, role, password, group_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.name,
                role_to_db(user.role),
                user.password,
                user.group_id
            ],
        ),
        Record::Group(group) => conn.execute(
            "INSERT INTO teacher_groups (id, name, leader_id) VALUES (?1, ?2, ?3)",
            params![group.id, group.name, group.leader_id],
        ),
        Record::AcademicYear(year) => conn.execute(
            "INSERT INTO academic_years (id, name) VALUES (?1, ?2)",
            params![year.id, year.name],
        ),
        Record::Activity(activity) => conn.execute(
            "INSERT INTO activities (id, name, date, academic_year_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                activity.id,
                activity.name,
                activity.date,
                activity.academic_year_id
            ],
        ),
        Record::ParticipationRecord(record) => conn.execute(
            "INSERT INTO participation_records (id, teacher_id, activity_id, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.teacher_id,
                record.activity_id,
                status_to_db(record.status)
            ],
        ),
    }
}

fn update_row(conn: &Connection, record: &Record) -> rusqlite::Result<usize> {
    match record {
        Record::User(user) => conn.execute(
            "UPDATE users SET name = ?2, role = ?3, password = ?4, group_id = ?5
             WHERE id = ?1",
            params![
                user.id,
                user.name,
                role_to_db(user.role),
                user.password,
                user.group_id
            ],
        ),
        Record::Group(group) => conn.execute(
            "UPDATE teacher_groups SET name = ?2, leader_id = ?3 WHERE id = ?1",
            params![group.id, group.name, group.leader_id],
        ),
        Record::AcademicYear(year) => conn.execute(
            "UPDATE academic_years SET name = ?2 WHERE id = ?1",
            params![year.id, year.name],
        ),
        Record::Activity(activity) => conn.execute(
            "UPDATE activities SET name = ?2, date = ?3, academic_year_id = ?4
             WHERE id = ?1",
            params![
                activity.id,
                activity.name,
                activity.date,
                activity.academic_year_id
            ],
        ),
        Record::ParticipationRecord(record) => conn.execute(
            "UPDATE participation_records SET teacher_id = ?2, activity_id = ?3, status = ?4
             WHERE id = ?1",
            params![
                record.id,
                record.teacher_id,
                record.activity_id,
                status_to_db(record.status)
            ],
        ),
    }
}

fn parse_row(kind: EntityKind, row: &Row<'_>) -> PersistenceResult<Record> {
    let load_error = |err: rusqlite::Error| PersistenceError::new(Some(kind), Operation::Load, err);
    let invalid = |column: &str, value: &str| {
        PersistenceError::new(
            Some(kind),
            Operation::Load,
            format!("invalid value `{value}` in {}.{column}", table_name(kind)),
        )
    };

    let record = match kind {
        EntityKind::User => {
            let role_text: String = row.get("role").map_err(load_error)?;
            let role = parse_role(&role_text).ok_or_else(|| invalid("role", &role_text))?;
            Record::User(User {
                id: row.get("id").map_err(load_error)?,
                name: row.get("name").map_err(load_error)?,
                role,
                password: row.get("password").map_err(load_error)?,
                group_id: row.get("group_id").map_err(load_error)?,
            })
        }
        EntityKind::Group => Record::Group(Group {
            id: row.get("id").map_err(load_error)?,
            name: row.get("name").map_err(load_error)?,
            leader_id: row.get("leader_id").map_err(load_error)?,
        }),
        EntityKind::AcademicYear => Record::AcademicYear(AcademicYear {
            id: row.get("id").map_err(load_error)?,
            name: row.get("name").map_err(load_error)?,
        }),
        EntityKind::Activity => Record::Activity(Activity {
            id: row.get("id").map_err(load_error)?,
            name: row.get("name").map_err(load_error)?,
            date: row.get("date").map_err(load_error)?,
            academic_year_id: row.get("academic_year_id").map_err(load_error)?,
        }),
        EntityKind::ParticipationRecord => {
            let status_text: String = row.get("status").map_err(load_error)?;
            let status =
                parse_status(&status_text).ok_or_else(|| invalid("status", &status_text))?;
            Record::ParticipationRecord(ParticipationRecord {
                id: row.get("id").map_err(load_error)?,
                teacher_id: row.get("teacher_id").map_err(load_error)?,
                activity_id: row.get("activity_id").map_err(load_error)?,
                status,
            })
        }
    };
    Ok(record)
}

fn role_to_db(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "admin",
        UserRole::GroupLeader => "group_leader",
        UserRole::Teacher => "teacher",
    }
}

fn parse_role(value: &str) -> Option<UserRole> {
    match value {
        "admin" => Some(UserRole::Admin),
        "group_leader" => Some(UserRole::GroupLeader),
        "teacher" => Some(UserRole::Teacher),
        _ => None,
    }
}

fn status_to_db(status: ParticipationStatus) -> &'static str {
    match status {
        ParticipationStatus::Organizer => "organizer",
        ParticipationStatus::Participated => "participated",
        ParticipationStatus::Late => "late",
        ParticipationStatus::LeftEarly => "left_early",
        ParticipationStatus::Absent => "absent",
    }
}

fn parse_status(value: &str) -> Option<ParticipationStatus> {
    match value {
        "organizer" => Some(ParticipationStatus::Organizer),
        "participated" => Some(ParticipationStatus::Participated),
        "late" => Some(ParticipationStatus::Late),
        "left_early" => Some(ParticipationStatus::LeftEarly),
        "absent" => Some(ParticipationStatus::Absent),
        _ => None,
    }
}
