//! Entity store: the authoritative in-memory collections and their command
//! surface.
//!
//! # Responsibility
//! - Hold the five stored collections and expose typed add/update/remove.
//! - Route every deletion through the cascade planner.
//! - Delegate durability to a `PersistenceAdapter` chosen by the caller.
//!
//! # Invariants
//! - Validation and reference checks run before anything is staged.
//! - In-memory state only changes after the adapter confirms the whole
//!   change set of an operation; on failure it stays at the last commit.
//! - Bare removal without cascade is never exposed for users, groups,
//!   activities or academic years.

mod change_set;
mod dataset;
mod ids;

pub use change_set::{ChangeSet, Mutation};
pub(crate) use change_set::Staged;
pub use dataset::Dataset;

use crate::cascade::{check_integrity, classify_projection, plan_removal, CascadeStep};
use crate::error::{AuthError, StoreError, StoreResult};
use crate::model::{
    AcademicYear, Activity, Entity, EntityId, EntityKind, Group, ParticipationEntry,
    ParticipationRecord, Record, Teacher, User, ValidationError,
};
use crate::persistence::PersistenceAdapter;
use crate::seed;
use ids::fresh_id;
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::time::Instant;

/// In-memory entity collections synchronized with one persistence backend.
pub struct EntityStore<P: PersistenceAdapter> {
    adapter: P,
    data: Dataset,
}

impl<P: PersistenceAdapter> EntityStore<P> {
    /// Loads every collection from `adapter`.
    ///
    /// Integrity violations found in stored data are logged, not rejected.
    pub fn load(adapter: P) -> StoreResult<Self> {
        let data = load_dataset(&adapter)?;
        audit(&data);
        Ok(Self { adapter, data })
    }

    /// Loads the backend and seeds the demo dataset when it holds no data.
    pub fn initialize(adapter: P) -> StoreResult<Self> {
        let mut store = Self::load(adapter)?;
        let is_empty = EntityKind::ALL
            .iter()
            .all(|kind| store.data.len_of(*kind) == 0);
        if !is_empty {
            return Ok(store);
        }

        let mut staged = Staged::new(&store.data);
        for mutation in seed::demo_changes().iter() {
            staged.push(mutation.clone())?;
        }
        store.commit(staged)?;
        info!(
            "event=store_seed module=store status=ok backend={} users={} activities={}",
            store.adapter.backend_name(),
            store.data.users.len(),
            store.data.activities.len()
        );
        Ok(store)
    }

    /// Discards in-memory state and re-reads every collection.
    ///
    /// Recovery path after a failed multi-step operation on a backend whose
    /// change sets are not atomic.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.data = load_dataset(&self.adapter)?;
        audit(&self.data);
        Ok(())
    }

    pub fn adapter(&self) -> &P {
        &self.adapter
    }

    /// Read-only view of every collection.
    pub fn snapshot(&self) -> &Dataset {
        &self.data
    }

    pub fn users(&self) -> &[User] {
        &self.data.users
    }

    pub fn groups(&self) -> &[Group] {
        &self.data.groups
    }

    pub fn academic_years(&self) -> &[AcademicYear] {
        &self.data.academic_years
    }

    pub fn activities(&self) -> &[Activity] {
        &self.data.activities
    }

    pub fn participation_records(&self) -> &[ParticipationRecord] {
        &self.data.participation_records
    }

    /// Teacher projection, recomputed from the current users.
    pub fn teachers(&self) -> Vec<Teacher> {
        self.data.teachers()
    }

    pub fn get<T: Entity>(&self, id: &str) -> Option<&T> {
        self.data.get::<T>(id)
    }

    /// Stores a new entity under a freshly generated id and returns it.
    pub fn add<T: Entity>(&mut self, draft: T::Draft) -> StoreResult<T> {
        let started = Instant::now();
        let result = self.add_inner::<T>(draft);
        log_outcome("entity_add", T::KIND, started, &result);
        result
    }

    fn add_inner<T: Entity>(&mut self, draft: T::Draft) -> StoreResult<T> {
        let id = fresh_id(T::collection(&self.data));
        let item = T::from_draft(id, draft).normalized();
        item.validate()?;
        let record = item.clone().into_record();
        check_references(&self.data, &record, None)?;

        let mut staged = Staged::new(&self.data);
        staged.insert(item.clone())?;
        self.commit(staged)?;
        log_projection(None, Some(&record));
        Ok(item)
    }

    /// Replaces the stored entity that has `item`'s id.
    ///
    /// Fails with `NotFound` when no such entity exists.
    pub fn update<T: Entity>(&mut self, item: T) -> StoreResult<()> {
        let started = Instant::now();
        let result = self.update_inner(item);
        log_outcome("entity_update", T::KIND, started, &result);
        result
    }

    fn update_inner<T: Entity>(&mut self, item: T) -> StoreResult<()> {
        let existing = self
            .data
            .get::<T>(item.id())
            .cloned()
            .ok_or_else(|| StoreError::not_found(T::KIND, item.id()))?;
        let item = item.merge_update(&existing).normalized();
        item.validate()?;
        if item == existing {
            return Ok(());
        }

        let before = existing.into_record();
        let after = item.clone().into_record();
        check_references(&self.data, &after, Some(&before))?;

        let mut staged = Staged::new(&self.data);
        staged.update(item)?;
        self.commit(staged)?;
        log_projection(Some(&before), Some(&after));
        Ok(())
    }

    /// Deletes one entity together with its full cascade closure.
    pub fn remove(&mut self, kind: EntityKind, id: &str) -> StoreResult<()> {
        let started = Instant::now();
        let result = self.remove_inner(kind, id);
        log_outcome("entity_remove", kind, started, &result);
        result
    }

    fn remove_inner(&mut self, kind: EntityKind, id: &str) -> StoreResult<()> {
        let plan =
            plan_removal(&self.data, kind, id).ok_or_else(|| StoreError::not_found(kind, id))?;
        let before = self.data.get::<User>(id).cloned().map(User::into_record);

        let mut staged = Staged::new(&self.data);
        for step in &plan.steps {
            match step {
                CascadeStep::ClearGroupLeader { group_id } => {
                    if let Some(group) = staged.data.get::<Group>(group_id).cloned() {
                        staged.update(Group {
                            leader_id: None,
                            ..group
                        })?;
                    }
                }
                CascadeStep::Remove { kind, id } => staged.delete(*kind, id)?,
            }
        }
        self.commit(staged)?;

        info!(
            "event=cascade_remove module=store status=ok kind={} users={} activities={} records={} cleared_leaders={}",
            kind.collection_name(),
            plan.removed(EntityKind::User).len(),
            plan.removed(EntityKind::Activity).len(),
            plan.removed(EntityKind::ParticipationRecord).len(),
            plan.cleared_leaders().len()
        );
        if kind == EntityKind::User {
            log_projection(before.as_ref(), None);
        }
        Ok(())
    }

    pub fn remove_user(&mut self, id: &str) -> StoreResult<()> {
        self.remove(EntityKind::User, id)
    }

    /// Deletes the group and every member account (with their records).
    pub fn remove_group(&mut self, id: &str) -> StoreResult<()> {
        self.remove(EntityKind::Group, id)
    }

    pub fn remove_academic_year(&mut self, id: &str) -> StoreResult<()> {
        self.remove(EntityKind::AcademicYear, id)
    }

    pub fn remove_activity(&mut self, id: &str) -> StoreResult<()> {
        self.remove(EntityKind::Activity, id)
    }

    pub fn remove_participation_record(&mut self, id: &str) -> StoreResult<()> {
        self.remove(EntityKind::ParticipationRecord, id)
    }

    /// Edits a teacher through its backing user account (name and group).
    pub fn update_teacher(&mut self, teacher: Teacher) -> StoreResult<()> {
        let user = self.teacher_account(&teacher.id)?;
        self.update(User {
            name: teacher.name,
            group_id: teacher.group_id,
            ..user
        })
    }

    /// Deleting a teacher deletes the user account and everything it owns.
    pub fn remove_teacher(&mut self, id: &str) -> StoreResult<()> {
        self.teacher_account(id)?;
        self.remove_user(id)
    }

    fn teacher_account(&self, id: &str) -> StoreResult<User> {
        self.data
            .get::<User>(id)
            .filter(|user| user.role.is_teacher())
            .cloned()
            .ok_or_else(|| StoreError::not_found(EntityKind::User, id))
    }

    /// Replaces every participation record of one activity in one change set.
    pub fn update_participation_batch(
        &mut self,
        activity_id: &str,
        entries: &[ParticipationEntry],
    ) -> StoreResult<Vec<ParticipationRecord>> {
        let started = Instant::now();
        let result = self.update_participation_batch_inner(activity_id, entries);
        log_outcome(
            "participation_batch",
            EntityKind::ParticipationRecord,
            started,
            &result,
        );
        result
    }

    fn update_participation_batch_inner(
        &mut self,
        activity_id: &str,
        entries: &[ParticipationEntry],
    ) -> StoreResult<Vec<ParticipationRecord>> {
        if !self.data.contains::<Activity>(activity_id) {
            return Err(StoreError::not_found(EntityKind::Activity, activity_id));
        }
        let mut seen = BTreeSet::new();
        for entry in entries {
            if !seen.insert(entry.teacher_id.as_str()) {
                return Err(ValidationError::DuplicateParticipant(entry.teacher_id.clone()).into());
            }
            ensure_participant(&self.data, &entry.teacher_id)?;
        }

        let mut staged = Staged::new(&self.data);
        let stale: Vec<EntityId> = self
            .data
            .participation_records
            .iter()
            .filter(|record| record.activity_id == activity_id)
            .map(|record| record.id.clone())
            .collect();
        for id in &stale {
            staged.delete(EntityKind::ParticipationRecord, id)?;
        }

        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = ParticipationRecord {
                id: fresh_id(&staged.data.participation_records),
                teacher_id: entry.teacher_id.clone(),
                activity_id: activity_id.to_string(),
                status: entry.status,
            };
            staged.insert(record.clone())?;
            created.push(record);
        }
        self.commit(staged)?;

        debug!(
            "event=participation_batch module=store status=ok replaced={} inserted={}",
            stale.len(),
            created.len()
        );
        Ok(created)
    }

    /// Self-service password change; the current password must match.
    ///
    /// An empty `new_password` leaves the stored password unchanged.
    pub fn request_password_change(
        &mut self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> StoreResult<()> {
        let started = Instant::now();
        let result = self
            .password_target(user_id)
            .and_then(|user| {
                if user.password != current_password {
                    return Err(AuthError::PasswordMismatch.into());
                }
                Ok(user)
            })
            .and_then(|user| self.store_password(user, new_password));
        log_outcome("password_change", EntityKind::User, started, &result);
        result
    }

    /// Administrator reset; no current-password check.
    ///
    /// An empty `new_password` leaves the stored password unchanged.
    pub fn request_password_reset(&mut self, user_id: &str, new_password: &str) -> StoreResult<()> {
        let started = Instant::now();
        let result = self
            .password_target(user_id)
            .and_then(|user| self.store_password(user, new_password));
        log_outcome("password_reset", EntityKind::User, started, &result);
        result
    }

    fn password_target(&self, user_id: &str) -> StoreResult<User> {
        self.data
            .get::<User>(user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(EntityKind::User, user_id))
    }

    fn store_password(&mut self, user: User, new_password: &str) -> StoreResult<()> {
        if new_password.is_empty() {
            debug!("event=password_write module=store status=skipped reason=empty");
            return Ok(());
        }
        let mut staged = Staged::new(&self.data);
        staged.update(User {
            password: new_password.to_string(),
            ..user
        })?;
        self.commit(staged)
    }

    fn commit(&mut self, staged: Staged) -> StoreResult<()> {
        if staged.changes.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        match self.adapter.apply_changes(&staged.changes) {
            Ok(()) => {
                debug!(
                    "event=commit module=store status=ok backend={} mutations={} duration_ms={}",
                    self.adapter.backend_name(),
                    staged.changes.len(),
                    started.elapsed().as_millis()
                );
                self.data = staged.data;
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=commit module=store status=error backend={} mutations={} duration_ms={} error={}",
                    self.adapter.backend_name(),
                    staged.changes.len(),
                    started.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

fn load_dataset<P: PersistenceAdapter>(adapter: &P) -> StoreResult<Dataset> {
    let started = Instant::now();
    let mut data = Dataset::default();
    for kind in EntityKind::ALL {
        let loaded = adapter
            .load_collection(kind)
            .and_then(|records| data.replace_collection(kind, records));
        if let Err(err) = loaded {
            error!(
                "event=store_load module=store status=error backend={} kind={} duration_ms={} error={}",
                adapter.backend_name(),
                kind.collection_name(),
                started.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    }

    info!(
        "event=store_load module=store status=ok backend={} users={} groups={} years={} activities={} records={} duration_ms={}",
        adapter.backend_name(),
        data.users.len(),
        data.groups.len(),
        data.academic_years.len(),
        data.activities.len(),
        data.participation_records.len(),
        started.elapsed().as_millis()
    );
    Ok(data)
}

fn audit(data: &Dataset) {
    for violation in check_integrity(data) {
        warn!(
            "event=integrity_violation module=store code={} detail={}",
            violation.code(),
            violation
        );
    }
}

/// Cross-collection checks for one incoming row.
///
/// `previous` is the stored row on update; a group leader's role is only
/// checked when the leader changes.
fn check_references(data: &Dataset, record: &Record, previous: Option<&Record>) -> StoreResult<()> {
    match record {
        Record::User(user) => {
            if let Some(group_id) = &user.group_id {
                if !data.contains::<Group>(group_id) {
                    return Err(StoreError::not_found(EntityKind::Group, group_id));
                }
            }
        }
        Record::Group(group) => {
            if let Some(leader_id) = &group.leader_id {
                let leader = data
                    .get::<User>(leader_id)
                    .ok_or_else(|| StoreError::not_found(EntityKind::User, leader_id))?;
                let previous_leader = match previous {
                    Some(Record::Group(old)) => old.leader_id.as_deref(),
                    _ => None,
                };
                if previous_leader != Some(leader_id.as_str()) && !leader.role.is_teacher() {
                    return Err(ValidationError::LeaderNotTeacher {
                        group_id: group.id.clone(),
                        user_id: leader_id.clone(),
                    }
                    .into());
                }
            }
        }
        Record::AcademicYear(_) => {}
        Record::Activity(activity) => {
            if !data.contains::<AcademicYear>(&activity.academic_year_id) {
                return Err(StoreError::not_found(
                    EntityKind::AcademicYear,
                    &activity.academic_year_id,
                ));
            }
        }
        Record::ParticipationRecord(record) => {
            ensure_participant(data, &record.teacher_id)?;
            if !data.contains::<Activity>(&record.activity_id) {
                return Err(StoreError::not_found(
                    EntityKind::Activity,
                    &record.activity_id,
                ));
            }
        }
    }
    Ok(())
}

fn ensure_participant(data: &Dataset, teacher_id: &str) -> StoreResult<()> {
    let user = data
        .get::<User>(teacher_id)
        .ok_or_else(|| StoreError::not_found(EntityKind::User, teacher_id))?;
    if !user.role.is_teacher() {
        return Err(ValidationError::ParticipantNotTeacher(teacher_id.to_string()).into());
    }
    Ok(())
}

fn log_projection(before: Option<&Record>, after: Option<&Record>) {
    let as_user = |record: Option<&Record>| match record {
        Some(Record::User(user)) => Some(user.clone()),
        _ => None,
    };
    let (before, after) = (as_user(before), as_user(after));
    if before.is_none() && after.is_none() {
        return;
    }

    let change = classify_projection(before.as_ref(), after.as_ref());
    let user_id = after
        .as_ref()
        .or(before.as_ref())
        .map(|user| user.id.as_str())
        .unwrap_or_default();
    debug!(
        "event=teacher_projection module=store change={} user_id={}",
        change.label(),
        user_id
    );
}

fn log_outcome<T>(event: &str, kind: EntityKind, started: Instant, result: &StoreResult<T>) {
    match result {
        Ok(_) => info!(
            "event={} module=store status=ok kind={} duration_ms={}",
            event,
            kind.collection_name(),
            started.elapsed().as_millis()
        ),
        Err(StoreError::Persistence(_)) => error!(
            "event={} module=store status=error kind={} duration_ms={} error_code=persistence",
            event,
            kind.collection_name(),
            started.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={} module=store status=rejected kind={} duration_ms={} error_code={}",
            event,
            kind.collection_name(),
            started.elapsed().as_millis(),
            err.code()
        ),
    }
}
