use attendance_core::{
    AcademicYear, Activity, EntityKind, EntityStore, Group, MemoryAdapter, NewAcademicYear,
    NewActivity, NewGroup, NewParticipationRecord, NewUser, ParticipationStatus, StoreError,
    Teacher, User, UserRole, ValidationError,
};

fn empty_store() -> EntityStore<MemoryAdapter> {
    EntityStore::load(MemoryAdapter::new()).unwrap()
}

#[test]
fn add_assigns_unique_prefixed_ids_and_persists() {
    let mut store = empty_store();
    let first = store
        .add::<AcademicYear>(NewAcademicYear::new("2024-2025"))
        .unwrap();
    let second = store
        .add::<AcademicYear>(NewAcademicYear::new("2025-2026"))
        .unwrap();

    assert!(first.id.starts_with("year-"));
    assert_ne!(first.id, second.id);
    assert_eq!(store.academic_years().len(), 2);

    let stored = store.adapter().snapshot().unwrap();
    assert_eq!(stored.academic_years, store.academic_years());
}

#[test]
fn add_trims_names_and_rejects_blank_ones() {
    let mut store = empty_store();
    let group = store.add::<Group>(NewGroup::new("  Math  ")).unwrap();
    assert_eq!(group.name, "Math");

    let err = store.add::<Group>(NewGroup::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::BlankField {
            kind: EntityKind::Group,
            ..
        })
    ));
    assert_eq!(store.groups().len(), 1);
}

#[test]
fn teacher_accounts_need_an_existing_group() {
    let mut store = empty_store();

    let err = store
        .add::<User>(NewUser::new("Alice", UserRole::Teacher, "pw"))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingGroup(_))
    ));

    let err = store
        .add::<User>(NewUser::new("Alice", UserRole::Teacher, "pw").in_group("group-missing"))
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            kind: EntityKind::Group,
            id: "group-missing".to_string(),
        }
    );
    assert!(store.users().is_empty());
}

#[test]
fn admin_accounts_never_keep_a_group() {
    let mut store = empty_store();
    let group = store.add::<Group>(NewGroup::new("Math")).unwrap();
    let admin = store
        .add::<User>(NewUser::new("Root", UserRole::Admin, "pw").in_group(group.id))
        .unwrap();

    assert_eq!(admin.group_id, None);
    assert!(store.teachers().is_empty());
}

#[test]
fn activity_requires_year_and_calendar_date() {
    let mut store = empty_store();
    let year = store
        .add::<AcademicYear>(NewAcademicYear::new("2024-2025"))
        .unwrap();

    let err = store
        .add::<Activity>(NewActivity::new("Orientation", "2024-02-30", year.id.clone()))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::InvalidDate(_))
    ));

    let err = store
        .add::<Activity>(NewActivity::new("Orientation", "2024-09-01", "year-missing"))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            kind: EntityKind::AcademicYear,
            ..
        }
    ));

    let activity = store
        .add::<Activity>(NewActivity::new("Orientation", "2024-09-01", year.id))
        .unwrap();
    assert!(activity.id.starts_with("act-"));
}

#[test]
fn participation_requires_teacher_role_user() {
    let mut store = empty_store();
    let year = store
        .add::<AcademicYear>(NewAcademicYear::new("2024-2025"))
        .unwrap();
    let activity = store
        .add::<Activity>(NewActivity::new("Orientation", "2024-09-01", year.id))
        .unwrap();
    let admin = store
        .add::<User>(NewUser::new("Root", UserRole::Admin, "pw"))
        .unwrap();

    let err = store
        .add::<attendance_core::ParticipationRecord>(NewParticipationRecord {
            teacher_id: admin.id.clone(),
            activity_id: activity.id,
            status: ParticipationStatus::Participated,
        })
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Validation(ValidationError::ParticipantNotTeacher(admin.id))
    );
}

#[test]
fn update_replaces_existing_row_and_reports_missing_ones() {
    let mut store = empty_store();
    let year = store
        .add::<AcademicYear>(NewAcademicYear::new("2024-2025"))
        .unwrap();

    store
        .update(AcademicYear {
            name: "School year 2024-2025".to_string(),
            ..year.clone()
        })
        .unwrap();
    assert_eq!(
        store.get::<AcademicYear>(&year.id).unwrap().name,
        "School year 2024-2025"
    );

    let err = store
        .update(AcademicYear {
            id: "year-missing".to_string(),
            name: "Ghost".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(store.academic_years().len(), 1);
}

#[test]
fn empty_password_on_update_keeps_stored_password() {
    let mut store = empty_store();
    let admin = store
        .add::<User>(NewUser::new("Root", UserRole::Admin, "secret"))
        .unwrap();

    store
        .update(User {
            name: "Root Admin".to_string(),
            password: String::new(),
            ..admin.clone()
        })
        .unwrap();

    let stored = store.get::<User>(&admin.id).unwrap();
    assert_eq!(stored.name, "Root Admin");
    assert_eq!(stored.password, "secret");
}

#[test]
fn leader_must_hold_teacher_role_when_assigned() {
    let mut store = empty_store();
    let group = store.add::<Group>(NewGroup::new("Math")).unwrap();
    let admin = store
        .add::<User>(NewUser::new("Root", UserRole::Admin, "pw"))
        .unwrap();

    let err = store
        .update(Group {
            leader_id: Some(admin.id.clone()),
            ..group.clone()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::LeaderNotTeacher { .. })
    ));

    let err = store
        .update(Group {
            leader_id: Some("user-ghost".to_string()),
            ..group
        })
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
}

#[test]
fn teacher_projection_follows_role_changes() {
    let mut store = empty_store();
    let group = store.add::<Group>(NewGroup::new("Math")).unwrap();
    let user = store
        .add::<User>(NewUser::new("Alice", UserRole::Admin, "pw"))
        .unwrap();
    assert!(store.teachers().is_empty());

    store
        .update(User {
            role: UserRole::GroupLeader,
            group_id: Some(group.id.clone()),
            ..user.clone()
        })
        .unwrap();
    assert_eq!(
        store.teachers(),
        vec![Teacher {
            id: user.id.clone(),
            name: "Alice".to_string(),
            group_id: Some(group.id.clone()),
        }]
    );

    store
        .update(User {
            role: UserRole::Admin,
            ..store.get::<User>(&user.id).unwrap().clone()
        })
        .unwrap();
    assert!(store.teachers().is_empty());
    assert_eq!(store.get::<User>(&user.id).unwrap().group_id, None);
}

#[test]
fn teacher_projection_query_is_stable_without_writes() {
    let store = EntityStore::initialize(MemoryAdapter::new()).unwrap();
    let first = store.teachers();
    let second = store.teachers();

    assert_eq!(first, second);
    let teacher_role_users = store
        .users()
        .iter()
        .filter(|user| user.role.is_teacher())
        .count();
    assert_eq!(first.len(), teacher_role_users);
}

#[test]
fn update_teacher_patches_backing_user() {
    let mut store = EntityStore::initialize(MemoryAdapter::new()).unwrap();
    let mut teacher = store
        .teachers()
        .into_iter()
        .find(|teacher| teacher.id == "user-teacher-1")
        .unwrap();
    teacher.name = "Alex N.".to_string();
    teacher.group_id = Some("group-2".to_string());

    store.update_teacher(teacher).unwrap();

    let user = store.get::<User>("user-teacher-1").unwrap();
    assert_eq!(user.name, "Alex N.");
    assert_eq!(user.group_id.as_deref(), Some("group-2"));
    assert_eq!(user.role, UserRole::Teacher);
    assert_eq!(user.password, "123");
}

#[test]
fn update_teacher_rejects_non_teacher_accounts() {
    let mut store = EntityStore::initialize(MemoryAdapter::new()).unwrap();
    let err = store
        .update_teacher(Teacher {
            id: "user-admin".to_string(),
            name: "Admin".to_string(),
            group_id: None,
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn initialize_seeds_only_an_empty_backend() {
    let adapter = MemoryAdapter::new();
    let store = EntityStore::initialize(adapter).unwrap();
    assert_eq!(store.users().len(), 8);
    assert_eq!(store.participation_records().len(), 9);
    assert!(attendance_core::check_integrity(store.snapshot()).is_empty());

    let mut store = EntityStore::load(MemoryAdapter::new()).unwrap();
    store
        .add::<AcademicYear>(NewAcademicYear::new("2030-2031"))
        .unwrap();
    let snapshot = store.adapter().snapshot().unwrap();
    let reopened = EntityStore::initialize(MemoryAdapter::with_dataset(snapshot)).unwrap();
    assert!(reopened.users().is_empty());
    assert_eq!(reopened.academic_years().len(), 1);
}
