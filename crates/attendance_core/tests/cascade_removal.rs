use attendance_core::{
    check_integrity, plan_removal, AcademicYear, Activity, CascadeStep, EntityKind, EntityStore,
    Group, MemoryAdapter, NewAcademicYear, NewActivity, NewGroup, NewParticipationRecord, NewUser,
    ParticipationRecord, ParticipationStatus, StoreError, User, UserRole,
};

fn seeded_store() -> EntityStore<MemoryAdapter> {
    EntityStore::initialize(MemoryAdapter::new()).unwrap()
}

fn assert_consistent(store: &EntityStore<MemoryAdapter>) {
    let violations = check_integrity(store.snapshot());
    assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    assert_eq!(store.adapter().snapshot().unwrap(), *store.snapshot());
}

#[test]
fn deleting_year_removes_its_activities_and_their_records_but_keeps_users() {
    let mut store = EntityStore::load(MemoryAdapter::new()).unwrap();
    let year = store
        .add::<AcademicYear>(NewAcademicYear::new("2024-2025"))
        .unwrap();
    let activity = store
        .add::<Activity>(NewActivity::new("Orientation", "2024-09-01", year.id.clone()))
        .unwrap();
    let group = store.add::<Group>(NewGroup::new("Math")).unwrap();
    let alice = store
        .add::<User>(NewUser::new("Alice", UserRole::Teacher, "pw").in_group(group.id))
        .unwrap();
    store
        .add::<ParticipationRecord>(NewParticipationRecord {
            teacher_id: alice.id.clone(),
            activity_id: activity.id.clone(),
            status: ParticipationStatus::Participated,
        })
        .unwrap();

    store.remove_academic_year(&year.id).unwrap();

    assert!(store.get::<Activity>(&activity.id).is_none());
    assert!(store.participation_records().is_empty());
    assert!(store.get::<User>(&alice.id).is_some());
    assert_consistent(&store);
}

#[test]
fn deleting_year_leaves_other_years_untouched() {
    let mut store = seeded_store();
    store.remove_academic_year("year-1").unwrap();

    let activity_ids: Vec<&str> = store
        .activities()
        .iter()
        .map(|activity| activity.id.as_str())
        .collect();
    assert_eq!(activity_ids, vec!["act-4"]);
    assert!(store.participation_records().is_empty());
    assert_eq!(store.academic_years().len(), 1);
    assert_consistent(&store);
}

#[test]
fn deleting_group_deletes_member_accounts_and_their_records() {
    let mut store = seeded_store();
    store.remove_group("group-1").unwrap();

    for id in ["user-leader-1", "user-teacher-1", "user-teacher-2"] {
        assert!(store.get::<User>(id).is_none(), "{id} should be gone");
    }
    assert!(store
        .participation_records()
        .iter()
        .all(|record| !["user-teacher-1", "user-teacher-2"].contains(&record.teacher_id.as_str())));

    let group_ids: Vec<&str> = store.groups().iter().map(|group| group.id.as_str()).collect();
    assert_eq!(group_ids, vec!["group-2", "group-3"]);
    assert_eq!(
        store.get::<Group>("group-2").unwrap().leader_id.as_deref(),
        Some("user-leader-2")
    );
    assert!(store.get::<User>("user-admin").is_some());
    assert_consistent(&store);
}

#[test]
fn deleting_member_who_leads_another_group_clears_that_leader() {
    let mut store = seeded_store();
    store.remove_group("group-3").unwrap();

    assert!(store.get::<User>("user-teacher-5").is_none());
    assert!(store.get::<Group>("group-3").is_none());
    assert_eq!(store.groups().len(), 2);
    assert_consistent(&store);
}

#[test]
fn deleting_leader_clears_leader_reference_and_keeps_group() {
    let mut store = EntityStore::load(MemoryAdapter::new()).unwrap();
    let math = store.add::<Group>(NewGroup::new("Math")).unwrap();
    assert_eq!(math.leader_id, None);

    let bob = store
        .add::<User>(NewUser::new("Bob", UserRole::GroupLeader, "pw").in_group(math.id.clone()))
        .unwrap();
    store
        .update(Group {
            leader_id: Some(bob.id.clone()),
            ..math.clone()
        })
        .unwrap();
    assert_eq!(
        store.get::<Group>(&math.id).unwrap().leader_id.as_deref(),
        Some(bob.id.as_str())
    );

    store.remove_user(&bob.id).unwrap();

    let group = store.get::<Group>(&math.id).unwrap();
    assert_eq!(group.leader_id, None);
    assert!(store.teachers().is_empty());
    assert_consistent(&store);
}

#[test]
fn deleting_user_removes_their_records_only() {
    let mut store = seeded_store();
    store.remove_user("user-teacher-1").unwrap();

    assert_eq!(store.participation_records().len(), 6);
    assert!(store
        .participation_records()
        .iter()
        .all(|record| record.teacher_id != "user-teacher-1"));
    assert!(store.get::<Activity>("act-3").is_some());
    assert_consistent(&store);
}

#[test]
fn deleting_activity_removes_its_records() {
    let mut store = seeded_store();
    store.remove_activity("act-2").unwrap();

    assert!(store
        .participation_records()
        .iter()
        .all(|record| record.activity_id != "act-2"));
    assert_eq!(store.participation_records().len(), 5);
    assert_consistent(&store);
}

#[test]
fn remove_teacher_deletes_the_account() {
    let mut store = seeded_store();
    store.remove_teacher("user-teacher-4").unwrap();
    assert!(store.get::<User>("user-teacher-4").is_none());

    let err = store.remove_teacher("user-admin").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(store.get::<User>("user-admin").is_some());
}

#[test]
fn removing_missing_entity_is_not_found() {
    let mut store = seeded_store();
    let before = store.snapshot().clone();

    let err = store.remove(EntityKind::Group, "group-missing").unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            kind: EntityKind::Group,
            id: "group-missing".to_string(),
        }
    );
    assert_eq!(*store.snapshot(), before);
}

#[test]
fn demoted_teacher_keeps_participation_records() {
    let mut store = seeded_store();
    let user = store.get::<User>("user-teacher-1").unwrap().clone();
    store
        .update(User {
            role: UserRole::Admin,
            ..user
        })
        .unwrap();

    assert!(store.teachers().iter().all(|teacher| teacher.id != "user-teacher-1"));
    assert_eq!(
        store
            .participation_records()
            .iter()
            .filter(|record| record.teacher_id == "user-teacher-1")
            .count(),
        3
    );
    let codes: Vec<&str> = check_integrity(store.snapshot())
        .iter()
        .map(|violation| violation.code())
        .collect();
    assert_eq!(codes, vec!["participant_not_teacher"; 3]);
}

#[test]
fn user_plan_clears_leaders_before_records_and_removes_user_last() {
    let store = seeded_store();
    let plan = plan_removal(store.snapshot(), EntityKind::User, "user-leader-1").unwrap();

    assert_eq!(
        plan.steps,
        vec![
            CascadeStep::ClearGroupLeader {
                group_id: "group-1".to_string(),
            },
            CascadeStep::Remove {
                kind: EntityKind::User,
                id: "user-leader-1".to_string(),
            },
        ]
    );
}
