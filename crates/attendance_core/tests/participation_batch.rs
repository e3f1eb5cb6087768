use attendance_core::{
    EntityStore, MemoryAdapter, ParticipationEntry, ParticipationStatus, StoreError,
    ValidationError,
};

fn seeded_store() -> EntityStore<MemoryAdapter> {
    EntityStore::initialize(MemoryAdapter::new()).unwrap()
}

fn statuses_for(
    store: &EntityStore<MemoryAdapter>,
    activity_id: &str,
) -> Vec<(String, ParticipationStatus)> {
    let mut rows: Vec<_> = store
        .participation_records()
        .iter()
        .filter(|record| record.activity_id == activity_id)
        .map(|record| (record.teacher_id.clone(), record.status))
        .collect();
    rows.sort();
    rows
}

#[test]
fn batch_replaces_every_record_of_the_activity() {
    let mut store = seeded_store();
    let created = store
        .update_participation_batch(
            "act-1",
            &[
                ParticipationEntry::new("user-teacher-1", ParticipationStatus::Organizer),
                ParticipationEntry::new("user-leader-1", ParticipationStatus::LeftEarly),
            ],
        )
        .unwrap();

    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|record| record.id.starts_with("pr-")));
    assert_eq!(
        statuses_for(&store, "act-1"),
        vec![
            ("user-leader-1".to_string(), ParticipationStatus::LeftEarly),
            ("user-teacher-1".to_string(), ParticipationStatus::Organizer),
        ]
    );
    assert_eq!(statuses_for(&store, "act-2").len(), 4);
    assert_eq!(store.adapter().snapshot().unwrap(), *store.snapshot());
}

#[test]
fn empty_batch_clears_the_activity() {
    let mut store = seeded_store();
    store.update_participation_batch("act-2", &[]).unwrap();
    assert!(statuses_for(&store, "act-2").is_empty());
    assert_eq!(store.participation_records().len(), 5);
}

#[test]
fn batch_rejects_duplicates_and_non_teachers_before_writing() {
    let mut store = seeded_store();
    let before = store.snapshot().clone();

    let err = store
        .update_participation_batch(
            "act-1",
            &[
                ParticipationEntry::new("user-teacher-1", ParticipationStatus::Late),
                ParticipationEntry::new("user-teacher-1", ParticipationStatus::Absent),
            ],
        )
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Validation(ValidationError::DuplicateParticipant(
            "user-teacher-1".to_string()
        ))
    );

    let err = store
        .update_participation_batch(
            "act-1",
            &[ParticipationEntry::new("user-admin", ParticipationStatus::Late)],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::ParticipantNotTeacher(_))
    ));

    let err = store
        .update_participation_batch("act-missing", &[])
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    assert_eq!(*store.snapshot(), before);
}
