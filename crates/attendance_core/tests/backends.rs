use attendance_core::store::Mutation;
use attendance_core::{
    check_integrity, open_adapter, BackendKind, ChangeSet, EntityKind, EntityStore, Group,
    JsonFileAdapter, NewGroup, NewUser, PersistenceAdapter, Record, SqliteAdapter, StoreConfig,
    User, UserRole,
};

fn exercise_cascades<P: PersistenceAdapter>(store: &mut EntityStore<P>) {
    store.remove_group("group-1").unwrap();
    store.remove_academic_year("year-2").unwrap();
    store.request_password_reset("user-teacher-3", "changed").unwrap();
    let group = store.add::<Group>(NewGroup::new("Science")).unwrap();
    store
        .add::<User>(NewUser::new("Fay", UserRole::Teacher, "pw").in_group(group.id))
        .unwrap();
}

#[test]
fn json_backend_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = EntityStore::initialize(JsonFileAdapter::open(dir.path()).unwrap()).unwrap();
    exercise_cascades(&mut store);
    let expected = store.snapshot().clone();
    drop(store);

    let reopened = EntityStore::load(JsonFileAdapter::open(dir.path()).unwrap()).unwrap();
    assert_eq!(*reopened.snapshot(), expected);
    assert!(check_integrity(reopened.snapshot()).is_empty());
    assert!(dir.path().join("participation_records.json").exists());
}

#[test]
fn sqlite_backend_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance.db");

    let mut store = EntityStore::initialize(SqliteAdapter::open(&path).unwrap()).unwrap();
    exercise_cascades(&mut store);
    let expected = store.snapshot().clone();
    drop(store);

    let reopened = EntityStore::initialize(SqliteAdapter::open(&path).unwrap()).unwrap();
    assert_eq!(*reopened.snapshot(), expected);
    assert_eq!(
        reopened.get::<User>("user-teacher-3").unwrap().password,
        "changed"
    );
}

#[test]
fn sqlite_change_set_rolls_back_on_constraint_failure() {
    let adapter = SqliteAdapter::open_in_memory().unwrap();
    let mut changes = ChangeSet::new();
    changes.push(Mutation::Insert(Record::Group(Group {
        id: "group-1".to_string(),
        name: "Math".to_string(),
        leader_id: None,
    })));
    changes.push(Mutation::Insert(Record::User(User {
        id: "user-1".to_string(),
        name: "Alice".to_string(),
        role: UserRole::Teacher,
        password: "pw".to_string(),
        group_id: Some("group-missing".to_string()),
    })));

    let err = adapter.apply_changes(&changes).unwrap_err();
    assert_eq!(err.kind, Some(EntityKind::User));
    assert!(adapter.load_collection(EntityKind::Group).unwrap().is_empty());
}

#[test]
fn sqlite_rejects_deleting_a_leader_without_clearing_the_reference() {
    let adapter = SqliteAdapter::open_in_memory().unwrap();
    let mut store = EntityStore::initialize(adapter).unwrap();

    assert!(store
        .adapter()
        .delete_one(EntityKind::User, "user-leader-2")
        .is_err());

    store.remove_user("user-leader-2").unwrap();
    assert_eq!(store.get::<Group>("group-2").unwrap().leader_id, None);
}

#[test]
fn open_adapter_builds_the_configured_backend() {
    let dir = tempfile::tempdir().unwrap();

    let memory = open_adapter(&StoreConfig::default()).unwrap();
    assert_eq!(memory.backend_name(), "memory");

    let json = open_adapter(&StoreConfig {
        backend: BackendKind::Json,
        data_path: Some(dir.path().join("docs")),
        ..StoreConfig::default()
    })
    .unwrap();
    assert_eq!(json.backend_name(), "json");

    let sqlite = open_adapter(&StoreConfig {
        backend: BackendKind::Sqlite,
        data_path: Some(dir.path().join("attendance.db")),
        ..StoreConfig::default()
    })
    .unwrap();
    let store = EntityStore::initialize(sqlite).unwrap();
    assert_eq!(store.adapter().backend_name(), "sqlite");
    assert_eq!(store.users().len(), 8);
}
