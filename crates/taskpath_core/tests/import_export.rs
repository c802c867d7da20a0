use taskpath_core::{
    CategoryService, ExportData, ImportPolicy, MemoryStorage, NewTask, Settings, SettingsStore,
    TaskService, TransferError, TransferService,
};

fn draft(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        due_date: 1_000,
        ..NewTask::default()
    }
}

fn bundle_json(data: &ExportData) -> String {
    serde_json::to_string(data).unwrap()
}

#[test]
fn export_produces_the_snapshot_shape() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);
    let categories = CategoryService::new(&storage);
    categories.list();
    let done = tasks.create_task(draft("Done")).unwrap();
    tasks.create_task(draft("Open")).unwrap();
    tasks.toggle_completion(done.id, true).unwrap();

    let transfer = TransferService::new(&storage);
    let payload = transfer.export_snapshot("android").unwrap();

    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    let metadata = &value["metadata"];
    assert!(metadata["version"].is_string());
    assert!(metadata["exportDate"].is_string());
    assert_eq!(metadata["platform"], "android");

    let data = &value["data"];
    assert_eq!(data["tasks"].as_array().unwrap().len(), 2);
    assert!(!data["categories"].as_array().unwrap().is_empty());
    assert!(data["settings"].is_object());

    // Pretty-printed with 2-space indent.
    assert!(payload.contains("\n  \"metadata\""));
}

#[test]
fn export_does_not_mutate_local_state() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);
    tasks.create_task(draft("Untouched")).unwrap();

    let before_active = tasks.active();
    let transfer = TransferService::new(&storage);
    transfer.export_snapshot("ios").unwrap();

    assert_eq!(tasks.active(), before_active);
    assert!(tasks.archived().is_empty());
}

#[test]
fn merge_keeps_local_replaces_collisions_adds_new() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);
    let a = tasks.create_task(draft("A")).unwrap();
    let b = tasks.create_task(draft("B")).unwrap();

    let mut b_prime = b.clone();
    b_prime.title = "B, imported".to_string();
    let mut c = b.clone();
    c.id = uuid::Uuid::new_v4();
    c.title = "C".to_string();

    let transfer = TransferService::new(&storage);
    let summary = transfer
        .import(
            &bundle_json(&ExportData {
                tasks: vec![b_prime.clone(), c.clone()],
                categories: Vec::new(),
                settings: None,
            }),
            ImportPolicy::Merge,
        )
        .unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.replaced, 1);
    assert_eq!(summary.preserved, 1);

    let active = tasks.active();
    let titles: Vec<_> = active.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B, imported", "C"]);
    assert_eq!(tasks.get(a.id).unwrap().title, "A");
    assert_eq!(tasks.get(b.id).unwrap().title, "B, imported");
}

#[test]
fn replace_overwrites_local_collections() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);
    tasks.create_task(draft("A")).unwrap();
    let b = tasks.create_task(draft("B")).unwrap();

    let mut b_prime = b.clone();
    b_prime.title = "B, imported".to_string();
    let mut c = b.clone();
    c.id = uuid::Uuid::new_v4();
    c.title = "C".to_string();

    let transfer = TransferService::new(&storage);
    let summary = transfer
        .import(
            &bundle_json(&ExportData {
                tasks: vec![b_prime, c],
                categories: Vec::new(),
                settings: None,
            }),
            ImportPolicy::Replace,
        )
        .unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.replaced, 1);
    assert_eq!(summary.preserved, 0);

    let titles: Vec<_> = tasks
        .active()
        .iter()
        .map(|t| t.title.clone())
        .collect();
    assert_eq!(titles, vec!["B, imported", "C"]);
}

#[test]
fn imported_tasks_split_by_archived_flag() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);

    let mut open = taskpath_core::Task::new("Open", 1_000, 500);
    open.archived = false;
    let mut done = taskpath_core::Task::new("Done", 1_000, 500);
    done.completed = true;
    done.archived = true;
    done.archived_at = Some(2_000);

    let transfer = TransferService::new(&storage);
    transfer
        .import(
            &bundle_json(&ExportData {
                tasks: vec![open.clone(), done.clone()],
                categories: Vec::new(),
                settings: None,
            }),
            ImportPolicy::Replace,
        )
        .unwrap();

    assert_eq!(tasks.active().len(), 1);
    assert_eq!(tasks.active()[0].id, open.id);
    assert_eq!(tasks.archived().len(), 1);
    assert_eq!(tasks.archived()[0].id, done.id);
}

#[test]
fn malformed_bundle_leaves_everything_untouched() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);
    tasks.create_task(draft("Keep me")).unwrap();
    let before = tasks.active();

    let transfer = TransferService::new(&storage);
    for payload in ["not json at all", "{\"data\":{}}", "{\"tasks\":42}"] {
        let err = transfer.import(payload, ImportPolicy::Replace).unwrap_err();
        assert!(matches!(err, TransferError::MalformedBundle(_)));
        assert_eq!(tasks.active(), before);
    }
}

#[test]
fn structurally_invalid_task_rejects_the_whole_bundle() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);
    tasks.create_task(draft("Keep me")).unwrap();
    let before = tasks.active();

    let blank = taskpath_core::Task::new("   ", 1_000, 500);
    let transfer = TransferService::new(&storage);
    let err = transfer
        .import(
            &bundle_json(&ExportData {
                tasks: vec![blank],
                categories: Vec::new(),
                settings: None,
            }),
            ImportPolicy::Merge,
        )
        .unwrap_err();

    assert!(matches!(err, TransferError::InvalidTask(_)));
    assert_eq!(tasks.active(), before);
}

#[test]
fn full_snapshot_roundtrips_through_import() {
    let storage = MemoryStorage::new();
    let tasks = TaskService::new(&storage);
    let categories = CategoryService::new(&storage);
    categories.list();
    let done = tasks.create_task(draft("Done")).unwrap();
    tasks.create_task(draft("Open")).unwrap();
    tasks.toggle_completion(done.id, false).unwrap();
    tasks.archive_task(done.id).unwrap();
    SettingsStore::new(&storage)
        .save(&Settings {
            auto_archive_enabled: true,
            ..Settings::default()
        })
        .unwrap();

    let payload = TransferService::new(&storage)
        .export_snapshot("android")
        .unwrap();

    let other = MemoryStorage::new();
    TransferService::new(&other)
        .import(&payload, ImportPolicy::Replace)
        .unwrap();

    let imported_tasks = TaskService::new(&other);
    assert_eq!(imported_tasks.active(), tasks.active());
    assert_eq!(imported_tasks.archived(), tasks.archived());
    assert_eq!(
        CategoryService::new(&other).list(),
        categories.list()
    );
    assert!(SettingsStore::new(&other).load().auto_archive_enabled);
}
