use imo_storage::*;
use tempfile::TempDir;

#[test]
fn test_file_store_roundtrip_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/store.json");

    let store = FileStore::builder().path(&path).open().unwrap();
    store.set("import-map-override:react", "//localhost:8080/react.js").unwrap();
    store.set("import-map-overrides-disabled", "[\"react\"]").unwrap();
    store.delete("import-map-overrides-disabled").unwrap();
    drop(store);

    let reopened = FileStore::builder().path(&path).create(false).open().unwrap();
    assert_eq!(
        reopened.get("import-map-override:react").unwrap().as_deref(),
        Some("//localhost:8080/react.js")
    );
    assert!(reopened.get("import-map-overrides-disabled").unwrap().is_none());
    assert_eq!(reopened.keys().unwrap().len(), 1);
}

#[test]
fn test_missing_snapshot_without_create_fails() {
    let temp = TempDir::new().unwrap();
    let result = FileStore::builder().path(temp.path().join("absent.json")).create(false).open();

    assert!(matches!(result, Err(StorageError::Io { .. })));
}

#[test]
fn test_malformed_snapshot_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.json");
    std::fs::write(&path, b"not json").unwrap();

    let result = FileStore::builder().path(&path).open();
    assert!(matches!(result, Err(StorageError::Snapshot { .. })));
}

#[test]
fn test_no_temp_files_left_after_writes() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::builder().path(temp.path().join("store.json")).open().unwrap();

    for i in 0..10 {
        store.set(&format!("key-{i}"), "value").unwrap();
    }

    let leftovers = std::fs::read_dir(temp.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().contains(".imotmp."))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn test_namespaced_view_over_file_store() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::builder().path(temp.path().join("store.json")).open().unwrap();
    let overrides = store.namespace("import-map-override:");

    overrides.set("@demo/pkg", "//localhost:9000/demo-pkg.js").unwrap();
    store.set("import-map-overrides-external-maps", "[]").unwrap();

    assert_eq!(overrides.keys().unwrap(), vec!["@demo/pkg".to_owned()]);
    assert_eq!(overrides.qualify("@demo/pkg"), "import-map-override:@demo/pkg");
    assert!(store.probe().is_ok());
}
