// ABOUTME: Integration tests for the persisted environment pointer.
// ABOUTME: Bootstrap, record shape, atomic replacement and role validation on disk.

use cutover::pointer::{
    EnvironmentPointerStore, FilePointerStore, PointerBackend, PointerErrorKind,
};
use cutover::types::{EnvironmentName, EnvironmentPair};
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn name(s: &str) -> EnvironmentName {
    EnvironmentName::new(s).unwrap()
}

fn store_at(path: &Path) -> EnvironmentPointerStore {
    EnvironmentPointerStore::new(
        Arc::new(FilePointerStore::new(path)),
        EnvironmentPair::default(),
    )
}

fn stray_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n != "pointer.json")
        .collect()
}

#[tokio::test]
async fn first_read_writes_blue_record_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("pointer.json");
    let store = store_at(&path);

    assert_eq!(store.active_environment().await.unwrap(), "blue");

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({ "activeEnvironment": "blue" }));
}

#[tokio::test]
async fn reads_are_stable_between_switches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pointer.json");
    let store = store_at(&path);

    let first = store.active_environment().await.unwrap();
    let modified = fs::metadata(&path).unwrap().modified().unwrap();
    for _ in 0..5 {
        assert_eq!(store.active_environment().await.unwrap(), first);
    }
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
}

#[tokio::test]
async fn switch_is_visible_to_a_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pointer.json");

    store_at(&path)
        .set_active_environment(&name("green"))
        .await
        .unwrap();

    let reopened = store_at(&path);
    let (active, inactive) = reopened.roles_snapshot().await.unwrap();
    assert_eq!(active, "green");
    assert_eq!(inactive, "blue");
    assert!(stray_files(dir.path()).is_empty());
}

#[tokio::test]
async fn record_naming_unknown_role_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pointer.json");
    fs::write(&path, r#"{"activeEnvironment":"purple"}"#).unwrap();

    let err = store_at(&path).active_environment().await.unwrap_err();
    assert_eq!(err.kind(), PointerErrorKind::UnknownEnvironment);
}

#[tokio::test]
async fn truncated_record_is_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pointer.json");
    fs::write(&path, r#"{"activeEnv"#).unwrap();

    let err = store_at(&path).active_environment().await.unwrap_err();
    assert_eq!(err.kind(), PointerErrorKind::Corrupt);
    // The corrupt record is left for the operator
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"activeEnv"#);
}

#[tokio::test]
async fn foreign_role_is_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pointer.json");
    let store = store_at(&path);
    store.active_environment().await.unwrap();

    let err = store
        .set_active_environment(&name("purple"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), PointerErrorKind::UnknownEnvironment);
    assert_eq!(store.active_environment().await.unwrap(), "blue");
}

#[tokio::test]
async fn concurrent_readers_never_see_a_torn_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pointer.json");
    let backend = Arc::new(FilePointerStore::new(&path));
    let store = EnvironmentPointerStore::new(backend.clone(), EnvironmentPair::default());
    store.active_environment().await.unwrap();

    let reader = tokio::spawn({
        let backend = backend.clone();
        async move {
            for _ in 0..200 {
                let record = backend.read().await.unwrap().unwrap();
                assert!(
                    record.active_environment == "blue" || record.active_environment == "green"
                );
            }
        }
    });

    for i in 0..200 {
        let target = if i % 2 == 0 { "green" } else { "blue" };
        store.set_active_environment(&name(target)).await.unwrap();
    }
    reader.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_each_land_a_whole_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pointer.json");
    let store = store_at(&path);
    store.active_environment().await.unwrap();

    for _ in 0..300 {
        let writers: Vec<_> = ["blue", "green"]
            .into_iter()
            .map(|target| {
                let store = store.clone();
                tokio::spawn(async move { store.set_active_environment(&name(target)).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let active = store.active_environment().await.unwrap();
        assert!(active == "blue" || active == "green", "unexpected role {active}");
    }

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|n| n != "pointer.json")
        .collect();
    assert!(leftovers.is_empty(), "stray files: {leftovers:?}");
}

proptest! {
    #[test]
    fn last_write_wins_and_leaves_no_staging_files(switches in proptest::collection::vec(any::<bool>(), 1..16)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pointer.json");
        let store = store_at(&path);

        let last = runtime.block_on(async {
            let mut last = name("blue");
            for to_green in &switches {
                last = name(if *to_green { "green" } else { "blue" });
                store.set_active_environment(&last).await.unwrap();
            }
            last
        });

        let (active, inactive) = runtime.block_on(store_at(&path).roles_snapshot()).unwrap();
        prop_assert_eq!(&active, &last);
        prop_assert_ne!(&active, &inactive);
        prop_assert!(stray_files(dir.path()).is_empty());
    }
}
