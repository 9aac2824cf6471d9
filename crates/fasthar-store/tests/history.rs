use fasthar_core::Snapshot;
use fasthar_core::har::{HarReader, HarWriter};
use fasthar_store::{SnapshotStore, StoreKey};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(filename)
}

fn tagged(snapshot_ref: &str) -> Snapshot {
    let mut har = HarReader::from_file(&fixture_path("enriched.har")).unwrap();
    har.log.snapshot_ref = Some(snapshot_ref.to_string());
    Snapshot::new(har)
}

async fn stores() -> Vec<(Arc<dyn SnapshotStore>, tempfile::TempDir)> {
    let dir = tempfile::tempdir().unwrap();
    let file = fasthar_store::open(dir.path().to_str().unwrap()).await.unwrap();
    let memory = fasthar_store::open("memory://").await.unwrap();
    vec![(file, dir), (memory, tempfile::tempdir().unwrap())]
}

#[tokio::test]
async fn test_listed_snapshot_is_identical_to_appended() {
    for (store, _dir) in stores().await {
        let key = StoreKey::for_url("http://thephantomoftheopera.com");
        let snapshot = tagged("badc0ffee");

        store.append(&key, &snapshot).await.unwrap();
        let history = store.list(&key).await.unwrap();

        let found = Snapshot::find(&history, "badc0ffee").unwrap();
        assert_eq!(found, &snapshot, "{}", store.describe());
        assert_eq!(
            HarWriter::to_json(&found.har).unwrap(),
            HarWriter::to_json(&snapshot.har).unwrap()
        );
    }
}

#[tokio::test]
async fn test_concurrent_appends_are_all_kept() {
    for (store, _dir) in stores().await {
        let key = StoreKey::for_url("http://example.com/");

        let mut handles = Vec::new();
        for i in 0..24 {
            let store = Arc::clone(&store);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                store.append(&key, &tagged(&format!("r{i}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let history = store.list(&key).await.unwrap();
        assert_eq!(history.len(), 24, "{}", store.describe());
        let mut refs: Vec<String> = history
            .iter()
            .map(|s| s.snapshot_ref().unwrap().to_string())
            .collect();
        refs.sort();
        refs.dedup();
        assert_eq!(refs.len(), 24);
    }
}

#[tokio::test]
async fn test_duplicate_refs_are_kept_and_first_wins() {
    for (store, _dir) in stores().await {
        let key = StoreKey::for_url("http://example.com/");
        let mut second = tagged("same");
        second.har.log.sha = Some("second".to_string());

        store.append(&key, &tagged("same")).await.unwrap();
        store.append(&key, &second).await.unwrap();

        let history = store.list(&key).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(Snapshot::find(&history, "same").unwrap().har.log.sha, None);
    }
}
