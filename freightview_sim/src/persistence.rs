//! JSON file persistence for the shipment list.

use async_trait::async_trait;
use freightview_core::{Shipment, Snapshot};
use freightview_env::{EnvError, SnapshotSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SimError;

/// Writes every published snapshot's shipments to a JSON file.
///
/// Each write goes to its own uniquely named sibling temp file, is synced,
/// and is then renamed over the target, so a crash mid-write leaves the
/// previous file intact. Writes are serialized, and a snapshot older than
/// the last one written is skipped, so the file only ever moves forward.
pub struct JsonFileStore {
    path: PathBuf,
    last_written: Mutex<Option<u64>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_written: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = std::ffi::OsString::from(".");
        if let Some(file) = self.path.file_name() {
            name.push(file);
        }
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    /// Reads previously saved shipments. A missing file yields `None`.
    pub fn load(&self) -> Result<Option<Vec<Shipment>>, SimError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SimError::io(&self.path, e)),
        };
        let shipments = serde_json::from_str(&raw).map_err(|e| SimError::json(&self.path, e))?;
        Ok(Some(shipments))
    }

    async fn write_atomic(&self, json: &[u8]) -> std::io::Result<()> {
        let temp = self.temp_path();
        let result = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(json).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&temp, &self.path).await
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&temp).await;
        }
        result
    }
}

#[async_trait]
impl SnapshotSink<Snapshot> for JsonFileStore {
    async fn publish(&self, snapshot: Arc<Snapshot>) -> Result<(), EnvError> {
        let mut last_written = self.last_written.lock().await;
        if last_written.is_some_and(|last| snapshot.sequence <= last) {
            debug!("Skipping stale snapshot {} for {}", snapshot.sequence, self.path.display());
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(&snapshot.shipments).map_err(EnvError::serialization)?;
        self.write_atomic(&json).await.map_err(EnvError::persistence)?;
        *last_written = Some(snapshot.sequence);

        debug!(
            "Saved {} shipments to {} (snapshot {})",
            snapshot.shipments.len(),
            self.path.display(),
            snapshot.sequence
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use freightview_core::{CityCatalog, CreateShipment, Tracker, TrackerConfig};
    use freightview_env::SequentialIds;

    fn tracker(store: Arc<JsonFileStore>) -> Tracker<SimContext> {
        Tracker::new(
            SimContext::shared(7),
            TrackerConfig::default(),
            Arc::new(CityCatalog::world()),
            Arc::new(SequentialIds::new()),
        )
        .unwrap()
        .with_sink(store)
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("shipments.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipments.json");
        std::fs::write(&path, "[{").unwrap();

        assert!(matches!(JsonFileStore::new(path).load(), Err(SimError::Json { .. })));
    }

    #[tokio::test]
    async fn test_published_snapshot_restores_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("shipments.json")));
        let source = tracker(store.clone());

        source
            .create_shipment(&CreateShipment::new("Parts", "Munich", "Shanghai"))
            .await
            .unwrap();
        source.tick().await.unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, source.list_shipments());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let restored = tracker(store.clone());
        assert_eq!(restored.restore(loaded).unwrap(), 1);
        let next = restored
            .create_shipment(&CreateShipment::new("More parts", "Munich", "Tokyo"))
            .await
            .unwrap();
        assert_eq!(next.id().to_string(), "PKG002");
    }

    #[test]
    fn test_temp_paths_are_unique_siblings() {
        let store = JsonFileStore::new("/data/shipments.json");
        let (a, b) = (store.temp_path(), store.temp_path());

        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/data")));
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".shipments.json.") && name.ends_with(".tmp"), "{name}");
    }

    #[tokio::test]
    async fn test_older_snapshot_never_overwrites_newer() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("shipments.json"));
        let source = Tracker::new(
            SimContext::shared(7),
            TrackerConfig::default(),
            Arc::new(CityCatalog::world()),
            Arc::new(SequentialIds::new()),
        )
        .unwrap();
        source
            .create_shipment(&CreateShipment::new("Parts", "Munich", "Shanghai"))
            .await
            .unwrap();
        let newer = source.snapshot();
        let older = Arc::new(Snapshot {
            sequence: newer.sequence - 1,
            taken_at_ms: newer.taken_at_ms,
            shipments: Vec::new(),
        });

        store.publish(newer.clone()).await.unwrap();
        store.publish(older).await.unwrap();

        assert_eq!(store.load().unwrap().unwrap(), newer.shipments);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_persist_the_full_set() {
        for round in 0..5 {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(JsonFileStore::new(dir.path().join("shipments.json")));
            let source = Arc::new(tracker(store.clone()));

            let handles: Vec<_> = (0..32)
                .map(|i| {
                    let source = Arc::clone(&source);
                    tokio::spawn(async move {
                        source
                            .create_shipment(&CreateShipment::new(format!("Crate {i}"), "Lima", "Bogotá"))
                            .await
                            .unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap();
            }

            let loaded = store.load().unwrap().unwrap();
            assert_eq!(loaded.len(), 32, "round {round}");
            assert_eq!(loaded, source.list_shipments(), "round {round}");
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1, "round {round}");
        }
    }
}
