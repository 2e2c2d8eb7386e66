use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    errors::Result,
    memory_store::MemoryStore,
    store::{MetaOptions, MetadataStore},
};

/// FileStore keeps the metadata in memory and rewrites a JSON snapshot file
/// after every mutation.
///
/// The snapshot is a single JSON object mapping full paths to values. Writes go
/// to a sibling temporary file which is then renamed over the snapshot, so a
/// crash leaves either the old or the new content on disk. A mutation whose
/// snapshot cannot be written is undone in memory before the error is returned.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    flush_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Opens the snapshot at `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = MemoryStore::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                let entries: BTreeMap<String, Value> = serde_json::from_slice(&bytes)?;
                let count = entries.len();
                for (key, value) in entries {
                    inner.insert(&key, value)?;
                }
                info!(path = %path.display(), entries = count, "loaded metadata snapshot");
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no metadata snapshot found, starting empty");
            }
            Err(err) => return Err(err.into()),
        }

        Ok(FileStore {
            path,
            inner,
            flush_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn restore(&self, key: &str, previous: Option<Value>) -> Result<()> {
        warn!(path = %self.path.display(), key = %key, "snapshot write failed, reverting change");
        match previous {
            Some(value) => self.inner.insert(key, value).map(|_| ()),
            None => self.inner.remove(key).map(|_| ()),
        }
    }

    // callers hold `flush_lock`
    async fn flush(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.inner.snapshot())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "flushed metadata snapshot");
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for FileStore {
    async fn get(&self, key: &str, get_options: MetaOptions) -> Result<Option<Value>> {
        self.inner.get(key, get_options).await
    }

    async fn put(&self, key: &str, value: Value, _put_options: MetaOptions) -> Result<()> {
        let _guard = self.flush_lock.lock().await;
        let previous = self.inner.insert(key, value)?;
        if let Err(err) = self.flush().await {
            self.restore(key, previous)?;
            return Err(err);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.flush_lock.lock().await;
        let Some(previous) = self.inner.remove(key)? else {
            return Ok(());
        };
        if let Err(err) = self.flush().await {
            self.restore(key, Some(previous))?;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_snapshot_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("fleet.json");

        let store = FileStore::open(&path).await?;
        store
            .put("/fleet/nodes/c1", json!({"name": "c1"}), MetaOptions::None)
            .await?;
        store
            .put("/fleet/requirements/current", json!({}), MetaOptions::None)
            .await?;
        store.delete("/fleet/requirements/current").await?;

        let reopened = FileStore::open(&path).await?;
        assert_eq!(
            reopened.get("/fleet/nodes/c1", MetaOptions::None).await?,
            Some(json!({"name": "c1"}))
        );
        assert!(reopened
            .get("/fleet/requirements/current", MetaOptions::None)
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_is_not_kept() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("fleet.json");
        let store = FileStore::open(&path).await?;
        store
            .put("/fleet/profiles/1.0/kept", json!({"id": "kept"}), MetaOptions::None)
            .await?;

        // a directory in place of the temp file makes every snapshot write fail
        let blocker = path.with_extension("tmp");
        std::fs::create_dir(&blocker)?;

        let put = store
            .put("/fleet/profiles/1.0/a", json!({"id": "a"}), MetaOptions::None)
            .await;
        assert!(put.is_err());
        assert!(store
            .get("/fleet/profiles/1.0/a", MetaOptions::None)
            .await?
            .is_none());

        let overwrite = store
            .put("/fleet/profiles/1.0/kept", json!({"id": "changed"}), MetaOptions::None)
            .await;
        assert!(overwrite.is_err());
        assert!(store.delete("/fleet/profiles/1.0/kept").await.is_err());
        assert_eq!(
            store.get("/fleet/profiles/1.0/kept", MetaOptions::None).await?,
            Some(json!({"id": "kept"}))
        );

        std::fs::remove_dir(&blocker)?;
        store
            .put("/fleet/profiles/1.0/b", json!({"id": "b"}), MetaOptions::None)
            .await?;

        let reopened = FileStore::open(&path).await?;
        assert!(reopened
            .get("/fleet/profiles/1.0/a", MetaOptions::None)
            .await?
            .is_none());
        assert_eq!(
            reopened.get("/fleet/profiles/1.0/kept", MetaOptions::None).await?,
            Some(json!({"id": "kept"}))
        );
        assert!(reopened
            .get("/fleet/profiles/1.0/b", MetaOptions::None)
            .await?
            .is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileStore::open(dir.path().join("nested/fleet.json")).await?;
        assert!(store
            .get("/fleet/nodes/", MetaOptions::WithPrefix)
            .await?
            .is_none());

        store
            .put("/fleet/nodes/c1", json!({}), MetaOptions::None)
            .await?;
        assert!(store.path().exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("fleet.json");
        std::fs::write(&path, b"not json")?;

        let result = FileStore::open(&path).await;
        assert!(matches!(
            result,
            Err(crate::metadata::MetadataError::SerializationError(_))
        ));
        Ok(())
    }
}
