use super::{
    errors::Result,
    store::{MetaOptions, MetadataStore},
    MetadataError,
};

use async_trait::async_trait;
use dashmap::{mapref::one::RefMut, DashMap};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// MemoryStore is a simple in-memory key-value store that implements the MetadataStore trait.
/// Used by tests and as the working set of the FileStore.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            inner: Arc::new(DashMap::new()),
        }
    }

    fn get_map(&self, path: &str) -> Result<RefMut<'_, String, BTreeMap<String, Value>>> {
        let map_key = map_key(path)?;
        let bmap = self.inner.entry(map_key).or_default();
        Ok(bmap)
    }

    /// Returns every stored entry keyed by its full path.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        for entry in self.inner.iter() {
            for (key, value) in entry.value() {
                out.insert(format!("{}/{}", entry.key(), key), value.clone());
            }
        }
        out
    }

    /// Stores `value` at `path`, returning the value it replaced.
    pub(crate) fn insert(&self, path: &str, value: Value) -> Result<Option<Value>> {
        let key = item_key(path)?;
        Ok(self.get_map(path)?.insert(key, value))
    }

    pub(crate) fn remove(&self, path: &str) -> Result<Option<Value>> {
        let key = item_key(path)?;
        Ok(self.get_map(path)?.remove(&key))
    }
}

// The first three segments (empty, root, category) select the map.
fn map_key(path: &str) -> Result<String> {
    let parts: Vec<&str> = path.split('/').take(3).collect();
    if parts.len() < 3 || !path.starts_with('/') {
        return Err(MetadataError::InvalidArguments(format!(
            "Path must have at least 3 segments: {}",
            path
        )));
    }
    Ok(parts.join("/"))
}

fn item_key(path: &str) -> Result<String> {
    let parts: Vec<&str> = path.split('/').skip(3).collect();
    let key = parts.join("/");
    if key.is_empty() {
        return Err(MetadataError::InvalidArguments(format!(
            "Path must have a key component: {}",
            path
        )));
    }
    Ok(key)
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn get(&self, path: &str, get_options: MetaOptions) -> Result<Option<Value>> {
        let map_prefix = map_key(path)?;
        let suffix = path.split('/').skip(3).collect::<Vec<_>>().join("/");

        let Some(bmap) = self.inner.get(&map_prefix) else {
            return Ok(None);
        };

        match get_options {
            MetaOptions::None => Ok(bmap.get(&suffix).cloned()),
            MetaOptions::WithPrefix => {
                let matches: Map<String, Value> = bmap
                    .iter()
                    .filter(|(k, _)| k.starts_with(&suffix))
                    .map(|(k, v)| (format!("{}/{}", map_prefix, k), v.clone()))
                    .collect();
                if matches.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::Object(matches)))
                }
            }
        }
    }

    async fn put(&self, path: &str, value: Value, _put_options: MetaOptions) -> Result<()> {
        self.insert(path, value)?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.remove(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_delete() -> Result<()> {
        let store = MemoryStore::new();
        let path = "/fleet/profiles/1.0/broker1";
        let value = json!({"id": "broker1"});

        store.put(path, value.clone(), MetaOptions::None).await?;
        assert_eq!(store.get(path, MetaOptions::None).await?, Some(value));

        store.delete(path).await?;
        assert!(matches!(store.get(path, MetaOptions::None).await, Ok(None)));
        Ok(())
    }

    #[tokio::test]
    async fn test_prefix_get_returns_full_paths() -> Result<()> {
        let store = MemoryStore::new();
        store
            .put("/fleet/profiles/1.0/a", json!(1), MetaOptions::None)
            .await?;
        store
            .put("/fleet/profiles/1.0/b", json!(2), MetaOptions::None)
            .await?;
        store
            .put("/fleet/profiles/1.1/a", json!(3), MetaOptions::None)
            .await?;

        let found = store
            .get("/fleet/profiles/1.0/", MetaOptions::WithPrefix)
            .await?
            .expect("entries under prefix");
        let found = found.as_object().unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.get("/fleet/profiles/1.0/a"), Some(&json!(1)));
        assert_eq!(found.get("/fleet/profiles/1.0/b"), Some(&json!(2)));

        assert!(store
            .get("/fleet/profiles/2.0/", MetaOptions::WithPrefix)
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_paths() {
        let store = MemoryStore::new();
        let short = store.put("/fleet", json!(1), MetaOptions::None).await;
        assert!(matches!(short, Err(MetadataError::InvalidArguments(_))));

        let no_key = store.put("/fleet/nodes", json!(1), MetaOptions::None).await;
        assert!(matches!(no_key, Err(MetadataError::InvalidArguments(_))));
    }

    #[test]
    fn test_snapshot_rebuilds_full_paths() {
        let store = MemoryStore::new();
        store.insert("/fleet/nodes/c1", json!({"name": "c1"})).unwrap();
        store.insert("/fleet/requirements/current", json!({})).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("/fleet/nodes/c1"));
        assert!(snapshot.contains_key("/fleet/requirements/current"));
    }
}
