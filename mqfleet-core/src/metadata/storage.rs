//! Metadata storage enum.
//!
//! The manager persists to a JSON snapshot file; tests use the in-memory backend.

use async_trait::async_trait;
use serde_json::Value;

use super::{FileStore, MemoryStore, MetaOptions, MetadataStore, Result};

#[derive(Debug, Clone)]
pub enum MetadataStorage {
    File(FileStore),
    InMemory(MemoryStore),
}

#[async_trait]
impl MetadataStore for MetadataStorage {
    async fn get(&self, key: &str, opts: MetaOptions) -> Result<Option<Value>> {
        match self {
            Self::File(s) => s.get(key, opts).await,
            Self::InMemory(s) => s.get(key, opts).await,
        }
    }

    async fn put(&self, key: &str, value: Value, opts: MetaOptions) -> Result<()> {
        match self {
            Self::File(s) => s.put(key, value, opts).await,
            Self::InMemory(s) => s.put(key, value, opts).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Self::File(s) => s.delete(key).await,
            Self::InMemory(s) => s.delete(key).await,
        }
    }
}
