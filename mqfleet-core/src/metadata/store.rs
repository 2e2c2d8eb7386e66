use async_trait::async_trait;
use serde_json::Value;

use super::errors::Result;

/// Backend-agnostic options for metadata store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaOptions {
    None,
    /// Treat the key as a prefix and return all matching entries as a JSON object
    /// keyed by full path.
    WithPrefix,
}

/// Hierarchical key-value store holding the fleet metadata.
///
/// Keys are `/`-separated paths with at least three segments
/// (`/{root}/{category}/{key...}`).
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    async fn get(&self, key: &str, get_options: MetaOptions) -> Result<Option<Value>>;
    async fn put(&self, key: &str, value: Value, put_options: MetaOptions) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}
