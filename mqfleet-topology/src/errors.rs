use mqfleet_core::metadata::MetadataError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopologyError>;

#[derive(Error, Debug)]
pub enum TopologyError {
    /// Malformed input entry.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing provider, node or profile.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A node provider refused to plan a node.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Metadata store error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The failure of one element of a batch operation.
#[derive(Debug)]
pub struct ItemError {
    /// Broker or node name the failure belongs to.
    pub item: String,
    pub error: TopologyError,
}

impl ItemError {
    pub fn new(item: impl Into<String>, error: TopologyError) -> Self {
        ItemError {
            item: item.into(),
            error,
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.error)
    }
}

impl std::error::Error for ItemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Result of a batch operation: the elements that went through and the ones that failed.
///
/// A non-empty `failed` list next to a non-empty `completed` list is a partial failure.
/// Batch operations never drop the completed results because some elements failed.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub completed: Vec<T>,
    pub failed: Vec<ItemError>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        BatchOutcome {
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty() && !self.completed.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record(&mut self, item: &str, result: Result<T>) {
        match result {
            Ok(value) => self.completed.push(value),
            Err(error) => self.failed.push(ItemError::new(item, error)),
        }
    }

    pub(crate) fn merge(&mut self, other: BatchOutcome<T>) {
        self.completed.extend(other.completed);
        self.failed.extend(other.failed);
    }
}
