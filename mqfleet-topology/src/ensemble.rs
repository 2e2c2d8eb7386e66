use async_trait::async_trait;
use mqfleet_core::EnsembleConnection;

use crate::errors::{Result, TopologyError};

/// Supplies what newly provisioned nodes need to join the fleet.
#[async_trait]
pub trait EnsembleLocator: Send + Sync {
    /// Name of the node this engine runs on; it becomes the parent of planned nodes.
    async fn current_node(&self) -> Result<String>;

    async fn connection(&self) -> Result<EnsembleConnection>;
}

/// Locator with fixed values taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticEnsemble {
    current_node: String,
    connection: EnsembleConnection,
}

impl StaticEnsemble {
    pub fn new(current_node: impl Into<String>, connection: EnsembleConnection) -> Self {
        StaticEnsemble {
            current_node: current_node.into(),
            connection,
        }
    }
}

#[async_trait]
impl EnsembleLocator for StaticEnsemble {
    async fn current_node(&self) -> Result<String> {
        Ok(self.current_node.clone())
    }

    async fn connection(&self) -> Result<EnsembleConnection> {
        if self.connection.url.is_empty() {
            return Err(TopologyError::Configuration(
                "ensemble url is not configured".to_string(),
            ));
        }
        Ok(self.connection.clone())
    }
}
