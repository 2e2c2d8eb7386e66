use anyhow::{anyhow, Result};
use mqfleet_core::EnsembleConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

const DEFAULT_VERSION: &str = "1.0";
const DEFAULT_DATA_BASE: &str = "${base}";
const DEFAULT_BASE_PROFILE: &str = "mq-base";
const DEFAULT_LOG_LEVEL: &str = "info";

/// configuration settings loaded from the config file
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LoadConfiguration {
    /// Fleet name, only used for logging
    pub(crate) fleet_name: String,
    /// Version used for broker descriptions that do not name one (defaults to "1.0")
    pub(crate) default_version: Option<String>,
    /// Directory default broker data paths are derived from (defaults to "${base}")
    pub(crate) data_base: Option<String>,
    /// Metadata store configuration
    pub(crate) store: StoreConfig,
    /// Ensemble the provisioned nodes join
    pub(crate) ensemble: EnsembleConfig,
    /// Resolution of bare broker config references
    #[serde(default)]
    pub(crate) config_resolver: Option<ConfigResolverConfig>,
    /// Node providers available for provisioning
    #[serde(default)]
    pub(crate) providers: Vec<ProviderConfig>,
    /// Log level used when RUST_LOG is not set
    pub(crate) log_level: Option<String>,
}

/// validated settings the manager runs with
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ServiceConfiguration {
    pub(crate) fleet_name: String,
    pub(crate) default_version: String,
    pub(crate) data_base: String,
    /// Path of the metadata snapshot file
    pub(crate) store_path: PathBuf,
    /// Node the manager runs on, parent of provisioned nodes
    pub(crate) current_node: String,
    pub(crate) ensemble: EnsembleConnection,
    /// Profile bare config references resolve against
    pub(crate) base_profile: String,
    pub(crate) providers: Vec<ProviderConfig>,
    pub(crate) log_level: String,
}

/// Metadata store configuration
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoreConfig {
    /// Snapshot file of the file-backed store
    pub(crate) path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EnsembleConfig {
    pub(crate) current_node: String,
    pub(crate) url: String,
    pub(crate) password: Option<String>,
    pub(crate) proxy_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ConfigResolverConfig {
    pub(crate) base_profile: String,
}

/// Node provider entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProviderConfig {
    /// Scheme the provider is registered under, e.g. "ssh" or "child"
    pub(crate) scheme: String,
    /// Nodes created by this provider are children of the current node
    #[serde(default)]
    pub(crate) child: bool,
    /// Management user for child nodes when the broker description has none
    #[serde(default)]
    pub(crate) default_user: Option<String>,
}

/// Implementing the TryFrom trait to transform LoadConfiguration into ServiceConfiguration
impl TryFrom<LoadConfiguration> for ServiceConfiguration {
    type Error = anyhow::Error;

    fn try_from(config: LoadConfiguration) -> Result<Self> {
        if config.store.path.trim().is_empty() {
            return Err(anyhow!("store.path must not be empty"));
        }
        if config.ensemble.url.trim().is_empty() {
            return Err(anyhow!("ensemble.url must not be empty"));
        }
        if config.ensemble.current_node.trim().is_empty() {
            return Err(anyhow!("ensemble.current_node must not be empty"));
        }

        let default_version = config
            .default_version
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        if default_version.is_empty() || default_version.contains('/') {
            return Err(anyhow!("invalid default_version: {:?}", default_version));
        }

        // every scheme maps to exactly one provider
        let mut schemes = HashSet::new();
        for provider in &config.providers {
            if provider.scheme.trim().is_empty() {
                return Err(anyhow!("provider scheme must not be empty"));
            }
            if !schemes.insert(provider.scheme.as_str()) {
                return Err(anyhow!("provider scheme {} is configured twice", provider.scheme));
            }
        }

        Ok(ServiceConfiguration {
            fleet_name: config.fleet_name,
            default_version,
            data_base: config
                .data_base
                .unwrap_or_else(|| DEFAULT_DATA_BASE.to_string()),
            store_path: PathBuf::from(config.store.path),
            current_node: config.ensemble.current_node,
            ensemble: EnsembleConnection {
                url: config.ensemble.url,
                password: config.ensemble.password,
                proxy_uri: config.ensemble.proxy_uri,
            },
            base_profile: config
                .config_resolver
                .map(|r| r.base_profile)
                .unwrap_or_else(|| DEFAULT_BASE_PROFILE.to_string()),
            providers: config.providers,
            log_level: config
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}
