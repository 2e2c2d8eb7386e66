//! Mapping between a flat [`BrokerConfig`] and the broker section of a [`Profile`].

use mqfleet_core::{BrokerConfig, Profile, Section};
use std::sync::Arc;
use tracing::warn;

use crate::errors::Result;
use crate::resolver::ConfigResolver;

/// Prefix of the profile sections that describe a broker.
pub const BROKER_SECTION_PREFIX: &str = "mqfleet.broker-";

pub const DATA: &str = "data";
pub const CONFIG_URL: &str = "config";
pub const GROUP: &str = "group";
pub const NETWORKS: &str = "network";
pub const NETWORK_USER_NAME: &str = "network.userName";
pub const NETWORK_PASSWORD: &str = "network.password";
pub const PARENT: &str = "parent";
pub const BROKER_NAME: &str = "broker-name";

/// Placeholder each node expands to its own installation directory.
pub const DEFAULT_DATA_BASE: &str = "${base}";

const RECOGNIZED_KEYS: [&str; 8] = [
    DATA,
    CONFIG_URL,
    GROUP,
    NETWORKS,
    NETWORK_USER_NAME,
    NETWORK_PASSWORD,
    PARENT,
    BROKER_NAME,
];

pub fn broker_section_key(broker_name: &str) -> String {
    format!("{}{}", BROKER_SECTION_PREFIX, broker_name)
}

#[derive(Clone)]
pub struct ConfigTranslator {
    resolver: Arc<dyn ConfigResolver>,
    data_base: String,
}

impl std::fmt::Debug for ConfigTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigTranslator")
            .field("data_base", &self.data_base)
            .finish()
    }
}

impl ConfigTranslator {
    pub fn new(resolver: Arc<dyn ConfigResolver>) -> Self {
        ConfigTranslator {
            resolver,
            data_base: DEFAULT_DATA_BASE.to_string(),
        }
    }

    /// Overrides the directory default data paths are derived from.
    pub fn with_data_base(mut self, data_base: impl Into<String>) -> Self {
        self.data_base = data_base.into();
        self
    }

    pub fn default_data_path(&self, broker_name: &str) -> String {
        format!("{}/data/{}", self.data_base.trim_end_matches('/'), broker_name)
    }

    /// Builds the broker section entries for `cfg`.
    ///
    /// Extra properties that name a recognized key are dropped with a warning,
    /// so they can neither shadow a field nor rename or re-parent the broker.
    /// Optional fields that are unset produce no entry at all, which leaves any
    /// stored value in place when the section is merged into an existing profile.
    pub async fn to_section(&self, cfg: &BrokerConfig, version: &str) -> Result<Section> {
        let mut section = Section::new();

        for entry in &cfg.properties {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            if RECOGNIZED_KEYS.contains(&key) {
                warn!(broker = %cfg.name, key = %key, "ignoring property that names a reserved key");
                continue;
            }
            section.insert(key.to_string(), value.to_string());
        }

        let data = match cfg.data.as_deref() {
            Some(data) if !data.is_empty() => data.to_string(),
            _ => self.default_data_path(&cfg.name),
        };
        section.insert(DATA.to_string(), data);

        if let Some(config) = cfg.config_url.as_deref() {
            let resolved = self.resolver.resolve(version, config).await?;
            section.insert(CONFIG_URL.to_string(), resolved);
        }

        let optional = [
            (GROUP, &cfg.group),
            (NETWORKS, &cfg.networks),
            (NETWORK_USER_NAME, &cfg.networks_user_name),
            (NETWORK_PASSWORD, &cfg.networks_password),
            (PARENT, &cfg.parent_profile),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                section.insert(key.to_string(), value.clone());
            }
        }

        Ok(section)
    }

    /// Reads a broker description back from `profile`.
    ///
    /// Returns `None` when the profile has no broker section. Provisioning-only
    /// fields (`username`, `password`, `jvm_opts`) are not part of the section and
    /// come back unset; `required_instances` keeps its default.
    pub fn from_section(&self, profile: &Profile) -> Option<BrokerConfig> {
        let section = profile
            .section(&broker_section_key(&profile.id))
            .or_else(|| {
                profile
                    .sections_with_prefix(BROKER_SECTION_PREFIX)
                    .map(|(_, section)| section)
                    .next()
            })?;

        let get = |key: &str| section.get(key).cloned();

        let properties = section
            .iter()
            .filter(|(key, _)| !RECOGNIZED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| {
                if value.is_empty() {
                    key.clone()
                } else {
                    format!("{}={}", key, value)
                }
            })
            .collect();

        Some(BrokerConfig {
            name: profile.id.clone(),
            version: Some(profile.version.clone()),
            parent_profile: profile.primary_parent().map(str::to_string).or_else(|| get(PARENT)),
            data: get(DATA),
            config_url: get(CONFIG_URL),
            group: get(GROUP),
            networks: get(NETWORKS),
            networks_user_name: get(NETWORK_USER_NAME),
            networks_password: get(NETWORK_PASSWORD),
            properties,
            ..BrokerConfig::default()
        })
    }
}
