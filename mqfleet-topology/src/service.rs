use mqfleet_core::{BrokerConfig, Profile, ProvisioningPlan, Section};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ensemble::EnsembleLocator;
use crate::errors::{BatchOutcome, ItemError, Result, TopologyError};
use crate::planner::ProvisioningPlanner;
use crate::provider::ProviderRegistry;
use crate::reconciler::{discover_managed_profiles, ratchet_minimum};
use crate::resolver::ConfigResolver;
use crate::resources::validate_segment;
use crate::store::ProfileStore;
use crate::translator::{
    broker_section_key, ConfigTranslator, BROKER_NAME, BROKER_SECTION_PREFIX, PARENT,
};

pub const DEFAULT_VERSION: &str = "1.0";
/// Parent given to broker profiles created without an explicit parent.
pub const DEFAULT_BASE_PROFILE: &str = "mq-base";

/// TopologyService - loads and applies the broker topology of the fleet
///
/// Loading reads the managed broker profiles back into flat [`BrokerConfig`]s.
/// Applying writes each description into its profile and raises the fleet
/// requirement for it, entry by entry: a failing entry is recorded and the
/// remaining entries are still applied.
#[derive(Clone)]
pub struct TopologyService {
    store: Arc<dyn ProfileStore>,
    translator: ConfigTranslator,
    planner: ProvisioningPlanner,
    default_version: String,
    base_profile: String,
}

impl std::fmt::Debug for TopologyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyService")
            .field("translator", &self.translator)
            .field("planner", &self.planner)
            .field("default_version", &self.default_version)
            .field("base_profile", &self.base_profile)
            .finish()
    }
}

impl TopologyService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        resolver: Arc<dyn ConfigResolver>,
        providers: ProviderRegistry,
        ensemble: Arc<dyn EnsembleLocator>,
    ) -> Self {
        TopologyService {
            translator: ConfigTranslator::new(resolver),
            planner: ProvisioningPlanner::new(store.clone(), providers, ensemble),
            store,
            default_version: DEFAULT_VERSION.to_string(),
            base_profile: DEFAULT_BASE_PROFILE.to_string(),
        }
    }

    /// Version used for descriptions that do not name one.
    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = version.into();
        self
    }

    pub fn with_base_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.base_profile = profile_id.into();
        self
    }

    pub fn with_data_base(mut self, data_base: impl Into<String>) -> Self {
        self.translator = self.translator.with_data_base(data_base);
        self
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    pub fn translator(&self) -> &ConfigTranslator {
        &self.translator
    }

    pub fn planner(&self) -> &ProvisioningPlanner {
        &self.planner
    }

    /// The broker descriptions of all managed broker profiles of `version`.
    pub async fn load_topology(&self, version: &str) -> Result<Vec<BrokerConfig>> {
        let managed =
            discover_managed_profiles(self.store.as_ref(), version, BROKER_SECTION_PREFIX).await?;
        let requirements = self.store.get_requirements().await?;

        let mut seen = HashSet::new();
        let mut configs = Vec::new();
        for profile in managed.values() {
            // a profile defining several brokers is listed once
            if !seen.insert(profile.id.as_str()) {
                continue;
            }
            let Some(mut cfg) = self.translator.from_section(profile) else {
                debug!(profile = %profile.id, "profile has no broker section, skipping");
                continue;
            };
            if let Some(minimum) = requirements.minimum_instances(&profile.id) {
                cfg.required_instances = minimum;
            }
            configs.push(cfg);
        }

        info!(version = %version, brokers = configs.len(), "loaded broker topology");
        Ok(configs)
    }

    /// [`load_topology`](Self::load_topology) for the default version.
    pub async fn load(&self) -> Result<Vec<BrokerConfig>> {
        self.load_topology(&self.default_version).await
    }

    pub async fn load_json(&self, version: &str) -> Result<String> {
        let configs = self.load_topology(version).await?;
        Ok(serde_json::to_string_pretty(&configs)?)
    }

    /// Writes every description into its profile and ratchets its requirement.
    pub async fn apply_topology(&self, cfgs: &[BrokerConfig]) -> BatchOutcome<Profile> {
        let mut outcome = BatchOutcome::default();
        for cfg in cfgs {
            let result = self.apply_one(cfg).await;
            if let Err(err) = &result {
                warn!(broker = %cfg.name, error = %err, "failed to apply broker configuration");
            }
            outcome.record(&cfg.name, result);
        }
        info!(
            applied = outcome.completed.len(),
            failed = outcome.failed.len(),
            "broker topology applied"
        );
        outcome
    }

    /// Decodes a JSON object or array of broker descriptions and applies them.
    ///
    /// Elements that do not decode are reported as configuration errors; the other
    /// elements are still applied. Only a document that is not a JSON object or
    /// array fails the whole call.
    pub async fn save_json(&self, json: &str) -> Result<BatchOutcome<Profile>> {
        let decoded = BrokerConfig::decode_batch(json)
            .map_err(|e| TopologyError::Configuration(format!("invalid broker document: {}", e)))?;

        let mut outcome = BatchOutcome::default();
        let mut cfgs = Vec::with_capacity(decoded.len());
        for (index, item) in decoded.into_iter().enumerate() {
            match item {
                Ok(cfg) => cfgs.push(cfg),
                Err(err) => {
                    warn!(entry = index, error = %err, "skipping undecodable broker entry");
                    outcome.failed.push(ItemError::new(
                        format!("entry {}", index),
                        TopologyError::Configuration(err.to_string()),
                    ));
                }
            }
        }

        outcome.merge(self.apply_topology(&cfgs).await);
        Ok(outcome)
    }

    async fn apply_one(&self, cfg: &BrokerConfig) -> Result<Profile> {
        validate_segment("broker name", &cfg.name)?;
        let version = cfg.version_or(&self.default_version);
        validate_segment("version", version)?;

        let section = self.translator.to_section(cfg, version).await?;
        let profile = self
            .create_or_update_profile(version, &cfg.name, section)
            .await?;

        let requirements = self.store.get_requirements().await?;
        let (requirements, changed) =
            ratchet_minimum(&requirements, &profile.id, cfg.required_instances);
        if changed {
            self.store.set_requirements(&requirements).await?;
            info!(
                profile = %profile.id,
                minimum_instances = cfg.required_instances,
                "raised profile requirement"
            );
        }
        Ok(profile)
    }

    /// Merges `section` into the broker section of profile `(version, name)`,
    /// creating the profile when it does not exist yet.
    ///
    /// A `parent` entry becomes the primary parent of the profile instead of being
    /// stored in the section. New profiles without one get the base broker profile.
    pub async fn create_or_update_profile(
        &self,
        version: &str,
        name: &str,
        mut section: Section,
    ) -> Result<Profile> {
        let parent = section.remove(PARENT).filter(|p| !p.is_empty());

        let (mut profile, created) = match self.store.get_profile(version, name).await? {
            Some(profile) => (profile, false),
            None => (Profile::new(name, version), true),
        };

        match parent {
            Some(parent) => {
                profile.parents.retain(|p| *p != parent);
                profile.parents.insert(0, parent);
            }
            None if created => profile.parents.push(self.base_profile.clone()),
            None => {}
        }
        if let Some(parent) = profile.primary_parent() {
            if self.store.get_profile(version, parent).await?.is_none() {
                warn!(profile = %name, parent = %parent, version = %version, "parent profile does not exist");
            }
        }

        profile
            .configurations
            .entry(broker_section_key(name))
            .or_insert_with(|| Section::from([(BROKER_NAME.to_string(), name.to_string())]))
            .extend(section);

        self.store.put_profile(&profile).await?;
        if created {
            info!(profile = %name, version = %version, "created broker profile");
        } else {
            debug!(profile = %name, version = %version, "updated broker profile");
        }
        Ok(profile)
    }

    /// Plans `node_names` for the broker described by `cfg`, whose profile is `cfg.name`.
    pub async fn provision(
        &self,
        cfg: &BrokerConfig,
        scheme: &str,
        node_names: &[String],
    ) -> Result<BatchOutcome<ProvisioningPlan>> {
        let version = cfg.version_or(&self.default_version);
        self.planner
            .build_plans(cfg, scheme, &cfg.name, version, node_names)
            .await
    }

    /// Adds the stored profile `(version, profile_id)` to each of `node_names`.
    pub async fn assign(
        &self,
        profile_id: &str,
        version: &str,
        node_names: &[String],
    ) -> Result<BatchOutcome<String>> {
        let profile = self
            .store
            .get_profile(version, profile_id)
            .await?
            .ok_or_else(|| {
                TopologyError::NotFound(format!("profile {} in version {}", profile_id, version))
            })?;
        Ok(self.planner.assign_profile(node_names, &profile).await)
    }
}
