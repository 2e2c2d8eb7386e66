use mqfleet_core::{BrokerConfig, Profile, ProvisioningPlan};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ensemble::EnsembleLocator;
use crate::errors::{BatchOutcome, Result, TopologyError};
use crate::provider::{NodeProvider, ProviderRegistry};
use crate::store::ProfileStore;

/// ProvisioningPlanner - turns broker descriptions into node-level work
///
/// ## Responsibilities:
/// - **Plan building**: one [`ProvisioningPlan`] per requested node, parented to the
///   node this engine runs on and wired to the ensemble
/// - **Profile assignment**: adds a profile to the profile set of existing nodes
///
/// Both operations walk their node list to the end. A node that fails is recorded
/// in the returned [`BatchOutcome`] and the next node is processed.
#[derive(Clone)]
pub struct ProvisioningPlanner {
    store: Arc<dyn ProfileStore>,
    providers: ProviderRegistry,
    ensemble: Arc<dyn EnsembleLocator>,
}

impl std::fmt::Debug for ProvisioningPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningPlanner")
            .field("providers", &self.providers)
            .finish()
    }
}

impl ProvisioningPlanner {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        providers: ProviderRegistry,
        ensemble: Arc<dyn EnsembleLocator>,
    ) -> Self {
        ProvisioningPlanner {
            store,
            providers,
            ensemble,
        }
    }

    /// Builds a provisioning plan for each of `node_names`.
    ///
    /// Fails as a whole only when no provider is registered for `scheme`.
    pub async fn build_plans(
        &self,
        cfg: &BrokerConfig,
        scheme: &str,
        profile_id: &str,
        version: &str,
        node_names: &[String],
    ) -> Result<BatchOutcome<ProvisioningPlan>> {
        let provider = self.providers.get(scheme).ok_or_else(|| {
            TopologyError::NotFound(format!("no node provider available for scheme: {}", scheme))
        })?;

        let mut outcome = BatchOutcome::default();
        for name in node_names {
            let result = self
                .build_plan(provider.as_ref(), cfg, profile_id, version, name)
                .await;
            if let Err(err) = &result {
                warn!(node = %name, scheme = %scheme, error = %err, "unable to plan node");
            }
            outcome.record(name, result);
        }

        info!(
            profile = %profile_id,
            scheme = %scheme,
            planned = outcome.completed.len(),
            failed = outcome.failed.len(),
            "provisioning plans built"
        );
        Ok(outcome)
    }

    async fn build_plan(
        &self,
        provider: &dyn NodeProvider,
        cfg: &BrokerConfig,
        profile_id: &str,
        version: &str,
        name: &str,
    ) -> Result<ProvisioningPlan> {
        let parent = self.ensemble.current_node().await?;
        let connection = self.ensemble.connection().await?;

        let mut plan = provider.new_plan(name)?.with_ensemble(connection);
        plan.parent = parent;
        plan.replicas = cfg.required_instances;
        plan.profiles = vec![profile_id.to_string()];
        plan.version = version.to_string();
        plan.jvm_opts = cfg.jvm_opts.clone();

        if let Some(child) = provider.child_support() {
            plan.child_credentials = Some(
                child.child_credentials(cfg.username.as_deref(), cfg.password.as_deref()),
            );
        }
        Ok(plan)
    }

    /// Adds `profile` to every node of `node_names`.
    ///
    /// Unknown nodes are reported as [`TopologyError::NotFound`] and skipped. The
    /// completed list holds the names of the nodes that now carry the profile.
    pub async fn assign_profile(&self, node_names: &[String], profile: &Profile) -> BatchOutcome<String> {
        let mut outcome = BatchOutcome::default();
        for name in node_names {
            let result = self.assign_to_node(name, profile).await;
            match &result {
                Ok(_) => info!(node = %name, profile = %profile.id, "profile assigned to node"),
                Err(err) => {
                    warn!(node = %name, profile = %profile.id, error = %err, "failed to assign profile")
                }
            }
            outcome.record(name, result);
        }
        outcome
    }

    async fn assign_to_node(&self, name: &str, profile: &Profile) -> Result<String> {
        let node = self
            .store
            .get_node(name)
            .await?
            .ok_or_else(|| TopologyError::NotFound(format!("node {} does not exist", name)))?;

        let mut profiles = node.profiles;
        if !profiles.insert(profile.id.clone()) {
            debug!(node = %name, profile = %profile.id, "node already carries the profile");
            return Ok(name.to_string());
        }

        let profiles: Vec<String> = profiles.into_iter().collect();
        self.store.set_node_profiles(name, &profiles).await?;
        Ok(name.to_string())
    }
}
