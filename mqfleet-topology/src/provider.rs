use mqfleet_core::{ChildCredentials, ProvisioningPlan};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{Result, TopologyError};

/// Creates provisioning plans for one provisioning scheme (`child`, `ssh`, `cloud` ...).
pub trait NodeProvider: Send + Sync {
    fn scheme(&self) -> &str;

    /// Starts a plan for a node called `name`. Providers reject names they cannot create.
    fn new_plan(&self, name: &str) -> Result<ProvisioningPlan>;

    /// The child-node capability, for providers whose nodes run under a parent node.
    fn child_support(&self) -> Option<&dyn ChildNodeSupport> {
        None
    }
}

/// Capability of providers that create child nodes managed through their parent.
pub trait ChildNodeSupport: Send + Sync {
    fn child_credentials(&self, user: Option<&str>, password: Option<&str>) -> ChildCredentials;
}

/// Scheme → provider lookup.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn NodeProvider>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under its scheme, replacing any previous provider for it.
    pub fn register(&mut self, provider: Arc<dyn NodeProvider>) {
        self.providers.insert(provider.scheme().to_string(), provider);
    }

    pub fn with_provider(mut self, provider: impl NodeProvider + 'static) -> Self {
        self.register(Arc::new(provider));
        self
    }

    pub fn get(&self, scheme: &str) -> Option<Arc<dyn NodeProvider>> {
        self.providers.get(scheme).cloned()
    }

    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }
}

/// Provider declared in the manager configuration.
///
/// Node names must be made of ASCII letters, digits, `-`, `_` and `.`.
#[derive(Debug, Clone)]
pub struct ConfiguredProvider {
    scheme: String,
    child: Option<ChildDefaults>,
}

#[derive(Debug, Clone)]
struct ChildDefaults {
    user: Option<String>,
}

impl ConfiguredProvider {
    pub fn new(scheme: impl Into<String>) -> Self {
        ConfiguredProvider {
            scheme: scheme.into(),
            child: None,
        }
    }

    /// Marks the provider as creating child nodes. `default_user` is used when a
    /// broker description carries no management user.
    pub fn with_child_nodes(mut self, default_user: Option<String>) -> Self {
        self.child = Some(ChildDefaults { user: default_user });
        self
    }
}

fn valid_node_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl NodeProvider for ConfiguredProvider {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn new_plan(&self, name: &str) -> Result<ProvisioningPlan> {
        if !valid_node_name(name) {
            return Err(TopologyError::Provider(format!(
                "{} provider cannot create a node named {:?}",
                self.scheme, name
            )));
        }
        Ok(ProvisioningPlan::new(name))
    }

    fn child_support(&self) -> Option<&dyn ChildNodeSupport> {
        self.child.as_ref().map(|c| c as &dyn ChildNodeSupport)
    }
}

impl ChildNodeSupport for ChildDefaults {
    fn child_credentials(&self, user: Option<&str>, password: Option<&str>) -> ChildCredentials {
        ChildCredentials {
            user: user.map(str::to_string).or_else(|| self.user.clone()),
            password: password.map(str::to_string),
        }
    }
}
