use async_trait::async_trait;
use mqfleet_core::{FleetRequirements, Node, Profile};

use crate::errors::Result;

/// Persistence of profiles, nodes and the fleet requirements record.
///
/// Profiles are content-addressed by `(version, id)`; `put_profile` creates or
/// replaces. Profiles returned by the store carry their associated node names.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, version: &str, id: &str) -> Result<Option<Profile>>;

    async fn put_profile(&self, profile: &Profile) -> Result<()>;

    /// All profiles of `version`, ordered by id.
    async fn list_profiles(&self, version: &str) -> Result<Vec<Profile>>;

    /// The requirements record, empty when none has been written yet.
    async fn get_requirements(&self) -> Result<FleetRequirements>;

    async fn set_requirements(&self, requirements: &FleetRequirements) -> Result<()>;

    async fn get_node(&self, name: &str) -> Result<Option<Node>>;

    async fn set_node_profiles(&self, name: &str, profiles: &[String]) -> Result<()>;

    /// All nodes, ordered by name.
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Records a node that exists outside the engine, keeping its profiles if it was already known.
    async fn register_node(&self, node: &Node) -> Result<()>;
}
