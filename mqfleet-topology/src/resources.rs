//! [`ProfileStore`] backed by the metadata store.
//!
//! Layout:
//! - `/fleet/profiles/{version}/{id}`: a [`Profile`] without its node list
//! - `/fleet/requirements/current`: the [`FleetRequirements`] record
//! - `/fleet/nodes/{name}`: a [`Node`] and the profile ids it carries

use async_trait::async_trait;
use mqfleet_core::metadata::{MetaOptions, MetadataStorage, MetadataStore};
use mqfleet_core::{FleetRequirements, Node, Profile};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use crate::errors::{Result, TopologyError};
use crate::store::ProfileStore;

pub const BASE_PROFILES_PATH: &str = "/fleet/profiles";
pub const BASE_NODES_PATH: &str = "/fleet/nodes";
pub const REQUIREMENTS_PATH: &str = "/fleet/requirements/current";

#[derive(Debug, Clone)]
pub struct MetadataProfileStore {
    store: MetadataStorage,
}

impl MetadataProfileStore {
    pub fn new(store: MetadataStorage) -> Self {
        MetadataProfileStore { store }
    }

    async fn read_prefix<T: serde::de::DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        if let Some(Value::Object(map)) = self.store.get(prefix, MetaOptions::WithPrefix).await? {
            // serde_json::Map iterates in key order
            for (_, value) in map {
                out.push(serde_json::from_value(value)?);
            }
        }
        Ok(out)
    }

    fn attach_nodes(profile: &mut Profile, nodes: &[Node]) {
        profile.nodes = nodes
            .iter()
            .filter(|node| node.carries(&profile.id))
            .filter(|node| {
                node.version
                    .as_deref()
                    .map_or(true, |v| v == profile.version)
            })
            .map(|node| node.name.clone())
            .collect();
    }
}

/// Rejects values that cannot be used as a single path segment.
pub(crate) fn validate_segment(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TopologyError::Configuration(format!("{} must not be empty", kind)));
    }
    if value.contains('/') {
        return Err(TopologyError::Configuration(format!(
            "{} must not contain '/': {}",
            kind, value
        )));
    }
    Ok(())
}

fn join_path(parts: &[&str]) -> String {
    parts.join("/")
}

#[async_trait]
impl ProfileStore for MetadataProfileStore {
    async fn get_profile(&self, version: &str, id: &str) -> Result<Option<Profile>> {
        validate_segment("version", version)?;
        validate_segment("profile id", id)?;

        let path = join_path(&[BASE_PROFILES_PATH, version, id]);
        let Some(value) = self.store.get(&path, MetaOptions::None).await? else {
            return Ok(None);
        };
        let mut profile: Profile = serde_json::from_value(value)?;
        let nodes = self.list_nodes().await?;
        Self::attach_nodes(&mut profile, &nodes);
        Ok(Some(profile))
    }

    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        validate_segment("version", &profile.version)?;
        validate_segment("profile id", &profile.id)?;

        let path = join_path(&[BASE_PROFILES_PATH, &profile.version, &profile.id]);
        self.store
            .put(&path, serde_json::to_value(profile)?, MetaOptions::None)
            .await?;
        debug!(path = %path, "stored profile");
        Ok(())
    }

    async fn list_profiles(&self, version: &str) -> Result<Vec<Profile>> {
        validate_segment("version", version)?;

        let prefix = format!("{}/", join_path(&[BASE_PROFILES_PATH, version]));
        let mut profiles: Vec<Profile> = self.read_prefix(&prefix).await?;
        let nodes = self.list_nodes().await?;
        for profile in profiles.iter_mut() {
            Self::attach_nodes(profile, &nodes);
        }
        Ok(profiles)
    }

    async fn get_requirements(&self) -> Result<FleetRequirements> {
        match self.store.get(REQUIREMENTS_PATH, MetaOptions::None).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(FleetRequirements::default()),
        }
    }

    async fn set_requirements(&self, requirements: &FleetRequirements) -> Result<()> {
        self.store
            .put(
                REQUIREMENTS_PATH,
                serde_json::to_value(requirements)?,
                MetaOptions::None,
            )
            .await?;
        Ok(())
    }

    async fn get_node(&self, name: &str) -> Result<Option<Node>> {
        validate_segment("node name", name)?;

        let path = join_path(&[BASE_NODES_PATH, name]);
        match self.store.get(&path, MetaOptions::None).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn set_node_profiles(&self, name: &str, profiles: &[String]) -> Result<()> {
        let mut node = self
            .get_node(name)
            .await?
            .ok_or_else(|| TopologyError::NotFound(format!("node {}", name)))?;
        node.profiles = profiles.iter().cloned().collect();

        let path = join_path(&[BASE_NODES_PATH, name]);
        self.store
            .put(&path, serde_json::to_value(&node)?, MetaOptions::None)
            .await?;
        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.read_prefix(&format!("{}/", BASE_NODES_PATH)).await
    }

    async fn register_node(&self, node: &Node) -> Result<()> {
        let mut merged = node.clone();
        if let Some(existing) = self.get_node(&node.name).await? {
            let profiles: BTreeSet<String> =
                existing.profiles.union(&node.profiles).cloned().collect();
            merged.profiles = profiles;
            if merged.version.is_none() {
                merged.version = existing.version;
            }
        }

        let path = join_path(&[BASE_NODES_PATH, &node.name]);
        self.store
            .put(&path, serde_json::to_value(&merged)?, MetaOptions::None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqfleet_core::metadata::MemoryStore;

    fn store() -> MetadataProfileStore {
        MetadataProfileStore::new(MetadataStorage::InMemory(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_profiles_carry_their_nodes() -> Result<()> {
        let store = store();
        store.put_profile(&Profile::new("broker1", "1.0")).await?;
        store.put_profile(&Profile::new("broker2", "1.0")).await?;
        store.put_profile(&Profile::new("broker1", "1.1")).await?;

        store.register_node(&Node::new("c1")).await?;
        store
            .set_node_profiles("c1", &["broker1".to_string()])
            .await?;

        let profile = store.get_profile("1.0", "broker1").await?.unwrap();
        assert!(profile.nodes.contains("c1"));

        let listed = store.list_profiles("1.0").await?;
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["broker1", "broker2"]);
        assert!(listed[0].has_nodes());
        assert!(!listed[1].has_nodes());
        Ok(())
    }

    #[tokio::test]
    async fn test_node_version_limits_association() -> Result<()> {
        let store = store();
        store.put_profile(&Profile::new("broker1", "1.0")).await?;
        store.put_profile(&Profile::new("broker1", "1.1")).await?;

        let mut node = Node::new("c1");
        node.version = Some("1.1".into());
        node.profiles.insert("broker1".into());
        store.register_node(&node).await?;

        assert!(!store.get_profile("1.0", "broker1").await?.unwrap().has_nodes());
        assert!(store.get_profile("1.1", "broker1").await?.unwrap().has_nodes());
        Ok(())
    }

    #[tokio::test]
    async fn test_requirements_default_to_empty() -> Result<()> {
        let store = store();
        assert_eq!(store.get_requirements().await?, FleetRequirements::default());

        let requirements = FleetRequirements::default().with_minimum("broker1", 2);
        store.set_requirements(&requirements).await?;
        assert_eq!(store.get_requirements().await?, requirements);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_keeps_known_profiles() -> Result<()> {
        let store = store();
        let mut node = Node::new("c1");
        node.profiles.insert("a".into());
        store.register_node(&node).await?;

        let mut again = Node::new("c1");
        again.profiles.insert("b".into());
        store.register_node(&again).await?;

        let stored = store.get_node("c1").await?.unwrap();
        assert!(stored.carries("a"));
        assert!(stored.carries("b"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_node_and_bad_ids() {
        let store = store();
        let missing = store.set_node_profiles("ghost", &[]).await;
        assert!(matches!(missing, Err(TopologyError::NotFound(_))));

        let bad = store.put_profile(&Profile::new("a/b", "1.0")).await;
        assert!(matches!(bad, Err(TopologyError::Configuration(_))));

        let empty = store.get_profile("1.0", "").await;
        assert!(matches!(empty, Err(TopologyError::Configuration(_))));
    }
}
