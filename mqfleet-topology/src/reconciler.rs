use mqfleet_core::{FleetRequirements, Profile};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::store::ProfileStore;

/// Raises the minimum instance count of `profile_id` to `desired`.
///
/// Returns the resulting requirements and whether they differ from `requirements`.
/// A missing minimum is always set; a recorded one is only ever raised, never
/// lowered. The caller persists the result only when it changed.
pub fn ratchet_minimum(
    requirements: &FleetRequirements,
    profile_id: &str,
    desired: u32,
) -> (FleetRequirements, bool) {
    match requirements.minimum_instances(profile_id) {
        Some(current) if current >= desired => (requirements.clone(), false),
        _ => (
            requirements.clone().with_minimum(profile_id, desired),
            true,
        ),
    }
}

/// Finds the profiles of `version` that define a managed broker.
///
/// Every section whose key starts with `prefix` names a broker (the key minus the
/// prefix). A profile counts only when the fleet requires instances of it or some
/// node already carries it; broker-shaped template profiles are left out.
///
/// Profiles are visited in id order and sections in key order. When two sections
/// name the same broker the last one visited wins.
pub async fn discover_managed_profiles(
    store: &dyn ProfileStore,
    version: &str,
    prefix: &str,
) -> Result<BTreeMap<String, Profile>> {
    let requirements = store.get_requirements().await?;
    let profiles = store.list_profiles(version).await?;

    let mut managed: BTreeMap<String, Profile> = BTreeMap::new();
    for profile in profiles {
        if !requirements.has_minimum_instances(&profile.id) && !profile.has_nodes() {
            continue;
        }
        let broker_names: Vec<String> = profile
            .sections_with_prefix(prefix)
            .map(|(name, _)| name.to_string())
            .collect();
        for broker_name in broker_names {
            debug!(broker = %broker_name, profile = %profile.id, "found managed broker");
            if let Some(previous) = managed.insert(broker_name.clone(), profile.clone()) {
                warn!(
                    broker = %broker_name,
                    previous = %previous.id,
                    profile = %profile.id,
                    "broker is defined by more than one profile"
                );
            }
        }
    }
    Ok(managed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::MetadataProfileStore;
    use crate::translator::{broker_section_key, BROKER_SECTION_PREFIX};
    use mqfleet_core::metadata::{MemoryStore, MetadataStorage};
    use mqfleet_core::{Node, Section};

    fn store() -> MetadataProfileStore {
        MetadataProfileStore::new(MetadataStorage::InMemory(MemoryStore::new()))
    }

    fn broker_profile(id: &str, broker: &str) -> Profile {
        let mut profile = Profile::new(id, "1.0");
        profile
            .configurations
            .insert(broker_section_key(broker), Section::new());
        profile
    }

    #[test]
    fn test_ratchet_sets_missing_minimum() {
        let (requirements, changed) = ratchet_minimum(&FleetRequirements::default(), "p", 0);
        assert!(changed);
        assert_eq!(requirements.minimum_instances("p"), Some(0));
    }

    #[test]
    fn test_ratchet_never_lowers() {
        let mut requirements = FleetRequirements::default();
        let mut stored_max = 0;
        for desired in [2, 1, 5, 5, 3, 0, 7, 6] {
            let (next, changed) = ratchet_minimum(&requirements, "p", desired);
            assert_eq!(changed, requirements.minimum_instances("p").map_or(true, |m| desired > m));
            requirements = next;
            stored_max = stored_max.max(desired);
            assert_eq!(requirements.minimum_instances("p"), Some(stored_max));
        }
    }

    #[test]
    fn test_ratchet_leaves_other_profiles_alone() {
        let requirements = FleetRequirements::default().with_minimum("other", 4);
        let (next, _) = ratchet_minimum(&requirements, "p", 1);
        assert_eq!(next.minimum_instances("other"), Some(4));
        assert_eq!(requirements.minimum_instances("p"), None);
    }

    #[tokio::test]
    async fn test_template_profiles_are_excluded() -> Result<()> {
        let store = store();
        store.put_profile(&broker_profile("mq-default", "default")).await?;

        let managed = discover_managed_profiles(&store, "1.0", BROKER_SECTION_PREFIX).await?;
        assert!(managed.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_requirement_includes_profile() -> Result<()> {
        let store = store();
        store.put_profile(&broker_profile("mq-default", "default")).await?;
        store
            .set_requirements(&FleetRequirements::default().with_minimum("mq-default", 0))
            .await?;

        let managed = discover_managed_profiles(&store, "1.0", BROKER_SECTION_PREFIX).await?;
        assert_eq!(managed.len(), 1);
        assert_eq!(managed["default"].id, "mq-default");
        Ok(())
    }

    #[tokio::test]
    async fn test_associated_node_includes_profile() -> Result<()> {
        let store = store();
        store.put_profile(&broker_profile("mq-east", "east")).await?;
        let mut node = Node::new("c1");
        node.profiles.insert("mq-east".into());
        store.register_node(&node).await?;

        let managed = discover_managed_profiles(&store, "1.0", BROKER_SECTION_PREFIX).await?;
        assert_eq!(managed.keys().collect::<Vec<_>>(), vec!["east"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_prefixed_sections_are_not_brokers() -> Result<()> {
        let store = store();
        let mut profile = broker_profile("mq-east", "east");
        profile
            .configurations
            .insert("org.ops4j.logging".into(), Section::new());
        store.put_profile(&profile).await?;
        store
            .set_requirements(&FleetRequirements::default().with_minimum("mq-east", 1))
            .await?;

        let managed = discover_managed_profiles(&store, "1.0", BROKER_SECTION_PREFIX).await?;
        assert_eq!(managed.len(), 1);
        assert!(managed.contains_key("east"));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_broker_name_last_profile_wins() -> Result<()> {
        let store = store();
        store.put_profile(&broker_profile("a-profile", "shared")).await?;
        store.put_profile(&broker_profile("b-profile", "shared")).await?;
        store
            .set_requirements(
                &FleetRequirements::default()
                    .with_minimum("a-profile", 1)
                    .with_minimum("b-profile", 1),
            )
            .await?;

        let managed = discover_managed_profiles(&store, "1.0", BROKER_SECTION_PREFIX).await?;
        assert_eq!(managed.len(), 1);
        assert_eq!(managed["shared"].id, "b-profile");
        Ok(())
    }
}
