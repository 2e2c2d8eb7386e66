use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fleet-wide record of how many instances each profile needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetRequirements {
    #[serde(default)]
    pub profile_requirements: BTreeMap<String, ProfileRequirement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequirement {
    #[serde(default)]
    pub minimum_instances: Option<u32>,
}

impl FleetRequirements {
    pub fn minimum_instances(&self, profile_id: &str) -> Option<u32> {
        self.profile_requirements
            .get(profile_id)
            .and_then(|r| r.minimum_instances)
    }

    pub fn has_minimum_instances(&self, profile_id: &str) -> bool {
        self.minimum_instances(profile_id).is_some()
    }

    pub fn with_minimum(mut self, profile_id: impl Into<String>, minimum: u32) -> Self {
        self.profile_requirements
            .entry(profile_id.into())
            .or_default()
            .minimum_instances = Some(minimum);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_minimum_is_not_a_requirement() {
        let mut requirements = FleetRequirements::default();
        requirements
            .profile_requirements
            .insert("p".into(), ProfileRequirement::default());

        assert!(!requirements.has_minimum_instances("p"));
        assert!(requirements
            .with_minimum("p", 3)
            .has_minimum_instances("p"));
    }

    #[test]
    fn test_wire_format() {
        let requirements = FleetRequirements::default().with_minimum("broker1", 2);
        let json = serde_json::to_value(&requirements).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"profileRequirements": {"broker1": {"minimumInstances": 2}}})
        );
    }
}
