use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Key/value entries of one configuration section.
pub type Section = BTreeMap<String, String>;

/// A named, versioned, hierarchical configuration record.
///
/// Profiles are addressed by `(version, id)`. The first entry of `parents` is the
/// primary parent. `nodes` is not persisted with the profile: the store derives it
/// from the node records on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub configurations: BTreeMap<String, Section>,
    #[serde(default, skip_serializing)]
    pub nodes: BTreeSet<String>,
}

impl Profile {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Profile {
            id: id.into(),
            version: version.into(),
            parents: Vec::new(),
            configurations: BTreeMap::new(),
            nodes: BTreeSet::new(),
        }
    }

    pub fn primary_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.configurations.get(key)
    }

    /// Sections whose key starts with `prefix`, paired with the key remainder.
    pub fn sections_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Section)> + 'a {
        self.configurations
            .iter()
            .filter_map(move |(key, section)| Some((key.strip_prefix(prefix)?, section)))
    }

    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }
}

/// A running or provisionable process that carries a set of profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub profiles: BTreeSet<String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            version: None,
            profiles: BTreeSet::new(),
        }
    }

    pub fn carries(&self, profile_id: &str) -> bool {
        self.profiles.contains(profile_id)
    }
}
