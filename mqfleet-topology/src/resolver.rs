use async_trait::async_trait;

use crate::errors::{Result, TopologyError};

/// Turns a symbolic broker configuration reference into the value stored in a profile.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    async fn resolve(&self, version: &str, reference: &str) -> Result<String>;
}

/// Resolves bare file names against a base profile of the requested version.
///
/// `broker.xml` at version `1.0` with base profile `mq-base` becomes
/// `profile:/fleet/versions/1.0/profiles/mq-base/broker.xml`. References that
/// already carry a scheme (`file:`, `http:`, `profile:` ...) are kept as given.
#[derive(Debug, Clone)]
pub struct VersionedConfigResolver {
    base_profile: String,
}

impl VersionedConfigResolver {
    pub fn new(base_profile: impl Into<String>) -> Self {
        VersionedConfigResolver {
            base_profile: base_profile.into(),
        }
    }
}

fn has_scheme(reference: &str) -> bool {
    match reference.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[async_trait]
impl ConfigResolver for VersionedConfigResolver {
    async fn resolve(&self, version: &str, reference: &str) -> Result<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(TopologyError::Configuration(
                "config reference must not be empty".to_string(),
            ));
        }
        if has_scheme(reference) {
            return Ok(reference.to_string());
        }
        Ok(format!(
            "profile:/fleet/versions/{}/profiles/{}/{}",
            version,
            self.base_profile,
            reference.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bare_reference_is_versioned() {
        let resolver = VersionedConfigResolver::new("mq-base");
        assert_eq!(
            resolver.resolve("1.0", "broker.xml").await.unwrap(),
            "profile:/fleet/versions/1.0/profiles/mq-base/broker.xml"
        );
        assert_eq!(
            resolver.resolve("1.1", "/conf/broker.xml").await.unwrap(),
            "profile:/fleet/versions/1.1/profiles/mq-base/conf/broker.xml"
        );
    }

    #[tokio::test]
    async fn test_reference_with_scheme_is_kept() {
        let resolver = VersionedConfigResolver::new("mq-base");
        for reference in ["file:/etc/broker.xml", "http://host/broker.xml", "profile:x.xml"] {
            assert_eq!(resolver.resolve("1.0", reference).await.unwrap(), reference);
        }
    }

    #[tokio::test]
    async fn test_empty_reference_is_rejected() {
        let resolver = VersionedConfigResolver::new("mq-base");
        assert!(matches!(
            resolver.resolve("1.0", "  ").await,
            Err(TopologyError::Configuration(_))
        ));
    }
}
