use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat description of one broker as edited by the operator.
///
/// Only `name` is mandatory. Fields left as `None` are never written over
/// values already stored in the broker's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub parent_profile: Option<String>,
    /// Data directory. An empty path counts as unset and gets the default path.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub config_url: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub networks: Option<String>,
    #[serde(default)]
    pub networks_user_name: Option<String>,
    #[serde(default)]
    pub networks_password: Option<String>,
    /// Extra section entries as `key=value` strings. Keys the engine manages
    /// itself (`data`, `group`, `parent`, `broker-name` ...) are dropped.
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default = "default_required_instances")]
    pub required_instances: u32,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub jvm_opts: Option<String>,
}

fn default_required_instances() -> u32 {
    1
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            name: String::new(),
            version: None,
            parent_profile: None,
            data: None,
            config_url: None,
            group: None,
            networks: None,
            networks_user_name: None,
            networks_password: None,
            properties: Vec::new(),
            required_instances: default_required_instances(),
            username: None,
            password: None,
            jvm_opts: None,
        }
    }
}

impl BrokerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        BrokerConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The configured version, or `default` when the description leaves it unset.
    pub fn version_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.version.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => default,
        }
    }

    /// Decodes a JSON document holding either a single broker object or an array of them.
    ///
    /// Each array element is decoded on its own, so one malformed element does not
    /// reject its siblings. Unknown fields are ignored. Only a document that is not
    /// JSON, or is neither an object nor an array, fails as a whole.
    pub fn decode_batch(json: &str) -> Result<Vec<Result<BrokerConfig, serde_json::Error>>, serde_json::Error> {
        let document: Value = serde_json::from_str(json)?;
        match document {
            Value::Array(items) => Ok(items.into_iter().map(serde_json::from_value).collect()),
            object @ Value::Object(_) => Ok(vec![serde_json::from_value(object)]),
            other => Err(serde::de::Error::custom(format!(
                "expected a broker object or an array of them, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_object_and_array_decode_alike() {
        let object = r#"{"name":"broker1","version":"1.0","requiredInstances":2}"#;
        let array = format!("[{}]", object);

        let from_object: Vec<_> = BrokerConfig::decode_batch(object)
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        let from_array: Vec<_> = BrokerConfig::decode_batch(&array)
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(from_object.len(), 1);
        assert_eq!(from_object, from_array);
        assert_eq!(from_object[0].name, "broker1");
        assert_eq!(from_object[0].required_instances, 2);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{"name":"b","kind":"amq","nested":{"x":1}}"#;
        let decoded = BrokerConfig::decode_batch(json).unwrap();
        let cfg = decoded.into_iter().next().unwrap().unwrap();
        assert_eq!(cfg, BrokerConfig::new("b"));
    }

    #[test]
    fn test_bad_element_does_not_reject_siblings() {
        let json = r#"[{"name":"a"}, {"name":"b","requiredInstances":-3}, 7, {"name":"c"}]"#;
        let decoded = BrokerConfig::decode_batch(json).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[0].as_ref().unwrap().name, "a");
        assert!(decoded[1].is_err());
        assert!(decoded[2].is_err());
        assert_eq!(decoded[3].as_ref().unwrap().name, "c");
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        assert!(BrokerConfig::decode_batch("\"broker\"").is_err());
        assert!(BrokerConfig::decode_batch("{not json").is_err());
    }

    #[test]
    fn test_defaults_and_camel_case_fields() {
        let json = r#"{
            "name": "b1",
            "parentProfile": "mq-base",
            "networksUserName": "admin",
            "networksPassword": "secret",
            "jvmOpts": "-Xmx512m",
            "properties": ["a=1", "b"]
        }"#;
        let cfg: BrokerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.required_instances, 1);
        assert_eq!(cfg.parent_profile.as_deref(), Some("mq-base"));
        assert_eq!(cfg.networks_user_name.as_deref(), Some("admin"));
        assert_eq!(cfg.networks_password.as_deref(), Some("secret"));
        assert_eq!(cfg.jvm_opts.as_deref(), Some("-Xmx512m"));
        assert_eq!(cfg.properties, vec!["a=1".to_string(), "b".to_string()]);

        let out = serde_json::to_value(&cfg).unwrap();
        assert_eq!(out["requiredInstances"], 1);
        assert_eq!(out["networksUserName"], "admin");
    }

    #[test]
    fn test_version_or_default() {
        let mut cfg = BrokerConfig::new("b");
        assert_eq!(cfg.version_or("1.0"), "1.0");
        cfg.version = Some(String::new());
        assert_eq!(cfg.version_or("1.0"), "1.0");
        cfg.version = Some("2.0".into());
        assert_eq!(cfg.version_or("1.0"), "2.0");
    }
}
