use serde::{Deserialize, Serialize};

/// Connection parameters a new node needs to join the ensemble.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleConnection {
    /// Address of the coordination ensemble.
    pub url: String,
    pub password: Option<String>,
    /// Artifact repository / proxy location new nodes download from.
    pub proxy_uri: Option<String>,
}

/// Management credentials handed to child nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCredentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Everything a node provider needs to create one broker node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningPlan {
    pub name: String,
    pub parent: String,
    pub profiles: Vec<String>,
    pub version: String,
    pub replicas: u32,
    pub ensemble_server: bool,
    pub ensemble_url: String,
    pub ensemble_password: Option<String>,
    pub proxy_uri: Option<String>,
    pub jvm_opts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_credentials: Option<ChildCredentials>,
}

impl ProvisioningPlan {
    /// A plan for `name` that joins the ensemble as a plain member.
    pub fn new(name: impl Into<String>) -> Self {
        ProvisioningPlan {
            name: name.into(),
            parent: String::new(),
            profiles: Vec::new(),
            version: String::new(),
            replicas: 1,
            ensemble_server: false,
            ensemble_url: String::new(),
            ensemble_password: None,
            proxy_uri: None,
            jvm_opts: None,
            child_credentials: None,
        }
    }

    pub fn with_ensemble(mut self, connection: EnsembleConnection) -> Self {
        self.ensemble_url = connection.url;
        self.ensemble_password = connection.password;
        self.proxy_uri = connection.proxy_uri;
        self
    }
}
