//! The director environment as handed to the deployer

use serde::{Deserialize, Serialize};

/// Name given to directors created by this tool
pub const DEFAULT_DIRECTOR_NAME: &str = "bosh";

/// Everything the deployer needs to delete a director environment.
///
/// Rebuilt at teardown time from outputs, provider attributes and the
/// configured public CIDR; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    pub director_name: String,
    pub external_ip: String,
    pub credentials_ref: String,
    pub internal_cidr: String,
    pub internal_gateway: String,
    pub internal_ip: String,
    pub network: String,
    pub private_subnetwork: String,
    pub project_id: String,
    pub public_key: String,
    pub public_subnetwork: String,
    pub spot: bool,
    pub zone: String,
}

/// Director credential material
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DirectorCredentials {
    pub password: String,
    pub cert: String,
    pub key: String,
    pub ca_cert: String,
}

impl std::fmt::Debug for DirectorCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorCredentials")
            .field("password", &"<redacted>")
            .field("cert", &format!("{} bytes", self.cert.len()))
            .field("key", &"<redacted>")
            .field("ca_cert", &format!("{} bytes", self.ca_cert.len()))
            .finish()
    }
}

/// Director settings that are known locally rather than looked up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    #[serde(default = "default_director_name")]
    pub director_name: String,

    pub credentials: DirectorCredentials,

    /// CIDR the director network was created with
    pub public_cidr: String,

    pub public_key: String,

    #[serde(default)]
    pub spot: bool,
}

fn default_director_name() -> String {
    DEFAULT_DIRECTOR_NAME.to_string()
}
