//! The `undeploy.yml` document
//!
//! ```yaml
//! platform: gcp
//! region: europe-west1
//! zone: europe-west1-b
//! project: ci-project
//! credentials_path: /secrets/gcp.json
//! director:
//!   credentials: { password: ..., cert: ..., key: ..., ca_cert: ... }
//!   public_cidr: 10.0.0.0/24
//!   public_key: ssh-rsa AAAA...
//! deployer:
//!   manifest: director.yml
//!   deployment: concourse
//! outputs: outputs.json
//! state: director-state.json
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use undeploy_core::orchestrator::{ATTR_CREDENTIALS_PATH, ATTR_PROJECT};
use undeploy_core::{DirectorConfig, ProviderSettings};

const ATTR_ZONE: &str = "zone";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider platform name, e.g. `aws` or `gcp`
    pub platform: String,

    pub region: String,

    #[serde(default)]
    pub zone: Option<String>,

    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Extra provider attributes, passed through untouched
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    pub director: DirectorConfig,

    pub deployer: DeployerSettings,

    /// JSON file with the outputs recorded at creation time
    pub outputs: PathBuf,

    /// Where the residual director state is kept between runs
    pub state: PathBuf,
}

/// How to reach the deployment tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployerSettings {
    /// Director manifest handed to `delete-env`
    pub manifest: PathBuf,

    #[serde(default)]
    pub binary: Option<PathBuf>,

    #[serde(default)]
    pub deployment: Option<String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content).map_err(|e| ConfigError::Invalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.platform.trim().is_empty() {
            return Err(ConfigError::Invalid {
                path: "<inline>".to_string(),
                message: "platform must not be empty".to_string(),
            });
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.outputs);
        resolve(&mut self.state);
        resolve(&mut self.deployer.manifest);
    }

    /// Provider settings for the configured platform.
    ///
    /// `project` and `credentials_path` are always present, empty when not
    /// configured, since the environment descriptor carries them on every
    /// platform.
    pub fn provider_settings(&self) -> ProviderSettings {
        let mut settings = ProviderSettings::new(self.platform.to_lowercase(), &self.region)
            .with_attribute(ATTR_PROJECT, self.project.clone().unwrap_or_default())
            .with_attribute(
                ATTR_CREDENTIALS_PATH,
                self.credentials_path.clone().unwrap_or_default(),
            );
        if let Some(zone) = &self.zone {
            settings = settings.with_attribute(ATTR_ZONE, zone);
        }
        for (key, value) in &self.attributes {
            settings = settings.with_attribute(key, value);
        }
        settings
    }
}
