//! Wiring from config to the orchestrator and its collaborators

use anyhow::Context as _;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use undeploy_bosh::BoshCli;
use undeploy_config::{Config, JsonOutputs};
use undeploy_core::{ProviderClient, ProviderFactory, ProviderRegistry, TeardownOrchestrator};

pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
}

impl Context {
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => undeploy_config::find_config_file()?,
        };
        let config = Config::load(&config_path)?;
        println!(
            "{} {}",
            "Config:".dimmed(),
            config_path.display().to_string().dimmed()
        );
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn registry(&self) -> ProviderRegistry {
        providers()
    }

    pub async fn provider(&self) -> anyhow::Result<Box<dyn ProviderClient>> {
        let settings = self.config.provider_settings();
        self.registry()
            .build(&settings)
            .await
            .with_context(|| format!("Failed to set up the {} provider", settings.platform))
    }

    pub fn deployer(&self) -> BoshCli {
        let settings = &self.config.deployer;
        let mut bosh = BoshCli::new(&settings.manifest);
        if let Some(binary) = &settings.binary {
            bosh = bosh.with_binary(binary);
        }
        if let Some(deployment) = &settings.deployment {
            bosh = bosh.with_deployment(deployment);
        }
        bosh
    }

    pub fn orchestrator(&self) -> anyhow::Result<TeardownOrchestrator> {
        let outputs = JsonOutputs::load(&self.config.outputs)?;
        tracing::debug!("Loaded {} outputs", outputs.len());

        Ok(TeardownOrchestrator::new(
            Arc::new(self.registry()),
            self.config.provider_settings(),
            Arc::new(outputs),
            Arc::new(self.deployer()),
            self.config.director.clone(),
        ))
    }
}

/// Factories for every platform compiled in
pub fn providers() -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "aws")]
    let registry = registry.register("aws", Arc::new(undeploy_aws::AwsProviderFactory));

    #[cfg(feature = "gcp")]
    let registry = registry.register("gcp", Arc::new(undeploy_gcp::GcpProviderFactory));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_features_register_both_platforms() {
        let registry = providers();
        #[cfg(all(feature = "aws", feature = "gcp"))]
        assert_eq!(registry.platforms(), vec!["aws", "gcp"]);
        let _ = registry;
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(
            &path,
            r#"
platform: aws
region: eu-west-1
director:
  credentials: { password: p, cert: c, key: k, ca_cert: ca }
  public_cidr: 10.0.0.0/24
  public_key: ssh-rsa AAAA
deployer:
  manifest: director.yml
  binary: /opt/bosh/bin/bosh
outputs: outputs.json
state: state.json
"#,
        )
        .unwrap();

        let ctx = Context::load(Some(&path)).unwrap();
        assert_eq!(ctx.config_path, path);
        assert_eq!(ctx.deployer().manifest(), dir.path().join("director.yml"));
    }
}
