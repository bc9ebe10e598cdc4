//! AWS provider implementation

use crate::ec2::{Ec2Api, SdkEc2};
use crate::error::AwsError;
use crate::route53::{Route53Api, SdkRoute53};
use async_trait::async_trait;
use std::sync::Arc;
use undeploy_core::{
    CleanupFailure, HostedZone, ProviderClient, ProviderFactory, ProviderSettings, Result,
    TeardownError, VolumeDeleter, VolumeInfo, whitelist,
};

const PLATFORM_NAME: &str = "AWS";

/// AWS provider
pub struct AwsClient {
    settings: ProviderSettings,
    zone: String,
    ec2: Arc<dyn Ec2Api>,
    route53: Arc<dyn Route53Api>,
}

impl AwsClient {
    /// Connect using the default credential chain for `settings.region`.
    pub async fn connect(settings: &ProviderSettings) -> Result<Self> {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()))
            .load()
            .await;

        Ok(Self::with_apis(
            settings.clone(),
            Arc::new(SdkEc2::new(&config)),
            Arc::new(SdkRoute53::new(&config)),
        ))
    }

    pub fn with_apis(
        settings: ProviderSettings,
        ec2: Arc<dyn Ec2Api>,
        route53: Arc<dyn Route53Api>,
    ) -> Self {
        let zone = settings
            .attribute("zone")
            .map(str::to_string)
            .unwrap_or_else(|_| format!("{}a", settings.region));
        Self {
            settings,
            zone,
            ec2,
            route53,
        }
    }
}

/// Deletes EBS volumes one `DeleteVolume` call at a time
pub struct AwsVolumeDeleter {
    ec2: Arc<dyn Ec2Api>,
}

impl AwsVolumeDeleter {
    pub fn new(ec2: Arc<dyn Ec2Api>) -> Self {
        Self { ec2 }
    }
}

#[async_trait]
impl VolumeDeleter for AwsVolumeDeleter {
    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        self.ec2.delete_volume(volume_id).await?;
        Ok(())
    }
}

#[async_trait]
impl ProviderClient for AwsClient {
    fn region(&self) -> &str {
        &self.settings.region
    }

    fn platform_name(&self) -> &str {
        PLATFORM_NAME
    }

    fn attr(&self, name: &str) -> Result<String> {
        Ok(self.settings.attribute(name)?.to_string())
    }

    fn zone(&self) -> &str {
        &self.zone
    }

    async fn is_whitelisted(&self, target_ip: &str, group: &str) -> Result<bool> {
        let rules = self
            .ec2
            .security_group_rules(group)
            .await?
            .ok_or_else(|| AwsError::SecurityGroupNotFound(group.to_string()))?;
        Ok(whitelist::evaluate(&rules, target_ip))
    }

    async fn list_volumes(&self, volume_ids: &[String]) -> Result<Vec<VolumeInfo>> {
        if volume_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.ec2.describe_volumes(volume_ids).await?)
    }

    fn volume_deleter(&self) -> Box<dyn VolumeDeleter> {
        Box::new(AwsVolumeDeleter::new(self.ec2.clone()))
    }

    /// One batch terminate; if it fails, some instances may already be
    /// going, so every captured volume ID comes back with the error.
    async fn delete_instances_in_network(
        &self,
        network: &str,
    ) -> std::result::Result<Vec<String>, CleanupFailure> {
        let instances = self
            .ec2
            .describe_instances_in_vpc(network)
            .await
            .map_err(TeardownError::from)?;
        if instances.is_empty() {
            tracing::debug!("No instances found in {}", network);
            return Ok(Vec::new());
        }

        let mut instance_ids = Vec::with_capacity(instances.len());
        let mut volume_ids = Vec::new();
        for instance in instances {
            tracing::info!("Terminating instance {}", instance.id);
            instance_ids.push(instance.id);
            volume_ids.extend(instance.volume_ids);
        }

        if let Err(e) = self.ec2.terminate_instances(&instance_ids).await {
            return Err(CleanupFailure::new(volume_ids, e));
        }
        Ok(volume_ids)
    }

    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        Ok(self.route53.list_hosted_zones().await?)
    }
}

/// Builds [`AwsClient`]s from the default credential chain
pub struct AwsProviderFactory;

#[async_trait]
impl ProviderFactory for AwsProviderFactory {
    async fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn ProviderClient>> {
        Ok(Box::new(AwsClient::connect(settings).await?))
    }
}
