//! GCP provider implementation

use crate::api::{ComputeApi, GcpConfig, RestCompute};
use crate::error::GcpError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use undeploy_core::{
    CleanupFailure, HostedZone, ProviderClient, ProviderFactory, ProviderSettings, Result,
    TeardownError, VolumeDeleter, VolumeInfo, whitelist,
};

const PLATFORM_NAME: &str = "GCP";

/// GCP provider
pub struct GcpClient {
    settings: ProviderSettings,
    zone: String,
    compute: Arc<dyn ComputeApi>,
}

impl GcpClient {
    pub fn new(settings: ProviderSettings, config: GcpConfig) -> Self {
        let zone = config.zone.clone();
        Self::with_api(settings, zone, Arc::new(RestCompute::new(config)))
    }

    pub fn with_api(settings: ProviderSettings, zone: String, compute: Arc<dyn ComputeApi>) -> Self {
        Self {
            settings,
            zone,
            compute,
        }
    }
}

/// Deletes persistent disks one request at a time
pub struct GcpDiskDeleter {
    compute: Arc<dyn ComputeApi>,
}

impl GcpDiskDeleter {
    pub fn new(compute: Arc<dyn ComputeApi>) -> Self {
        Self { compute }
    }
}

#[async_trait]
impl VolumeDeleter for GcpDiskDeleter {
    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        self.compute.delete_disk(volume_id).await?;
        Ok(())
    }
}

#[async_trait]
impl ProviderClient for GcpClient {
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
            .compute
            .firewall_rules(group)
            .await?
            .ok_or_else(|| GcpError::FirewallNotFound(group.to_string()))?;
        Ok(whitelist::evaluate(&rules, target_ip))
    }

    async fn list_volumes(&self, volume_ids: &[String]) -> Result<Vec<VolumeInfo>> {
        if volume_ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&str> = volume_ids.iter().map(String::as_str).collect();
        let disks = self.compute.list_disks().await?;
        Ok(disks
            .into_iter()
            .filter(|disk| wanted.contains(disk.id.as_str()))
            .collect())
    }

    fn volume_deleter(&self) -> Box<dyn VolumeDeleter> {
        Box::new(GcpDiskDeleter::new(self.compute.clone()))
    }

    /// Compute Engine has no batch delete, so instances are deleted one
    /// request each. A failure stops the pass; the error carries the disks of
    /// the instances already deleted.
    async fn delete_instances_in_network(
        &self,
        network: &str,
    ) -> std::result::Result<Vec<String>, CleanupFailure> {
        let instances = self
            .compute
            .list_instances_in_network(network)
            .await
            .map_err(TeardownError::from)?;
        if instances.is_empty() {
            tracing::debug!("No instances found in {}", network);
            return Ok(Vec::new());
        }

        let mut volume_ids = Vec::new();
        for instance in instances {
            tracing::info!("Deleting instance {}", instance.id);
            if let Err(e) = self.compute.delete_instance(&instance.id).await {
                tracing::warn!("Failed to delete instance {}: {}", instance.id, e);
                return Err(CleanupFailure::new(volume_ids, e));
            }
            volume_ids.extend(instance.volume_ids);
        }
        Ok(volume_ids)
    }

    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        Ok(self.compute.list_managed_zones().await?)
    }
}

/// Builds [`GcpClient`]s from provider settings
pub struct GcpProviderFactory;

#[async_trait]
impl ProviderFactory for GcpProviderFactory {
    async fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn ProviderClient>> {
        let config = GcpConfig::from_settings(settings)?;
        Ok(Box::new(GcpClient::new(settings.clone(), config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use undeploy_core::{IngressRule, InstanceInfo, VolumeStatus, clean_network_with};

    #[derive(Default)]
    struct FakeCompute {
        firewalls: Vec<(String, Vec<IngressRule>)>,
        disks: Vec<VolumeInfo>,
        instances: Vec<InstanceInfo>,
        failing_instance: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCompute {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ComputeApi for FakeCompute {
        async fn firewall_rules(&self, firewall: &str) -> crate::Result<Option<Vec<IngressRule>>> {
            Ok(self
                .firewalls
                .iter()
                .find(|(name, _)| name == firewall)
                .map(|(_, rules)| rules.clone()))
        }

        async fn list_disks(&self) -> crate::Result<Vec<VolumeInfo>> {
            self.record("list_disks".to_string());
            Ok(self.disks.clone())
        }

        async fn delete_disk(&self, disk: &str) -> crate::Result<()> {
            self.record(format!("delete_disk:{}", disk));
            Ok(())
        }

        async fn list_instances_in_network(&self, _network: &str) -> crate::Result<Vec<InstanceInfo>> {
            Ok(self.instances.clone())
        }

        async fn delete_instance(&self, instance: &str) -> crate::Result<()> {
            self.record(format!("delete_instance:{}", instance));
            if self.failing_instance.as_deref() == Some(instance) {
                return Err(GcpError::ApiError {
                    status: 503,
                    message: "backend unavailable".to_string(),
                });
            }
            Ok(())
        }

        async fn list_managed_zones(&self) -> crate::Result<Vec<HostedZone>> {
            Ok(vec![
                HostedZone::new("com.", "com-zone"),
                HostedZone::new("example.com.", "example-zone"),
            ])
        }
    }

    fn client(compute: Arc<FakeCompute>) -> GcpClient {
        let settings = ProviderSettings::new("gcp", "europe-west1")
            .with_attribute("project", "ci-project")
            .with_attribute("credentials_path", "/secrets/gcp.json");
        GcpClient::with_api(settings, "europe-west1-b".to_string(), compute)
    }

    #[test]
    fn test_attributes() {
        let client = client(Arc::new(FakeCompute::default()));
        assert_eq!(client.platform_name(), "GCP");
        assert_eq!(client.zone(), "europe-west1-b");
        assert_eq!(client.attr("project").unwrap(), "ci-project");
        assert_eq!(client.attr("credentials_path").unwrap(), "/secrets/gcp.json");
        assert!(matches!(client.attr("nope"), Err(TeardownError::LookupFailure(_))));
    }

    #[tokio::test]
    async fn test_missing_firewall_is_lookup_failure() {
        let client = client(Arc::new(FakeCompute::default()));
        let err = client.is_whitelisted("1.2.3.4", "bosh-fw").await.unwrap_err();
        assert!(matches!(err, TeardownError::LookupFailure(_)));
    }

    #[tokio::test]
    async fn test_whitelisted_firewall() {
        let compute = Arc::new(FakeCompute {
            firewalls: vec![(
                "bosh-fw".to_string(),
                vec![
                    IngressRule::new("1.2.3.4/32", 22),
                    IngressRule::new("1.2.3.4/32", 6868),
                    IngressRule::new("1.2.3.4/32", 25555),
                ],
            )],
            ..Default::default()
        });
        let client = client(compute);
        assert!(client.is_whitelisted("1.2.3.4", "bosh-fw").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_volumes_skips_attached_disks() {
        let compute = Arc::new(FakeCompute {
            disks: vec![
                VolumeInfo::new("vm-1-boot", VolumeStatus::Available),
                VolumeInfo::new("vm-1-data", VolumeStatus::InUse),
                VolumeInfo::new("unrelated", VolumeStatus::Available),
            ],
            ..Default::default()
        });
        let client = client(compute.clone());
        let deleter = client.volume_deleter();
        let ids = vec!["vm-1-boot".to_string(), "vm-1-data".to_string()];

        client.delete_volumes(&ids, deleter.as_ref()).await.unwrap();

        assert_eq!(compute.calls(), vec!["list_disks", "delete_disk:vm-1-boot"]);
    }

    #[tokio::test]
    async fn test_delete_instances_in_network() {
        let compute = Arc::new(FakeCompute {
            instances: vec![InstanceInfo {
                id: "vm-1".to_string(),
                volume_ids: vec!["vm-1-boot".to_string()],
            }],
            ..Default::default()
        });
        let client = client(compute.clone());

        let dangling = client.delete_instances_in_network("ci-network").await.unwrap();

        assert_eq!(dangling, vec!["vm-1-boot"]);
        assert_eq!(compute.calls(), vec!["delete_instance:vm-1"]);
    }

    #[tokio::test]
    async fn test_partial_instance_deletion_keeps_deleted_disks() {
        let compute = Arc::new(FakeCompute {
            instances: vec![
                InstanceInfo {
                    id: "vm-1".to_string(),
                    volume_ids: vec!["vm-1-boot".to_string()],
                },
                InstanceInfo {
                    id: "vm-2".to_string(),
                    volume_ids: vec!["vm-2-boot".to_string()],
                },
            ],
            failing_instance: Some("vm-2".to_string()),
            ..Default::default()
        });
        let client = client(compute.clone());
        let deleter = client.volume_deleter();

        let failure = clean_network_with(&client, "ci-network", deleter.as_ref())
            .await
            .unwrap_err();

        assert_eq!(compute.calls(), vec!["delete_instance:vm-1", "delete_instance:vm-2"]);
        assert_eq!(failure.dangling_volumes, vec!["vm-1-boot"]);
        assert!(matches!(failure.error, TeardownError::ProviderApiFailure(_)));
    }

    #[tokio::test]
    async fn test_resolve_owning_zone() {
        let client = client(Arc::new(FakeCompute::default()));
        let zone = client.resolve_owning_zone("ci.example.com").await.unwrap();
        assert_eq!(zone.name, "example.com");
        assert_eq!(zone.id, "example-zone");
    }
}
