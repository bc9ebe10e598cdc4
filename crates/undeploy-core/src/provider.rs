//! Provider capability trait and factory

use crate::error::{CleanupFailure, Result, TeardownError};
use crate::model::{HostedZone, VolumeInfo, deletable_volumes};
use crate::zone::{self, ResolvedZone};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Policy used to delete a single volume.
///
/// Providers ship a default (see [`ProviderClient::volume_deleter`]); tests
/// and multi-step deletion protocols supply their own.
#[async_trait]
pub trait VolumeDeleter: Send + Sync {
    async fn delete_volume(&self, volume_id: &str) -> Result<()>;
}

/// Cloud provider capabilities needed to tear a director down
///
/// Every provider (AWS, GCP, ...) implements the same operation set. No
/// operation retries; see [`ProviderClient::delete_volumes`].
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Region the client operates in
    fn region(&self) -> &str;

    /// Platform name (e.g. "AWS", "GCP")
    fn platform_name(&self) -> &str;

    /// Look up a provider attribute such as `project` or `credentials_path`
    fn attr(&self, name: &str) -> Result<String>;

    /// Availability zone the director was placed in
    fn zone(&self) -> &str;

    /// Whether the group opens every required director port to `target_ip/32`.
    ///
    /// A group that does not exist is a [`TeardownError::LookupFailure`].
    async fn is_whitelisted(&self, target_ip: &str, group: &str) -> Result<bool>;

    /// Current status of the requested volumes. Unknown IDs are omitted.
    async fn list_volumes(&self, volume_ids: &[String]) -> Result<Vec<VolumeInfo>>;

    /// The provider's own deletion policy
    fn volume_deleter(&self) -> Box<dyn VolumeDeleter>;

    /// Delete every requested volume that is currently `available`.
    ///
    /// Volumes still attached are skipped. The first failing deletion stops
    /// the pass and leaves the rest in place. Volumes freed by instance
    /// termination need several passes: callers repeat this until
    /// [`ProviderClient::list_volumes`] returns nothing.
    async fn delete_volumes(&self, volume_ids: &[String], deleter: &dyn VolumeDeleter) -> Result<()> {
        if volume_ids.is_empty() {
            return Ok(());
        }

        let volumes = self.list_volumes(volume_ids).await?;
        for volume_id in deletable_volumes(&volumes, volume_ids) {
            tracing::info!("Deleting volume: {}", volume_id);
            deleter.delete_volume(&volume_id).await?;
        }
        Ok(())
    }

    /// Terminate every instance in `network` and return the volume IDs that
    /// were attached to them.
    ///
    /// Volumes are captured before termination and are not yet deletable
    /// when this returns. On failure the error carries the volume IDs of
    /// every instance already terminated, since their mappings cannot be
    /// read back afterwards.
    async fn delete_instances_in_network(
        &self,
        network: &str,
    ) -> std::result::Result<Vec<String>, CleanupFailure>;

    /// All DNS zones visible to the account
    async fn list_zones(&self) -> Result<Vec<HostedZone>>;

    /// The most specific zone owning `subdomain`
    async fn resolve_owning_zone(&self, subdomain: &str) -> Result<ResolvedZone> {
        let zones = self.list_zones().await?;
        zone::resolve(&zones, subdomain)
    }
}

/// Settings a provider client is constructed from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Platform key used to select the factory (e.g. "aws", "gcp")
    pub platform: String,

    pub region: String,

    /// Provider-specific attributes (project, zone, credentials_path, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl ProviderSettings {
    pub fn new(platform: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            region: region.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute value, or a lookup failure when absent.
    pub fn attribute(&self, name: &str) -> Result<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| TeardownError::LookupFailure(format!("provider attribute {}", name)))
    }
}

/// Builds provider clients
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    async fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn ProviderClient>>;
}

/// Factory that dispatches on [`ProviderSettings::platform`]
///
/// Built explicitly by the caller and handed to the orchestrator.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    factories: HashMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, platform: impl Into<String>, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factories.insert(platform.into().to_lowercase(), factory);
        self
    }

    pub fn platforms(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl ProviderFactory for ProviderRegistry {
    async fn build(&self, settings: &ProviderSettings) -> Result<Box<dyn ProviderClient>> {
        let factory = self
            .factories
            .get(&settings.platform.to_lowercase())
            .ok_or_else(|| TeardownError::ProviderNotFound(settings.platform.clone()))?;
        factory.build(settings).await
    }
}
