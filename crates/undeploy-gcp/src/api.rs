//! Compute Engine and Cloud DNS REST client
//!
//! Direct API implementation using Bearer token authentication.

use crate::error::{GcpError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use undeploy_core::{HostedZone, IngressRule, InstanceInfo, ProviderSettings, VolumeInfo, VolumeStatus};

const COMPUTE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";
const DNS_API_BASE: &str = "https://dns.googleapis.com/dns/v1";
const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Connection settings for the GCP APIs
#[derive(Clone)]
pub struct GcpConfig {
    pub project: String,
    pub region: String,
    pub zone: String,
    pub access_token: String,
}

impl std::fmt::Debug for GcpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpConfig")
            .field("project", &self.project)
            .field("region", &self.region)
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}

impl GcpConfig {
    /// Read project and zone from the provider attributes. The access token
    /// comes from the `access_token` attribute, falling back to
    /// `GOOGLE_OAUTH_ACCESS_TOKEN`.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let attribute = |name: &str| {
            settings
                .attribute(name)
                .map(str::to_string)
                .map_err(|_| GcpError::MissingAttribute(name.to_string()))
        };

        let access_token = match settings.attribute("access_token") {
            Ok(token) => token.to_string(),
            Err(_) => std::env::var(ACCESS_TOKEN_ENV)
                .map_err(|_| GcpError::MissingEnvVar(ACCESS_TOKEN_ENV.to_string()))?,
        };

        Ok(Self {
            project: attribute("project")?,
            region: settings.region.clone(),
            zone: attribute("zone")?,
            access_token,
        })
    }
}

/// The subset of Compute Engine and Cloud DNS the GCP provider needs
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Ingress rules of a firewall, `None` if it does not exist
    async fn firewall_rules(&self, firewall: &str) -> Result<Option<Vec<IngressRule>>>;

    /// Disks in the configured zone
    async fn list_disks(&self) -> Result<Vec<VolumeInfo>>;

    async fn delete_disk(&self, disk: &str) -> Result<()>;

    /// Instances in the configured zone attached to `network`
    async fn list_instances_in_network(&self, network: &str) -> Result<Vec<InstanceInfo>>;

    async fn delete_instance(&self, instance: &str) -> Result<()>;

    /// Every Cloud DNS managed zone in the project
    async fn list_managed_zones(&self) -> Result<Vec<HostedZone>>;
}

/// [`ComputeApi`] over HTTPS
pub struct RestCompute {
    client: reqwest::Client,
    config: GcpConfig,
}

impl RestCompute {
    pub fn new(config: GcpConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn compute_url(&self, path: &str) -> String {
        format!("{}/projects/{}/{}", COMPUTE_API_BASE, self.config.project, path)
    }

    fn zone_url(&self, path: &str) -> String {
        self.compute_url(&format!("zones/{}/{}", self.config.zone, path))
    }

    /// GET a single resource, `None` on 404
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(read(response).await?))
    }

    /// GET every page of a list endpoint
    async fn list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            tracing::debug!("GET {} (page token: {:?})", url, page_token);
            let mut request = self.client.get(url).bearer_auth(&self.config.access_token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListPage<T> = read(request.send().await?).await?;
            items.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        tracing::debug!("DELETE {}", url);
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        // The returned operation completes asynchronously
        let _operation: serde_json::Value = read(response).await?;
        Ok(())
    }
}

async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(api_error(status.as_u16(), &body));
    }
    Ok(response.json().await?)
}

fn api_error(status: u16, body: &str) -> GcpError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| body.to_string());
    GcpError::ApiError { status, message }
}

#[async_trait]
impl ComputeApi for RestCompute {
    async fn firewall_rules(&self, firewall: &str) -> Result<Option<Vec<IngressRule>>> {
        let url = self.compute_url(&format!("global/firewalls/{}", firewall));
        let firewall: Option<ApiFirewall> = self.get(&url).await?;
        Ok(firewall.as_ref().map(firewall_rules))
    }

    async fn list_disks(&self) -> Result<Vec<VolumeInfo>> {
        let disks: Vec<ApiDisk> = self.list(&self.zone_url("disks")).await?;
        Ok(disks
            .iter()
            .map(|disk| VolumeInfo::new(disk.name.clone(), disk_status(disk)))
            .collect())
    }

    async fn delete_disk(&self, disk: &str) -> Result<()> {
        self.delete(&self.zone_url(&format!("disks/{}", disk))).await
    }

    async fn list_instances_in_network(&self, network: &str) -> Result<Vec<InstanceInfo>> {
        let instances: Vec<ApiInstance> = self.list(&self.zone_url("instances")).await?;
        Ok(instances
            .iter()
            .filter(|instance| in_network(instance, network))
            .map(instance_info)
            .collect())
    }

    async fn delete_instance(&self, instance: &str) -> Result<()> {
        self.delete(&self.zone_url(&format!("instances/{}", instance))).await
    }

    async fn list_managed_zones(&self) -> Result<Vec<HostedZone>> {
        let url = format!("{}/projects/{}/managedZones", DNS_API_BASE, self.config.project);
        let zones: Vec<ApiManagedZone> = self.list(&url).await?;
        Ok(zones
            .into_iter()
            .map(|zone| HostedZone::new(zone.dns_name, zone.name))
            .collect())
    }
}

/// One rule per (source range, allowed port). Protocols without explicit
/// ports are skipped; ranged ports use their first port. Disabled and egress
/// firewalls admit nothing.
pub(crate) fn firewall_rules(firewall: &ApiFirewall) -> Vec<IngressRule> {
    let ingress = firewall
        .direction
        .as_deref()
        .is_none_or(|direction| direction == "INGRESS");
    if firewall.disabled || !ingress {
        return Vec::new();
    }

    let ports: Vec<u16> = firewall
        .allowed
        .iter()
        .flat_map(|allowed| allowed.ports.iter())
        .filter_map(|port| port.split('-').next()?.trim().parse().ok())
        .collect();

    firewall
        .source_ranges
        .iter()
        .flat_map(|range| ports.iter().map(move |port| IngressRule::new(range.clone(), *port)))
        .collect()
}

/// A disk is `available` once it is ready and no instance uses it.
pub(crate) fn disk_status(disk: &ApiDisk) -> VolumeStatus {
    match disk.status.as_str() {
        "READY" if disk.users.is_empty() => VolumeStatus::Available,
        "READY" => VolumeStatus::InUse,
        "CREATING" | "RESTORING" => VolumeStatus::Creating,
        "DELETING" => VolumeStatus::Deleting,
        "FAILED" => VolumeStatus::Error,
        _ => VolumeStatus::Unknown,
    }
}

fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

pub(crate) fn in_network(instance: &ApiInstance, network: &str) -> bool {
    instance
        .network_interfaces
        .iter()
        .any(|nic| nic.network == network || last_segment(&nic.network) == network)
}

pub(crate) fn instance_info(instance: &ApiInstance) -> InstanceInfo {
    InstanceInfo {
        id: instance.name.clone(),
        volume_ids: instance
            .disks
            .iter()
            .filter_map(|disk| disk.source.as_deref())
            .map(|source| last_segment(source).to_string())
            .collect(),
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage<T> {
    #[serde(default = "Vec::new", alias = "managedZones")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiFirewall {
    /// Absent means INGRESS
    direction: Option<String>,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    source_ranges: Vec<String>,
    #[serde(default)]
    allowed: Vec<ApiAllowed>,
}

#[derive(Debug, Deserialize)]
struct ApiAllowed {
    #[serde(rename = "IPProtocol")]
    #[allow(dead_code)]
    ip_protocol: String,
    #[serde(default)]
    ports: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDisk {
    name: String,
    status: String,
    #[serde(default)]
    users: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiInstance {
    name: String,
    #[serde(default)]
    network_interfaces: Vec<ApiNetworkInterface>,
    #[serde(default)]
    disks: Vec<ApiAttachedDisk>,
}

#[derive(Debug, Deserialize)]
struct ApiNetworkInterface {
    network: String,
}

#[derive(Debug, Deserialize)]
struct ApiAttachedDisk {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiManagedZone {
    name: String,
    dns_name: String,
}
