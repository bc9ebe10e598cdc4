//! Provider-side resources referenced during a teardown
//!
//! None of these are stored beyond a single teardown pass; they are
//! fetched from the provider, inspected and dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single ingress permission of a security group or firewall
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngressRule {
    /// Source range, e.g. `203.0.113.7/32`
    pub source_cidr: String,

    /// Port the rule opens (the start of the range for ranged rules)
    pub port: u16,
}

impl IngressRule {
    pub fn new(source_cidr: impl Into<String>, port: u16) -> Self {
        Self {
            source_cidr: source_cidr.into(),
            port,
        }
    }
}

/// A DNS zone as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Dot-terminated domain name, e.g. `example.com.`
    pub name: String,

    /// Provider identifier, possibly wrapped (`/hostedzone/Z123`)
    pub id: String,
}

impl HostedZone {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Status of a block storage volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeStatus {
    Creating,
    /// Detached and deletable
    Available,
    /// Still attached to an instance
    InUse,
    Deleting,
    Deleted,
    Error,
    Unknown,
}

impl VolumeStatus {
    /// Parse an EC2-style volume state string.
    pub fn from_provider(state: &str) -> Self {
        match state {
            "creating" => VolumeStatus::Creating,
            "available" => VolumeStatus::Available,
            "in-use" => VolumeStatus::InUse,
            "deleting" => VolumeStatus::Deleting,
            "deleted" => VolumeStatus::Deleted,
            "error" => VolumeStatus::Error,
            _ => VolumeStatus::Unknown,
        }
    }
}

impl std::fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeStatus::Creating => write!(f, "creating"),
            VolumeStatus::Available => write!(f, "available"),
            VolumeStatus::InUse => write!(f, "in-use"),
            VolumeStatus::Deleting => write!(f, "deleting"),
            VolumeStatus::Deleted => write!(f, "deleted"),
            VolumeStatus::Error => write!(f, "error"),
            VolumeStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A volume and its current status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub id: String,
    pub status: VolumeStatus,
}

impl VolumeInfo {
    pub fn new(id: impl Into<String>, status: VolumeStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }
}

/// An instance together with the volumes mapped to it before termination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub id: String,
    pub volume_ids: Vec<String>,
}

/// Volumes that are both requested and `available`, in listing order.
pub fn deletable_volumes(volumes: &[VolumeInfo], requested: &[String]) -> Vec<String> {
    let requested: HashSet<&str> = requested.iter().map(String::as_str).collect();
    volumes
        .iter()
        .filter(|v| v.status == VolumeStatus::Available && requested.contains(v.id.as_str()))
        .map(|v| v.id.clone())
        .collect()
}
