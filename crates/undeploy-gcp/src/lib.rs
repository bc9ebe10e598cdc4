//! GCP provider for undeploy
//!
//! This crate implements the `ProviderClient` trait for Google Cloud using
//! the Compute Engine and Cloud DNS REST APIs directly.
//!
//! # Features
//!
//! - Firewall whitelist checks
//! - Persistent disk cleanup
//! - Instance deletion by VPC network
//! - Cloud DNS managed zone lookup
//!
//! # Requirements
//!
//! - An OAuth access token, either as the `access_token` provider attribute
//!   or in `GOOGLE_OAUTH_ACCESS_TOKEN` (e.g. `gcloud auth print-access-token`)
//! - `project` and `zone` provider attributes
//!
//! # Example
//!
//! ```ignore
//! use undeploy_gcp::{GcpClient, GcpConfig};
//! use undeploy_core::ProviderClient;
//!
//! let config = GcpConfig::from_settings(&settings)?;
//! let client = GcpClient::new(settings.clone(), config);
//!
//! let zone = client.resolve_owning_zone("ci.example.com").await?;
//! ```

pub mod api;
pub mod error;
pub mod provider;

pub use api::{ComputeApi, GcpConfig, RestCompute};
pub use error::{GcpError, Result};
pub use provider::{GcpClient, GcpDiskDeleter, GcpProviderFactory};
