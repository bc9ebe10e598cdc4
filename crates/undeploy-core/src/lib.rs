//! undeploy core
//!
//! This crate provides the provider abstraction and teardown orchestration
//! used to decommission a BOSH director and the cloud resources around it.
//!
//! # Supported Providers
//!
//! - **AWS**: security groups, EBS volumes, EC2 instances, Route 53 zones (`undeploy-aws`)
//! - **GCP**: firewalls, persistent disks, Compute instances, Cloud DNS zones (`undeploy-gcp`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  undeploy CLI                    │
//! │        (destroy / clean-network / ...)           │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                undeploy-core                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          TeardownOrchestrator             │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   trait ProviderClient / ProviderFactory  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────┐ ┌────────────┐ ┌─────────────┐    │
//! │  │ network  │ │ whitelist  │ │    zone     │    │
//! │  └──────────┘ └────────────┘ └─────────────┘    │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  undeploy-aws │ │  undeploy-gcp │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! The orchestrator never retries. Volumes left behind by terminated
//! instances only become deletable once the provider reports them
//! `available`, so callers re-run [`ProviderClient::delete_volumes`] until
//! [`ProviderClient::list_volumes`] comes back empty.

pub mod collaborator;
pub mod environment;
pub mod error;
pub mod model;
pub mod network;
pub mod orchestrator;
pub mod provider;
pub mod state;
pub mod step;
pub mod whitelist;
pub mod zone;

// Re-exports
pub use collaborator::{AuthenticatedCommand, Deployer, OutputStore};
pub use environment::{DirectorConfig, DirectorCredentials, EnvironmentDescriptor};
pub use error::{CleanupFailure, Result, TeardownError, TeardownFailure};
pub use model::{HostedZone, IngressRule, InstanceInfo, VolumeInfo, VolumeStatus};
pub use network::InternalNetwork;
pub use orchestrator::{TeardownOrchestrator, clean_network_with};
pub use provider::{
    ProviderClient, ProviderFactory, ProviderRegistry, ProviderSettings, VolumeDeleter,
};
pub use state::{StateFile, TemporaryStore};
pub use step::TeardownStep;
pub use zone::ResolvedZone;
