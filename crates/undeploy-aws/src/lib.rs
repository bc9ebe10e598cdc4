//! AWS provider for undeploy
//!
//! This crate implements the `ProviderClient` trait for AWS on top of the
//! EC2 and Route 53 SDKs.
//!
//! # Features
//!
//! - Security group whitelist checks
//! - EBS volume cleanup
//! - EC2 instance termination by VPC
//! - Route 53 hosted zone lookup
//!
//! # Requirements
//!
//! Credentials are resolved through the default AWS provider chain
//! (environment, shared config, instance profile).
//!
//! # Example
//!
//! ```ignore
//! use undeploy_aws::AwsClient;
//! use undeploy_core::{ProviderClient, ProviderSettings};
//!
//! let client = AwsClient::connect(&ProviderSettings::new("aws", "eu-west-1")).await?;
//!
//! let dangling = client.delete_instances_in_network("vpc-0123").await?;
//! client.delete_volumes(&dangling, client.volume_deleter().as_ref()).await?;
//! ```

pub mod ec2;
pub mod error;
pub mod provider;
pub mod route53;

pub use ec2::{Ec2Api, SdkEc2};
pub use error::{AwsError, Result};
pub use provider::{AwsClient, AwsProviderFactory, AwsVolumeDeleter};
pub use route53::{Route53Api, SdkRoute53};
