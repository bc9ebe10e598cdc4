//! Route 53 hosted zone listing

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_sdk_route53::error::DisplayErrorContext;
use undeploy_core::HostedZone;

#[async_trait]
pub trait Route53Api: Send + Sync {
    /// Every hosted zone in the account, across all pages
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>>;
}

/// [`Route53Api`] backed by the AWS SDK
#[derive(Clone)]
pub struct SdkRoute53 {
    client: aws_sdk_route53::Client,
}

impl SdkRoute53 {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_route53::Client::new(config),
        }
    }
}

#[async_trait]
impl Route53Api for SdkRoute53 {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>> {
        let mut zones = Vec::new();
        let mut pages = self.client.list_hosted_zones().into_paginator().send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::Route53(DisplayErrorContext(&e).to_string()))?;
            zones.extend(
                page.hosted_zones()
                    .iter()
                    .map(|zone| HostedZone::new(zone.name(), zone.id())),
            );
        }

        tracing::debug!("Listed {} hosted zones", zones.len());
        Ok(zones)
    }
}
