//! EC2 operations used during teardown

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ec2::types::{Filter, Reservation, SecurityGroup};
use undeploy_core::{IngressRule, InstanceInfo, VolumeInfo, VolumeStatus};

const GROUP_NOT_FOUND: &str = "InvalidGroup.NotFound";

/// The subset of EC2 the AWS provider needs
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Ingress rules of a security group, `None` if the group does not exist
    async fn security_group_rules(&self, group_id: &str) -> Result<Option<Vec<IngressRule>>>;

    /// Volumes with the given IDs, whatever their state
    async fn describe_volumes(&self, volume_ids: &[String]) -> Result<Vec<VolumeInfo>>;

    async fn delete_volume(&self, volume_id: &str) -> Result<()>;

    /// Instances attached to a VPC, with their EBS volume IDs
    async fn describe_instances_in_vpc(&self, vpc_id: &str) -> Result<Vec<InstanceInfo>>;

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()>;
}

/// [`Ec2Api`] backed by the AWS SDK
#[derive(Clone)]
pub struct SdkEc2 {
    client: aws_sdk_ec2::Client,
}

impl SdkEc2 {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ec2::Client::new(config),
        }
    }
}

fn sdk_error<E: std::error::Error>(err: E) -> AwsError {
    AwsError::Ec2(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl Ec2Api for SdkEc2 {
    async fn security_group_rules(&self, group_id: &str) -> Result<Option<Vec<IngressRule>>> {
        tracing::debug!("Describing security group {}", group_id);
        let output = match self
            .client
            .describe_security_groups()
            .group_ids(group_id)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let code = err.as_service_error().and_then(|e| e.code());
                if code == Some(GROUP_NOT_FOUND) {
                    return Ok(None);
                }
                return Err(sdk_error(err));
            }
        };

        Ok(output.security_groups().first().map(ingress_rules))
    }

    async fn describe_volumes(&self, volume_ids: &[String]) -> Result<Vec<VolumeInfo>> {
        tracing::debug!("Describing {} volumes", volume_ids.len());
        let output = self
            .client
            .describe_volumes()
            .filters(
                Filter::builder()
                    .name("volume-id")
                    .set_values(Some(volume_ids.to_vec()))
                    .build(),
            )
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .volumes()
            .iter()
            .filter_map(|volume| {
                let id = volume.volume_id()?;
                let status = volume
                    .state()
                    .map(|s| VolumeStatus::from_provider(s.as_str()))
                    .unwrap_or(VolumeStatus::Unknown);
                Some(VolumeInfo::new(id, status))
            })
            .collect())
    }

    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        self.client
            .delete_volume()
            .volume_id(volume_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn describe_instances_in_vpc(&self, vpc_id: &str) -> Result<Vec<InstanceInfo>> {
        tracing::debug!("Describing instances in {}", vpc_id);
        let output = self
            .client
            .describe_instances()
            .filters(Filter::builder().name("vpc-id").values(vpc_id).build())
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(instances(output.reservations()))
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()> {
        self.client
            .terminate_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}

/// Flatten a group's permissions into one rule per (range, port).
///
/// Permissions without a port (all traffic) are skipped.
pub fn ingress_rules(group: &SecurityGroup) -> Vec<IngressRule> {
    group
        .ip_permissions()
        .iter()
        .filter_map(|permission| {
            let port = u16::try_from(permission.from_port()?).ok()?;
            Some((permission, port))
        })
        .flat_map(|(permission, port)| {
            permission
                .ip_ranges()
                .iter()
                .filter_map(move |range| range.cidr_ip().map(|cidr| IngressRule::new(cidr, port)))
        })
        .collect()
}

/// Instances and the EBS volumes mapped to them
pub fn instances(reservations: &[Reservation]) -> Vec<InstanceInfo> {
    reservations
        .iter()
        .flat_map(|reservation| reservation.instances())
        .filter_map(|instance| {
            let id = instance.instance_id()?.to_string();
            let volume_ids = instance
                .block_device_mappings()
                .iter()
                .filter_map(|mapping| mapping.ebs().and_then(|ebs| ebs.volume_id()))
                .map(str::to_string)
                .collect();
            Some(InstanceInfo { id, volume_ids })
        })
        .collect()
}
