//! AWS provider error types

use thiserror::Error;
use undeploy_core::TeardownError;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("EC2 request failed: {0}")]
    Ec2(String),

    #[error("Route 53 request failed: {0}")]
    Route53(String),

    #[error("Security group not found: {0}")]
    SecurityGroupNotFound(String),
}

impl From<AwsError> for TeardownError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::SecurityGroupNotFound(_) => TeardownError::LookupFailure(err.to_string()),
            _ => TeardownError::ProviderApiFailure(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_group_is_a_lookup_failure() {
        let err: TeardownError = AwsError::SecurityGroupNotFound("sg-1".to_string()).into();
        assert!(matches!(err, TeardownError::LookupFailure(ref m) if m.contains("sg-1")));

        let err: TeardownError = AwsError::Ec2("throttled".to_string()).into();
        assert!(matches!(err, TeardownError::ProviderApiFailure(_)));
    }
}
