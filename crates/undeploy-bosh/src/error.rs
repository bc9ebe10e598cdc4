//! BOSH deployer error types

use thiserror::Error;
use undeploy_core::TeardownError;

#[derive(Error, Debug)]
pub enum BoshError {
    #[error("bosh CLI not found: {0}")]
    BoshNotFound(String),

    #[error("bosh command failed: {0}")]
    CommandFailed(String),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<BoshError> for TeardownError {
    fn from(err: BoshError) -> Self {
        match err {
            BoshError::IoError(e) => TeardownError::Io(e),
            BoshError::JsonError(e) => TeardownError::Json(e),
            other => TeardownError::CommandFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BoshError>;
