//! GCP provider error types

use thiserror::Error;
use undeploy_core::TeardownError;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),

    #[error("Missing provider attribute: {0}")]
    MissingAttribute(String),

    #[error("Firewall not found: {0}")]
    FirewallNotFound(String),

    #[error("GCP API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<GcpError> for TeardownError {
    fn from(err: GcpError) -> Self {
        match err {
            GcpError::MissingEnvVar(_)
            | GcpError::MissingAttribute(_)
            | GcpError::FirewallNotFound(_) => TeardownError::LookupFailure(err.to_string()),
            _ => TeardownError::ProviderApiFailure(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GcpError>;
