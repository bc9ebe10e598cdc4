//! Teardown error types

use crate::step::TeardownStep;
use thiserror::Error;

/// Teardown errors
#[derive(Error, Debug)]
pub enum TeardownError {
    #[error("Lookup failed: {0}")]
    LookupFailure(String),

    #[error("Invalid network input: {0}")]
    InvalidNetworkInput(String),

    #[error("Provider API error: {0}")]
    ProviderApiFailure(String),

    #[error("No matching hosted zone found for domain {0}")]
    NoMatchingZone(String),

    #[error("Teardown stopped at {step} after the deployment was removed: {source}")]
    PartialTeardown {
        step: TeardownStep,
        #[source]
        source: Box<TeardownError>,
    },

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TeardownError {
    /// Wrap an error raised at or after the deployment-removal step.
    pub fn partial(step: TeardownStep, source: TeardownError) -> Self {
        TeardownError::PartialTeardown {
            step,
            source: Box::new(source),
        }
    }

    /// Whether re-running the whole teardown from scratch is safe.
    pub fn is_retry_safe(&self) -> bool {
        !matches!(self, TeardownError::PartialTeardown { .. })
    }

    /// The step a partial teardown stopped at.
    pub fn failed_step(&self) -> Option<TeardownStep> {
        match self {
            TeardownError::PartialTeardown { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TeardownError>;

/// A failed decommission, carrying the best-known residual director state
/// so the caller can persist it.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct TeardownFailure {
    pub state: Vec<u8>,
    #[source]
    pub error: TeardownError,
}

impl TeardownFailure {
    pub fn new(state: Vec<u8>, error: TeardownError) -> Self {
        Self { state, error }
    }

    pub fn partial(state: Vec<u8>, step: TeardownStep, error: TeardownError) -> Self {
        Self {
            state,
            error: TeardownError::partial(step, error),
        }
    }
}

/// A failed network cleanup. Instances may already be terminating, so the
/// volume IDs captured before termination are handed back regardless.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct CleanupFailure {
    pub dangling_volumes: Vec<String>,
    #[source]
    pub error: TeardownError,
}

impl CleanupFailure {
    pub fn new(dangling_volumes: Vec<String>, error: impl Into<TeardownError>) -> Self {
        Self {
            dangling_volumes,
            error: error.into(),
        }
    }
}

/// A failure before anything was terminated
impl From<TeardownError> for CleanupFailure {
    fn from(error: TeardownError) -> Self {
        Self::new(Vec::new(), error)
    }
}
