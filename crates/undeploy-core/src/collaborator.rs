//! External collaborators of the orchestrator

use crate::environment::{DirectorCredentials, EnvironmentDescriptor};
use crate::error::Result;
use crate::state::TemporaryStore;
use async_trait::async_trait;
use std::io::Write;

/// Key/value view of the outputs recorded when the director was created
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Value for `key`, or a lookup failure when the key is absent
    async fn get(&self, key: &str) -> Result<String>;
}

/// A command run against a live director
#[derive(Debug, Clone)]
pub struct AuthenticatedCommand<'a> {
    /// Deployer subcommand, e.g. `delete-deployment`
    pub command: &'a str,

    /// Director address
    pub address: &'a str,

    pub password: &'a str,

    pub ca_cert: &'a str,

    /// Pass `--force` to the subcommand
    pub force: bool,

    pub flags: Vec<String>,
}

/// The deployment tool that owns the director
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Run a command against the director, streaming its output to `output`.
    async fn run_authenticated_command(
        &self,
        command: &AuthenticatedCommand<'_>,
        output: &mut (dyn Write + Send),
    ) -> Result<()>;

    /// Delete the director environment.
    ///
    /// `store` holds the serialized director state under
    /// [`crate::state::STATE_KEY`]; the deployer updates it in place, even
    /// when deletion fails part way.
    async fn delete_environment(
        &self,
        store: &mut TemporaryStore,
        environment: &EnvironmentDescriptor,
        credentials: &DirectorCredentials,
        extra: Option<&serde_json::Value>,
    ) -> Result<()>;
}
