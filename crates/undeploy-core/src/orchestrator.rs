//! Director teardown sequencing

use crate::collaborator::{AuthenticatedCommand, Deployer, OutputStore};
use crate::environment::{DirectorConfig, EnvironmentDescriptor};
use crate::error::{CleanupFailure, Result, TeardownError, TeardownFailure};
use crate::network::InternalNetwork;
use crate::provider::{ProviderClient, ProviderFactory, ProviderSettings, VolumeDeleter};
use crate::state::TemporaryStore;
use crate::step::TeardownStep;
use std::io::Write;
use std::sync::Arc;

pub const OUTPUT_DIRECTOR_PUBLIC_IP: &str = "DirectorPublicIP";
pub const OUTPUT_NETWORK: &str = "Network";
pub const OUTPUT_PUBLIC_SUBNETWORK: &str = "PublicSubnetworkName";
pub const OUTPUT_PRIVATE_SUBNETWORK: &str = "PrivateSubnetworkName";

pub const ATTR_CREDENTIALS_PATH: &str = "credentials_path";
pub const ATTR_PROJECT: &str = "project";

const DELETE_DEPLOYMENT: &str = "delete-deployment";

/// Tears down a director and the resources around it
pub struct TeardownOrchestrator {
    factory: Arc<dyn ProviderFactory>,
    settings: ProviderSettings,
    outputs: Arc<dyn OutputStore>,
    deployer: Arc<dyn Deployer>,
    director: DirectorConfig,
}

impl TeardownOrchestrator {
    pub fn new(
        factory: Arc<dyn ProviderFactory>,
        settings: ProviderSettings,
        outputs: Arc<dyn OutputStore>,
        deployer: Arc<dyn Deployer>,
        director: DirectorConfig,
    ) -> Self {
        Self {
            factory,
            settings,
            outputs,
            deployer,
            director,
        }
    }

    /// Build the provider client for the configured platform.
    pub async fn provider(&self) -> Result<Box<dyn ProviderClient>> {
        self.factory.build(&self.settings).await
    }

    /// Decommission the director, streaming deployer output to stdout.
    pub async fn decommission(&self, state: Vec<u8>) -> std::result::Result<Vec<u8>, TeardownFailure> {
        let mut stdout = std::io::stdout();
        self.decommission_with_output(state, &mut stdout).await
    }

    /// Decommission the director.
    ///
    /// Returns the residual director state. Every failure carries the
    /// best-known state as well. Failures before the deployment is removed
    /// leave nothing changed; later ones are reported as
    /// [`TeardownError::PartialTeardown`] and need manual follow-up.
    pub async fn decommission_with_output(
        &self,
        state: Vec<u8>,
        output: &mut (dyn Write + Send),
    ) -> std::result::Result<Vec<u8>, TeardownFailure> {
        let provider = match self.provider().await {
            Ok(provider) => provider,
            Err(e) => return Err(TeardownFailure::new(state, e)),
        };

        let public_ip = match self.outputs.get(OUTPUT_DIRECTOR_PUBLIC_IP).await {
            Ok(ip) => ip,
            Err(e) => {
                let error = TeardownError::LookupFailure(format!("failed to retrieve director IP: {}", e));
                return Err(TeardownFailure::new(state, error));
            }
        };

        tracing::info!("Removing deployment from director {}", public_ip);
        let command = AuthenticatedCommand {
            command: DELETE_DEPLOYMENT,
            address: &public_ip,
            password: &self.director.credentials.password,
            ca_cert: &self.director.credentials.ca_cert,
            force: true,
            flags: Vec::new(),
        };
        if let Err(e) = self.deployer.run_authenticated_command(&command, output).await {
            return Err(TeardownFailure::partial(state, TeardownStep::RemoveDeployment, e));
        }

        let mut store = TemporaryStore::with_state(state);

        let environment = match self.describe_environment(provider.as_ref(), &public_ip).await {
            Ok(environment) => environment,
            Err((step, e)) => {
                tracing::warn!("Teardown stopped at {} with the deployment removed", step);
                return Err(TeardownFailure::partial(store.into_state(), step, e));
            }
        };

        tracing::info!("Deleting director environment {}", environment.director_name);
        let result = self
            .deployer
            .delete_environment(&mut store, &environment, &self.director.credentials, None)
            .await;

        let residual = store.into_state();
        match result {
            Ok(()) => Ok(residual),
            Err(e) => {
                tracing::warn!("Director environment deletion failed: {}", e);
                Err(TeardownFailure::partial(residual, TeardownStep::DeleteEnvironment, e))
            }
        }
    }

    async fn describe_environment(
        &self,
        provider: &dyn ProviderClient,
        public_ip: &str,
    ) -> std::result::Result<EnvironmentDescriptor, (TeardownStep, TeardownError)> {
        let network = InternalNetwork::derive(&self.director.public_cidr)
            .map_err(|e| (TeardownStep::DeriveNetwork, e))?;

        let gather = |e| (TeardownStep::GatherDescriptor, e);
        let credentials_ref = provider.attr(ATTR_CREDENTIALS_PATH).map_err(gather)?;
        let vpc = self.outputs.get(OUTPUT_NETWORK).await.map_err(gather)?;
        let public_subnetwork = self.outputs.get(OUTPUT_PUBLIC_SUBNETWORK).await.map_err(gather)?;
        let private_subnetwork = self.outputs.get(OUTPUT_PRIVATE_SUBNETWORK).await.map_err(gather)?;
        let project_id = provider.attr(ATTR_PROJECT).map_err(gather)?;

        Ok(EnvironmentDescriptor {
            director_name: self.director.director_name.clone(),
            external_ip: public_ip.to_string(),
            credentials_ref,
            internal_cidr: network.cidr,
            internal_gateway: network.gateway.to_string(),
            internal_ip: network.director_ip.to_string(),
            network: vpc,
            private_subnetwork,
            project_id,
            public_key: self.director.public_key.clone(),
            public_subnetwork,
            spot: self.director.spot,
            zone: provider.zone().to_string(),
        })
    }

    /// Terminate every instance in `network` and make one deletion pass over
    /// the volumes they leave behind, using the provider's default policy.
    pub async fn clean_network(&self, network: &str) -> std::result::Result<Vec<String>, CleanupFailure> {
        let provider = self.provider().await?;
        let deleter = provider.volume_deleter();
        clean_network_with(provider.as_ref(), network, deleter.as_ref()).await
    }
}

/// Terminate instances in `network`, then make one pass over their volumes.
///
/// Returns the volume IDs captured from the terminated instances, and hands
/// them back with the error when termination stops part way. Most of
/// them are still attached when the single pass runs, so callers keep
/// calling [`ProviderClient::delete_volumes`] with these IDs until
/// [`ProviderClient::list_volumes`] reports none left.
pub async fn clean_network_with(
    provider: &dyn ProviderClient,
    network: &str,
    deleter: &dyn VolumeDeleter,
) -> std::result::Result<Vec<String>, CleanupFailure> {
    let dangling = provider.delete_instances_in_network(network).await?;

    if let Err(error) = provider.delete_volumes(&dangling, deleter).await {
        return Err(CleanupFailure::new(dangling, error));
    }

    Ok(dangling)
}
