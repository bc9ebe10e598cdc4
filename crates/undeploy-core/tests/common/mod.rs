use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use undeploy_core::state::STATE_KEY;
use undeploy_core::{
    AuthenticatedCommand, CleanupFailure, Deployer, DirectorConfig, DirectorCredentials, EnvironmentDescriptor,
    HostedZone, InstanceInfo, OutputStore, ProviderClient, ProviderFactory, ProviderSettings,
    Result, TeardownError, TeardownOrchestrator, TemporaryStore, VolumeDeleter, VolumeInfo,
};

/// Everything the fakes did, in order
#[derive(Default)]
pub struct Journal {
    pub events: Mutex<Vec<String>>,
}

impl Journal {
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.events().iter().any(|e| e.starts_with(prefix))
    }
}

pub struct FakeOutputs {
    pub values: HashMap<String, String>,
    pub journal: Arc<Journal>,
}

impl FakeOutputs {
    pub fn complete(journal: Arc<Journal>) -> Self {
        let values = [
            ("DirectorPublicIP", "34.1.2.3"),
            ("Network", "ci-network"),
            ("PublicSubnetworkName", "ci-public"),
            ("PrivateSubnetworkName", "ci-private"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { values, journal }
    }

    pub fn without(mut self, key: &str) -> Self {
        self.values.remove(key);
        self
    }
}

#[async_trait]
impl OutputStore for FakeOutputs {
    async fn get(&self, key: &str) -> Result<String> {
        self.journal.record(format!("outputs:get:{}", key));
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| TeardownError::LookupFailure(format!("output {}", key)))
    }
}

#[derive(Default)]
pub struct FakeDeployer {
    pub journal: Arc<Journal>,
    pub fail_command: bool,
    pub fail_delete_env: bool,
    pub environments: Mutex<Vec<EnvironmentDescriptor>>,
    pub forced: Mutex<Vec<bool>>,
}

#[async_trait]
impl Deployer for FakeDeployer {
    async fn run_authenticated_command(
        &self,
        command: &AuthenticatedCommand<'_>,
        output: &mut (dyn Write + Send),
    ) -> Result<()> {
        self.journal
            .record(format!("deployer:{}:{}", command.command, command.address));
        self.forced.lock().unwrap().push(command.force);
        writeln!(output, "Deleting deployment")?;
        if self.fail_command {
            return Err(TeardownError::CommandFailed("director unreachable".to_string()));
        }
        Ok(())
    }

    async fn delete_environment(
        &self,
        store: &mut TemporaryStore,
        environment: &EnvironmentDescriptor,
        _credentials: &DirectorCredentials,
        _extra: Option<&serde_json::Value>,
    ) -> Result<()> {
        self.journal.record("deployer:delete-env");
        self.environments.lock().unwrap().push(environment.clone());
        if self.fail_delete_env {
            store.set(STATE_KEY, b"{\"half\":true}".to_vec());
            return Err(TeardownError::CommandFailed("delete-env failed".to_string()));
        }
        store.set(STATE_KEY, b"{}".to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProvider {
    pub journal: Arc<Journal>,
    pub attributes: HashMap<String, String>,
    pub instances: HashMap<String, Vec<InstanceInfo>>,
    pub volumes: Vec<VolumeInfo>,
    /// Terminate one instance at a time and fail on this one
    pub fail_terminate: Option<String>,
}

#[async_trait]
impl ProviderClient for FakeProvider {
    fn region(&self) -> &str {
        "europe-west1"
    }

    fn platform_name(&self) -> &str {
        "FAKE"
    }

    fn attr(&self, name: &str) -> Result<String> {
        self.attributes
            .get(name)
            .cloned()
            .ok_or_else(|| TeardownError::LookupFailure(format!("attribute {}", name)))
    }

    fn zone(&self) -> &str {
        "europe-west1-b"
    }

    async fn is_whitelisted(&self, _target_ip: &str, _group: &str) -> Result<bool> {
        Ok(true)
    }

    async fn list_volumes(&self, volume_ids: &[String]) -> Result<Vec<VolumeInfo>> {
        self.journal.record("provider:list-volumes");
        Ok(self
            .volumes
            .iter()
            .filter(|v| volume_ids.contains(&v.id))
            .cloned()
            .collect())
    }

    fn volume_deleter(&self) -> Box<dyn VolumeDeleter> {
        Box::new(JournalDeleter {
            journal: self.journal.clone(),
        })
    }

    async fn delete_instances_in_network(
        &self,
        network: &str,
    ) -> std::result::Result<Vec<String>, CleanupFailure> {
        let instances = self.instances.get(network).cloned().unwrap_or_default();
        if instances.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(failing) = &self.fail_terminate {
            let mut volume_ids = Vec::new();
            for instance in instances {
                if &instance.id == failing {
                    return Err(CleanupFailure::new(
                        volume_ids,
                        TeardownError::ProviderApiFailure(format!("terminate {}", failing)),
                    ));
                }
                self.journal.record(format!("provider:terminate:{}", instance.id));
                volume_ids.extend(instance.volume_ids);
            }
            return Ok(volume_ids);
        }

        let ids: Vec<String> = instances.iter().map(|i| i.id.clone()).collect();
        self.journal.record(format!("provider:terminate:{}", ids.join(",")));
        Ok(instances.into_iter().flat_map(|i| i.volume_ids).collect())
    }

    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        Ok(Vec::new())
    }
}

pub struct JournalDeleter {
    pub journal: Arc<Journal>,
}

#[async_trait]
impl VolumeDeleter for JournalDeleter {
    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        self.journal.record(format!("provider:delete-volume:{}", volume_id));
        Ok(())
    }
}

/// Hands out a fresh [`FakeProvider`] built from a template
pub struct FakeFactory {
    pub journal: Arc<Journal>,
    pub attributes: HashMap<String, String>,
    pub instances: HashMap<String, Vec<InstanceInfo>>,
    pub volumes: Vec<VolumeInfo>,
    pub fail_terminate: Option<String>,
}

impl FakeFactory {
    pub fn gcp_like(journal: Arc<Journal>) -> Self {
        let attributes = [
            ("credentials_path", "/secrets/gcp.json"),
            ("project", "ci-project"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            journal,
            attributes,
            instances: HashMap::new(),
            volumes: Vec::new(),
            fail_terminate: None,
        }
    }
}

#[async_trait]
impl ProviderFactory for FakeFactory {
    async fn build(&self, _settings: &ProviderSettings) -> Result<Box<dyn ProviderClient>> {
        Ok(Box::new(FakeProvider {
            journal: self.journal.clone(),
            attributes: self.attributes.clone(),
            instances: self.instances.clone(),
            volumes: self.volumes.clone(),
            fail_terminate: self.fail_terminate.clone(),
        }))
    }
}

pub fn director_config() -> DirectorConfig {
    DirectorConfig {
        director_name: "bosh".to_string(),
        credentials: DirectorCredentials {
            password: "secret".to_string(),
            cert: "CERT".to_string(),
            key: "KEY".to_string(),
            ca_cert: "CA".to_string(),
        },
        public_cidr: "10.0.0.0/24".to_string(),
        public_key: "ssh-rsa AAAA".to_string(),
        spot: true,
    }
}

pub fn orchestrator(
    factory: FakeFactory,
    outputs: FakeOutputs,
    deployer: Arc<FakeDeployer>,
) -> TeardownOrchestrator {
    orchestrator_with(factory, outputs, deployer, director_config())
}

pub fn orchestrator_with(
    factory: FakeFactory,
    outputs: FakeOutputs,
    deployer: Arc<FakeDeployer>,
    director: DirectorConfig,
) -> TeardownOrchestrator {
    TeardownOrchestrator::new(
        Arc::new(factory),
        ProviderSettings::new("fake", "europe-west1"),
        Arc::new(outputs),
        deployer,
        director,
    )
}
