//! bosh CLI wrapper
//!
//! Authenticated commands get their credentials through the `BOSH_*`
//! environment variables so the client secret never shows up in `ps`.

use crate::error::{BoshError, Result};
use crate::vars;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use undeploy_core::{
    AuthenticatedCommand, Deployer, DirectorCredentials, EnvironmentDescriptor, TemporaryStore,
    state::STATE_KEY,
};

const DEFAULT_BINARY: &str = "bosh";
const DEFAULT_CLIENT: &str = "admin";
const VARS_FILE: &str = "vars.yml";

/// `Deployer` backed by the bosh CLI
#[derive(Debug, Clone)]
pub struct BoshCli {
    binary: PathBuf,
    manifest: PathBuf,
    client: String,
    deployment: Option<String>,
}

impl BoshCli {
    /// `manifest` is the director manifest `delete-env` tears down.
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            manifest: manifest.into(),
            client: DEFAULT_CLIENT.to_string(),
            deployment: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Deployment targeted by authenticated commands (`--deployment`)
    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = Some(deployment.into());
        self
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Arguments for an authenticated command, credentials excluded
    pub fn command_args(&self, command: &AuthenticatedCommand<'_>) -> Vec<String> {
        let mut args = vec!["--non-interactive".to_string()];
        if let Some(deployment) = &self.deployment {
            args.push("--deployment".to_string());
            args.push(deployment.clone());
        }
        args.push(command.command.to_string());
        if command.force {
            args.push("--force".to_string());
        }
        args.extend(command.flags.iter().cloned());
        args
    }

    /// Environment carrying the director address and credentials
    pub fn command_env<'a>(&'a self, command: &AuthenticatedCommand<'a>) -> Vec<(&'static str, &'a str)> {
        vec![
            ("BOSH_ENVIRONMENT", command.address),
            ("BOSH_CLIENT", self.client.as_str()),
            ("BOSH_CLIENT_SECRET", command.password),
            ("BOSH_CA_CERT", command.ca_cert),
        ]
    }

    /// Arguments for `delete-env`
    pub fn delete_env_args(&self, state: &Path, vars_file: &Path) -> Vec<String> {
        vec![
            "--non-interactive".to_string(),
            "delete-env".to_string(),
            self.manifest.display().to_string(),
            "--state".to_string(),
            state.display().to_string(),
            "--vars-file".to_string(),
            vars_file.display().to_string(),
        ]
    }

    async fn run(&self, mut cmd: Command, args: &[String]) -> Result<Vec<u8>> {
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.binary.display(), args.join(" "));

        let output = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                BoshError::BoshNotFound(self.binary.display().to_string())
            }
            _ => BoshError::IoError(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BoshError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(output.stdout)
    }

    async fn delete_env(
        &self,
        store: &mut TemporaryStore,
        environment: &EnvironmentDescriptor,
        credentials: &DirectorCredentials,
        extra: Option<&serde_json::Value>,
    ) -> Result<()> {
        let workdir = tempfile::tempdir()?;
        let state_path = workdir.path().join(STATE_KEY);
        let vars_path = workdir.path().join(VARS_FILE);

        if let Some(state) = store.get(STATE_KEY) {
            tokio::fs::write(&state_path, state).await?;
        }
        tokio::fs::write(&vars_path, vars::render(environment, credentials, extra)?).await?;

        let args = self.delete_env_args(&state_path, &vars_path);
        let result = self.run(Command::new(&self.binary), &args).await;

        // bosh rewrites the state as it goes; keep whatever it left behind
        match tokio::fs::read(&state_path).await {
            Ok(state) => store.set(STATE_KEY, state),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => store.set(STATE_KEY, Vec::new()),
            Err(e) => {
                tracing::warn!("Failed to read back director state: {}", e);
            }
        }

        result.map(|_| ())
    }
}

#[async_trait]
impl Deployer for BoshCli {
    async fn run_authenticated_command(
        &self,
        command: &AuthenticatedCommand<'_>,
        output: &mut (dyn Write + Send),
    ) -> undeploy_core::Result<()> {
        let mut cmd = Command::new(&self.binary);
        cmd.envs(self.command_env(command));

        let stdout = self.run(cmd, &self.command_args(command)).await?;
        output.write_all(&stdout)?;
        Ok(())
    }

    async fn delete_environment(
        &self,
        store: &mut TemporaryStore,
        environment: &EnvironmentDescriptor,
        credentials: &DirectorCredentials,
        extra: Option<&serde_json::Value>,
    ) -> undeploy_core::Result<()> {
        tracing::info!("Deleting director environment {}", environment.director_name);
        self.delete_env(store, environment, credentials, extra)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn command(force: bool) -> AuthenticatedCommand<'static> {
        AuthenticatedCommand {
            command: "delete-deployment",
            address: "34.1.2.3",
            password: "secret",
            ca_cert: "CA",
            force,
            flags: vec![],
        }
    }

    fn environment() -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            director_name: "bosh".to_string(),
            external_ip: "34.1.2.3".to_string(),
            credentials_ref: String::new(),
            internal_cidr: "10.0.0.0/24".to_string(),
            internal_gateway: "10.0.0.1".to_string(),
            internal_ip: "10.0.0.6".to_string(),
            network: "ci-network".to_string(),
            private_subnetwork: String::new(),
            project_id: String::new(),
            public_key: "ssh-rsa AAAA".to_string(),
            public_subnetwork: String::new(),
            spot: false,
            zone: "eu-west-1a".to_string(),
        }
    }

    #[test]
    fn test_command_args() {
        let bosh = BoshCli::new("director.yml").with_deployment("concourse");
        assert_eq!(
            bosh.command_args(&command(true)),
            vec![
                "--non-interactive",
                "--deployment",
                "concourse",
                "delete-deployment",
                "--force"
            ]
        );

        let mut cmd = command(false);
        cmd.flags = vec!["--skip-drain".to_string()];
        assert_eq!(
            BoshCli::new("director.yml").command_args(&cmd),
            vec!["--non-interactive", "delete-deployment", "--skip-drain"]
        );
    }

    #[test]
    fn test_credentials_stay_out_of_args() {
        let bosh = BoshCli::new("director.yml");
        let cmd = command(true);
        assert!(!bosh.command_args(&cmd).iter().any(|a| a.contains("secret")));

        let env = bosh.command_env(&cmd);
        assert!(env.contains(&("BOSH_CLIENT_SECRET", "secret")));
        assert!(env.contains(&("BOSH_CLIENT", "admin")));
        assert!(env.contains(&("BOSH_ENVIRONMENT", "34.1.2.3")));
    }

    #[test]
    fn test_delete_env_args() {
        let bosh = BoshCli::new("/deploy/director.yml");
        let args = bosh.delete_env_args(Path::new("/tmp/x/state.json"), Path::new("/tmp/x/vars.yml"));
        assert_eq!(
            args,
            vec![
                "--non-interactive",
                "delete-env",
                "/deploy/director.yml",
                "--state",
                "/tmp/x/state.json",
                "--vars-file",
                "/tmp/x/vars.yml"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let bosh = BoshCli::new("director.yml").with_binary("/nonexistent/bosh");
        let mut out = Vec::new();
        let err = bosh
            .run_authenticated_command(&command(true), &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    fn fake_bosh(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("bosh");
        std::fs::write(&path, format!("#!/bin/sh\n{}", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_stdout_reaches_sink() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_bosh(dir.path(), "echo \"deleting on $BOSH_ENVIRONMENT\"\n");
        let bosh = BoshCli::new("director.yml").with_binary(binary);

        let mut out = Vec::new();
        bosh.run_authenticated_command(&command(true), &mut out)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "deleting on 34.1.2.3\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_delete_env_writes_back_state_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_bosh(
            dir.path(),
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "--state" ]; then printf '{"half":true}' > "$2"; fi
  shift
done
echo "vm still attached" >&2
exit 1
"#,
        );
        let bosh = BoshCli::new("director.yml").with_binary(binary);
        let mut store = TemporaryStore::with_state(b"{\"full\":true}".to_vec());

        let err = bosh
            .delete_environment(&mut store, &environment(), &DirectorCredentials::default(), None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("vm still attached"));
        assert_eq!(store.get(STATE_KEY), Some(&b"{\"half\":true}"[..]));
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_delete_env_clears_removed_state() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_bosh(
            dir.path(),
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "--state" ]; then rm -f "$2"; fi
  shift
done
"#,
        );
        let bosh = BoshCli::new("director.yml").with_binary(binary);
        let mut store = TemporaryStore::with_state(b"{\"full\":true}".to_vec());

        bosh.delete_environment(&mut store, &environment(), &DirectorCredentials::default(), None)
            .await
            .unwrap();

        assert_eq!(store.into_state(), Vec::<u8>::new());
    }
}
