mod commands;
mod context;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "undeploy")]
#[command(about = "Decommission a BOSH director and the cloud resources around it", long_about = None)]
struct Cli {
    /// Config file (defaults to discovery: UNDEPLOY_CONFIG_PATH, ./undeploy.yml, ~/.config/undeploy)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove the deployment, then delete the director environment
    Destroy {
        /// Actually run; without this only the plan is shown
        #[arg(short, long)]
        yes: bool,
    },
    /// Terminate every instance in a network and delete the volumes left behind
    CleanNetwork {
        /// VPC ID or network name
        network: String,
        /// Volume deletion passes before giving up
        #[arg(long, default_value = "10")]
        sweep_attempts: u32,
        /// Seconds between volume deletion passes
        #[arg(long, default_value = "5")]
        sweep_interval: u64,
    },
    /// Check that a firewall / security group admits an IP on the director ports
    CheckWhitelist {
        /// IPv4 address
        ip: String,
        /// Security group ID or firewall name
        group: String,
    },
    /// Find the hosted zone owning a subdomain
    FindZone {
        subdomain: String,
    },
    /// Show version
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.clone();
    let load = || context::Context::load(config.as_deref());

    match cli.command {
        Commands::Destroy { yes } => commands::destroy::handle(&load()?, yes).await,
        Commands::CleanNetwork {
            network,
            sweep_attempts,
            sweep_interval,
        } => {
            commands::clean_network::handle(&load()?, &network, sweep_attempts, sweep_interval)
                .await
        }
        Commands::CheckWhitelist { ip, group } => {
            commands::check_whitelist::handle(&load()?, &ip, &group).await
        }
        Commands::FindZone { subdomain } => commands::find_zone::handle(&load()?, &subdomain).await,
        // needs no config
        Commands::Version => {
            println!("undeploy {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
