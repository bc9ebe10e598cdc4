use crate::context::Context;
use colored::Colorize;
use std::time::Duration;
use undeploy_core::{VolumeStatus, clean_network_with};

pub async fn handle(
    ctx: &Context,
    network: &str,
    sweep_attempts: u32,
    sweep_interval: u64,
) -> anyhow::Result<()> {
    let provider = ctx.provider().await?;
    let deleter = provider.volume_deleter();

    println!("{}", format!("Terminating instances in {}...", network).yellow());
    let dangling = clean_network_with(provider.as_ref(), network, deleter.as_ref())
        .await
        .map_err(|failure| {
            if !failure.dangling_volumes.is_empty() {
                eprintln!(
                    "{} volumes left behind: {}",
                    "⚠".yellow(),
                    failure.dangling_volumes.join(", ")
                );
            }
            failure.error
        })?;

    if dangling.is_empty() {
        println!("  {} nothing to clean up", "✓".green());
        return Ok(());
    }

    // volumes detach as their instances finish terminating
    let mut remaining = dangling.clone();
    for attempt in 1..=sweep_attempts {
        remaining = provider
            .list_volumes(&dangling)
            .await?
            .into_iter()
            .filter(|v| v.status != VolumeStatus::Deleted)
            .map(|v| v.id)
            .collect::<Vec<_>>();

        if remaining.is_empty() {
            println!("  {} {} volumes deleted", "✓".green(), dangling.len());
            return Ok(());
        }

        tracing::debug!(
            "Sweep {}/{}: {} volumes remaining",
            attempt,
            sweep_attempts,
            remaining.len()
        );
        provider.delete_volumes(&remaining, deleter.as_ref()).await?;
        tokio::time::sleep(Duration::from_secs(sweep_interval)).await;
    }

    anyhow::bail!(
        "volumes still present after {} passes: {}",
        sweep_attempts,
        remaining.join(", ")
    )
}
