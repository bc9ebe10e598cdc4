use crate::context::Context;
use colored::{ColoredString, Colorize};
use undeploy_core::{StateFile, TeardownError, TeardownStep};

pub async fn handle(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    let config = &ctx.config;
    let state_file = StateFile::new(&config.state);

    println!(
        "{}  {} on {} ({})",
        "Destroy:".bold(),
        config.director.director_name.red().bold(),
        config.platform.yellow(),
        config.region
    );
    println!("  {} {}", "Outputs:".dimmed(), config.outputs.display());
    println!("  {} {}", "State:".dimmed(), state_file.path().display());
    println!("  {} {}", "Manifest:".dimmed(), config.deployer.manifest.display());
    println!();

    if !yes {
        println!("  {}", "→ re-run with --yes to tear the director down".yellow());
        return Ok(());
    }

    let orchestrator = ctx.orchestrator()?;
    let state = state_file.load().await?;

    match orchestrator.decommission(state).await {
        Ok(residual) => {
            state_file.save(&residual).await?;
            println!();
            println!("{}", "✓ Director decommissioned".green().bold());
            Ok(())
        }
        Err(failure) => {
            // keep whatever the deployer left, even on failure
            if let Err(e) = state_file.save(&failure.state).await {
                tracing::warn!("Failed to save director state: {}", e);
            }

            println!();
            println!("{}", failure_hint(&failure.error));
            Err(failure.error.into())
        }
    }
}

/// What the operator has to do after a failed decommission
fn failure_hint(error: &TeardownError) -> ColoredString {
    match error.failed_step() {
        None => "Nothing was removed; fix the problem and run destroy again.".yellow(),
        Some(TeardownStep::RemoveDeployment) => {
            "Removing the deployment failed and may have stopped part way. Check the director before running destroy again."
                .red()
        }
        Some(step) => format!(
            "The deployment is already gone but teardown stopped at {}. Clean up the remaining resources by hand.",
            step
        )
        .red(),
    }
}
