use crate::context::Context;
use colored::Colorize;
use undeploy_core::whitelist::REQUIRED_PORTS;

pub async fn handle(ctx: &Context, ip: &str, group: &str) -> anyhow::Result<()> {
    let provider = ctx.provider().await?;
    let ports: Vec<String> = REQUIRED_PORTS.iter().map(u16::to_string).collect();

    if provider.is_whitelisted(ip, group).await? {
        println!(
            "{} {} admits {}/32 on {}",
            "✓".green(),
            group.cyan(),
            ip,
            ports.join(", ")
        );
        Ok(())
    } else {
        anyhow::bail!(
            "{} does not admit {}/32 on every port of {}",
            group,
            ip,
            ports.join(", ")
        )
    }
}
