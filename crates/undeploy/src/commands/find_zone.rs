use crate::context::Context;
use colored::Colorize;

pub async fn handle(ctx: &Context, subdomain: &str) -> anyhow::Result<()> {
    let provider = ctx.provider().await?;
    let zone = provider.resolve_owning_zone(subdomain).await?;

    println!("{} {}", "Zone:".bold(), zone.name.green());
    println!("{} {}", "ID:".bold(), zone.id);
    Ok(())
}
