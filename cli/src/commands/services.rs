//! `faultline block-services` / `unblock-services` — isolate an application
//! from its bound services.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::TargetArgs;
use crate::domain::Direction;

/// Arguments for the block-services command.
#[derive(Args, Debug)]
pub struct BlockServicesArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Traffic direction to block: ingress, egress or both
    #[arg(long, short = 'd', default_value = "egress")]
    pub direction: Direction,

    /// Only block these services (by name); repeatable. Defaults to all.
    #[arg(long = "service", value_name = "NAME")]
    pub services: Vec<String>,
}

/// Arguments for the unblock-services command.
#[derive(Args, Debug)]
pub struct UnblockServicesArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Only unblock these services (by name); repeatable. Defaults to all.
    #[arg(long = "service", value_name = "NAME")]
    pub services: Vec<String>,
}

fn filter(services: &[String]) -> Option<&[String]> {
    (!services.is_empty()).then_some(services)
}

/// Run the block-services command.
///
/// # Errors
///
/// Returns the discovery error or the first failing instance's error, after
/// service isolation has been removed again.
pub async fn run_block(app: &AppContext, args: &BlockServicesArgs) -> Result<()> {
    let target = app.target(&args.target).await?;
    target
        .block_services(args.direction, filter(&args.services))
        .await?;
    app.output
        .success(&format!("Blocked {} service traffic of {}", args.direction, target.app()));
    Ok(())
}

/// Run the unblock-services command.
///
/// # Errors
///
/// Returns the discovery error.
pub async fn run_unblock(app: &AppContext, args: &UnblockServicesArgs) -> Result<()> {
    let target = app.target(&args.target).await?;
    target.unblock_services(filter(&args.services)).await;
    app.output
        .success(&format!("Unblocked services of {}", target.app()));
    Ok(())
}
