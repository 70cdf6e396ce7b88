//! `faultline block` / `faultline unblock` — drop traffic to an application.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::TargetArgs;
use crate::domain::{Direction, PortSelection};

/// Arguments for the block command.
#[derive(Args, Debug)]
pub struct BlockArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Traffic direction to block: ingress, egress or both
    #[arg(long, short = 'd', default_value = "ingress")]
    pub direction: Direction,

    /// Ports to block: `env` (the app's ports), `all`, or a comma list.
    /// A comma list must be passed to `unblock` as well.
    #[arg(long, short = 'p', default_value = "env")]
    pub ports: PortSelection,
}

/// Arguments for the unblock command.
#[derive(Args, Debug)]
pub struct UnblockArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Custom ports that were passed to `block`, as a comma list
    #[arg(long, short = 'p')]
    pub ports: Option<PortSelection>,
}

/// Run the block command.
///
/// # Errors
///
/// Returns the discovery error or the first failing instance's error, after
/// every instance has been unblocked again.
pub async fn run_block(app: &AppContext, args: &BlockArgs) -> Result<()> {
    let mut target = app.target(&args.target).await?;
    target.block(args.direction, &args.ports).await?;
    app.output.success(&format!(
        "Blocked {} traffic of {} ({} instances)",
        args.direction,
        target.app(),
        target.app().len()
    ));
    Ok(())
}

/// Run the unblock command.
///
/// # Errors
///
/// Returns the discovery error.
pub async fn run_unblock(app: &AppContext, args: &UnblockArgs) -> Result<()> {
    let mut target = app.target(&args.target).await?;
    let ports = args.ports.as_ref().and_then(PortSelection::rollback_ports);
    target.unblock(ports).await;
    app.output.success(&format!("Unblocked {}", target.app()));
    Ok(())
}
