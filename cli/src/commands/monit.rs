//! `faultline kill-monit` / `start-monit` — control monit jobs on the hosts of
//! an application.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::TargetArgs;

/// Arguments for the monit commands.
#[derive(Args, Debug)]
pub struct MonitArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Name of the monit job, e.g. `rep` or `garden`
    pub process: String,
}

/// Run the kill-monit command.
///
/// # Errors
///
/// Returns the discovery error or the kill failure.
pub async fn run_kill(app: &AppContext, args: &MonitArgs) -> Result<()> {
    let target = app.target(&args.target).await?;
    let prompt = format!(
        "Kill monit job '{}' on the host of {}? Start it again with `faultline start-monit`.",
        args.process,
        target.app()
    );
    if !app.confirm(&prompt)? {
        app.output.info("Aborted.");
        return Ok(());
    }
    target.kill_monit_process(&args.process).await?;
    app.output
        .success(&format!("Killed monit job '{}'", args.process));
    Ok(())
}

/// Run the start-monit command.
///
/// # Errors
///
/// Returns the discovery error or the first start failure.
pub async fn run_start(app: &AppContext, args: &MonitArgs) -> Result<()> {
    let target = app.target(&args.target).await?;
    target.start_monit_process(&args.process).await?;
    app.output.success(&format!(
        "Started monit job '{}' on {} hosts",
        args.process,
        target.app().len()
    ));
    Ok(())
}
