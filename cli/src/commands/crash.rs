//! `faultline crash` — kill random application containers.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::TargetArgs;

/// Arguments for the crash command.
#[derive(Args, Debug)]
pub struct CrashArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of instances to crash
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,
}

/// Run the crash command.
///
/// # Errors
///
/// Returns the discovery error or the first crash failure.
pub async fn run(app: &AppContext, args: &CrashArgs) -> Result<()> {
    let target = app.target(&args.target).await?;
    let count = args.count.min(target.app().len());
    if !app.confirm(&format!("Crash {count} instance(s) of {}?", target.app()))? {
        app.output.info("Aborted.");
        return Ok(());
    }
    let crashed = target.crash_random_instance(count).await?;
    app.output.success(&format!("Crashed {crashed} instance(s)"));
    Ok(())
}
