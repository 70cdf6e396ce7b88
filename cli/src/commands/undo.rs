//! `faultline undo` — remove every fault from an application.

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::TargetArgs;

/// Run the undo command.
///
/// # Errors
///
/// Returns the discovery error.
pub async fn run(app: &AppContext, args: &TargetArgs) -> Result<()> {
    let mut target = app.target(args).await?;
    target.undo_all().await;
    app.output
        .success(&format!("Removed all faults from {}", target.app()));
    Ok(())
}
