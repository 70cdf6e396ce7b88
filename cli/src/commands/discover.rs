//! `faultline discover` — print the discovered topology.

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::TargetArgs;
use crate::output::json;

/// Run the discover command.
///
/// # Errors
///
/// Returns the discovery error.
pub async fn run(app: &AppContext, args: &TargetArgs) -> Result<()> {
    let target = app.target(args).await?;
    if app.is_json() {
        println!("{}", json::to_pretty(target.app())?);
    } else {
        app.renderer().render_app(target.app());
    }
    Ok(())
}
