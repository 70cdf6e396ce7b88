//! `faultline routes` — list the public routes of an application.

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::TargetArgs;
use crate::output::json;

/// Run the routes command.
///
/// # Errors
///
/// Returns the discovery error or the fatal route query error.
pub async fn run(app: &AppContext, args: &TargetArgs) -> Result<()> {
    let target = app.target(args).await?;
    let routes = target.find_routes().await?;
    if app.is_json() {
        println!("{}", json::to_pretty(&routes)?);
    } else {
        app.renderer().render_routes(&routes);
    }
    Ok(())
}
