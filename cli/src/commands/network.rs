//! `faultline manipulate` / `shape` / `unmanipulate` — degrade the network of
//! an application with `tc`.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::TargetArgs;
use crate::domain::NetemOptions;

/// Parses a percentage in `0..=100`. Rejects `NaN` and infinities.
fn parse_percent(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("'{s}' is not a percentage between 0 and 100"));
    }
    Ok(value)
}

/// Arguments for the manipulate command.
#[derive(Args, Debug)]
pub struct ManipulateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Added latency in milliseconds
    #[arg(long, value_name = "MS")]
    pub latency: Option<u32>,

    /// Standard deviation of the latency in milliseconds
    #[arg(long, value_name = "MS", requires = "latency")]
    pub latency_sd: Option<u32>,

    /// Packet loss in percent
    #[arg(long, value_name = "PCT", value_parser = parse_percent)]
    pub loss: Option<f64>,

    /// Correlation of successive losses in percent
    #[arg(long, value_name = "PCT", requires = "loss", value_parser = parse_percent)]
    pub loss_corr: Option<f64>,

    /// Packet duplication in percent
    #[arg(long, value_name = "PCT", value_parser = parse_percent)]
    pub duplication: Option<f64>,

    /// Packet corruption in percent
    #[arg(long, value_name = "PCT", value_parser = parse_percent)]
    pub corruption: Option<f64>,
}

impl ManipulateArgs {
    #[must_use]
    pub fn netem(&self) -> NetemOptions {
        NetemOptions {
            latency_ms: self.latency,
            latency_sd_ms: self.latency_sd,
            loss_pct: self.loss,
            loss_corr_pct: self.loss_corr,
            duplication_pct: self.duplication,
            corruption_pct: self.corruption,
        }
    }
}

/// Arguments for the shape command.
#[derive(Args, Debug)]
pub struct ShapeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Download limit in kbit/s
    #[arg(long, value_name = "KBPS", value_parser = clap::value_parser!(u32).range(1..))]
    pub download: Option<u32>,

    /// Upload limit in kbit/s
    #[arg(long, value_name = "KBPS", value_parser = clap::value_parser!(u32).range(1..))]
    pub upload: Option<u32>,
}

/// Run the manipulate command.
///
/// # Errors
///
/// Returns the discovery error or the first failing instance's error, after
/// every instance has been reset.
pub async fn run_manipulate(app: &AppContext, args: &ManipulateArgs) -> Result<()> {
    let opts = args.netem();
    if opts.is_empty() {
        app.output.warn("No manipulation requested; nothing to do.");
        return Ok(());
    }
    let mut target = app.target(&args.target).await?;
    target.manipulate_network(&opts).await?;
    app.output
        .success(&format!("Manipulated network of {}", target.app()));
    Ok(())
}

/// Run the shape command.
///
/// # Errors
///
/// Same as [`run_manipulate`].
pub async fn run_shape(app: &AppContext, args: &ShapeArgs) -> Result<()> {
    if args.download.is_none() && args.upload.is_none() {
        app.output.warn("No bandwidth limit requested; nothing to do.");
        return Ok(());
    }
    let mut target = app.target(&args.target).await?;
    target.shape_network(args.download, args.upload).await?;
    app.output.success(&format!("Shaped network of {}", target.app()));
    Ok(())
}

/// Run the unmanipulate command.
///
/// # Errors
///
/// Returns the discovery error.
pub async fn run_unmanipulate(app: &AppContext, args: &TargetArgs) -> Result<()> {
    let mut target = app.target(args).await?;
    target.unmanipulate_network().await;
    app.output.success(&format!("Reset network of {}", target.app()));
    Ok(())
}
