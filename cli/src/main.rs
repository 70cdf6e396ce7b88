//! Faultline - network fault injection for Cloud Foundry applications

use clap::Parser;
use tracing_subscriber::EnvFilter;

use faultline::cli::Cli;
use faultline::domain::DiscoveryError;
use faultline::output::json;

/// Exit status for errors that must stop the whole run.
const EXIT_FATAL: i32 = 2;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn is_fatal(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DiscoveryError>()
        .is_some_and(DiscoveryError::is_fatal)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let as_json = cli.json;

    if let Err(e) = cli.run().await {
        let fatal = is_fatal(&e);
        match json::format_error(&format!("{e:#}"), fatal) {
            Ok(obj) if as_json => eprintln!("{obj}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(if fatal { EXIT_FATAL } else { 1 });
    }
}
