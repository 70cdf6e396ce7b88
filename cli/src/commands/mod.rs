//! Command implementations

pub mod block;
pub mod crash;
pub mod discover;
pub mod monit;
pub mod network;
pub mod routes;
pub mod services;
pub mod undo;
pub mod version;

use clap::Args;

/// Identifies the application a command acts on.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Organization the application runs in
    #[arg(long, short = 'o', env = "FAULTLINE_ORG")]
    pub org: String,

    /// Space the application runs in
    #[arg(long, short = 's', env = "FAULTLINE_SPACE")]
    pub space: String,

    /// Application name
    #[arg(long, short = 'a')]
    pub app: String,
}
