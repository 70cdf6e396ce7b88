//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands::{self, TargetArgs};
use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;

/// Discover Cloud Foundry applications and inject network faults into them
#[derive(Parser)]
#[command(
    name = "faultline",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Path to the configuration file [default: ~/.faultline/config.yaml]
    #[arg(long, short = 'c', global = true, env = "FAULTLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log platform commands and their output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Do not ask for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the instances and services of an application
    Discover(TargetArgs),

    /// Drop traffic to and/or from every instance
    Block(commands::block::BlockArgs),

    /// Remove traffic blocks
    Unblock(commands::block::UnblockArgs),

    /// Cut instances off from their bound services
    BlockServices(commands::services::BlockServicesArgs),

    /// Reconnect instances to their bound services
    UnblockServices(commands::services::UnblockServicesArgs),

    /// Add latency, loss, duplication or corruption
    Manipulate(commands::network::ManipulateArgs),

    /// Limit bandwidth
    Shape(commands::network::ShapeArgs),

    /// Remove manipulation and shaping
    Unmanipulate(TargetArgs),

    /// Kill a monit job on the host of the first instance
    KillMonit(commands::monit::MonitArgs),

    /// Start a monit job on every instance's host
    StartMonit(commands::monit::MonitArgs),

    /// Crash random instances
    Crash(commands::crash::CrashArgs),

    /// List the public routes of an application
    Routes(TargetArgs),

    /// Remove every fault this tool can inject
    Undo(TargetArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command
    /// fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            config,
            json,
            quiet,
            no_color,
            yes,
            command,
            ..
        } = self;

        if matches!(command, Command::Version) {
            return commands::version::run(&OutputContext::new(no_color, quiet), json);
        }

        let flags = AppFlags {
            no_color,
            quiet,
            json,
            yes,
        };
        let app = AppContext::new(&flags, &YamlConfigStore::new(config))?;

        match command {
            Command::Discover(args) => commands::discover::run(&app, &args).await,
            Command::Block(args) => commands::block::run_block(&app, &args).await,
            Command::Unblock(args) => commands::block::run_unblock(&app, &args).await,
            Command::BlockServices(args) => commands::services::run_block(&app, &args).await,
            Command::UnblockServices(args) => commands::services::run_unblock(&app, &args).await,
            Command::Manipulate(args) => commands::network::run_manipulate(&app, &args).await,
            Command::Shape(args) => commands::network::run_shape(&app, &args).await,
            Command::Unmanipulate(args) => commands::network::run_unmanipulate(&app, &args).await,
            Command::KillMonit(args) => commands::monit::run_kill(&app, &args).await,
            Command::StartMonit(args) => commands::monit::run_start(&app, &args).await,
            Command::Crash(args) => commands::crash::run(&app, &args).await,
            Command::Routes(args) => commands::routes::run(&app, &args).await,
            Command::Undo(args) => commands::undo::run(&app, &args).await,
            Command::Version => Ok(()),
        }
    }
}
