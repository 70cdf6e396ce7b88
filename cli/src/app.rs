//! Application context — unified state passed to every command handler.
//!
//! Built once in `Cli::run()` after the configuration is loaded. Commands
//! receive `&AppContext` and never construct executors or output contexts
//! themselves.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::application::services::discovery::AppRef;
use crate::application::services::target::TargetApp;
use crate::commands::TargetArgs;
use crate::domain::ChaosConfig;
use crate::infra::command_runner::{DEFAULT_REMOTE_TIMEOUT, TokioCommandRunner};
use crate::infra::executor::BoshExecutor;
use crate::infra::resolver::SystemResolver;
use crate::output::{HumanRenderer, OutputContext, TerminalReporter};

/// Production executor type.
pub type Executor = BoshExecutor<TokioCommandRunner>;

/// A discovered application wired to the production collaborators.
pub type Target<'a> = TargetApp<'a, Executor, SystemResolver>;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Skip interactive prompts (also set by `CI` / `FAULTLINE_YES`).
    pub yes: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration loaded at startup.
    pub config: ChaosConfig,
    /// Runs `cf` locally and command batches over `bosh ssh`.
    pub executor: Executor,
    /// Resolves service host names.
    pub resolver: SystemResolver,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid.
    pub fn new(flags: &AppFlags, store: &impl ConfigStore) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("FAULTLINE_YES").is_ok();
        let config = store.load()?;
        let executor = BoshExecutor::new(
            TokioCommandRunner::new(DEFAULT_REMOTE_TIMEOUT),
            config.bosh.clone(),
        );

        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode: if flags.json {
                OutputMode::Json
            } else {
                OutputMode::Human
            },
            config,
            executor,
            resolver: SystemResolver,
            non_interactive: flags.yes || ci_env,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// Discover the application named by `args`.
    ///
    /// # Errors
    ///
    /// Returns the discovery error.
    pub async fn target(&self, args: &TargetArgs) -> Result<Target<'_>> {
        let reporter = TerminalReporter::new(&self.output);
        TargetApp::discover(
            &self.executor,
            &self.resolver,
            &self.config,
            &reporter,
            AppRef {
                org: &args.org,
                space: &args.space,
                name: &args.app,
            },
        )
        .await
    }

    /// Ask the user to confirm a destructive action.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `FAULTLINE_YES`
    /// env), the action is confirmed without prompting. Interactively the
    /// prompt defaults to "no".
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.non_interactive {
            return Ok(true);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}
