//! Infrastructure implementation of the `PlatformExecutor` port.
//!
//! Local calls go straight to the `CommandRunner`. Host batches are piped as
//! a shell script into `bosh ssh <host_id>` against the configured director
//! and deployment.

use anyhow::Result;
use tracing::debug;

use crate::application::ports::{CommandOutput, CommandRunner, PlatformExecutor};
use crate::domain::config::BoshConfig;
use crate::domain::remote::batch_script;
use crate::infra::command_runner::DEFAULT_CMD_TIMEOUT;

/// `PlatformExecutor` that reaches platform hosts through the BOSH CLI.
pub struct BoshExecutor<R> {
    runner: R,
    bosh: BoshConfig,
}

impl<R: CommandRunner> BoshExecutor<R> {
    /// `runner`'s own timeout applies to host batches; local calls use
    /// [`DEFAULT_CMD_TIMEOUT`].
    #[must_use]
    pub fn new(runner: R, bosh: BoshConfig) -> Self {
        Self { runner, bosh }
    }
}

impl<R: CommandRunner> PlatformExecutor for BoshExecutor<R> {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!(program, ?args, "running local command");
        let out = self
            .runner
            .run_with_timeout(program, args, DEFAULT_CMD_TIMEOUT)
            .await?;
        let out = CommandOutput::from(out);
        debug!(program, code = out.code, stdout = %out.stdout, "local command finished");
        Ok(out)
    }

    async fn run_on_host(&self, host_id: &str, cmds: &[String]) -> Result<CommandOutput> {
        let args = [
            "-e",
            self.bosh.env.as_str(),
            "-d",
            self.bosh.deployment.as_str(),
            "ssh",
            host_id,
        ];
        let script = batch_script(cmds);
        debug!(host = host_id, %script, "running batch over bosh ssh");
        let out = self
            .runner
            .run_with_stdin(&self.bosh.cmd, &args, script.as_bytes())
            .await?;
        let out = CommandOutput::from(out);
        debug!(host = host_id, code = out.code, stdout = %out.stdout, "batch finished");
        Ok(out)
    }
}
