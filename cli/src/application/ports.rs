//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::Output;

use anyhow::Result;

use crate::domain::ChaosConfig;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of a command run locally or on a platform host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `-1` when the process was terminated by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl From<Output> for CommandOutput {
    fn from(out: Output) -> Self {
        Self {
            code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Platform Ports ────────────────────────────────────────────────────────────

/// Executes platform CLI calls locally and command batches on platform hosts.
///
/// Only `Err` signals that a command could not be dispatched at all; a
/// command that ran and failed is reported through `CommandOutput::code`.
#[allow(async_fn_in_trait)]
pub trait PlatformExecutor {
    /// Run a program on the local machine.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
    /// Run `cmds` in order on the platform host `host_id` (e.g.
    /// `diego_cell/2f1a...`) as a single batch. Every command runs; the
    /// batch exits with the last non-zero status.
    async fn run_on_host(&self, host_id: &str, cmds: &[String]) -> Result<CommandOutput>;
}

/// Resolves host names to IP addresses.
#[allow(async_fn_in_trait)]
pub trait HostResolver {
    /// Resolve `host` to one IP address in textual form.
    async fn resolve(&self, host: &str) -> Result<String>;
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading of the chaos configuration.
pub trait ConfigStore {
    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or invalid.
    fn load(&self) -> Result<ChaosConfig>;
    /// Path of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if no path can be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
