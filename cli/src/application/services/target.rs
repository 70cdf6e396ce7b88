//! Application service — fault injection and rollback across a discovered app.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Instances are visited strictly in discovery order, one host at a time.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::application::ports::{CommandOutput, HostResolver, PlatformExecutor, ProgressReporter};
use crate::application::services::discovery::{self, AppRef};
use crate::application::services::instance::InstanceHandle;
use crate::domain::parse::parse_pid_files;
use crate::domain::remote::{
    find_pid_files_command, kill_monit_commands, start_monit_command, validate_process_name,
};
use crate::domain::{
    App, ChaosConfig, CustomServiceConfig, DiscoveryError, Direction, FaultError, NetemOptions,
    NetworkMode, PortSelection,
};

/// Convert a batch result into an error carrying its exit code.
fn check(operation: &'static str, host: &str, out: &CommandOutput) -> Result<(), FaultError> {
    if out.success() {
        return Ok(());
    }
    error!(operation, host, code = out.code, stderr = %out.stderr.trim(), "remote batch failed");
    Err(FaultError::Remote {
        operation,
        host: host.to_string(),
        code: out.code,
    })
}

/// Turn a dispatched batch into `Ok(())` or the error it represents.
fn settle(operation: &'static str, host: &str, result: Result<CommandOutput>) -> Result<()> {
    check(operation, host, &result?)?;
    Ok(())
}

/// Log a rollback result. Non-zero codes are expected when a rule or qdisc
/// is already gone.
fn tolerate(operation: &'static str, host: &str, result: Result<CommandOutput>) {
    match result {
        Ok(out) if !out.success() => {
            debug!(operation, host, code = out.code, "rollback command reported failure");
        }
        Ok(_) => {}
        Err(e) => warn!(operation, host, error = %e, "rollback batch could not be dispatched"),
    }
}

/// A discovered application together with the collaborators needed to alter
/// it.
///
/// The current topology is held behind an [`Arc`]; [`TargetApp::snapshot`]
/// hands out the value as of that moment and [`TargetApp::rediscover`]
/// replaces it wholesale.
pub struct TargetApp<'a, E, R> {
    exec: &'a E,
    resolver: &'a R,
    cfg: &'a ChaosConfig,
    app: Arc<App>,
    mode: NetworkMode,
}

impl<'a, E: PlatformExecutor, R: HostResolver> TargetApp<'a, E, R> {
    /// Wrap an already discovered application.
    #[must_use]
    pub fn new(exec: &'a E, resolver: &'a R, cfg: &'a ChaosConfig, app: App) -> Self {
        Self {
            exec,
            resolver,
            cfg,
            app: Arc::new(app),
            mode: NetworkMode::None,
        }
    }

    /// Discover `target` and wrap the result.
    ///
    /// # Errors
    ///
    /// Returns the discovery error; see [`discovery::discover`].
    pub async fn discover(
        exec: &'a E,
        resolver: &'a R,
        cfg: &'a ChaosConfig,
        reporter: &impl ProgressReporter,
        target: AppRef<'_>,
    ) -> Result<Self> {
        let app = discovery::discover(exec, resolver, cfg, reporter, target).await?;
        Ok(Self::new(exec, resolver, cfg, app))
    }

    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The topology as of now. Later rediscovery does not affect it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<App> {
        Arc::clone(&self.app)
    }

    #[must_use]
    pub fn mode(&self) -> NetworkMode {
        self.mode
    }

    fn handles(&self) -> impl Iterator<Item = InstanceHandle<'_, E>> {
        self.app
            .instances
            .iter()
            .map(|inst| InstanceHandle::new(self.exec, inst))
    }

    // ── Traffic blocking ──────────────────────────────────────────────────

    /// Block traffic to and/or from every instance.
    ///
    /// On the first failing instance every instance is unblocked again and
    /// the failure is returned.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::ModeConflict` if shaping or manipulation is
    /// active, `FaultError::Remote` with the failing code, or a dispatch
    /// error.
    pub async fn block(&mut self, direction: Direction, ports: &PortSelection) -> Result<()> {
        self.mode.check(NetworkMode::Blocked)?;
        let mut failure = None;
        for handle in self.handles() {
            let host = &handle.instance().host_id;
            let result = handle.block(direction, ports).await;
            if let Err(e) = settle("block", host, result) {
                failure = Some(e);
                break;
            }
        }
        if let Some(e) = failure {
            self.unblock(ports.rollback_ports()).await;
            return Err(e);
        }
        self.mode = NetworkMode::Blocked;
        info!(app = %self.app, %direction, "blocked application traffic");
        Ok(())
    }

    /// Remove block rules from every instance. Safe to call when nothing is
    /// blocked; failures are logged and otherwise ignored.
    pub async fn unblock(&mut self, ports: Option<&BTreeSet<u16>>) {
        for handle in self.handles() {
            let result = handle.unblock(ports).await;
            tolerate("unblock", &handle.instance().host_id, result);
        }
        if self.mode == NetworkMode::Blocked {
            self.mode = NetworkMode::None;
        }
        info!(app = %self.app, "unblocked application traffic");
    }

    // ── Service isolation ─────────────────────────────────────────────────

    /// Isolate every instance from its bound services.
    ///
    /// Services whose type is whitelisted are never targeted. `filter`
    /// restricts the services by name. Stops at the first failing instance
    /// and unblocks services everywhere before returning the failure.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::Remote` with the failing code, or a dispatch
    /// error.
    pub async fn block_services(
        &self,
        direction: Direction,
        filter: Option<&[String]>,
    ) -> Result<()> {
        let mut failure = None;
        for handle in self.handles() {
            let host = &handle.instance().host_id;
            let result = handle
                .block_services(&self.app.services, direction, &self.cfg.service_whitelist, filter)
                .await;
            if let Err(e) = settle("block_services", host, result) {
                failure = Some(e);
                break;
            }
        }
        if let Some(e) = failure {
            self.unblock_services(filter).await;
            return Err(e);
        }
        info!(app = %self.app, %direction, "blocked application services");
        Ok(())
    }

    /// Remove service isolation rules from every instance. Failures are
    /// logged and otherwise ignored.
    pub async fn unblock_services(&self, filter: Option<&[String]>) {
        for handle in self.handles() {
            let result = handle
                .unblock_services(&self.app.services, &self.cfg.service_whitelist, filter)
                .await;
            tolerate("unblock_services", &handle.instance().host_id, result);
        }
        info!(app = %self.app, "unblocked application services");
    }

    // ── Manipulation and shaping ──────────────────────────────────────────

    /// Apply netem manipulation on every instance. Empty options are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::ModeConflict`, `FaultError::MissingInterface`,
    /// `FaultError::Remote` with the failing code, or a dispatch error. All
    /// instances are reset before a failure is returned.
    pub async fn manipulate_network(&mut self, opts: &NetemOptions) -> Result<()> {
        if opts.is_empty() {
            return Ok(());
        }
        self.mode.check(NetworkMode::Manipulated)?;
        let mut failure = None;
        for handle in self.handles() {
            let host = &handle.instance().host_id;
            let result = handle.manipulate_network(opts).await;
            if let Err(e) = settle("manipulate_network", host, result) {
                failure = Some(e);
                break;
            }
        }
        if let Some(e) = failure {
            self.unmanipulate_network().await;
            return Err(e);
        }
        self.mode = NetworkMode::Manipulated;
        Ok(())
    }

    /// Limit bandwidth on every instance, in kbit/s. No limits is a no-op.
    ///
    /// # Errors
    ///
    /// Same as [`Self::manipulate_network`].
    pub async fn shape_network(
        &mut self,
        download_kbps: Option<u32>,
        upload_kbps: Option<u32>,
    ) -> Result<()> {
        if download_kbps.is_none() && upload_kbps.is_none() {
            return Ok(());
        }
        self.mode.check(NetworkMode::Shaped)?;
        let mut failure = None;
        for handle in self.handles() {
            let host = &handle.instance().host_id;
            let result = handle.shape_network(download_kbps, upload_kbps).await;
            if let Err(e) = settle("shape_network", host, result) {
                failure = Some(e);
                break;
            }
        }
        if let Some(e) = failure {
            self.unmanipulate_network().await;
            return Err(e);
        }
        self.mode = NetworkMode::Shaped;
        Ok(())
    }

    /// Remove manipulation and shaping from every instance. Failures are
    /// logged and otherwise ignored.
    pub async fn unmanipulate_network(&mut self) {
        for handle in self.handles() {
            let result = handle.unmanipulate_network().await;
            tolerate("unmanipulate_network", &handle.instance().host_id, result);
        }
        if matches!(self.mode, NetworkMode::Shaped | NetworkMode::Manipulated) {
            self.mode = NetworkMode::None;
        }
        info!(app = %self.app, "reset application network");
    }

    // ── Process control ───────────────────────────────────────────────────

    /// Kill a monit-managed process on the host of the first instance.
    ///
    /// Only the first instance is handled. If killing fails the process is
    /// started again on every instance before the failure is returned.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid process name, `FaultError::NoPidFiles`
    /// when the process has no pid file, `FaultError::Remote` when a batch
    /// fails, or a dispatch error.
    pub async fn kill_monit_process(&self, process: &str) -> Result<()> {
        validate_process_name(process)?;
        let Some(handle) = self.handles().next() else {
            return Ok(());
        };
        let host = handle.instance().host_id.clone();

        let out = handle.run(&[find_pid_files_command(process)]).await?;
        let pid_files = parse_pid_files(&out.stdout);
        if pid_files.is_empty() {
            error!(process, host = %host, code = out.code, "no pid files found");
            return Err(FaultError::NoPidFiles {
                process: process.to_string(),
                host,
            }
            .into());
        }
        check("find pid files", &host, &out)?;
        debug!(process, host = %host, ?pid_files, "found pid files");

        let out = handle.run(&kill_monit_commands(process, &pid_files)).await?;
        if let Err(e) = check("kill_monit_process", &host, &out) {
            if let Err(restart) = self.start_monit_process(process).await {
                warn!(process, error = %restart, "failed to restart monit process");
            }
            return Err(e.into());
        }
        info!(process, host = %host, "killed monit process");
        Ok(())
    }

    /// Start a monit-managed process on every instance's host.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid process name, or the first failure
    /// after every host was attempted.
    pub async fn start_monit_process(&self, process: &str) -> Result<()> {
        validate_process_name(process)?;
        let mut first_failure: Option<anyhow::Error> = None;
        for handle in self.handles() {
            let host = &handle.instance().host_id;
            let result = handle.run(&[start_monit_command(process)]).await;
            if let Err(e) = settle("start_monit_process", host, result) {
                first_failure.get_or_insert(e);
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Crash up to `count` randomly chosen instances. Returns how many were
    /// crashed.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::MissingContainerId`, `FaultError::Remote`, or a
    /// dispatch error for the first instance that could not be crashed.
    pub async fn crash_random_instance(&self, count: usize) -> Result<usize> {
        let chosen = {
            let mut rng = rand::rng();
            self.choose_instances(&mut rng, count)
        };
        self.crash_instances(&chosen).await
    }

    /// Crash up to `count` instances chosen with `rng`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::crash_random_instance`].
    pub async fn crash_random_instance_with<G: Rng + ?Sized>(
        &self,
        rng: &mut G,
        count: usize,
    ) -> Result<usize> {
        let chosen = self.choose_instances(rng, count);
        self.crash_instances(&chosen).await
    }

    fn choose_instances<G: Rng + ?Sized>(&self, rng: &mut G, count: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.app.len()).collect();
        indices.shuffle(rng);
        indices.truncate(count);
        indices
    }

    async fn crash_instances(&self, indices: &[usize]) -> Result<usize> {
        for &i in indices {
            let handle = InstanceHandle::new(self.exec, &self.app.instances[i]);
            let out = handle.crash().await?;
            check("crash", &handle.instance().host_id, &out)?;
        }
        Ok(indices.len())
    }

    // ── Topology ──────────────────────────────────────────────────────────

    /// Public routes of the application as `host.domain[/path]`.
    ///
    /// # Errors
    ///
    /// Returns the fatal `DiscoveryError::RouteQuery` on failure.
    pub async fn find_routes(&self) -> Result<Vec<String>> {
        let guid = self
            .app
            .guid
            .as_deref()
            .ok_or_else(|| DiscoveryError::GuidNotFound {
                app: self.app.name.clone(),
            })?;
        discovery::find_routes(self.exec, self.cfg, guid).await
    }

    /// Add a service that is not bound through the platform.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::Resolve` if the host does not resolve.
    pub async fn add_custom_service(&mut self, custom: &CustomServiceConfig) -> Result<()> {
        let service = discovery::custom_service(self.resolver, custom).await?;
        let mut app = App::clone(&self.app);
        app.services.push(service);
        self.app = Arc::new(app);
        Ok(())
    }

    // ── Rollback ──────────────────────────────────────────────────────────

    /// Undo every fault this tool can apply, whether or not it was applied.
    pub async fn undo_all(&mut self) {
        self.unblock(None).await;
        self.unblock_services(None).await;
        self.unmanipulate_network().await;
        self.mode = NetworkMode::None;
    }

    /// Undo all faults, discover the application again, and replace the held
    /// topology. Snapshots taken earlier keep the old topology.
    ///
    /// # Errors
    ///
    /// Returns the discovery error; the previous topology is kept.
    pub async fn rediscover(&mut self, reporter: &impl ProgressReporter) -> Result<()> {
        self.undo_all().await;
        let current = Arc::clone(&self.app);
        let target = AppRef {
            org: &current.org,
            space: &current.space,
            name: &current.name,
        };
        let fresh = discovery::discover(self.exec, self.resolver, self.cfg, reporter, target).await?;
        self.app = Arc::new(fresh);
        Ok(())
    }
}
