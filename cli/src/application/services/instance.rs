//! Application service — fault primitives for a single application instance.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every primitive sends at most one batch to the instance's host and
//! returns the batch result; callers decide what a non-zero code means.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::application::ports::{CommandOutput, PlatformExecutor};
use crate::domain::firewall::{self, Direction, PortSelection};
use crate::domain::remote::crash_command;
use crate::domain::traffic::{self, NetemOptions};
use crate::domain::{AppInstance, FaultError, Service};

/// Insert commands isolating `container_ip` from every targetable service.
///
/// A service is targetable when its type is not in `whitelist` and it
/// matches `filter` (`None` or empty selects all services).
#[must_use]
pub fn service_block_batch<'a>(
    container_ip: &str,
    services: &[Service],
    direction: Direction,
    whitelist: impl IntoIterator<Item = &'a String> + Clone,
    filter: Option<&[String]>,
) -> Vec<String> {
    targetable(services, whitelist, filter)
        .flat_map(|s| &s.hosts)
        .flat_map(|ep| firewall::service_block_commands(container_ip, ep, direction))
        .collect()
}

/// Delete commands undoing [`service_block_batch`] in both directions.
#[must_use]
pub fn service_unblock_batch<'a>(
    container_ip: &str,
    services: &[Service],
    whitelist: impl IntoIterator<Item = &'a String> + Clone,
    filter: Option<&[String]>,
) -> Vec<String> {
    targetable(services, whitelist, filter)
        .flat_map(|s| &s.hosts)
        .flat_map(|ep| firewall::service_unblock_commands(container_ip, ep))
        .collect()
}

fn targetable<'s, 'a>(
    services: &'s [Service],
    whitelist: impl IntoIterator<Item = &'a String> + Clone,
    filter: Option<&'s [String]>,
) -> impl Iterator<Item = &'s Service> {
    services
        .iter()
        .filter(move |s| !s.is_whitelisted(whitelist.clone()) && s.matches_filter(filter))
}

/// A discovered instance bound to the executor that reaches its host.
pub struct InstanceHandle<'a, E> {
    exec: &'a E,
    instance: &'a AppInstance,
}

impl<'a, E: PlatformExecutor> InstanceHandle<'a, E> {
    #[must_use]
    pub fn new(exec: &'a E, instance: &'a AppInstance) -> Self {
        Self { exec, instance }
    }

    #[must_use]
    pub fn instance(&self) -> &AppInstance {
        self.instance
    }

    /// Run `cmds` on the instance's host as one batch. An empty batch is not
    /// sent and reports success.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be dispatched.
    pub async fn run(&self, cmds: &[String]) -> Result<CommandOutput> {
        if cmds.is_empty() {
            return Ok(CommandOutput::default());
        }
        debug!(host = %self.instance.host_id, commands = cmds.len(), "running batch");
        self.exec.run_on_host(&self.instance.host_id, cmds).await
    }

    /// Drop traffic to and/or from the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be dispatched.
    pub async fn block(&self, direction: Direction, ports: &PortSelection) -> Result<CommandOutput> {
        let cmds = firewall::instance_block_commands(
            &self.instance.container_ip,
            &self.instance.container_ports(),
            direction,
            ports,
        );
        if cmds.is_empty() {
            warn!(
                instance = %self.instance,
                "no unwhitelisted ports to block; instance traffic left untouched"
            );
            return Ok(CommandOutput::default());
        }
        info!(instance = %self.instance, %direction, "blocking instance");
        self.run(&cmds).await
    }

    /// Remove every block rule this instance may carry. `ports` must be the
    /// custom port set used when blocking, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be dispatched.
    pub async fn unblock(&self, ports: Option<&BTreeSet<u16>>) -> Result<CommandOutput> {
        let cmds = firewall::instance_unblock_commands(
            &self.instance.container_ip,
            &self.instance.container_ports(),
            ports,
        );
        self.run(&cmds).await
    }

    /// Isolate the instance from the given services.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be dispatched.
    pub async fn block_services<'w>(
        &self,
        services: &[Service],
        direction: Direction,
        whitelist: impl IntoIterator<Item = &'w String> + Clone,
        filter: Option<&[String]>,
    ) -> Result<CommandOutput> {
        let cmds = service_block_batch(
            &self.instance.container_ip,
            services,
            direction,
            whitelist,
            filter,
        );
        self.run(&cmds).await
    }

    /// Undo [`Self::block_services`].
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be dispatched.
    pub async fn unblock_services<'w>(
        &self,
        services: &[Service],
        whitelist: impl IntoIterator<Item = &'w String> + Clone,
        filter: Option<&[String]>,
    ) -> Result<CommandOutput> {
        let cmds =
            service_unblock_batch(&self.instance.container_ip, services, whitelist, filter);
        self.run(&cmds).await
    }

    fn interface(&self) -> Result<&str, FaultError> {
        self.instance
            .virtual_interface
            .as_deref()
            .ok_or_else(|| FaultError::MissingInterface {
                host: self.instance.host_id.clone(),
                container_ip: self.instance.container_ip.clone(),
            })
    }

    /// Add latency, loss, duplication or corruption on the instance's
    /// virtual interface.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::MissingInterface` if the interface is unknown, or
    /// an error if the batch cannot be dispatched.
    pub async fn manipulate_network(&self, opts: &NetemOptions) -> Result<CommandOutput> {
        if opts.is_empty() {
            return Ok(CommandOutput::default());
        }
        let iface = self.interface()?;
        let cmds: Vec<String> = traffic::netem_command(iface, opts).into_iter().collect();
        info!(instance = %self.instance, ?opts, "manipulating network");
        self.run(&cmds).await
    }

    /// Limit bandwidth on the instance's virtual interface, in kbit/s.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::MissingInterface` if the interface is unknown, or
    /// an error if the batch cannot be dispatched.
    pub async fn shape_network(
        &self,
        download_kbps: Option<u32>,
        upload_kbps: Option<u32>,
    ) -> Result<CommandOutput> {
        if download_kbps.is_none() && upload_kbps.is_none() {
            return Ok(CommandOutput::default());
        }
        let iface = self.interface()?;
        info!(
            instance = %self.instance,
            download_kbps, upload_kbps, "shaping network"
        );
        self.run(&traffic::shape_commands(iface, download_kbps, upload_kbps))
            .await
    }

    /// Remove any manipulation or shaping. Instances without a known
    /// interface are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be dispatched.
    pub async fn unmanipulate_network(&self) -> Result<CommandOutput> {
        match self.instance.virtual_interface.as_deref() {
            Some(iface) => self.run(&traffic::reset_commands(iface)).await,
            None => Ok(CommandOutput::default()),
        }
    }

    /// Hard-kill the instance's container.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::MissingContainerId` if the container id is
    /// unknown, or an error if the batch cannot be dispatched.
    pub async fn crash(&self) -> Result<CommandOutput> {
        let cid = self
            .instance
            .container_id
            .as_deref()
            .ok_or_else(|| FaultError::MissingContainerId {
                host: self.instance.host_id.clone(),
                container_ip: self.instance.container_ip.clone(),
            })?;
        info!(instance = %self.instance, "crashing instance");
        self.run(&[crash_command(cid)]).await
    }
}
