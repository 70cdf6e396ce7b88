//! Domain types and validators for Faultline configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access. The
//! configuration is loaded once at process start and passed by reference
//! into every component that needs whitelists or command names.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::service::{PortSpec, Protocol};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.faultline/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChaosConfig {
    /// Cloud Foundry CLI settings.
    pub cf: CfConfig,
    /// BOSH CLI settings used to reach platform hosts.
    pub bosh: BoshConfig,
    /// `cfdot` settings used to enumerate running instances.
    pub cfdot: CfdotConfig,
    /// Service types that must never be blocked.
    pub service_whitelist: BTreeSet<String>,
    /// Host ports excluded from instance port tracking.
    pub host_port_whitelist: BTreeSet<u16>,
    /// Container ports excluded from instance port tracking.
    pub container_port_whitelist: BTreeSet<u16>,
    /// Services the application uses that are not bound through the platform.
    pub services: Vec<CustomServiceConfig>,
}

/// Cloud Foundry CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfConfig {
    /// Name or path of the `cf` binary.
    #[serde(default = "default_cf_cmd")]
    pub cmd: String,
}

impl Default for CfConfig {
    fn default() -> Self {
        Self {
            cmd: default_cf_cmd(),
        }
    }
}

/// BOSH CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoshConfig {
    /// Name or path of the `bosh` binary.
    #[serde(default = "default_bosh_cmd")]
    pub cmd: String,
    /// BOSH environment alias.
    #[serde(default)]
    pub env: String,
    /// Name of the Cloud Foundry deployment.
    #[serde(default = "default_cf_deployment", rename = "cf-dep")]
    pub deployment: String,
    /// Host id of a diego cell with `cfdot` available.
    #[serde(default = "default_cfdot_host", rename = "cfdot-dc")]
    pub cfdot_host: String,
}

impl Default for BoshConfig {
    fn default() -> Self {
        Self {
            cmd: default_bosh_cmd(),
            env: String::new(),
            deployment: default_cf_deployment(),
            cfdot_host: default_cfdot_host(),
        }
    }
}

/// `cfdot` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfdotConfig {
    /// Command run on the cfdot host, e.g. `"cfdot"`.
    #[serde(default = "default_cfdot_cmd")]
    pub cmd: String,
}

impl Default for CfdotConfig {
    fn default() -> Self {
        Self {
            cmd: default_cfdot_cmd(),
        }
    }
}

/// A custom service declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomServiceConfig {
    pub name: String,
    /// Host name or address; resolved through DNS at discovery time.
    pub host: String,
    /// `(protocol, port)` pairs, e.g. `[[tcp, 3306], [icmp, all]]`.
    pub ports: Vec<(Protocol, PortSpec)>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_cf_cmd() -> String {
    "cf".to_string()
}

fn default_bosh_cmd() -> String {
    "bosh".to_string()
}

fn default_cf_deployment() -> String {
    "cf".to_string()
}

fn default_cfdot_host() -> String {
    "diego_cell/0".to_string()
}

fn default_cfdot_cmd() -> String {
    "cfdot".to_string()
}

// ── Validators ───────────────────────────────────────────────────────────────

impl ChaosConfig {
    /// Validates values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if a command name is empty, the BOSH environment is
    /// missing, or the cfdot host is not of the form `group/id`.
    pub fn validate(&self) -> Result<()> {
        if self.cf.cmd.trim().is_empty() {
            return Err(ConfigError::Missing("cf.cmd").into());
        }
        if self.bosh.cmd.trim().is_empty() {
            return Err(ConfigError::Missing("bosh.cmd").into());
        }
        if self.bosh.env.trim().is_empty() {
            return Err(ConfigError::Missing("bosh.env").into());
        }
        if self.bosh.deployment.trim().is_empty() {
            return Err(ConfigError::Missing("bosh.cf-dep").into());
        }
        if !is_host_id(&self.bosh.cfdot_host) {
            return Err(ConfigError::InvalidValue {
                key: "bosh.cfdot-dc",
                value: self.bosh.cfdot_host.clone(),
                expected: "<instance-group>/<id>, e.g. diego_cell/0",
            }
            .into());
        }
        if let Some(svc) = self.services.iter().find(|s| s.ports.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "services.ports",
                value: svc.name.clone(),
                expected: "at least one [protocol, port] pair",
            }
            .into());
        }
        Ok(())
    }

    /// Whether a `(host_port, container_port)` pair should be tracked.
    ///
    /// A whitelisted value on either side excludes the pair.
    #[must_use]
    pub fn tracks_ports(&self, host_port: u16, container_port: u16) -> bool {
        !self.host_port_whitelist.contains(&host_port)
            && !self.container_port_whitelist.contains(&container_port)
    }
}

fn is_host_id(value: &str) -> bool {
    matches!(value.split_once('/'), Some((group, id)) if !group.is_empty() && !id.is_empty())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
