//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Discovery errors ──────────────────────────────────────────────────────────

/// Errors raised while mapping `(org, space, app)` to live topology.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to target org {org} and space {space}.")]
    Target { org: String, space: String },

    #[error("Failed retrieving the GUID for {app}. Make sure {app} is in this space!")]
    GuidNotFound { app: String },

    #[error("Failed to query application environment variables for {app}.")]
    EnvironmentQuery { app: String },

    #[error("Failed to query application routes for {guid}.")]
    RouteQuery { guid: String },

    #[error("App discovery failed because no application instances could be found for {guid}.")]
    NoInstances { guid: String },

    #[error("App discovery failed because there was an error when finding services: {0}")]
    Services(String),

    #[error("Could not resolve host '{host}' for service '{service}'.")]
    Resolve { service: String, host: String },
}

impl DiscoveryError {
    /// Whether this error means the whole run must stop.
    ///
    /// Fatal errors indicate the named application does not exist in the
    /// targeted space or the platform session is unusable; retrying against
    /// the same state cannot succeed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::GuidNotFound { .. } | Self::EnvironmentQuery { .. } | Self::RouteQuery { .. }
        )
    }
}

// ── Fault errors ──────────────────────────────────────────────────────────────

/// Errors raised while injecting faults into a discovered application.
#[derive(Debug, Error)]
pub enum FaultError {
    #[error("{operation} failed on {host} with return code {code}.")]
    Remote {
        operation: &'static str,
        host: String,
        code: i32,
    },

    #[error("Cannot {requested} while the application network is {active}. Undo it first.")]
    ModeConflict {
        active: &'static str,
        requested: &'static str,
    },

    #[error("No pid files found for monit process '{process}' on {host}.")]
    NoPidFiles { process: String, host: String },

    #[error("Container id of instance {container_ip} on {host} is unknown.")]
    MissingContainerId { host: String, container_ip: String },

    #[error("Virtual interface of instance {container_ip} on {host} is unknown.")]
    MissingInterface { host: String, container_ip: String },
}

impl FaultError {
    /// The remote return code carried by this error, if any.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown traffic direction '{0}'. Valid directions: ingress, egress, both")]
    Direction(String),

    #[error("Unknown protocol '{0}'. Valid protocols: tcp, udp, udplite, icmp, esp, ah, sctp, all")]
    Protocol(String),

    #[error("Invalid port '{0}': expected a number between 1 and 65535 or 'all'")]
    Port(String),
}
