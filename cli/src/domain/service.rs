//! Service descriptors — the network dependencies of an application.
//!
//! Pure types only. Host names are resolved to addresses by the caller
//! before a `Service` is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Type tag given to services declared in configuration rather than bound
/// through the platform.
pub const CUSTOM_SERVICE_TYPE: &str = "custom";

// ── Protocol ─────────────────────────────────────────────────────────────────

/// IP protocol understood by `iptables -p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Udplite,
    Icmp,
    Esp,
    Ah,
    Sctp,
    All,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Udplite => "udplite",
            Self::Icmp => "icmp",
            Self::Esp => "esp",
            Self::Ah => "ah",
            Self::Sctp => "sctp",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "udplite" => Ok(Self::Udplite),
            "icmp" => Ok(Self::Icmp),
            "esp" => Ok(Self::Esp),
            "ah" => Ok(Self::Ah),
            "sctp" => Ok(Self::Sctp),
            "all" => Ok(Self::All),
            _ => Err(ConfigError::Protocol(s.to_string())),
        }
    }
}

// ── Port ─────────────────────────────────────────────────────────────────────

/// A single port, or every port.
///
/// Serialized as a bare number or the string `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PortRepr", into = "PortRepr")]
pub enum PortSpec {
    All,
    Number(u16),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u16),
    Word(String),
}

impl TryFrom<PortRepr> for PortSpec {
    type Error = ConfigError;

    fn try_from(repr: PortRepr) -> Result<Self, Self::Error> {
        match repr {
            PortRepr::Number(n) => Ok(Self::Number(n)),
            PortRepr::Word(w) => w.parse(),
        }
    }
}

impl From<PortSpec> for PortRepr {
    fn from(port: PortSpec) -> Self {
        match port {
            PortSpec::All => Self::Word("all".to_string()),
            PortSpec::Number(n) => Self::Number(n),
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for PortSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match s.parse::<u16>() {
            Ok(n) if n > 0 => Ok(Self::Number(n)),
            _ => Err(ConfigError::Port(s.to_string())),
        }
    }
}

// ── Endpoint ─────────────────────────────────────────────────────────────────

/// One `(address, protocol, port)` triple a service listens on.
///
/// Serialized as a three element array to keep the diagnostic dump compact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(pub String, pub Protocol, pub PortSpec);

impl Endpoint {
    #[must_use]
    pub fn new(address: impl Into<String>, protocol: Protocol, port: PortSpec) -> Self {
        Self(address.into(), protocol, port)
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.1
    }

    #[must_use]
    pub fn port(&self) -> PortSpec {
        self.2
    }
}

// ── Service ──────────────────────────────────────────────────────────────────

/// A bound or custom dependency of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service instance name, e.g. `"mysql"`. Not guaranteed unique.
    pub name: String,
    /// Service type, e.g. `"p-mysql"`, or [`CUSTOM_SERVICE_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Login user, when the binding carries one.
    #[serde(default)]
    pub user: Option<String>,
    /// Login password. Never written to the diagnostic dump.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Endpoints the application talks to.
    pub hosts: Vec<Endpoint>,
}

impl Service {
    /// Whether this service's type is on the given whitelist.
    #[must_use]
    pub fn is_whitelisted<'a>(&self, whitelist: impl IntoIterator<Item = &'a String>) -> bool {
        whitelist.into_iter().any(|t| *t == self.kind)
    }

    /// Whether the optional name filter selects this service.
    ///
    /// `None` and an empty filter select every service.
    #[must_use]
    pub fn matches_filter(&self, filter: Option<&[String]>) -> bool {
        match filter {
            Some(names) if !names.is_empty() => names.iter().any(|n| *n == self.name),
            _ => true,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service({}:{}", self.kind, self.name)?;
        for ep in &self.hosts {
            write!(f, " {}/{}:{}", ep.protocol(), ep.address(), ep.port())?;
        }
        f.write_str(")")
    }
}
