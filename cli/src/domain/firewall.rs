//! `iptables` rule builders for traffic blocking and service isolation.
//!
//! Every rule is a DROP in the host's `FORWARD` chain. Insertion puts the
//! rule at the head of the chain; deletion removes one copy, so rollback
//! repeats each delete [`TIMES_TO_REMOVE`] times to clear duplicates left by
//! repeated blocking.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ConfigError;
use crate::domain::service::{Endpoint, PortSpec, Protocol};

/// How many times each delete is issued during rollback.
pub const TIMES_TO_REMOVE: usize = 5;

// ── Direction ────────────────────────────────────────────────────────────────

/// Traffic direction relative to the application container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Traffic flowing into the container.
    Ingress,
    /// Traffic flowing out of the container.
    Egress,
    Both,
}

impl Direction {
    #[must_use]
    pub fn includes_ingress(self) -> bool {
        matches!(self, Self::Ingress | Self::Both)
    }

    #[must_use]
    pub fn includes_egress(self) -> bool {
        matches!(self, Self::Egress | Self::Both)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
            Self::Both => "both",
        })
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ingress" | "in" | "inbound" => Ok(Self::Ingress),
            "egress" | "out" | "outbound" => Ok(Self::Egress),
            "both" | "all" => Ok(Self::Both),
            _ => Err(ConfigError::Direction(s.to_string())),
        }
    }
}

// ── Port selection ───────────────────────────────────────────────────────────

/// Which ports of an instance to block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PortSelection {
    /// The container ports discovered for the instance.
    #[default]
    Env,
    /// All traffic to or from the container address.
    All,
    /// An explicit set of container ports. Must also be passed to unblock.
    Custom(BTreeSet<u16>),
}

impl PortSelection {
    /// Ports to pass to the rollback after a failed block.
    ///
    /// Named policies roll back with no explicit ports, which clears both
    /// the environment ports and the all-traffic rules.
    #[must_use]
    pub fn rollback_ports(&self) -> Option<&BTreeSet<u16>> {
        match self {
            Self::Custom(ports) => Some(ports),
            Self::Env | Self::All => None,
        }
    }
}

impl FromStr for PortSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "all" => Ok(Self::All),
            list => list
                .split(',')
                .map(|p| match p.parse::<PortSpec>() {
                    Ok(PortSpec::Number(n)) => Ok(n),
                    _ => Err(ConfigError::Port(p.to_string())),
                })
                .collect::<Result<BTreeSet<_>, _>>()
                .map(Self::Custom),
        }
    }
}

// ── Rules ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Destination,
}

impl Side {
    fn addr_flag(self) -> &'static str {
        match self {
            Self::Source => "-s",
            Self::Destination => "-d",
        }
    }

    fn port_flag(self) -> &'static str {
        match self {
            Self::Source => "--sport",
            Self::Destination => "--dport",
        }
    }
}

/// A single DROP rule in the `FORWARD` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRule {
    addresses: Vec<(Side, String)>,
    protocol: Protocol,
    port: Option<(Side, u16)>,
}

impl DropRule {
    /// Command that inserts this rule at the head of the chain.
    #[must_use]
    pub fn insert(&self) -> String {
        self.render(&["-I", "FORWARD", "1"])
    }

    /// Command that deletes one copy of this rule.
    #[must_use]
    pub fn delete(&self) -> String {
        self.render(&["-D", "FORWARD"])
    }

    fn render(&self, op: &[&str]) -> String {
        let mut parts: Vec<String> = ["sudo", "iptables"]
            .iter()
            .chain(op)
            .map(ToString::to_string)
            .collect();
        for (side, addr) in &self.addresses {
            parts.push(side.addr_flag().to_string());
            parts.push(addr.clone());
        }
        parts.push("-p".to_string());
        parts.push(self.protocol.to_string());
        if let Some((side, port)) = self.port {
            parts.push(side.port_flag().to_string());
            parts.push(port.to_string());
        }
        parts.push("-j".to_string());
        parts.push("DROP".to_string());
        parts.join(" ")
    }
}

/// Rule dropping traffic between a container and one service endpoint.
///
/// `egress` selects instance→service, otherwise service→instance. The port
/// clause is omitted for `PortSpec::All`.
#[must_use]
pub fn service_rule(container_ip: &str, endpoint: &Endpoint, egress: bool) -> DropRule {
    let (own, peer) = if egress {
        (Side::Source, Side::Destination)
    } else {
        (Side::Destination, Side::Source)
    };
    DropRule {
        addresses: vec![
            (own, container_ip.to_string()),
            (peer, endpoint.address().to_string()),
        ],
        protocol: endpoint.protocol(),
        port: match endpoint.port() {
            PortSpec::Number(n) => Some((peer, n)),
            PortSpec::All => None,
        },
    }
}

/// Rule dropping traffic to (`egress == false`) or from a container.
///
/// With a port the rule matches tcp on that container port, without one it
/// matches every protocol.
#[must_use]
pub fn instance_rule(container_ip: &str, port: Option<u16>, egress: bool) -> DropRule {
    let side = if egress { Side::Source } else { Side::Destination };
    DropRule {
        addresses: vec![(side, container_ip.to_string())],
        protocol: if port.is_some() { Protocol::Tcp } else { Protocol::All },
        port: port.map(|p| (side, p)),
    }
}

/// Insert commands blocking an instance in the given direction.
#[must_use]
pub fn instance_block_commands(
    container_ip: &str,
    container_ports: &BTreeSet<u16>,
    direction: Direction,
    ports: &PortSelection,
) -> Vec<String> {
    let targets: Vec<Option<u16>> = match ports {
        PortSelection::All => vec![None],
        PortSelection::Env => container_ports.iter().copied().map(Some).collect(),
        PortSelection::Custom(custom) => custom.iter().copied().map(Some).collect(),
    };
    let mut cmds = Vec::new();
    for port in targets {
        if direction.includes_ingress() {
            cmds.push(instance_rule(container_ip, port, false).insert());
        }
        if direction.includes_egress() {
            cmds.push(instance_rule(container_ip, port, true).insert());
        }
    }
    cmds
}

/// Delete commands undoing any block of an instance.
///
/// Covers both directions, the all-traffic rule, and every port in `ports`
/// (or the discovered container ports when `None`).
#[must_use]
pub fn instance_unblock_commands(
    container_ip: &str,
    container_ports: &BTreeSet<u16>,
    ports: Option<&BTreeSet<u16>>,
) -> Vec<String> {
    let mut targets = vec![None];
    targets.extend(ports.unwrap_or(container_ports).iter().copied().map(Some));
    let mut cmds = Vec::new();
    for port in targets {
        for egress in [false, true] {
            let rule = instance_rule(container_ip, port, egress).delete();
            cmds.extend(std::iter::repeat_n(rule, TIMES_TO_REMOVE));
        }
    }
    cmds
}

/// Insert commands isolating a container from one service endpoint.
#[must_use]
pub fn service_block_commands(
    container_ip: &str,
    endpoint: &Endpoint,
    direction: Direction,
) -> Vec<String> {
    let mut cmds = Vec::new();
    if direction.includes_egress() {
        cmds.push(service_rule(container_ip, endpoint, true).insert());
    }
    if direction.includes_ingress() {
        cmds.push(service_rule(container_ip, endpoint, false).insert());
    }
    cmds
}

/// Delete commands undoing service isolation for one endpoint, both directions.
#[must_use]
pub fn service_unblock_commands(container_ip: &str, endpoint: &Endpoint) -> Vec<String> {
    let mut cmds = Vec::with_capacity(2 * TIMES_TO_REMOVE);
    for egress in [true, false] {
        let rule = service_rule(container_ip, endpoint, egress).delete();
        cmds.extend(std::iter::repeat_n(rule, TIMES_TO_REMOVE));
    }
    cmds
}
