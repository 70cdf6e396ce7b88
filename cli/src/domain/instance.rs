//! Instance records — one running copy of an application on a host.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(host_port, container_port)` pair the application listens on.
pub type PortPair = (u16, u16);

/// One running copy of an application.
///
/// Immutable after discovery. Fault primitives scoped to a single instance
/// live in `application::services::instance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInstance {
    /// Platform host id, e.g. `"diego_cell/3f1c..."`.
    pub host_id: String,
    /// Address of the hosting node.
    pub host_ip: String,
    /// Container id, when it could be resolved.
    pub container_id: Option<String>,
    /// Address of the container on the host network.
    pub container_ip: String,
    /// Non-whitelisted port pairs.
    pub app_ports: BTreeSet<PortPair>,
    /// Host-side virtual interface of the container, when it could be resolved.
    pub virtual_interface: Option<String>,
}

impl AppInstance {
    /// Container-side ports of every tracked pair.
    #[must_use]
    pub fn container_ports(&self) -> BTreeSet<u16> {
        self.app_ports.iter().map(|&(_, c)| c).collect()
    }
}

impl fmt::Display for AppInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AppInstance({}@{} -> {} [{}]",
            self.host_id,
            self.host_ip,
            self.container_ip,
            self.container_id.as_deref().unwrap_or("?")
        )?;
        for (h, c) in &self.app_ports {
            write!(f, " {h}:{c}")?;
        }
        write!(f, " vi={})", self.virtual_interface.as_deref().unwrap_or("?"))
    }
}
