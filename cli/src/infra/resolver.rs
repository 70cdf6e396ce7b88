//! DNS infrastructure — implements `HostResolver` using `spawn_blocking`.

use std::net::{IpAddr, ToSocketAddrs};

use anyhow::{Context, Result};

use crate::application::ports::HostResolver;

/// Resolves through the system resolver, preferring IPv4 addresses.
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<String> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip.to_string());
        }
        let query = format!("{host}:0");
        let addrs: Vec<IpAddr> = tokio::task::spawn_blocking(move || {
            query
                .to_socket_addrs()
                .map(|it| it.map(|a| a.ip()).collect())
        })
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))?
        .with_context(|| format!("cannot resolve {host}"))?;

        addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .map(ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("no addresses for {host}"))
    }
}
