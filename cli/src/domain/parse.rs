//! Pure parsers turning remote command output into structured facts.
//!
//! Every function here takes text in and returns data out, so each one can
//! be tested against fixed fixtures without running a command.

#![allow(clippy::expect_used)] // Regexes below are compile-time constants

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::config::ChaosConfig;
use crate::domain::instance::PortPair;
use crate::domain::remote::PID_DIR;

static INTERFACE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+: ([\w-]+)(@[\w-]+)?:").expect("valid regex"));

static SERVICE_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://(?:[^@/]*@)?(\[[^\]]+\]|[^:/?#,]+)(?::(\d+))?")
        .expect("valid regex")
});

// ── Embedded JSON ─────────────────────────────────────────────────────────────

/// Every JSON object embedded in otherwise unstructured text, in order.
///
/// Objects nested inside an extracted object are not reported separately.
#[must_use]
pub fn extract_json(text: &str) -> Vec<Value> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                pos = start + stream.byte_offset();
                found.push(value);
            }
            _ => pos = start + 1,
        }
    }
    found
}

// ── Hanging indent ────────────────────────────────────────────────────────────

/// A line and the subsequent lines indented deeper than it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentNode {
    pub line: String,
    pub children: Vec<IndentNode>,
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Group lines into a forest by hanging indentation. Blank lines are dropped.
#[must_use]
pub fn group_by_hanging_indent(text: &str) -> Vec<IndentNode> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| (indent_of(l), l))
        .collect();
    build_forest(&lines)
}

fn build_forest(lines: &[(usize, &str)]) -> Vec<IndentNode> {
    let mut nodes = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (indent, line) = lines[i];
        let mut end = i + 1;
        while end < lines.len() && lines[end].0 > indent {
            end += 1;
        }
        nodes.push(IndentNode {
            line: line.to_string(),
            children: build_forest(&lines[i + 1..end]),
        });
        i = end;
    }
    nodes
}

/// Index path to the first line (depth first) matching `pattern`.
#[must_use]
pub fn find_in_groups(nodes: &[IndentNode], pattern: &Regex) -> Option<Vec<usize>> {
    for (idx, node) in nodes.iter().enumerate() {
        if pattern.is_match(&node.line) {
            return Some(vec![idx]);
        }
        if let Some(mut path) = find_in_groups(&node.children, pattern) {
            path.insert(0, idx);
            return Some(path);
        }
    }
    None
}

// ── Network interfaces ────────────────────────────────────────────────────────

/// Interface name from an `ip a` header such as `3: eth0@if2: <...>`.
#[must_use]
pub fn parse_interface_name(line: &str) -> Option<String> {
    INTERFACE_LINE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Name of the interface whose `ip a` group mentions `address`.
///
/// The match may be on any line of the group; the interface is taken from
/// the group's top-level header.
#[must_use]
pub fn find_virtual_interface(ip_output: &str, address: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?:^|[^0-9.]){}(?:[^0-9]|$)", regex::escape(address))).ok()?;
    let groups = group_by_hanging_indent(ip_output);
    let path = find_in_groups(&groups, &pattern)?;
    parse_interface_name(&groups[path[0]].line)
}

// ── Container id ──────────────────────────────────────────────────────────────

/// Container GUID from the last rep log entry in `output` whose data carries
/// exactly `address`. Entries for other containers are skipped.
#[must_use]
pub fn parse_container_id(output: &str, address: &str) -> Option<String> {
    extract_json(output).iter().rev().find_map(|entry| {
        let data = entry.get("data")?.as_object()?;
        if !data.values().any(|v| v.as_str() == Some(address)) {
            return None;
        }
        data.get("container-guid")?.as_str().map(str::to_string)
    })
}

// ── Actual LRPs ───────────────────────────────────────────────────────────────

/// One port mapping reported for a running instance.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    #[serde(default)]
    pub container_tls_proxy_port: Option<u16>,
    #[serde(default)]
    pub host_tls_proxy_port: Option<u16>,
}

/// One instance as reported by `cfdot actual-lrps`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ActualLrp {
    pub process_guid: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub cell_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub instance_address: String,
    pub state: String,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
}

impl ActualLrp {
    /// Whether this instance runs a version of the application `guid`.
    ///
    /// Process GUIDs are the application GUID followed by `-<version>`.
    #[must_use]
    pub fn belongs_to(&self, guid: &str) -> bool {
        self.process_guid
            .strip_prefix(guid)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == "RUNNING"
    }

    /// Platform host id of the cell running this instance.
    #[must_use]
    pub fn host_id(&self) -> String {
        format!("diego_cell/{}", self.cell_id)
    }
}

/// Every well-formed LRP record in `cfdot actual-lrps` output.
#[must_use]
pub fn parse_actual_lrps(output: &str) -> Vec<ActualLrp> {
    extract_json(output)
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

/// Port pairs to track for an instance, plain and TLS-proxy.
///
/// A pair is kept only when neither side is whitelisted.
#[must_use]
pub fn tracked_port_pairs(mappings: &[PortMapping], cfg: &ChaosConfig) -> BTreeSet<PortPair> {
    let mut pairs = BTreeSet::new();
    for m in mappings {
        if cfg.tracks_ports(m.host_port, m.container_port) {
            pairs.insert((m.host_port, m.container_port));
        }
        if let (Some(host), Some(cont)) = (m.host_tls_proxy_port, m.container_tls_proxy_port) {
            if cfg.tracks_ports(host, cont) {
                pairs.insert((host, cont));
            }
        }
    }
    pairs
}

// ── Monit ─────────────────────────────────────────────────────────────────────

/// Pid file paths in `find` output, without the echoed command line.
#[must_use]
pub fn parse_pid_files(output: &str) -> Vec<String> {
    let echo = format!("find {PID_DIR}");
    output
        .lines()
        .map(str::trim)
        .filter(|l| l.contains(PID_DIR) && !l.contains(&echo))
        .map(str::to_string)
        .collect()
}

// ── Services ──────────────────────────────────────────────────────────────────

/// Outcome of scanning `cf env` output for bound services.
#[derive(Debug, Clone, PartialEq)]
pub enum VcapServices {
    /// The output contained no JSON at all.
    Unreadable,
    /// No object carried a `VCAP_SERVICES` key.
    Absent,
    /// Exactly one `VCAP_SERVICES` map.
    Found(Map<String, Value>),
    /// More than one object carried a `VCAP_SERVICES` key.
    Ambiguous(usize),
}

/// Locate the `VCAP_SERVICES` map in `cf env` output.
#[must_use]
pub fn find_vcap_services(output: &str) -> VcapServices {
    let objects = extract_json(output);
    if objects.is_empty() {
        return VcapServices::Unreadable;
    }
    let mut maps: Vec<Map<String, Value>> = objects
        .into_iter()
        .filter_map(|mut o| match o.get_mut("VCAP_SERVICES").map(Value::take) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect();
    match maps.len() {
        0 => VcapServices::Absent,
        1 => VcapServices::Found(maps.remove(0)),
        n => VcapServices::Ambiguous(n),
    }
}

/// A bound service instance before its hosts are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    pub kind: String,
    pub name: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// `(host, port)` pairs; `None` means any port.
    pub hosts: Vec<(String, Option<u16>)>,
}

fn str_field<'a>(creds: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| creds.get(*k).and_then(Value::as_str))
}

fn port_field(value: Option<&Value>) -> Option<u16> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn hosts_from_credentials(creds: &Map<String, Value>) -> Vec<(String, Option<u16>)> {
    let port = port_field(creds.get("port"));
    if let Some(host) = str_field(creds, &["hostname", "host"]) {
        return vec![(host.to_string(), port)];
    }
    if let Some(Value::Array(hosts)) = creds.get("hosts") {
        return hosts
            .iter()
            .filter_map(Value::as_str)
            .map(|h| split_host_port(h, port))
            .collect();
    }
    str_field(creds, &["uri", "url", "jdbcUrl"])
        .and_then(|uri| SERVICE_URI.captures(uri.trim_start_matches("jdbc:")))
        .map(|c| {
            let host = c[1].trim_matches(|ch| ch == '[' || ch == ']').to_string();
            let port = c.get(2).and_then(|p| p.as_str().parse().ok()).or(port);
            vec![(host, port)]
        })
        .unwrap_or_default()
}

fn split_host_port(entry: &str, default_port: Option<u16>) -> (String, Option<u16>) {
    match entry.rsplit_once(':') {
        Some((host, port)) if port.parse::<u16>().is_ok() => (host.to_string(), port.parse().ok()),
        _ => (entry.to_string(), default_port),
    }
}

/// One binding per bound service instance that exposes a reachable host.
///
/// Bindings with no host information are skipped.
#[must_use]
pub fn service_bindings(vcap: &Map<String, Value>) -> Vec<ServiceBinding> {
    let empty = Map::new();
    let mut bindings = Vec::new();
    for (kind, instances) in vcap {
        let Some(instances) = instances.as_array() else {
            continue;
        };
        for inst in instances {
            let creds = inst
                .get("credentials")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            let hosts = hosts_from_credentials(creds);
            if hosts.is_empty() {
                continue;
            }
            bindings.push(ServiceBinding {
                kind: kind.clone(),
                name: inst
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(kind.as_str())
                    .to_string(),
                user: str_field(creds, &["username", "user"]).map(str::to_string),
                password: str_field(creds, &["password"]).map(str::to_string),
                hosts,
            });
        }
    }
    bindings
}

// ── Routes ────────────────────────────────────────────────────────────────────

/// A route entity from `cf curl /v2/apps/<guid>/routes`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteEntity {
    pub host: String,
    #[serde(default)]
    pub path: Option<String>,
    pub domain_url: String,
}

/// Route entities of the first JSON document in `output`.
#[must_use]
pub fn parse_route_entities(output: &str) -> Vec<RouteEntity> {
    extract_json(output)
        .first()
        .and_then(|doc| doc.get("resources"))
        .and_then(Value::as_array)
        .map(|resources| {
            resources
                .iter()
                .filter_map(|r| r.get("entity").cloned())
                .filter_map(|e| serde_json::from_value(e).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Domain name of the first JSON document in `output`.
#[must_use]
pub fn parse_domain_name(output: &str) -> Option<String> {
    extract_json(output)
        .first()?
        .get("entity")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// `host.domain[/path]` for a route.
#[must_use]
pub fn format_route(host: &str, domain: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{host}.{domain}")
    } else {
        format!("{host}.{domain}/{path}")
    }
}
