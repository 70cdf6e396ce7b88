//! Shared fixtures: configuration, platform output, and ready-made topologies.

#![allow(dead_code)]

use std::collections::BTreeSet;

use faultline::domain::{
    App, AppInstance, ChaosConfig, Endpoint, PortSpec, Protocol, Service,
};

use crate::mocks::{MockPlatform, ok};

pub const GUID: &str = "abc-123";
pub const CFDOT_HOST: &str = "diego_cell/0";

// ── Configuration ────────────────────────────────────────────────────────────

/// Configuration with a `logger` whitelist entry and no custom services.
pub fn config() -> ChaosConfig {
    let mut cfg = ChaosConfig::default();
    cfg.bosh.env = "lab".to_string();
    cfg.service_whitelist.insert("logger".to_string());
    cfg.host_port_whitelist.insert(61001);
    cfg
}

// ── Platform output ──────────────────────────────────────────────────────────

/// `cfdot actual-lrps` line for one instance of `process_guid`.
pub fn lrp_line(process_guid: &str, cell: &str, container_ip: &str, state: &str) -> String {
    format!(
        r#"{{"process_guid":"{process_guid}","index":0,"cell_id":"{cell}","address":"10.0.16.5","instance_address":"{container_ip}","state":"{state}","ports":[{{"container_port":8080,"host_port":6100}},{{"container_port":2222,"host_port":61001}}]}}"#
    )
}

pub const IP_A: &str = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN group default qlen 1000
    link/loopback 00:00:00:00:00:00 brd 00:00:00:00:00:00
    inet 127.0.0.1/8 scope host lo
12: s-010255000009@if11: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue state UP
    link/ether aa:bb:cc:dd:ee:ff brd ff:ff:ff:ff:ff:ff link-netnsid 0
    inet 10.255.0.10 peer 10.255.0.9/32 scope link s-010255000009
       valid_lft forever preferred_lft forever
";

pub const REP_LOG: &str = r#"{"timestamp":"1700000000.1","source":"rep","message":"rep.container-created","log_level":1,"data":{"container-guid":"c0ffee-01","instance-address":"10.255.0.9"}}"#;

pub const CF_ENV: &str = r#"Getting env variables for app billing in org dev / space staging as admin...
OK

System-Provided:
{
 "VCAP_SERVICES": {
  "p-mysql": [
   {
    "name": "mysql",
    "credentials": {
     "hostname": "db.internal",
     "port": 3306,
     "username": "billing",
     "password": "secret"
    }
   }
  ],
  "logger": [
   {
    "name": "syslog",
    "credentials": { "hostname": "10.9.9.9", "port": 514 }
   }
  ]
 }
}

{
 "VCAP_APPLICATION": {
  "application_name": "billing"
 }
}

No user-defined env variables have been set
"#;

pub const CF_ENV_NO_SERVICES: &str = r#"Getting env variables for app billing...
{
 "VCAP_APPLICATION": { "application_name": "billing" }
}
"#;

/// Platform answering every discovery step for a single running instance of
/// `billing` in `dev/staging`.
pub fn discoverable_platform() -> MockPlatform {
    MockPlatform::new()
        .on_local("app billing --guid", ok(&format!("{GUID}\n")))
        .on_local("env billing", ok(CF_ENV))
        .on_host(
            CFDOT_HOST,
            "actual-lrps",
            ok(&lrp_line("abc-123-v1", "c1", "10.255.0.9", "RUNNING")),
        )
        .on_host("diego_cell/c1", "ip a", ok(IP_A))
        .on_host("diego_cell/c1", "rep.stdout.log", ok(REP_LOG))
}

// ── Topologies ───────────────────────────────────────────────────────────────

pub fn instance(cell: &str, container_ip: &str, interface: Option<&str>) -> AppInstance {
    AppInstance {
        host_id: format!("diego_cell/{cell}"),
        host_ip: "10.0.16.5".to_string(),
        container_id: Some(format!("container-{cell}")),
        container_ip: container_ip.to_string(),
        app_ports: BTreeSet::from([(6100, 8080)]),
        virtual_interface: interface.map(str::to_string),
    }
}

pub fn service(name: &str, kind: &str, addr: &str, port: u16) -> Service {
    Service {
        name: name.to_string(),
        kind: kind.to_string(),
        user: None,
        password: None,
        hosts: vec![Endpoint::new(addr, Protocol::Tcp, PortSpec::Number(port))],
    }
}

/// Two instances on cells `c1` and `c2`, one mysql and one whitelisted
/// logger service.
pub fn two_instance_app() -> App {
    let mut app = App::new("dev", "staging", "billing");
    app.guid = Some(GUID.to_string());
    app.instances = vec![
        instance("c1", "10.255.0.9", Some("s-010255000009")),
        instance("c2", "10.255.0.21", Some("s-010255000021")),
    ];
    app.services = vec![
        service("mysql", "p-mysql", "10.1.2.3", 3306),
        service("syslog", "logger", "10.9.9.9", 514),
    ];
    app
}
