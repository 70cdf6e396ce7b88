//! Unit tests for the discovery service.
//!
//! Every test drives `discover` against a scripted `MockPlatform`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeSet;

use faultline::application::services::discovery::{self, AppRef};
use faultline::domain::{
    CUSTOM_SERVICE_TYPE, CustomServiceConfig, DiscoveryError, Endpoint, PortSpec, Protocol,
};

use crate::helpers::{
    CF_ENV_NO_SERVICES, CFDOT_HOST, GUID, config, discoverable_platform, lrp_line,
};
use crate::mocks::{Call, MockPlatform, SilentReporter, StaticResolver, fail, ok};

const BILLING: AppRef<'static> = AppRef {
    org: "dev",
    space: "staging",
    name: "billing",
};

fn resolver() -> StaticResolver {
    StaticResolver::default().with("db.internal", "10.1.2.3")
}

fn discovery_error(err: &anyhow::Error) -> &DiscoveryError {
    err.downcast_ref::<DiscoveryError>()
        .unwrap_or_else(|| panic!("expected DiscoveryError, got: {err:#}"))
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_builds_full_topology() {
    let cfg = config();
    let exec = discoverable_platform();

    let app = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    assert_eq!(app.id(), "dev_staging_billing");
    assert_eq!(app.guid.as_deref(), Some(GUID));
    assert_eq!(app.len(), 1);

    let inst = &app.instances[0];
    assert_eq!(inst.host_id, "diego_cell/c1");
    assert_eq!(inst.host_ip, "10.0.16.5");
    assert_eq!(inst.container_ip, "10.255.0.9");
    assert_eq!(inst.container_id.as_deref(), Some("c0ffee-01"));
    assert_eq!(inst.virtual_interface.as_deref(), Some("s-010255000009"));
    assert_eq!(inst.app_ports, BTreeSet::from([(6100, 8080)]));

    let mysql = app.service_by_name("mysql").expect("mysql bound");
    assert_eq!(mysql.kind, "p-mysql");
    assert_eq!(mysql.user.as_deref(), Some("billing"));
    assert_eq!(
        mysql.hosts,
        vec![Endpoint::new("10.1.2.3", Protocol::Tcp, PortSpec::Number(3306))]
    );
    assert!(app.service_by_name("syslog").is_some());
}

#[tokio::test]
async fn test_discover_targets_org_and_space_first() {
    let cfg = config();
    let exec = discoverable_platform();

    discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    assert_eq!(
        exec.calls()[0],
        Call::Local("cf target -o dev -s staging".to_string())
    );
}

#[tokio::test]
async fn test_discover_lists_lrps_on_cfdot_host() {
    let cfg = config();
    let exec = discoverable_platform();

    discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    assert_eq!(
        exec.batches_on(CFDOT_HOST),
        vec![vec!["cfdot actual-lrps".to_string()]]
    );
}

#[tokio::test]
async fn test_discover_prepends_custom_services() {
    let mut cfg = config();
    cfg.services.push(CustomServiceConfig {
        name: "ldap".to_string(),
        host: "ldap.corp".to_string(),
        ports: vec![(Protocol::Tcp, PortSpec::Number(389)), (Protocol::Icmp, PortSpec::All)],
        user: None,
        password: None,
    });
    let exec = discoverable_platform();
    let resolver = resolver().with("ldap.corp", "10.4.4.4");

    let app = discovery::discover(&exec, &resolver, &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    let ldap = &app.services[0];
    assert_eq!(ldap.name, "ldap");
    assert_eq!(ldap.kind, CUSTOM_SERVICE_TYPE);
    assert_eq!(
        ldap.hosts,
        vec![
            Endpoint::new("10.4.4.4", Protocol::Tcp, PortSpec::Number(389)),
            Endpoint::new("10.4.4.4", Protocol::Icmp, PortSpec::All),
        ]
    );
}

#[tokio::test]
async fn test_discover_tolerates_missing_interface_and_container_id() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("app billing --guid", ok(&format!("{GUID}\n")))
        .on_local("env billing", ok(CF_ENV_NO_SERVICES))
        .on_host(
            CFDOT_HOST,
            "actual-lrps",
            ok(&lrp_line("abc-123-v1", "c1", "10.255.0.9", "RUNNING")),
        )
        .on_host("diego_cell/c1", "rep.stdout.log", fail(1, ""));

    let app = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    assert!(app.instances[0].virtual_interface.is_none());
    assert!(app.instances[0].container_id.is_none());
    assert!(app.services.is_empty());
}

#[tokio::test]
async fn test_discover_ignores_rep_log_entry_of_neighbour_container() {
    let cfg = config();
    let rep_log = concat!(
        r#"{"source":"rep","data":{"container-guid":"c0ffee-01","instance-address":"10.255.0.9"}}"#,
        "\n",
        r#"{"source":"rep","data":{"container-guid":"beef-90","instance-address":"10.255.0.90"}}"#,
        "\n",
    );
    let exec = MockPlatform::new()
        .on_host("diego_cell/c1", "rep.stdout.log", ok(rep_log))
        .merge(discoverable_platform());

    let app = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    assert_eq!(app.instances[0].container_id.as_deref(), Some("c0ffee-01"));
    let lookup = exec
        .host_commands()
        .into_iter()
        .find(|c| c.contains("rep.stdout.log"))
        .expect("rep log lookup");
    assert!(lookup.contains("grep -Fw -e '10.255.0.9'"), "got: {lookup}");
}

#[tokio::test]
async fn test_discover_rep_log_with_only_neighbour_leaves_container_id_unset() {
    let cfg = config();
    let rep_log =
        r#"{"source":"rep","data":{"container-guid":"beef-90","instance-address":"10.255.0.90"}}"#;
    let exec = MockPlatform::new()
        .on_host("diego_cell/c1", "rep.stdout.log", ok(rep_log))
        .merge(discoverable_platform());

    let app = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    assert!(app.instances[0].container_id.is_none());
}

#[tokio::test]
async fn test_discover_skips_non_running_and_foreign_instances() {
    let cfg = config();
    let listing = [
        lrp_line("abc-123-v1", "c1", "10.255.0.9", "RUNNING"),
        lrp_line("abc-123-v1", "c2", "10.255.0.21", "CRASHED"),
        lrp_line("abc-1234-v1", "c3", "10.255.0.33", "RUNNING"),
    ]
    .join("\n");
    let exec = MockPlatform::new()
        .on_local("app billing --guid", ok(&format!("{GUID}\n")))
        .on_local("env billing", ok(CF_ENV_NO_SERVICES))
        .on_host(CFDOT_HOST, "actual-lrps", ok(&listing));

    let app = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .expect("discover");

    let hosts: Vec<_> = app.instances.iter().map(|i| i.host_id.as_str()).collect();
    assert_eq!(hosts, vec!["diego_cell/c1"]);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_target_failure() {
    let cfg = config();
    let exec = MockPlatform::new().on_local("target -o", fail(1, "org not found"));

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::Target { .. }));
    assert!(!discovery_error(&err).is_fatal());
    assert_eq!(exec.calls().len(), 1);
}

#[tokio::test]
async fn test_discover_unknown_app_is_fatal() {
    let cfg = config();
    let exec = MockPlatform::new().on_local("--guid", fail(1, "App billing not found"));

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    let e = discovery_error(&err);
    assert!(matches!(e, DiscoveryError::GuidNotFound { .. }));
    assert!(e.is_fatal());
    assert!(
        err.to_string().contains("Make sure billing is in this space"),
        "got: {err}"
    );
}

#[tokio::test]
async fn test_discover_empty_guid_output_is_fatal() {
    let cfg = config();
    let exec = MockPlatform::new().on_local("--guid", ok("\n"));

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::GuidNotFound { .. }));
}

#[tokio::test]
async fn test_discover_no_instances() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("--guid", ok(&format!("{GUID}\n")))
        .on_host(CFDOT_HOST, "actual-lrps", ok(""));

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    let e = discovery_error(&err);
    assert!(matches!(e, DiscoveryError::NoInstances { .. }));
    assert!(!e.is_fatal());
}

#[tokio::test]
async fn test_discover_only_crashed_instances_is_no_instances() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("--guid", ok(&format!("{GUID}\n")))
        .on_host(
            CFDOT_HOST,
            "actual-lrps",
            ok(&lrp_line("abc-123-v1", "c1", "10.255.0.9", "CRASHED")),
        );

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::NoInstances { .. }));
    assert!(
        exec.calls().iter().all(|c| !matches!(c, Call::Host { host, .. } if host == "diego_cell/c1")),
        "crashed instance must not be inspected"
    );
}

#[tokio::test]
async fn test_discover_cfdot_failure_is_no_instances() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("--guid", ok(&format!("{GUID}\n")))
        .on_host(CFDOT_HOST, "actual-lrps", fail(1, "connection refused"));

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::NoInstances { .. }));
}

#[tokio::test]
async fn test_discover_env_failure_is_fatal() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("env billing", fail(1, "not logged in"))
        .merge(discoverable_platform());

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    let e = discovery_error(&err);
    assert!(matches!(e, DiscoveryError::EnvironmentQuery { .. }));
    assert!(e.is_fatal());
}

#[tokio::test]
async fn test_discover_env_without_json_is_fatal() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("env billing", ok("FAILED\nServer error"))
        .merge(discoverable_platform());

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::EnvironmentQuery { .. }));
}

#[tokio::test]
async fn test_discover_ambiguous_vcap_services() {
    let cfg = config();
    let doubled = "{\"VCAP_SERVICES\": {}}\n{\"VCAP_SERVICES\": {}}\n";
    let exec = MockPlatform::new()
        .on_local("env billing", ok(doubled))
        .merge(discoverable_platform());

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::Services(_)));
}

#[tokio::test]
async fn test_discover_unresolvable_service_host() {
    let cfg = config();
    let exec = discoverable_platform();

    let err = discovery::discover(&exec, &StaticResolver::default(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    match discovery_error(&err) {
        DiscoveryError::Resolve { service, host } => {
            assert_eq!(service, "mysql");
            assert_eq!(host, "db.internal");
        }
        other => panic!("expected Resolve, got {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_service_resolve_failure_aborts_before_guid_lookup() {
    let mut cfg = config();
    cfg.services.push(CustomServiceConfig {
        name: "ldap".to_string(),
        host: "ldap.corp".to_string(),
        ports: vec![(Protocol::Tcp, PortSpec::Number(389))],
        user: None,
        password: None,
    });
    let exec = discoverable_platform();

    let err = discovery::discover(&exec, &resolver(), &cfg, &SilentReporter, BILLING)
        .await
        .unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::Resolve { .. }));
    assert!(
        !exec
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Local(l) if l.contains("--guid")))
    );
}

// ── Routes ───────────────────────────────────────────────────────────────────

const ROUTES: &str = r#"{
  "total_results": 2,
  "resources": [
    { "entity": { "host": "billing", "path": "", "domain_url": "/v2/shared_domains/d1" } },
    { "entity": { "host": "billing-api", "path": "/v1", "domain_url": "/v2/shared_domains/d1" } }
  ]
}"#;

const DOMAIN: &str = r#"{ "metadata": { "guid": "d1" }, "entity": { "name": "apps.example.com" } }"#;

#[tokio::test]
async fn test_find_routes_formats_host_domain_path() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("curl /v2/apps/abc-123/routes", ok(ROUTES))
        .on_local("curl /v2/shared_domains/d1", ok(DOMAIN));

    let routes = discovery::find_routes(&exec, &cfg, GUID).await.expect("routes");

    assert_eq!(
        routes,
        vec!["billing.apps.example.com", "billing-api.apps.example.com/v1"]
    );
}

#[tokio::test]
async fn test_find_routes_failure_is_fatal() {
    let cfg = config();
    let exec = MockPlatform::new().on_local("routes", fail(1, "unauthorized"));

    let err = discovery::find_routes(&exec, &cfg, GUID).await.unwrap_err();

    let e = discovery_error(&err);
    assert!(matches!(e, DiscoveryError::RouteQuery { .. }));
    assert!(e.is_fatal());
}

#[tokio::test]
async fn test_find_routes_unreadable_domain_is_fatal() {
    let cfg = config();
    let exec = MockPlatform::new()
        .on_local("routes", ok(ROUTES))
        .on_local("shared_domains", ok("not json"));

    let err = discovery::find_routes(&exec, &cfg, GUID).await.unwrap_err();

    assert!(matches!(discovery_error(&err), DiscoveryError::RouteQuery { .. }));
}
