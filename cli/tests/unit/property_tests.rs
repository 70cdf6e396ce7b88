//! Property-based tests for whitelist handling and rule generation.

#![allow(clippy::expect_used)]

use std::collections::BTreeSet;

use faultline::application::services::instance::{service_block_batch, service_unblock_batch};
use faultline::domain::parse::{PortMapping, tracked_port_pairs};
use faultline::domain::{
    ChaosConfig, Direction, Endpoint, NetworkMode, PortSelection, PortSpec, Protocol, Service,
    TIMES_TO_REMOVE,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

const KINDS: [&str; 4] = ["p-mysql", "p-redis", "logger", "custom"];

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Ingress),
        Just(Direction::Egress),
        Just(Direction::Both),
    ]
}

fn arb_mode() -> impl Strategy<Value = NetworkMode> {
    prop_oneof![
        Just(NetworkMode::None),
        Just(NetworkMode::Blocked),
        Just(NetworkMode::Shaped),
        Just(NetworkMode::Manipulated),
    ]
}

/// Services with distinct addresses `10.{i}.0.1`, one or two endpoints each.
fn arb_services() -> impl Strategy<Value = Vec<Service>> {
    prop::collection::vec((0..KINDS.len(), 1usize..=2, any::<bool>()), 0..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (kind, endpoints, all_ports))| {
                let port = if all_ports {
                    PortSpec::All
                } else {
                    PortSpec::Number(3000 + u16::try_from(i).expect("small index"))
                };
                Service {
                    name: format!("svc{i}"),
                    kind: KINDS[kind].to_string(),
                    user: None,
                    password: None,
                    hosts: (0..endpoints)
                        .map(|_| Endpoint::new(format!("10.{i}.0.1"), Protocol::Tcp, port))
                        .collect(),
                }
            })
            .collect()
    })
}

fn arb_whitelist() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(prop::sample::select(KINDS.to_vec()), 0..=KINDS.len())
        .prop_map(|set| set.into_iter().map(str::to_string).collect())
}

fn arb_filter() -> impl Strategy<Value = Option<Vec<String>>> {
    prop::option::of(prop::collection::vec((0usize..8).prop_map(|i| format!("svc{i}")), 0..4))
}

// ============================================================================
// Service isolation
// ============================================================================

proptest! {
    #[test]
    fn prop_block_batch_never_targets_whitelisted_services(
        services in arb_services(),
        whitelist in arb_whitelist(),
        filter in arb_filter(),
        direction in arb_direction(),
    ) {
        let cmds = service_block_batch(
            "10.255.0.9",
            &services,
            direction,
            &whitelist,
            filter.as_deref(),
        );
        for svc in services.iter().filter(|s| whitelist.contains(&s.kind)) {
            let addr = format!(" {} ", svc.hosts[0].address());
            prop_assert!(cmds.iter().all(|c| !c.contains(&addr)), "{} was targeted", svc.name);
        }
    }

    #[test]
    fn prop_unblock_batch_covers_every_targeted_endpoint(
        services in arb_services(),
        whitelist in arb_whitelist(),
        filter in arb_filter(),
    ) {
        let cmds = service_unblock_batch("10.255.0.9", &services, &whitelist, filter.as_deref());
        let targeted: usize = services
            .iter()
            .filter(|s| !s.is_whitelisted(&whitelist) && s.matches_filter(filter.as_deref()))
            .map(|s| s.hosts.len())
            .sum();
        prop_assert_eq!(cmds.len(), targeted * 2 * TIMES_TO_REMOVE);
        prop_assert!(cmds.iter().all(|c| c.starts_with("sudo iptables -D FORWARD")));
    }

    #[test]
    fn prop_block_batch_size_follows_direction(
        services in arb_services(),
        direction in arb_direction(),
    ) {
        let none: BTreeSet<String> = BTreeSet::new();
        let cmds = service_block_batch("10.255.0.9", &services, direction, &none, None);
        let endpoints: usize = services.iter().map(|s| s.hosts.len()).sum();
        let per_endpoint = if direction == Direction::Both { 2 } else { 1 };
        prop_assert_eq!(cmds.len(), endpoints * per_endpoint);
    }
}

// ============================================================================
// Port tracking
// ============================================================================

proptest! {
    #[test]
    fn prop_tracked_pairs_exclude_whitelisted_ports(
        mappings in prop::collection::vec((1u16..20, 1u16..20), 0..10),
        host_wl in prop::collection::btree_set(1u16..20, 0..5),
        container_wl in prop::collection::btree_set(1u16..20, 0..5),
    ) {
        // Narrow port ranges so whitelisted and tracked ports collide often.
        let mut cfg = ChaosConfig::default();
        cfg.host_port_whitelist = host_wl;
        cfg.container_port_whitelist = container_wl;
        let mappings: Vec<PortMapping> = mappings
            .iter()
            .map(|&(host_port, container_port)| PortMapping {
                container_port,
                host_port,
                container_tls_proxy_port: None,
                host_tls_proxy_port: None,
            })
            .collect();

        let pairs = tracked_port_pairs(&mappings, &cfg);

        for (host, container) in &pairs {
            prop_assert!(!cfg.host_port_whitelist.contains(host));
            prop_assert!(!cfg.container_port_whitelist.contains(container));
        }
        for m in &mappings {
            let expected = cfg.tracks_ports(m.host_port, m.container_port);
            prop_assert_eq!(pairs.contains(&(m.host_port, m.container_port)), expected);
        }
    }

    #[test]
    fn prop_custom_port_list_parses_to_set(
        ports in prop::collection::btree_set(1u16..=u16::MAX, 1..6),
    ) {
        let list = ports.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        let parsed: PortSelection = list.parse().expect("valid list");
        prop_assert_eq!(parsed, PortSelection::Custom(ports));
    }
}

// ============================================================================
// Mode exclusivity
// ============================================================================

proptest! {
    #[test]
    fn prop_mode_check_allows_only_compatible_transitions(
        active in arb_mode(),
        requested in arb_mode(),
    ) {
        let allowed = active == NetworkMode::None
            || requested == NetworkMode::None
            || active == requested;
        prop_assert_eq!(active.check(requested).is_ok(), allowed);
    }
}
