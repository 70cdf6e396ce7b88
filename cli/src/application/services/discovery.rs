//! Application service — topology discovery use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::application::ports::{HostResolver, PlatformExecutor, ProgressReporter};
use crate::domain::parse::{self, ActualLrp, VcapServices};
use crate::domain::remote::{LIST_INTERFACES, container_id_command};
use crate::domain::{
    App, AppInstance, CUSTOM_SERVICE_TYPE, ChaosConfig, CustomServiceConfig, DiscoveryError,
    Endpoint, PortSpec, Protocol, Service,
};

/// Identifies the application to discover.
#[derive(Debug, Clone, Copy)]
pub struct AppRef<'a> {
    pub org: &'a str,
    pub space: &'a str,
    pub name: &'a str,
}

/// Map `(org, space, name)` to a fully populated [`App`].
///
/// Each step is a hard gate: the first failing step aborts discovery.
///
/// # Errors
///
/// Returns a [`DiscoveryError`] naming the failed step. `GuidNotFound` and
/// `EnvironmentQuery` are fatal (see [`DiscoveryError::is_fatal`]).
pub async fn discover(
    exec: &impl PlatformExecutor,
    resolver: &impl HostResolver,
    cfg: &ChaosConfig,
    reporter: &impl ProgressReporter,
    target: AppRef<'_>,
) -> Result<App> {
    let AppRef { org, space, name } = target;

    reporter.step(&format!("targeting {org}/{space}..."));
    let out = exec
        .run(&cfg.cf.cmd, &["target", "-o", org, "-s", space])
        .await?;
    if !out.success() {
        error!(org, space, code = out.code, "failed to target org and space");
        return Err(DiscoveryError::Target {
            org: org.to_string(),
            space: space.to_string(),
        }
        .into());
    }

    let mut app = App::new(org, space, name);
    for custom in &cfg.services {
        app.services.push(custom_service(resolver, custom).await?);
    }

    reporter.step(&format!("resolving GUID of {name}..."));
    let guid = find_guid(exec, cfg, name).await?;
    app.guid = Some(guid.clone());

    reporter.step("enumerating instances...");
    app.instances = find_instances(exec, cfg, &guid).await?;

    reporter.step("resolving bound services...");
    app.services.extend(find_services(exec, resolver, cfg, name).await?);

    info!(app = name, org, space, "successfully discovered application");
    if let Ok(json) = app.to_json_pretty() {
        debug!("{json}");
    }
    reporter.success(&format!(
        "discovered {} ({} instances, {} services)",
        app.id(),
        app.len(),
        app.services.len()
    ));
    Ok(app)
}

/// Build a custom service descriptor, resolving `host` via DNS.
///
/// # Errors
///
/// Returns `DiscoveryError::Resolve` if the host cannot be resolved.
pub async fn custom_service(
    resolver: &impl HostResolver,
    custom: &CustomServiceConfig,
) -> Result<Service> {
    let addr = resolve(resolver, &custom.name, &custom.host).await?;
    let service = Service {
        name: custom.name.clone(),
        kind: CUSTOM_SERVICE_TYPE.to_string(),
        user: custom.user.clone(),
        password: custom.password.clone(),
        hosts: custom
            .ports
            .iter()
            .map(|&(protocol, port)| Endpoint::new(addr.clone(), protocol, port))
            .collect(),
    };
    info!(%service, "added custom service");
    Ok(service)
}

async fn resolve(resolver: &impl HostResolver, service: &str, host: &str) -> Result<String> {
    resolver.resolve(host).await.map_err(|e| {
        error!(service, host, error = %e, "failed to resolve service host");
        DiscoveryError::Resolve {
            service: service.to_string(),
            host: host.to_string(),
        }
        .into()
    })
}

/// GUID of `name` in the targeted space; the first line of `cf app --guid`.
///
/// # Errors
///
/// Returns the fatal `DiscoveryError::GuidNotFound` on a non-zero exit or
/// empty output.
pub async fn find_guid(exec: &impl PlatformExecutor, cfg: &ChaosConfig, name: &str) -> Result<String> {
    let out = exec.run(&cfg.cf.cmd, &["app", name, "--guid"]).await?;
    let guid = out.stdout.lines().next().map(str::trim).unwrap_or_default();
    if !out.success() || guid.is_empty() {
        error!(app = name, code = out.code, "failed to resolve application GUID");
        return Err(DiscoveryError::GuidNotFound {
            app: name.to_string(),
        }
        .into());
    }
    debug!(app = name, guid, "resolved application GUID");
    Ok(guid.to_string())
}

/// Running instances of the app identified by `guid`, in platform order.
///
/// # Errors
///
/// Returns `DiscoveryError::NoInstances` when the platform reports no
/// instance for the GUID, or none of them is running.
pub async fn find_instances(
    exec: &impl PlatformExecutor,
    cfg: &ChaosConfig,
    guid: &str,
) -> Result<Vec<AppInstance>> {
    let no_instances = || DiscoveryError::NoInstances {
        guid: guid.to_string(),
    };

    let listing = format!("{} actual-lrps", cfg.cfdot.cmd);
    let out = exec.run_on_host(&cfg.bosh.cfdot_host, &[listing]).await?;
    if !out.success() {
        error!(host = %cfg.bosh.cfdot_host, code = out.code, "failed to list actual LRPs");
        return Err(no_instances().into());
    }

    let raw: Vec<ActualLrp> = parse::parse_actual_lrps(&out.stdout)
        .into_iter()
        .filter(|lrp| lrp.belongs_to(guid))
        .collect();
    if raw.is_empty() {
        warn!(guid, "no application instances found");
        return Err(no_instances().into());
    }

    let mut instances = Vec::new();
    for lrp in raw.iter().filter(|lrp| lrp.is_running()) {
        let instance = resolve_instance(exec, cfg, lrp).await?;
        info!(%instance, "found instance");
        instances.push(instance);
    }
    if instances.is_empty() {
        warn!(guid, reported = raw.len(), "no running application instances");
        return Err(no_instances().into());
    }
    Ok(instances)
}

async fn resolve_instance(
    exec: &impl PlatformExecutor,
    cfg: &ChaosConfig,
    lrp: &ActualLrp,
) -> Result<AppInstance> {
    let host_id = lrp.host_id();
    let container_ip = lrp.instance_address.clone();

    let out = exec.run_on_host(&host_id, &[LIST_INTERFACES.to_string()]).await?;
    let virtual_interface = if out.success() {
        parse::find_virtual_interface(&out.stdout, &container_ip)
    } else {
        None
    };
    if virtual_interface.is_none() {
        warn!(host = %host_id, container = %container_ip, "could not find virtual interface");
    }

    let out = exec
        .run_on_host(&host_id, &[container_id_command(&container_ip)])
        .await?;
    let container_id = if out.success() {
        parse::parse_container_id(&out.stdout, &container_ip)
    } else {
        error!(host = %host_id, code = out.code, "failed to read container id from rep log");
        None
    };

    Ok(AppInstance {
        host_id,
        host_ip: lrp.address.clone(),
        container_id,
        container_ip,
        app_ports: parse::tracked_port_pairs(&lrp.ports, cfg),
        virtual_interface,
    })
}

/// Services bound to `name`, read from `VCAP_SERVICES` in `cf env`.
///
/// # Errors
///
/// Returns the fatal `DiscoveryError::EnvironmentQuery` if `cf env` fails or
/// prints no JSON, `DiscoveryError::Services` if more than one
/// `VCAP_SERVICES` block is present, and `DiscoveryError::Resolve` if a
/// service host does not resolve.
pub async fn find_services(
    exec: &impl PlatformExecutor,
    resolver: &impl HostResolver,
    cfg: &ChaosConfig,
    name: &str,
) -> Result<Vec<Service>> {
    let out = exec.run(&cfg.cf.cmd, &["env", name]).await?;
    let env_error = || DiscoveryError::EnvironmentQuery {
        app: name.to_string(),
    };
    if !out.success() {
        return Err(env_error().into());
    }

    let vcap = match parse::find_vcap_services(&out.stdout) {
        VcapServices::Found(vcap) => vcap,
        VcapServices::Absent => {
            info!(app = name, "no services found");
            return Ok(Vec::new());
        }
        VcapServices::Unreadable => return Err(env_error().into()),
        VcapServices::Ambiguous(n) => {
            return Err(DiscoveryError::Services(format!(
                "found {n} VCAP_SERVICES blocks in the environment of {name}"
            ))
            .into());
        }
    };

    let mut services = Vec::new();
    for binding in parse::service_bindings(&vcap) {
        let mut hosts = Vec::with_capacity(binding.hosts.len());
        for (host, port) in &binding.hosts {
            let addr = resolve(resolver, &binding.name, host).await?;
            let port = port.map_or(PortSpec::All, PortSpec::Number);
            hosts.push(Endpoint::new(addr, Protocol::Tcp, port));
        }
        let service = Service {
            name: binding.name,
            kind: binding.kind,
            user: binding.user,
            password: binding.password,
            hosts,
        };
        info!(%service, "found service");
        services.push(service);
    }
    Ok(services)
}

/// Public routes of the app with `guid`, as `host.domain[/path]`.
///
/// # Errors
///
/// Returns the fatal `DiscoveryError::RouteQuery` if either `cf curl` call
/// fails or its output cannot be read.
pub async fn find_routes(
    exec: &impl PlatformExecutor,
    cfg: &ChaosConfig,
    guid: &str,
) -> Result<Vec<String>> {
    let route_error = || DiscoveryError::RouteQuery {
        guid: guid.to_string(),
    };
    let path = format!("/v2/apps/{guid}/routes");
    let out = exec.run(&cfg.cf.cmd, &["curl", &path]).await?;
    if !out.success() {
        return Err(route_error().into());
    }

    let mut routes = Vec::new();
    for entity in parse::parse_route_entities(&out.stdout) {
        let out = exec.run(&cfg.cf.cmd, &["curl", &entity.domain_url]).await?;
        let domain = out
            .success()
            .then(|| parse::parse_domain_name(&out.stdout))
            .flatten()
            .ok_or_else(route_error)?;
        let route = parse::format_route(&entity.host, &domain, entity.path.as_deref().unwrap_or(""));
        debug!(%route, "found route");
        routes.push(route);
    }
    info!(guid, routes = routes.len(), "resolved routes");
    Ok(routes)
}
