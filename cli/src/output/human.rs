//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::domain::App;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the discovered topology of an application.
    pub fn render_app(&self, app: &App) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header(&app.id());
        self.ctx.field("GUID:", app.guid.as_deref().unwrap_or("(unknown)"));
        println!();

        self.ctx.header(&format!("Instances ({}):", app.len()));
        for inst in &app.instances {
            let ports: Vec<String> = inst
                .app_ports
                .iter()
                .map(|(host, cont)| format!("{host}->{cont}"))
                .collect();
            println!(
                "    {:<22} {:<16} {:<12} {}",
                inst.host_id,
                inst.container_ip,
                inst.virtual_interface.as_deref().unwrap_or("-"),
                ports.join(",").style(self.ctx.styles.dim)
            );
        }
        println!();

        self.ctx.header(&format!("Services ({}):", app.services.len()));
        if app.services.is_empty() {
            println!("    {}", "(none)".style(self.ctx.styles.dim));
        }
        for svc in &app.services {
            let hosts: Vec<String> = svc
                .hosts
                .iter()
                .map(|ep| format!("{}/{}:{}", ep.address(), ep.protocol(), ep.port()))
                .collect();
            println!(
                "    {:<20} {:<14} {}",
                svc.name,
                svc.kind.style(self.ctx.styles.accent),
                hosts.join(", ")
            );
        }
    }

    /// Render application routes, one per line.
    pub fn render_routes(&self, routes: &[String]) {
        if routes.is_empty() {
            self.ctx.info("No routes are mapped to this application.");
            return;
        }
        for route in routes {
            println!("{route}");
        }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if !self.ctx.quiet {
            println!("faultline {version}");
        }
    }
}
