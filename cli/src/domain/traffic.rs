//! `tc` command builders for latency/loss manipulation and bandwidth shaping.
//!
//! Both mechanisms attach qdiscs to the host-side virtual interface of a
//! container, so they cannot be active at the same time.

/// Options for `netem` based traffic manipulation. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetemOptions {
    /// Added delay in milliseconds.
    pub latency_ms: Option<u32>,
    /// Standard deviation of the delay in milliseconds. Needs `latency_ms`.
    pub latency_sd_ms: Option<u32>,
    /// Packet loss percentage.
    pub loss_pct: Option<f64>,
    /// Correlation of successive losses, in percent. Needs `loss_pct`.
    pub loss_corr_pct: Option<f64>,
    /// Packet duplication percentage.
    pub duplication_pct: Option<f64>,
    /// Packet corruption percentage.
    pub corruption_pct: Option<f64>,
}

impl NetemOptions {
    /// Whether no manipulation was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latency_ms.is_none()
            && self.loss_pct.is_none()
            && self.duplication_pct.is_none()
            && self.corruption_pct.is_none()
    }
}

/// The `netem` qdisc command for `interface`, or `None` when `opts` is empty.
#[must_use]
pub fn netem_command(interface: &str, opts: &NetemOptions) -> Option<String> {
    if opts.is_empty() {
        return None;
    }
    let mut parts = vec![format!("sudo tc qdisc add dev {interface} root netem")];
    if let Some(latency) = opts.latency_ms {
        parts.push(format!("delay {latency}ms"));
        parts.extend(opts.latency_sd_ms.map(|sd| format!("{sd}ms")));
    }
    if let Some(loss) = opts.loss_pct {
        parts.push(format!("loss {loss}%"));
        parts.extend(opts.loss_corr_pct.map(|corr| format!("{corr}%")));
    }
    parts.extend(opts.duplication_pct.map(|dup| format!("duplicate {dup}%")));
    parts.extend(opts.corruption_pct.map(|corrupt| format!("corrupt {corrupt}%")));
    Some(parts.join(" "))
}

fn burst_kbit(rate_kbps: u32) -> u32 {
    (rate_kbps / 10).max(32)
}

/// Commands limiting bandwidth on `interface`, in kilobits per second.
///
/// Download traffic leaves the host towards the container and is shaped with
/// a token bucket; upload traffic enters the host from the container and is
/// policed on the ingress qdisc.
#[must_use]
pub fn shape_commands(
    interface: &str,
    download_kbps: Option<u32>,
    upload_kbps: Option<u32>,
) -> Vec<String> {
    let mut cmds = Vec::new();
    if let Some(rate) = download_kbps {
        cmds.push(format!(
            "sudo tc qdisc add dev {interface} root tbf rate {rate}kbit burst {}kbit latency 400ms",
            burst_kbit(rate)
        ));
    }
    if let Some(rate) = upload_kbps {
        cmds.push(format!("sudo tc qdisc add dev {interface} handle ffff: ingress"));
        cmds.push(format!(
            "sudo tc filter add dev {interface} parent ffff: protocol ip u32 match u32 0 0 \
             police rate {rate}kbit burst {}kbit drop flowid :1",
            burst_kbit(rate)
        ));
    }
    cmds
}

/// Commands removing every qdisc this module may have attached.
#[must_use]
pub fn reset_commands(interface: &str) -> Vec<String> {
    vec![
        format!("sudo tc qdisc del dev {interface} root"),
        format!("sudo tc qdisc del dev {interface} ingress"),
    ]
}
