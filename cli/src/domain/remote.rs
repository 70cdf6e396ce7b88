//! Remote shell command builders for diagnostics and process control.

use anyhow::Result;

use crate::domain::error::ConfigError;

/// Directory holding monit-managed pid files on platform hosts.
pub const PID_DIR: &str = "/var/vcap/sys/run";

/// Path to the monit binary on platform hosts.
pub const MONIT_BIN: &str = "/var/vcap/bosh/bin/monit";

/// Log of the cell rep, which records container GUIDs by address.
pub const REP_LOG: &str = "/var/vcap/sys/log/rep/rep.stdout.log";

const RUNC: &str = "sudo /var/vcap/packages/runc/bin/runc --root /run/containerd/runc/garden";

/// Lists network interfaces and their addresses.
pub const LIST_INTERFACES: &str = "ip a";

/// Wrap `cmds` into a script that runs every command and exits with the last
/// non-zero status, or 0 when all succeeded.
#[must_use]
pub fn batch_script(cmds: &[String]) -> String {
    let mut script = String::from("rc=0\n");
    for cmd in cmds {
        script.push_str(cmd);
        script.push_str(" || rc=$?\n");
    }
    script.push_str("exit $rc\n");
    script
}

/// Rep log lines kept per lookup. Older entries for the address are dropped.
pub const REP_LOG_TAIL: usize = 20;

/// Command printing the latest rep log lines mentioning `container_ip` as a
/// whole word, so `10.255.0.9` does not match `10.255.0.90`.
#[must_use]
pub fn container_id_command(container_ip: &str) -> String {
    format!("sudo cat {REP_LOG} | grep -Fw -e '{container_ip}' | tail -n {REP_LOG_TAIL}")
}

/// Validates a monit job name before it is spliced into a shell command.
///
/// # Errors
///
/// Returns an error if the name is empty or contains characters outside
/// `[A-Za-z0-9_.-]`.
pub fn validate_process_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(ConfigError::InvalidValue {
            key: "process",
            value: name.to_string(),
            expected: "a monit job name matching [A-Za-z0-9_.-]+",
        }
        .into());
    }
    Ok(())
}

/// Command listing pid files that belong to `process`.
#[must_use]
pub fn find_pid_files_command(process: &str) -> String {
    format!("find {PID_DIR} | grep {process} | grep --color=never pid")
}

/// Commands that stop monit from restarting `process`, then kill every pid.
#[must_use]
pub fn kill_monit_commands(process: &str, pid_files: &[String]) -> Vec<String> {
    let mut cmds = vec![format!("sudo {MONIT_BIN} unmonitor {process}")];
    cmds.extend(pid_files.iter().map(|pf| format!("sudo kill $(cat {pf})")));
    cmds
}

/// Command that (re)starts a monit job.
#[must_use]
pub fn start_monit_command(process: &str) -> String {
    format!("sudo {MONIT_BIN} start {process}")
}

/// Command that hard-kills a container.
#[must_use]
pub fn crash_command(container_id: &str) -> String {
    format!("{RUNC} kill {container_id} KILL")
}
