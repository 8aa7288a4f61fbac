//! Service management operations

use serde::Serialize;

use super::Outcome;
use crate::error::Result;
use crate::ssh::{quote, CommandRunner};

/// Service state as reported by systemd or a SysV init script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: String,

    /// Whether the service appears to be running
    pub running: bool,

    /// systemd `Loaded:` line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<String>,

    /// systemd active state (`active`, `inactive`, `failed`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,

    /// systemd sub-state (`running`, `exited`, `dead`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_pid: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<u32>,

    /// Unparsed command output
    pub output: String,
}

/// Build the status command
///
/// `systemctl status` exits 0 for running units and 3 for stopped ones. Any
/// other status (no systemctl, systemd not booted, unknown unit) falls
/// through to the `service` wrapper.
pub fn service_status_command(name: &str) -> String {
    let name = quote(name);
    format!(
        "systemctl status --no-pager {name} 2>&1; rc=$?; if [ $rc -eq 0 ] || [ $rc -eq 3 ]; then exit $rc; fi; service {name} status 2>&1"
    )
}

/// Interpret `systemctl status` or `service <name> status` output
pub fn parse_service_status(name: &str, stdout: &str, exit_code: Option<u32>) -> ServiceStatus {
    let mut status = ServiceStatus {
        name: name.to_string(),
        exit_code,
        output: stdout.trim_end().to_string(),
        ..Default::default()
    };

    for line in stdout.lines().map(str::trim) {
        if let Some(loaded) = line.strip_prefix("Loaded:") {
            status.loaded = Some(loaded.trim().to_string());
        } else if let Some(active) = line.strip_prefix("Active:") {
            // "active (running) since Mon 2024-05-01 10:00:00 UTC; 2h ago"
            let active = active.trim();
            status.active = active.split_whitespace().next().map(str::to_string);
            status.sub_state = active
                .split_once('(')
                .and_then(|(_, rest)| rest.split_once(')'))
                .map(|(sub, _)| sub.to_string());
        } else if let Some(pid) = line.strip_prefix("Main PID:") {
            status.main_pid = pid
                .split_whitespace()
                .next()
                .and_then(|pid| pid.parse().ok());
        }
    }

    status.running = match status.active.as_deref() {
        Some(active) => active == "active" && status.sub_state.as_deref() != Some("exited"),
        None => {
            let lower = status.output.to_lowercase();
            lower.contains("is running") || lower.contains("start/running")
        }
    };

    status
}

/// Check the status of a service
///
/// `systemctl status` exits 3 for stopped units, so a non-zero exit with output
/// is still interpreted; only a silent failure is reported as such.
pub async fn service_status(
    runner: &dyn CommandRunner,
    name: &str,
) -> Result<Outcome<ServiceStatus>> {
    let output = runner
        .run(&service_status_command(name), runner.default_timeout())
        .await?;

    if output.stdout.trim().is_empty() && !output.success() {
        return Ok(Outcome::Failed(output));
    }
    Ok(Outcome::Done(parse_service_status(
        name,
        &output.stdout,
        output.exit_code,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::ScriptedRunner;

    const SYSTEMD_ACTIVE: &str = "● docker.service - Docker Application Container Engine
     Loaded: loaded (/lib/systemd/system/docker.service; enabled; vendor preset: enabled)
     Active: active (running) since Wed 2024-05-01 10:00:00 UTC; 2h 3min ago
   Main PID: 812 (dockerd)
      Tasks: 21
";

    const SYSTEMD_INACTIVE: &str = "○ nfs-server.service - NFS server and services
     Loaded: loaded (/lib/systemd/system/nfs-server.service; disabled)
     Active: inactive (dead)
";

    #[test]
    fn test_service_status_command() {
        assert_eq!(
            service_status_command("docker"),
            "systemctl status --no-pager 'docker' 2>&1; rc=$?; if [ $rc -eq 0 ] || [ $rc -eq 3 ]; then exit $rc; fi; service 'docker' status 2>&1"
        );
    }

    #[test]
    fn test_parse_systemd_active() {
        let status = parse_service_status("docker", SYSTEMD_ACTIVE, Some(0));
        assert!(status.running);
        assert_eq!(status.active.as_deref(), Some("active"));
        assert_eq!(status.sub_state.as_deref(), Some("running"));
        assert_eq!(status.main_pid, Some(812));
        assert!(status.loaded.unwrap().starts_with("loaded"));
    }

    #[test]
    fn test_parse_systemd_inactive() {
        let status = parse_service_status("nfs-server", SYSTEMD_INACTIVE, Some(3));
        assert!(!status.running);
        assert_eq!(status.active.as_deref(), Some("inactive"));
        assert_eq!(status.sub_state.as_deref(), Some("dead"));
        assert_eq!(status.exit_code, Some(3));
    }

    #[test]
    fn test_parse_sysv_output() {
        assert!(parse_service_status("sshd", "sshd is running.\n", Some(0)).running);
        assert!(!parse_service_status("sshd", "sshd is not running\n", Some(3)).running);
    }

    #[tokio::test]
    async fn test_service_status_inactive_is_not_a_failure() {
        let runner = ScriptedRunner::new().exit(3, SYSTEMD_INACTIVE, "");
        let status = service_status(&runner, "nfs-server")
            .await
            .unwrap()
            .done()
            .unwrap();
        assert_eq!(status.name, "nfs-server");
        assert!(!status.running);
    }

    #[tokio::test]
    async fn test_service_status_without_systemd_uses_service() {
        let runner = ScriptedRunner::new().ok(
            "System has not been booted with systemd as init system (PID 1). Can't operate.
Failed to connect to bus: Host is down
 * sshd is running
",
        );
        let status = service_status(&runner, "sshd")
            .await
            .unwrap()
            .done()
            .unwrap();
        assert!(status.running);
        assert!(status.active.is_none());
        assert!(runner.commands()[0].ends_with("service 'sshd' status 2>&1"));
    }

    #[tokio::test]
    async fn test_service_status_silent_failure() {
        let runner = ScriptedRunner::new().exit(127, "", "");
        let outcome = service_status(&runner, "ghost").await.unwrap();
        assert!(!outcome.is_done());
    }
}
