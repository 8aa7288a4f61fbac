//! Core execution operations

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::ssh::{sanitize_command, CommandOutput, CommandRunner};

/// Command used to identify the NAS in a status report
pub const STATUS_COMMAND: &str = "hostname && uname -a";

/// Deadline for the status command
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Run an arbitrary command
///
/// `timeout` falls back to the runner's default. Empty commands are rejected
/// before anything is sent.
pub async fn execute(
    runner: &dyn CommandRunner,
    command: &str,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    let command = sanitize_command(command)?;
    let timeout = timeout.unwrap_or_else(|| runner.default_timeout());
    debug!("execute: {} (timeout {:?})", command, timeout);
    runner.run(command, timeout).await
}

/// Connection state shown by `ssh_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Error,
}

/// Connection status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: ConnectionState,

    /// `host:port`
    pub host: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// `hostname` and `uname -a` output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionState::Connected
    }
}

/// Identify the NAS, connecting if needed
///
/// Never fails: connection and command problems are reported in the record.
pub async fn check_status(runner: &dyn CommandRunner) -> StatusReport {
    let host = runner.endpoint();

    match runner.run(STATUS_COMMAND, STATUS_TIMEOUT).await {
        Ok(output) if output.success() => StatusReport {
            status: ConnectionState::Connected,
            host,
            user: Some(runner.username().to_string()),
            system: Some(output.stdout.trim().to_string()),
            error: None,
        },
        Ok(output) => StatusReport {
            status: ConnectionState::Error,
            host,
            user: None,
            system: None,
            error: Some(format!(
                "Status command exited with status {}: {}",
                output
                    .exit_code
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                output.stderr.trim()
            )),
        },
        Err(e) => StatusReport {
            status: ConnectionState::Error,
            host,
            user: None,
            system: None,
            error: Some(e.to_string()),
        },
    }
}
