//! Docker operations on the NAS

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Outcome;
use crate::error::Result;
use crate::ssh::{quote, CommandOutput, CommandRunner};

/// `docker logs` can be slow on large log files
pub const DOCKER_LOGS_TIMEOUT: Duration = Duration::from_secs(60);

/// One container as reported by `docker ps --format '{{json .}}'`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerInfo {
    #[serde(rename(deserialize = "ID"))]
    pub id: String,
    #[serde(rename(deserialize = "Names"))]
    pub names: String,
    #[serde(rename(deserialize = "Image"))]
    pub image: String,
    #[serde(rename(deserialize = "State"))]
    pub state: String,
    #[serde(rename(deserialize = "Status"))]
    pub status: String,
    #[serde(rename(deserialize = "Ports"))]
    pub ports: String,
    #[serde(rename(deserialize = "CreatedAt"))]
    pub created_at: String,
    #[serde(rename(deserialize = "Command"))]
    pub command: String,
}

/// Build the container listing command (one JSON object per line)
pub fn docker_ps_command(all: bool) -> String {
    if all {
        "docker ps -a --format '{{json .}}'".to_string()
    } else {
        "docker ps --format '{{json .}}'".to_string()
    }
}

/// Parse `docker ps --format '{{json .}}'` output; unreadable lines are skipped
pub fn parse_docker_ps(stdout: &str) -> Vec<ContainerInfo> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ContainerInfo>(line) {
            Ok(container) => Some(container),
            Err(e) => {
                debug!("Skipping unparsable docker ps line: {}", e);
                None
            }
        })
        .collect()
}

/// List containers, including stopped ones when `all` is set
pub async fn docker_ps(
    runner: &dyn CommandRunner,
    all: bool,
) -> Result<Outcome<Vec<ContainerInfo>>> {
    let output = runner
        .run(&docker_ps_command(all), runner.default_timeout())
        .await?;
    Ok(Outcome::from_output(output, |o| parse_docker_ps(&o.stdout)))
}

/// Build the log tail command; the container's stdout and stderr are merged
/// in arrival order
pub fn docker_logs_command(container: &str, lines: u32) -> String {
    format!("docker logs --tail {} {} 2>&1", lines, quote(container))
}

/// Last `lines` lines of a container's log
pub async fn docker_logs(
    runner: &dyn CommandRunner,
    container: &str,
    lines: u32,
) -> Result<CommandOutput> {
    runner
        .run(&docker_logs_command(container, lines), DOCKER_LOGS_TIMEOUT)
        .await
}
