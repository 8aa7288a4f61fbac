//! Tool catalogue
//!
//! The fixed set of `ssh_*` tools shared by both adapter surfaces: the MCP
//! server ([`crate::server`]) and the agent toolkit ([`crate::agent`]). Each
//! tool has a typed parameter struct whose JSON schema is derived with
//! `schemars`, and [`Toolbox::call`] dispatches a tool by name to the
//! operations in [`crate::ops`].

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SshNasError};
use crate::ops::{self, docker, exec, files, services, system, Outcome};
use crate::ssh::{CommandOutput, CommandRunner};

/// JSON object type used for tool arguments and schemas
pub type JsonObject = serde_json::Map<String, Value>;

/// Parameters for `ssh_execute`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ExecuteParams {
    /// The shell command to execute on the NAS
    pub command: String,

    /// Command timeout in seconds (default: server setting, 30)
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Parameters for tools that take none
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct NoParams {}

/// Parameters for `ssh_list_files`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ListFilesParams {
    /// Directory path to list (default: home directory)
    #[serde(default = "default_path")]
    pub path: String,

    /// Include hidden files
    #[serde(default)]
    pub all: bool,

    /// Use long listing format with details
    #[serde(default = "default_true")]
    pub long: bool,
}

/// Parameters for `ssh_read_file`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ReadFileParams {
    /// Path to the file to read
    pub path: String,

    /// Number of lines to read (default: all). Use negative for tail.
    #[serde(default)]
    pub lines: Option<i64>,
}

/// Parameters for `ssh_write_file`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct WriteFileParams {
    /// Path to the file to write
    pub path: String,

    /// Content to write to the file
    pub content: String,

    /// Append to file instead of overwriting
    #[serde(default)]
    pub append: bool,
}

/// Parameters for `ssh_file_exists`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FileExistsParams {
    /// Path to check
    pub path: String,
}

/// Parameters for `ssh_disk_usage`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DiskUsageParams {
    /// Specific path to check (default: all filesystems)
    #[serde(default)]
    pub path: Option<String>,
}

/// Parameters for `ssh_process_list`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ProcessListParams {
    /// Filter processes by name (grep pattern)
    #[serde(default)]
    pub filter: Option<String>,

    /// Limit to top N processes by CPU
    #[serde(default = "default_top")]
    pub top: u32,
}

/// Parameters for `ssh_docker_ps`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DockerPsParams {
    /// Show all containers (including stopped)
    #[serde(default)]
    pub all: bool,
}

/// Parameters for `ssh_docker_logs`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DockerLogsParams {
    /// Container name or ID
    pub container: String,

    /// Number of lines to show
    #[serde(default = "default_lines")]
    pub lines: u32,
}

/// Parameters for `ssh_service_status`
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ServiceStatusParams {
    /// Service name to check
    pub service: String,
}

fn default_path() -> String {
    "~".to_string()
}

fn default_true() -> bool {
    true
}

fn default_top() -> u32 {
    20
}

fn default_lines() -> u32 {
    100
}

/// A tool as advertised to clients
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonObject,
}

impl ToolInfo {
    fn new<P: JsonSchema>(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            input_schema: schema_of::<P>(),
        }
    }
}

/// JSON schema of a parameter struct, as a bare object schema
fn schema_of<P: JsonSchema>() -> JsonObject {
    match serde_json::to_value(schemars::schema_for!(P)) {
        Ok(Value::Object(mut schema)) => {
            schema.remove("$schema");
            schema.remove("title");
            schema
        }
        _ => {
            let mut schema = JsonObject::new();
            schema.insert("type".to_string(), Value::from("object"));
            schema
        }
    }
}

/// The full tool catalogue
pub fn catalogue() -> Vec<ToolInfo> {
    vec![
        ToolInfo::new::<ExecuteParams>(
            "ssh_execute",
            "Execute a command on the NAS via SSH. Use this to run shell commands, check system status, manage files, etc.",
        ),
        ToolInfo::new::<NoParams>(
            "ssh_status",
            "Check the SSH connection status to the NAS. Returns JSON with connection status, host info, and system details.",
        ),
        ToolInfo::new::<ListFilesParams>(
            "ssh_list_files",
            "List files and directories at a given path on the NAS. The path is taken literally (no glob expansion); use ssh_execute for wildcards.",
        ),
        ToolInfo::new::<ReadFileParams>(
            "ssh_read_file",
            "Read the contents of a file on the NAS. The path is taken literally (no glob expansion); use ssh_execute for wildcards.",
        ),
        ToolInfo::new::<WriteFileParams>(
            "ssh_write_file",
            "Write content to a file on the NAS (creates or overwrites).",
        ),
        ToolInfo::new::<FileExistsParams>(
            "ssh_file_exists",
            "Check if a file or directory exists on the NAS. Returns JSON with existence status and file info.",
        ),
        ToolInfo::new::<NoParams>(
            "ssh_system_info",
            "Get NAS system information (hostname, OS, uptime, load).",
        ),
        ToolInfo::new::<DiskUsageParams>(
            "ssh_disk_usage",
            "Get disk usage information from the NAS.",
        ),
        ToolInfo::new::<NoParams>(
            "ssh_memory_usage",
            "Get memory usage information from the NAS.",
        ),
        ToolInfo::new::<ProcessListParams>(
            "ssh_process_list",
            "List running processes on the NAS.",
        ),
        ToolInfo::new::<DockerPsParams>(
            "ssh_docker_ps",
            "List Docker containers on the NAS.",
        ),
        ToolInfo::new::<DockerLogsParams>(
            "ssh_docker_logs",
            "Get logs from a Docker container on the NAS.",
        ),
        ToolInfo::new::<ServiceStatusParams>(
            "ssh_service_status",
            "Check status of a service on the NAS (systemctl/service).",
        ),
    ]
}

/// Text result of a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,

    /// The tool ran but the remote operation failed
    pub is_error: bool,
}

impl ToolReply {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Dispatches catalogue tools against a command runner
#[derive(Clone)]
pub struct Toolbox {
    runner: Arc<dyn CommandRunner>,
}

impl Toolbox {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run the tool `name` with JSON `arguments`
    ///
    /// Remote failures (connection problems, non-zero exits) come back as a
    /// [`ToolReply`] with `is_error` set. Only an unknown tool name or
    /// arguments that do not match the tool's schema are returned as
    /// [`SshNasError::InvalidParams`].
    pub async fn call(&self, name: &str, arguments: JsonObject) -> Result<ToolReply> {
        debug!("Tool call: {}", name);
        let runner = self.runner.as_ref();

        let reply = match name {
            "ssh_execute" => {
                let p: ExecuteParams = parse_params(arguments)?;
                let timeout = p.timeout.filter(|secs| *secs > 0).map(Duration::from_secs);
                text_reply(exec::execute(runner, &p.command, timeout).await)
            }
            "ssh_status" => {
                let _: NoParams = parse_params(arguments)?;
                let report = exec::check_status(runner).await;
                ToolReply {
                    text: to_json(&report),
                    is_error: !report.is_connected(),
                }
            }
            "ssh_list_files" => {
                let p: ListFilesParams = parse_params(arguments)?;
                text_reply(files::list_files(runner, &p.path, p.all, p.long).await)
            }
            "ssh_read_file" => {
                let p: ReadFileParams = parse_params(arguments)?;
                outcome_reply(files::read_file(runner, &p.path, p.lines).await, |content| content)
            }
            "ssh_write_file" => {
                let p: WriteFileParams = parse_params(arguments)?;
                outcome_reply(
                    files::write_file(runner, &p.path, &p.content, p.append).await,
                    |()| format!("Successfully wrote to {}", p.path),
                )
            }
            "ssh_file_exists" => {
                let p: FileExistsParams = parse_params(arguments)?;
                outcome_reply(files::file_exists(runner, &p.path).await, |r| to_json(&r))
            }
            "ssh_system_info" => {
                let _: NoParams = parse_params(arguments)?;
                outcome_reply(system::system_info(runner).await, |r| to_json(&r))
            }
            "ssh_disk_usage" => {
                let p: DiskUsageParams = parse_params(arguments)?;
                outcome_reply(system::disk_usage(runner, p.path.as_deref()).await, |r| {
                    to_json(&r)
                })
            }
            "ssh_memory_usage" => {
                let _: NoParams = parse_params(arguments)?;
                outcome_reply(system::memory_usage(runner).await, |r| to_json(&r))
            }
            "ssh_process_list" => {
                let p: ProcessListParams = parse_params(arguments)?;
                outcome_reply(
                    system::process_list(runner, p.filter.as_deref(), p.top).await,
                    |r| to_json(&r),
                )
            }
            "ssh_docker_ps" => {
                let p: DockerPsParams = parse_params(arguments)?;
                outcome_reply(docker::docker_ps(runner, p.all).await, |r| to_json(&r))
            }
            "ssh_docker_logs" => {
                let p: DockerLogsParams = parse_params(arguments)?;
                text_reply(docker::docker_logs(runner, &p.container, p.lines).await)
            }
            "ssh_service_status" => {
                let p: ServiceStatusParams = parse_params(arguments)?;
                outcome_reply(services::service_status(runner, &p.service).await, |r| {
                    to_json(&r)
                })
            }
            _ => {
                return Err(SshNasError::invalid_params(format!(
                    "Unknown tool: {}",
                    name
                )))
            }
        };

        Ok(reply)
    }
}

fn parse_params<P: DeserializeOwned>(arguments: JsonObject) -> Result<P> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| SshNasError::invalid_params(format!("Invalid arguments: {}", e)))
}

fn text_reply(result: Result<CommandOutput>) -> ToolReply {
    match result {
        Ok(output) => ToolReply {
            text: ops::format_output(&output),
            is_error: !output.success(),
        },
        Err(e) => ToolReply::error(ops::format_error(&e)),
    }
}

fn outcome_reply<T>(result: Result<Outcome<T>>, render: impl FnOnce(T) -> String) -> ToolReply {
    match result {
        Ok(Outcome::Done(value)) => ToolReply::success(render(value)),
        Ok(Outcome::Failed(output)) => ToolReply::error(ops::format_output(&output)),
        Err(e) => ToolReply::error(ops::format_error(&e)),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("Error: failed to serialize result: {}", e))
}
