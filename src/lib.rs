//! SSH NAS MCP Server - remote administration tools for a NAS over SSH
//!
//! This crate keeps one persistent, password-authenticated SSH session to a
//! NAS and exposes a fixed catalogue of administration tools through two
//! surfaces: an MCP server on stdio and a function-calling toolkit for agent
//! frameworks.
//!
//! # Features
//!
//! - Lazy, auto-reconnecting SSH session shared by every tool
//! - Per-call command timeouts
//! - Structured (JSON) results for status, system, docker and service queries
//! - Non-zero exit codes reported as tool errors with stdout and stderr
//!
//! # Tools
//!
//! | Tool | Description |
//! |------|-------------|
//! | `ssh_execute` | Run an arbitrary shell command |
//! | `ssh_status` | Connection status and host identity |
//! | `ssh_list_files` | List a directory |
//! | `ssh_read_file` | Read a file (optionally head/tail) |
//! | `ssh_write_file` | Write or append to a file |
//! | `ssh_file_exists` | Check a path and describe it |
//! | `ssh_system_info` | Hostname, OS, uptime, load |
//! | `ssh_disk_usage` | Filesystem usage |
//! | `ssh_memory_usage` | Memory and swap usage |
//! | `ssh_process_list` | Running processes |
//! | `ssh_docker_ps` | Docker containers |
//! | `ssh_docker_logs` | Docker container logs |
//! | `ssh_service_status` | systemd / SysV service status |
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! NAS_HOST=192.168.1.10 NAS_USER=admin NAS_PASSWORD=secret mcp-ssh-nas
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod ops;
pub mod server;
pub mod ssh;
pub mod tools;

// Re-exports for convenience
pub use agent::AgentToolkit;
pub use config::{Args, Config};
pub use error::{Result, SshNasError};
pub use ops::Outcome;
pub use server::SshNasServer;
pub use ssh::{CommandOutput, CommandRunner, SshConfig, SshHandler, SshSession};
pub use tools::{catalogue, ToolReply, ToolInfo, Toolbox};
