//! Configuration and CLI argument parsing for the SSH NAS MCP server

use std::time::Duration;

use clap::Parser;

use crate::error::{Result, SshNasError};
use crate::ssh::SshConfig;

/// Default timeout for command execution in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// SSH NAS MCP server CLI arguments
///
/// Every connection flag falls back to its `NAS_*` environment variable, so the
/// server can be configured entirely through the environment (or a `.env` file).
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mcp-ssh-nas")]
#[command(version)]
#[command(about = "MCP server exposing SSH administration tools for a NAS")]
pub struct Args {
    /// NAS hostname or IP address
    #[arg(long, env = "NAS_HOST")]
    pub host: Option<String>,

    /// SSH port
    #[arg(long, default_value = "22", env = "NAS_PORT")]
    pub port: u16,

    /// SSH username
    #[arg(long, env = "NAS_USER")]
    pub user: Option<String>,

    /// SSH password
    #[arg(long, env = "NAS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Default command timeout in seconds
    #[arg(long, default_value = "30", env = "NAS_TIMEOUT")]
    pub timeout: u64,

    /// Print the tool catalogue as agent tool definitions (JSON) and exit
    #[arg(long)]
    pub list_tools: bool,
}

/// Parsed and validated configuration
#[derive(Clone)]
pub struct Config {
    /// NAS host
    pub host: String,

    /// SSH port
    pub port: u16,

    /// SSH username
    pub user: String,

    /// SSH password
    pub password: String,

    /// Default command timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Create Config from CLI Args
    pub fn from_args(args: Args) -> Result<Self> {
        let host = clean_value(args.host);
        let user = clean_value(args.user);
        let password = clean_value(args.password);

        let mut errors = Vec::new();
        if host.is_none() {
            errors.push("Missing required --host (NAS_HOST)");
        }
        if user.is_none() {
            errors.push("Missing required --user (NAS_USER)");
        }
        if password.is_none() {
            errors.push("Missing required --password (NAS_PASSWORD)");
        }
        if args.timeout == 0 {
            errors.push("--timeout (NAS_TIMEOUT) must be greater than zero");
        }

        match (host, user, password) {
            (Some(host), Some(user), Some(password)) if errors.is_empty() => Ok(Config {
                host,
                port: args.port,
                user,
                password,
                timeout_secs: args.timeout,
            }),
            _ => Err(SshNasError::config(errors.join("\n"))),
        }
    }

    /// Default command timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the connection parameters handed to the SSH session
    pub fn ssh_config(&self) -> SshConfig {
        SshConfig::new(&self.host, &self.user, &self.password)
            .with_port(self.port)
            .with_command_timeout(self.timeout())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Trim a value and treat empty strings as missing.
///
/// Docker secrets mounted as env files usually end with a newline.
fn clean_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(host: &str, user: &str, password: &str) -> Args {
        Args {
            host: Some(host.to_string()),
            port: 22,
            user: Some(user.to_string()),
            password: Some(password.to_string()),
            timeout: DEFAULT_TIMEOUT_SECS,
            list_tools: false,
        }
    }

    #[test]
    fn test_from_args_valid() {
        let config = Config::from_args(args("10.0.0.1", "admin", "secret")).unwrap();
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 22);
        assert_eq!(config.user, "admin");
        assert_eq!(config.password, "secret");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_args_trims_secrets() {
        let config = Config::from_args(args(" nas.local\n", "admin\n", "secret\n")).unwrap();
        assert_eq!(config.host, "nas.local");
        assert_eq!(config.user, "admin");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn test_from_args_reports_every_missing_value() {
        let err = Config::from_args(Args {
            port: 22,
            timeout: 30,
            ..Default::default()
        })
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("--host"));
        assert!(message.contains("--user"));
        assert!(message.contains("--password"));
    }

    #[test]
    fn test_from_args_blank_password_is_missing() {
        let err = Config::from_args(args("nas", "admin", "   ")).unwrap_err();
        assert!(err.to_string().contains("NAS_PASSWORD"));
    }

    #[test]
    fn test_from_args_zero_timeout() {
        let mut a = args("nas", "admin", "secret");
        a.timeout = 0;
        assert!(Config::from_args(a).is_err());
    }

    #[test]
    fn test_ssh_config() {
        let mut a = args("nas", "admin", "secret");
        a.port = 2222;
        let ssh = Config::from_args(a).unwrap().ssh_config();
        assert_eq!(ssh.host, "nas");
        assert_eq!(ssh.port, 2222);
        assert_eq!(ssh.username, "admin");
        assert_eq!(ssh.command_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::from_args(args("nas", "admin", "hunter2")).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(clean_value(Some("".to_string())), None);
        assert_eq!(clean_value(None), None);
    }
}
