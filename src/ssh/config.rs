//! SSH configuration types
//!
//! Connection parameters for the single NAS target.

use std::time::Duration;

use crate::config::DEFAULT_TIMEOUT_SECS;

/// SSH connection configuration
///
/// Immutable once handed to [`SshSession`](super::SshSession).
#[derive(Clone)]
pub struct SshConfig {
    /// Remote hostname or IP address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Password for password authentication
    pub password: String,

    /// Timeout applied by `execute` when the caller does not pass one
    pub command_timeout: Duration,
}

impl SshConfig {
    /// Create a new SSH configuration on the default port
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password: password.into(),
            command_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the default command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// `host:port` as shown in status reports
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}
