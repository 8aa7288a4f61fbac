//! Error types for the SSH NAS MCP server

use thiserror::Error;

/// Main error type for the SSH NAS MCP server
///
/// Variants fall into two classes: connection failures (the transport could
/// not be established or maintained) and execution failures (the transport
/// broke while a command was running). A command that exits non-zero is not
/// an error; it is reported through [`CommandOutput`](crate::ssh::CommandOutput).
#[derive(Debug, Error)]
pub enum SshNasError {
    /// SSH connection failed or was lost
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// Password authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport-level failure while running a command
    #[error("Command execution failed: {0}")]
    Execution(String),

    /// Command execution timed out
    #[error("Command timeout after {0}ms")]
    Timeout(u64),

    /// Invalid parameters provided
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using SshNasError
pub type Result<T> = std::result::Result<T, SshNasError>;

impl SshNasError {
    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        SshNasError::Connection(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        SshNasError::Authentication(msg.into())
    }

    /// Create an execution error from a string
    pub fn execution(msg: impl Into<String>) -> Self {
        SshNasError::Execution(msg.into())
    }

    /// Create an invalid params error from a string
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        SshNasError::InvalidParams(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        SshNasError::Config(msg.into())
    }

    /// True when the transport could not be established or maintained
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            SshNasError::Connection(_) | SshNasError::Authentication(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SshNasError::Connection("failed to connect".to_string());
        assert_eq!(err.to_string(), "SSH connection error: failed to connect");

        let err = SshNasError::Timeout(5000);
        assert_eq!(err.to_string(), "Command timeout after 5000ms");

        let err = SshNasError::execution("channel closed");
        assert_eq!(err.to_string(), "Command execution failed: channel closed");
    }

    #[test]
    fn test_connection_classification() {
        assert!(SshNasError::connection("refused").is_connection_error());
        assert!(SshNasError::auth("rejected").is_connection_error());
        assert!(!SshNasError::execution("eof").is_connection_error());
        assert!(!SshNasError::Timeout(10).is_connection_error());
        assert!(!SshNasError::invalid_params("empty").is_connection_error());
    }
}
