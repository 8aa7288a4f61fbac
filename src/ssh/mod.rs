//! SSH session module
//!
//! One password-authenticated SSH connection to the NAS, connected lazily and
//! reused for every command.

pub mod command;
pub mod config;
pub mod handler;
pub mod sanitize;
pub mod session;

// Re-exports
pub use command::{CommandOutput, CommandRunner};
pub use config::SshConfig;
pub use handler::SshHandler;
pub use sanitize::{escape_for_shell, quote, quote_path, sanitize_command};
pub use session::SshSession;
