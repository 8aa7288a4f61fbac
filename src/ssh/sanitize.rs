//! Command validation and shell quoting
//!
//! Every argument the templating helpers splice into a remote command goes
//! through [`quote`] or [`quote_path`], so paths and names containing spaces or
//! quotes reach the remote shell as a single word.

use crate::error::{Result, SshNasError};

/// Validate a raw command before execution
///
/// Rejects empty and whitespace-only commands. The command itself is returned
/// untouched: it runs verbatim on the remote shell.
///
/// # Examples
/// ```
/// use mcp_ssh_nas::ssh::sanitize::sanitize_command;
///
/// assert_eq!(sanitize_command("ls -la").unwrap(), "ls -la");
/// assert!(sanitize_command("   ").is_err());
/// ```
pub fn sanitize_command(command: &str) -> Result<&str> {
    if command.trim().is_empty() {
        return Err(SshNasError::invalid_params("No command provided"));
    }
    Ok(command)
}

/// Escape single quotes so the text can live inside a single-quoted string
///
/// `'` becomes `'"'"'`: close the quote, emit a literal quote from a
/// double-quoted string, reopen the quote.
///
/// ```
/// use mcp_ssh_nas::ssh::sanitize::escape_for_shell;
///
/// assert_eq!(escape_for_shell("it's"), "it'\"'\"'s");
/// ```
pub fn escape_for_shell(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}

/// Quote an arbitrary argument as one shell word
pub fn quote(s: &str) -> String {
    format!("'{}'", escape_for_shell(s))
}

/// Quote a path, leaving a leading `~` unquoted so the remote shell expands it
///
/// ```
/// use mcp_ssh_nas::ssh::sanitize::quote_path;
///
/// assert_eq!(quote_path("~"), "~");
/// assert_eq!(quote_path("~/My Files"), "~/'My Files'");
/// assert_eq!(quote_path("/volume1/data"), "'/volume1/data'");
/// ```
pub fn quote_path(path: &str) -> String {
    if path == "~" {
        return "~".to_string();
    }
    match path.strip_prefix("~/") {
        Some("") => "~/".to_string(),
        Some(rest) => format!("~/{}", quote(rest)),
        None => quote(path),
    }
}
