//! Remote administration operations
//!
//! Each operation is a pure command builder (`*_command`), an optional
//! best-effort parser (`parse_*`) and an async wrapper that runs the command
//! through a [`CommandRunner`](crate::ssh::CommandRunner). Parsers never fail:
//! output in an unexpected format yields partial records or empty lists.

pub mod docker;
pub mod exec;
pub mod files;
pub mod services;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::SshNasError;
use crate::ssh::CommandOutput;

/// Result of an operation whose command ran to completion
///
/// A non-zero exit status is not an error: the raw output is handed back so
/// the caller can show stderr and the exit code.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The command succeeded and its output was interpreted
    Done(T),
    /// The command exited non-zero
    Failed(CommandOutput),
}

impl<T> Outcome<T> {
    /// Interpret `output` with `parse` if the command succeeded
    pub fn from_output(output: CommandOutput, parse: impl FnOnce(&CommandOutput) -> T) -> Self {
        if output.success() {
            Outcome::Done(parse(&output))
        } else {
            Outcome::Failed(output)
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    /// The interpreted value, if the command succeeded
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Failed(_) => None,
        }
    }
}

/// Render command output as tool text
///
/// Success: stdout, then stderr prefixed with `STDERR:`, trimmed. Failure:
/// `Error:` with the exit status, followed by whatever the command printed.
pub fn format_output(output: &CommandOutput) -> String {
    if output.success() {
        let mut text = output.stdout.clone();
        if !output.stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str("STDERR: ");
            text.push_str(&output.stderr);
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            "Command completed successfully (no output)".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        let mut text = match (output.exit_code, &output.exit_signal) {
            (Some(code), _) => format!("Error: Command exited with status {}", code),
            (None, Some(signal)) => format!("Error: Command terminated by signal {}", signal),
            (None, None) => "Error: Command failed".to_string(),
        };
        for stream in [&output.stdout, &output.stderr] {
            let stream = stream.trim();
            if !stream.is_empty() {
                text.push('\n');
                text.push_str(stream);
            }
        }
        text
    }
}

/// Render an error as tool text
pub fn format_error(err: &SshNasError) -> String {
    format!("Error: {}", err)
}

/// Split a line into at most `n` whitespace-separated fields; the last field
/// keeps the remainder of the line, inner spacing included.
pub(crate) fn split_fields(line: &str, n: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = line.trim_start();

    while fields.len() + 1 < n && !rest.is_empty() {
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                rest = "";
            }
        }
    }

    let rest = rest.trim_end();
    if !rest.is_empty() {
        fields.push(rest);
    }
    fields
}
