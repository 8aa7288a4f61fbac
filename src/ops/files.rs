//! File operations on the NAS
//!
//! Paths are quoted with [`quote_path`], so `~` and `~/…` still expand while
//! everything else reaches the remote shell as a single literal word.

use serde::Serialize;

use super::Outcome;
use crate::error::Result;
use crate::ssh::{quote, quote_path, CommandOutput, CommandRunner};

/// Build the `ls` command
pub fn list_files_command(path: &str, all: bool, long: bool) -> String {
    let flags = match (long, all) {
        (true, true) => "-lha",
        (true, false) => "-lh",
        (false, true) => "-a",
        (false, false) => "",
    };

    if flags.is_empty() {
        format!("ls {}", quote_path(path))
    } else {
        format!("ls {} {}", flags, quote_path(path))
    }
}

/// List a directory
pub async fn list_files(
    runner: &dyn CommandRunner,
    path: &str,
    all: bool,
    long: bool,
) -> Result<CommandOutput> {
    runner
        .run(&list_files_command(path, all, long), runner.default_timeout())
        .await
}

/// Build the read command
///
/// `lines > 0` reads the first lines, `lines < 0` the last ones, and `None`
/// or `0` the whole file.
pub fn read_file_command(path: &str, lines: Option<i64>) -> String {
    match lines {
        Some(n) if n > 0 => format!("head -n {} {}", n, quote_path(path)),
        Some(n) if n < 0 => format!("tail -n {} {}", n.unsigned_abs(), quote_path(path)),
        _ => format!("cat {}", quote_path(path)),
    }
}

/// Read a file; the content is returned exactly as the command printed it
pub async fn read_file(
    runner: &dyn CommandRunner,
    path: &str,
    lines: Option<i64>,
) -> Result<Outcome<String>> {
    let output = runner
        .run(&read_file_command(path, lines), runner.default_timeout())
        .await?;
    Ok(Outcome::from_output(output, |o| o.stdout.clone()))
}

/// Build the write command
///
/// `printf '%s'` writes the content byte for byte, without the trailing
/// newline `echo` would add.
pub fn write_file_command(path: &str, content: &str, append: bool) -> String {
    let operator = if append { ">>" } else { ">" };
    format!(
        "printf '%s' {} {} {}",
        quote(content),
        operator,
        quote_path(path)
    )
}

/// Create, overwrite or append to a file
pub async fn write_file(
    runner: &dyn CommandRunner,
    path: &str,
    content: &str,
    append: bool,
) -> Result<Outcome<()>> {
    let output = runner
        .run(
            &write_file_command(path, content, append),
            runner.default_timeout(),
        )
        .await?;
    Ok(Outcome::from_output(output, |_| ()))
}

/// Existence check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileExists {
    pub exists: bool,

    /// `file` description of the path, when it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Build the existence check
///
/// One round trip: prints `exists` followed by the `file` description, or
/// `not found`.
pub fn file_exists_command(path: &str) -> String {
    let path = quote_path(path);
    format!(
        "if test -e {path}; then echo exists; file {path} 2>/dev/null || true; else echo 'not found'; fi"
    )
}

/// Interpret the existence check output
pub fn parse_file_exists(stdout: &str) -> FileExists {
    let mut lines = stdout.lines();
    let exists = lines.next().map(str::trim) == Some("exists");

    if !exists {
        return FileExists {
            exists: false,
            info: None,
        };
    }

    let info = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    FileExists {
        exists: true,
        info: (!info.is_empty()).then_some(info),
    }
}

/// Check whether a file or directory exists
pub async fn file_exists(runner: &dyn CommandRunner, path: &str) -> Result<Outcome<FileExists>> {
    let output = runner
        .run(&file_exists_command(path), runner.default_timeout())
        .await?;
    Ok(Outcome::from_output(output, |o| parse_file_exists(&o.stdout)))
}
