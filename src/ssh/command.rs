//! Command execution over SSH
//!
//! Provides [`CommandOutput`], the [`CommandRunner`] seam the templating
//! helpers are written against, and the channel read loop that turns russh
//! channel messages into a `CommandOutput`.

use std::time::Duration;

use async_trait::async_trait;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SshNasError};

/// Output from a command execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,

    /// Standard error from the command
    pub stderr: String,

    /// Exit code of the command (None when the remote side reported a signal instead)
    pub exit_code: Option<u32>,

    /// Signal that terminated the command, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<String>,
}

impl CommandOutput {
    /// Create a new empty CommandOutput
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the command succeeded (exit code 0)
    ///
    /// A command killed by a signal, or one whose status never arrived, did
    /// not succeed.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can run a shell command on the NAS
///
/// [`SshSession`](super::SshSession) is the production implementation. The
/// templating helpers in [`ops`](crate::ops) only depend on this trait.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` verbatim, waiting at most `timeout` for it to finish
    async fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput>;

    /// Timeout used when a caller has no specific deadline
    fn default_timeout(&self) -> Duration;

    /// `host:port` of the target
    fn endpoint(&self) -> String;

    /// Login name used on the target
    fn username(&self) -> &str;
}

/// Accumulates channel events for one command
#[derive(Debug, Default)]
struct ChannelState {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<u32>,
    exit_signal: Option<String>,
    got_exit: bool,
    got_eof: bool,
    closed: bool,
}

impl ChannelState {
    /// Record an exit status; returns true once the command is finished
    fn exit_status(&mut self, code: u32) -> bool {
        self.exit_code = Some(code);
        self.got_exit = true;
        self.got_eof
    }

    fn exit_signal(&mut self, signal: String) -> bool {
        self.exit_signal = Some(signal);
        self.got_exit = true;
        self.got_eof
    }

    fn eof(&mut self) -> bool {
        self.got_eof = true;
        self.got_exit
    }

    fn close(&mut self) {
        self.closed = true;
    }

    /// Turn the collected events into a result
    ///
    /// Without an exit status, only a channel that saw EOF and was closed by
    /// the server counts as a finished command. Anything else means the
    /// transport went away mid-command.
    fn finish(self) -> Result<CommandOutput> {
        if !self.got_exit && !(self.got_eof && self.closed) {
            return Err(SshNasError::execution(
                "Channel closed before the command finished",
            ));
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            exit_code: self.exit_code,
            exit_signal: self.exit_signal,
        })
    }
}

/// Read a channel until the command has finished
///
/// A command is finished once both EOF and its exit status (or exit signal)
/// have arrived, or the server closes the channel.
pub(crate) async fn collect_channel_output(mut channel: Channel<Msg>) -> Result<CommandOutput> {
    let mut state = ChannelState::default();

    while let Some(msg) = channel.wait().await {
        let finished = match msg {
            ChannelMsg::Data { data } => {
                state.stdout.extend_from_slice(&data);
                false
            }
            ChannelMsg::ExtendedData { data, ext } => {
                // ext == 1 is SSH_EXTENDED_DATA_STDERR
                if ext == 1 {
                    state.stderr.extend_from_slice(&data);
                } else {
                    state.stdout.extend_from_slice(&data);
                }
                false
            }
            ChannelMsg::ExitStatus { exit_status } => state.exit_status(exit_status),
            ChannelMsg::ExitSignal { signal_name, .. } => {
                debug!("Command terminated by signal {:?}", signal_name);
                state.exit_signal(format!("{:?}", signal_name))
            }
            ChannelMsg::Eof => state.eof(),
            ChannelMsg::Close => {
                state.close();
                true
            }
            _ => false,
        };

        if finished {
            break;
        }
    }

    let output = state.finish()?;

    debug!(
        "Command completed: exit_code={:?}, stdout_len={}, stderr_len={}",
        output.exit_code,
        output.stdout.len(),
        output.stderr.len()
    );

    Ok(output)
}
