//! Scripted command runner for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::ssh::{CommandOutput, CommandRunner};

/// Replays queued responses and records every command it was asked to run
pub(crate) struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<CommandOutput>>>,
    commands: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful command printing `stdout`
    pub(crate) fn ok(self, stdout: &str) -> Self {
        self.exit(0, stdout, "")
    }

    /// Queue a command with an explicit exit code
    pub(crate) fn exit(self, code: u32, stdout: &str, stderr: &str) -> Self {
        self.respond(Ok(CommandOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(code),
            exit_signal: None,
        }))
    }

    /// Queue an arbitrary response
    pub(crate) fn respond(self, response: Result<CommandOutput>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Commands run so far
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(command, _)| command.clone())
            .collect()
    }

    /// Timeouts passed so far
    pub(crate) fn timeouts(&self) -> Vec<Duration> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(_, timeout)| *timeout)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        self.commands
            .lock()
            .unwrap()
            .push((command.to_string(), timeout));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandOutput::new()))
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    fn endpoint(&self) -> String {
        "10.0.0.1:22".to_string()
    }

    fn username(&self) -> &str {
        "testuser"
    }
}
