//! SSH session
//!
//! [`SshSession`] owns at most one russh transport handle to the NAS. It is
//! either Disconnected (no handle, or a handle whose transport has closed) or
//! Connected. `execute` connects on demand; `status` never does.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, Disconnect};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::command::{collect_channel_output, CommandOutput, CommandRunner};
use super::config::SshConfig;
use super::handler::SshHandler;
use crate::config::CONNECTION_TIMEOUT_SECS;
use crate::error::{Result, SshNasError};

/// Deadline for the no-op command `status` runs
const STATUS_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Keepalive interval so an idle NAS session is not dropped by the server
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// One logical SSH connection to one NAS
pub struct SshSession {
    /// Connection parameters
    config: SshConfig,

    /// Live transport handle, if any
    handle: Mutex<Option<Handle<SshHandler>>>,
}

impl SshSession {
    /// Create a disconnected session
    ///
    /// No network traffic happens until `connect` or `execute` is called.
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            handle: Mutex::new(None),
        }
    }

    /// Connection parameters this session was built with
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Whether a handle exists and its transport is still open
    ///
    /// Purely local; use [`status`](Self::status) for a remote round trip.
    pub async fn is_connected(&self) -> bool {
        let guard = self.handle.lock().await;
        guard.as_ref().is_some_and(|handle| !handle.is_closed())
    }

    /// Establish the SSH connection
    ///
    /// A no-op when already connected. A handle whose transport has closed is
    /// replaced by the new one. The lock is held for the whole attempt so two
    /// callers never open two transports.
    pub async fn connect(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;

        if let Some(handle) = guard.as_ref() {
            if !handle.is_closed() {
                debug!("Already connected to {}", self.config.endpoint());
                return Ok(());
            }
            debug!("Previous transport closed, reconnecting");
        }

        let handle = self.establish().await?;
        *guard = Some(handle);

        info!(
            "Connected to {}@{}",
            self.config.username,
            self.config.endpoint()
        );
        Ok(())
    }

    /// Open and authenticate a new transport
    async fn establish(&self) -> Result<Handle<SshHandler>> {
        info!("Connecting to SSH server {}...", self.config.endpoint());

        let ssh_config = Arc::new(client::Config {
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            ..Default::default()
        });

        let connect_result = timeout(
            Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            client::connect(
                ssh_config,
                (self.config.host.as_str(), self.config.port),
                SshHandler::new(),
            ),
        )
        .await;

        let mut handle = match connect_result {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                error!("SSH connection failed: {}", e);
                return Err(SshNasError::connection(e.to_string()));
            }
            Err(_) => {
                error!("SSH connection timeout after {}s", CONNECTION_TIMEOUT_SECS);
                return Err(SshNasError::connection(format!(
                    "Connection timeout after {}s",
                    CONNECTION_TIMEOUT_SECS
                )));
            }
        };

        self.authenticate(&mut handle).await?;
        Ok(handle)
    }

    /// Password authentication
    async fn authenticate(&self, handle: &mut Handle<SshHandler>) -> Result<()> {
        debug!(
            "Attempting password authentication for user '{}'",
            self.config.username
        );

        let auth_result = handle
            .authenticate_password(&self.config.username, &self.config.password)
            .await
            .map_err(|e| SshNasError::auth(e.to_string()))?;

        if auth_result.success() {
            debug!("Password authentication successful");
            Ok(())
        } else {
            Err(SshNasError::auth(
                "Password rejected. Check username and password.",
            ))
        }
    }

    /// Run a command with the configured default timeout
    pub async fn execute(&self, command: &str) -> Result<CommandOutput> {
        self.execute_with_timeout(command, self.config.command_timeout)
            .await
    }

    /// Run a command verbatim, connecting first if needed
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` - stdout, stderr and exit code; non-zero exits are data
    /// * `Err(SshNasError::Connection | Authentication)` - the transport could not be established
    /// * `Err(SshNasError::Execution)` - the transport failed while running the command
    /// * `Err(SshNasError::Timeout)` - the command outlived `timeout_duration`
    pub async fn execute_with_timeout(
        &self,
        command: &str,
        timeout_duration: Duration,
    ) -> Result<CommandOutput> {
        if !self.is_connected().await {
            self.connect().await?;
        }

        debug!("Executing command: {}", command);
        self.run_on_channel(command, timeout_duration).await
    }

    /// Report whether the session is live and responsive
    ///
    /// Runs `true` on the remote host. Never connects and never fails: any
    /// problem drops the handle and yields `false`.
    pub async fn status(&self) -> bool {
        if !self.is_connected().await {
            return false;
        }

        match self.run_on_channel("true", STATUS_PROBE_TIMEOUT).await {
            Ok(output) => output.success(),
            Err(e) => {
                warn!("SSH session is not responsive: {}", e);
                self.drop_handle().await;
                false
            }
        }
    }

    /// Close the SSH connection
    ///
    /// Safe to call when not connected, and safe to call repeatedly.
    pub async fn close(&self) {
        let handle = self.handle.lock().await.take();
        match handle {
            Some(handle) => {
                if let Err(e) = handle
                    .disconnect(Disconnect::ByApplication, "", "en")
                    .await
                {
                    debug!("Disconnect did not complete cleanly: {}", e);
                }
                info!("SSH connection closed");
            }
            None => debug!("close() called without an open connection"),
        }
    }

    async fn drop_handle(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle
                .disconnect(Disconnect::ByApplication, "", "en")
                .await
            {
                debug!("Disconnect of unresponsive session failed: {}", e);
            }
        }
    }

    /// Open a session channel on the current handle
    ///
    /// If the transport turns out to be closed, the handle is dropped so the
    /// next `execute` reconnects.
    async fn open_channel(&self) -> Result<Channel<Msg>> {
        let mut guard = self.handle.lock().await;
        let handle = guard
            .as_ref()
            .ok_or_else(|| SshNasError::connection("SSH connection not established"))?;

        match handle.channel_open_session().await {
            Ok(channel) => Ok(channel),
            Err(e) => {
                let closed = handle.is_closed();
                if closed {
                    warn!("SSH transport closed: {}", e);
                    guard.take();
                }
                Err(SshNasError::execution(format!(
                    "Failed to open channel: {}",
                    e
                )))
            }
        }
    }

    async fn run_on_channel(
        &self,
        command: &str,
        timeout_duration: Duration,
    ) -> Result<CommandOutput> {
        let channel = self.open_channel().await?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| SshNasError::execution(format!("Failed to exec command: {}", e)))?;

        match timeout(timeout_duration, collect_channel_output(channel)).await {
            Ok(output) => output,
            Err(_) => {
                warn!(
                    "Command timed out after {}ms",
                    timeout_duration.as_millis()
                );
                Err(SshNasError::Timeout(timeout_duration.as_millis() as u64))
            }
        }
    }
}

#[async_trait]
impl CommandRunner for SshSession {
    async fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        self.execute_with_timeout(command, timeout).await
    }

    fn default_timeout(&self) -> Duration {
        self.config.command_timeout
    }

    fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    fn username(&self) -> &str {
        &self.config.username
    }
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("username", &self.config.username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A local port with nothing listening on it
    fn refused_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn unreachable_session() -> SshSession {
        SshSession::new(SshConfig::new("127.0.0.1", "testuser", "testpass").with_port(refused_port()))
    }

    #[tokio::test]
    async fn test_new_session_is_disconnected() {
        let session = unreachable_session();
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_status_false_before_connect() {
        let session = unreachable_session();
        assert!(!session.status().await);
        // status() never connects
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let session = unreachable_session();
        let err = session.connect().await.unwrap_err();
        assert!(err.is_connection_error(), "unexpected error: {}", err);
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_execute_refused_is_connection_error() {
        let session = unreachable_session();
        let err = session.execute("echo hello").await.unwrap_err();
        assert!(err.is_connection_error(), "unexpected error: {}", err);
        assert!(!session.status().await);
    }

    #[tokio::test]
    async fn test_close_twice_without_connection() {
        let session = unreachable_session();
        session.close().await;
        session.close().await;
        assert!(!session.is_connected().await);
    }

    #[test]
    fn test_runner_metadata() {
        let session = SshSession::new(
            SshConfig::new("nas.local", "admin", "secret")
                .with_port(2222)
                .with_command_timeout(Duration::from_secs(12)),
        );
        assert_eq!(CommandRunner::endpoint(&session), "nas.local:2222");
        assert_eq!(CommandRunner::username(&session), "admin");
        assert_eq!(session.default_timeout(), Duration::from_secs(12));
        assert!(!format!("{:?}", session).contains("secret"));
    }
}
