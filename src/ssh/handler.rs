//! russh client event handler

use tracing::debug;

/// SSH client handler for russh
///
/// Accepts whatever host key the NAS presents (the equivalent of an
/// auto-add policy). The key fingerprint is logged at debug level.
#[derive(Debug, Clone, Default)]
pub struct SshHandler;

impl SshHandler {
    /// Create a new SSH handler
    pub fn new() -> Self {
        Self
    }
}

impl russh::client::Handler for SshHandler {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(
            "Accepting server host key {}",
            server_public_key.fingerprint(Default::default())
        );
        Ok(true)
    }
}
