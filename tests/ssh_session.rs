//! Integration tests against a real OpenSSH server in a container.
//!
//! Run with `cargo test -- --ignored` on a machine with a docker daemon.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use mcp_ssh_nas::ops::{exec, files, Outcome};
use mcp_ssh_nas::tools::{JsonObject, Toolbox};
use mcp_ssh_nas::{SshConfig, SshNasError, SshSession};

const SSH_PORT: u16 = 2222;
const TEST_USER: &str = "testuser";
const TEST_PASSWORD: &str = "testpass";

struct SshServer {
    container: ContainerAsync<GenericImage>,
    host: String,
    port: u16,
}

impl SshServer {
    async fn start() -> Self {
        let container = GenericImage::new("lscr.io/linuxserver/openssh-server", "latest")
            .with_exposed_port(SSH_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("[ls.io-init] done."))
            .with_env_var("PUID", "1000")
            .with_env_var("PGID", "1000")
            .with_env_var("PASSWORD_ACCESS", "true")
            .with_env_var("USER_NAME", TEST_USER)
            .with_env_var("USER_PASSWORD", TEST_PASSWORD)
            .start()
            .await
            .expect("failed to start SSH container");

        let host = container
            .get_host()
            .await
            .expect("container host")
            .to_string();
        let port = container
            .get_host_port_ipv4(SSH_PORT)
            .await
            .expect("mapped SSH port");

        Self {
            container,
            host,
            port,
        }
    }

    fn config(&self, password: &str) -> SshConfig {
        SshConfig::new(&self.host, TEST_USER, password)
            .with_port(self.port)
            .with_command_timeout(Duration::from_secs(10))
    }

    /// Connected session; sshd may still be starting right after init
    async fn session(&self) -> SshSession {
        let session = SshSession::new(self.config(TEST_PASSWORD));
        for _ in 0..20 {
            if session.connect().await.is_ok() {
                return session;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        panic!("SSH server did not accept connections");
    }
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn execute_echo() {
    let server = SshServer::start().await;
    let session = server.session().await;

    let output = session.execute("echo hello").await.unwrap();
    assert_eq!(output.stdout, "hello\n");
    assert!(output.stderr.is_empty());
    assert_eq!(output.exit_code, Some(0));

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn nonzero_exit_and_stderr() {
    let server = SshServer::start().await;
    let session = server.session().await;

    let output = session.execute("echo oops >&2; exit 3").await.unwrap();
    assert_eq!(output.exit_code, Some(3));
    assert_eq!(output.stderr.trim(), "oops");
    assert!(session.is_connected().await);

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn command_timeout() {
    let server = SshServer::start().await;
    let session = server.session().await;

    let err = session
        .execute_with_timeout("sleep 5", Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(matches!(err, SshNasError::Timeout(500)));

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn status_follows_connection_lifecycle() {
    let server = SshServer::start().await;
    let session = server.session().await;

    assert!(session.status().await);

    session.close().await;
    assert!(!session.status().await);
    session.close().await;

    // Reconnects lazily
    let output = session.execute("true").await.unwrap();
    assert!(output.success());
    assert!(session.status().await);

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn killed_command_is_not_success() {
    let server = SshServer::start().await;
    let session = server.session().await;

    match session.execute("kill -9 $$").await {
        Ok(output) => {
            assert!(!output.success());
            assert_eq!(output.exit_code, None);
        }
        Err(e) => assert!(matches!(e, SshNasError::Execution(_)), "unexpected error: {}", e),
    }

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn status_drops_dead_connection() {
    let server = SshServer::start().await;
    let session = server.session().await;
    assert!(session.status().await);

    server.container.stop().await.expect("stop SSH container");

    let alive = tokio::time::timeout(Duration::from_secs(30), session.status())
        .await
        .expect("status() should not hang on a dead server");
    assert!(!alive);
    assert!(!session.is_connected().await);

    // The handle lock is free again
    tokio::time::timeout(Duration::from_secs(5), session.close())
        .await
        .expect("close() should not block");
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn wrong_password_is_rejected() {
    let server = SshServer::start().await;
    // Wait until sshd is up
    server.session().await.close().await;

    let session = SshSession::new(server.config("not-the-password"));
    let err = session.connect().await.unwrap_err();
    assert!(err.is_connection_error());
    assert!(!session.is_connected().await);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn write_read_and_exists() {
    let server = SshServer::start().await;
    let session = server.session().await;
    let path = "/tmp/mcp ssh nas test.txt";
    let content = "first line\nit's \"quoted\" $HOME\n";

    assert!(files::write_file(&session, path, content, false)
        .await
        .unwrap()
        .is_done());
    assert_eq!(
        files::read_file(&session, path, None).await.unwrap(),
        Outcome::Done(content.to_string())
    );

    let exists = files::file_exists(&session, path)
        .await
        .unwrap()
        .done()
        .unwrap();
    assert!(exists.exists);

    exec::execute(&session, &format!("rm -f '{}'", path), None)
        .await
        .unwrap();
    let exists = files::file_exists(&session, path)
        .await
        .unwrap()
        .done()
        .unwrap();
    assert!(!exists.exists);

    session.close().await;
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn toolbox_status_and_system_info() {
    let server = SshServer::start().await;
    let session = Arc::new(server.session().await);
    let toolbox = Toolbox::new(session.clone());

    let reply = toolbox.call("ssh_status", JsonObject::new()).await.unwrap();
    assert!(!reply.is_error);
    let status: Value = serde_json::from_str(&reply.text).unwrap();
    assert_eq!(status["status"], "connected");
    assert_eq!(status["user"], TEST_USER);

    let reply = toolbox
        .call("ssh_system_info", JsonObject::new())
        .await
        .unwrap();
    assert!(!reply.is_error);
    let info: Value = serde_json::from_str(&reply.text).unwrap();
    assert!(!info["hostname"].as_str().unwrap().is_empty());

    let args = json!({"path": "/etc/hostname"});
    let reply = toolbox
        .call("ssh_file_exists", args.as_object().cloned().unwrap())
        .await
        .unwrap();
    assert!(reply.text.contains("\"exists\": true"));

    session.close().await;
}
