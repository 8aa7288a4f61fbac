//! MCP Server implementation
//!
//! Exposes the tool catalogue over MCP. The server owns the single
//! [`SshSession`] shared by every tool call; the connection is opened lazily
//! by the first call that needs it.

use std::sync::Arc;

use rmcp::{
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
    ErrorData as McpError,
};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SshNasError;
use crate::ssh::SshSession;
use crate::tools::{catalogue, ToolReply, Toolbox};

/// SSH NAS MCP Server
#[derive(Clone)]
pub struct SshNasServer {
    /// Server configuration
    config: Config,

    /// The shared SSH session
    session: Arc<SshSession>,

    /// Tool dispatcher bound to `session`
    toolbox: Toolbox,
}

impl SshNasServer {
    /// Create a new server; no connection is made until a tool needs one
    pub fn new(config: Config) -> Self {
        let session = Arc::new(SshSession::new(config.ssh_config()));
        let toolbox = Toolbox::new(session.clone());

        Self {
            config,
            session,
            toolbox,
        }
    }

    /// Get a reference to the SSH session
    pub fn session(&self) -> &Arc<SshSession> {
        &self.session
    }

    /// Close the SSH session
    pub async fn shutdown(&self) {
        info!("Shutting down SSH NAS MCP Server...");
        self.session.close().await;
    }

    /// The catalogue as MCP tool definitions
    fn tools() -> Vec<Tool> {
        catalogue()
            .into_iter()
            .map(|tool| Tool::new(tool.name, tool.description, Arc::new(tool.input_schema)))
            .collect()
    }
}

fn to_call_result(reply: ToolReply) -> CallToolResult {
    let content = vec![Content::text(reply.text)];
    if reply.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for SshNasServer {
    /// Return server information
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "SSH NAS MCP Server v{} - Administer {}@{}:{} (commands, files, system, docker, services)",
                env!("CARGO_PKG_VERSION"),
                self.config.user,
                self.config.host,
                self.config.port,
            )),
        }
    }

    /// List available tools
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        debug!("list_tools called");

        Ok(ListToolsResult {
            tools: Self::tools(),
            next_cursor: None,
            meta: Default::default(),
        })
    }

    /// Call a tool
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let tool_name: &str = request.name.as_ref();
        debug!("call_tool called: {:?}", tool_name);

        let args = request.arguments.unwrap_or_default();

        match self.toolbox.call(tool_name, args).await {
            Ok(reply) => {
                if reply.is_error {
                    warn!("{} failed: {}", tool_name, reply.text);
                }
                Ok(to_call_result(reply))
            }
            Err(SshNasError::InvalidParams(msg)) => Err(McpError::invalid_params(msg, None)),
            Err(e) => Err(McpError::internal_error(e.to_string(), None)),
        }
    }
}
