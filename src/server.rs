//! MCP tool server exposing command runs and page reads over stdio.

use std::sync::Arc;

use anyhow::{Context, Result};
use cmdpager_core::{ErrorKind, OutputSession, PagerError, ReadPageRequest, RunRequest};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ErrorData as McpError, ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PagerServer {
    session: Arc<OutputSession>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PagerServer {
    pub fn new(session: Arc<OutputSession>) -> Self {
        Self {
            session,
            tool_router: Self::tool_router(),
        }
    }

    /// Run a shell command and return its combined STDOUT, STDERR and return
    /// code. Small output is returned directly with status "complete". Output
    /// above the token threshold is stored and returned with status
    /// "paginated" plus an output_id and total_pages; fetch it with
    /// read_output_page. A non-zero return code is a normal result.
    #[tool(name = "run_command")]
    async fn run_command(
        &self,
        params: Parameters<RunRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        debug!(command = %request.command, "run_command called");
        let response = self.session.run(request).await.map_err(to_mcp_error)?;
        json_result(&response)
    }

    /// Read one page (1-indexed) of output stored by run_command. The
    /// response lists the pages read so far. Once every page has been read
    /// the output is released and its output_id stops working.
    #[tool(name = "read_output_page")]
    async fn read_output_page(
        &self,
        params: Parameters<ReadPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        let response = self.session.read_page(params.0).map_err(to_mcp_error)?;
        json_result(&response)
    }
}

#[tool_handler]
impl ServerHandler for PagerServer {
    fn get_info(&self) -> ServerInfo {
        let settings = self.session.settings();
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = env!("CARGO_PKG_NAME").into();
        info.server_info.version = env!("CARGO_PKG_VERSION").into();
        info.instructions = Some(format!(
            "Use run_command to execute shell commands. Output estimated above {} tokens \
             (about {} characters per token) is split into pages of at most {} lines and \
             {} characters; read them with read_output_page until all pages have been read.",
            settings.token_threshold,
            settings.chars_per_token,
            settings.limits.page_size_lines,
            settings.limits.max_chars_per_page,
        ));
        info
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|err| {
        McpError::internal_error(format!("failed to encode response: {err}"), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Map a session error onto the protocol error space.
pub fn to_mcp_error(err: PagerError) -> McpError {
    let kind = err.kind();
    let message = err.to_string();
    let data = Some(json!({ "kind": kind }));
    match kind {
        ErrorKind::InvalidArgument | ErrorKind::OutOfRange => {
            McpError::invalid_params(message, data)
        }
        ErrorKind::NotFound => McpError::resource_not_found(message, data),
        ErrorKind::Timeout | ErrorKind::ExecutionFailure | ErrorKind::AlreadyExists => {
            McpError::internal_error(message, data)
        }
    }
}

/// Serve the tools on stdin/stdout until the client disconnects.
pub async fn serve_stdio(session: Arc<OutputSession>) -> Result<()> {
    let service = PagerServer::new(session);
    info!("serving MCP tools on stdio");
    let running = rmcp::serve_server(service, rmcp::transport::stdio())
        .await
        .context("failed to start MCP server on stdio")?;
    let reason = running.waiting().await.context("MCP server task failed")?;
    info!(?reason, "MCP server stopped");
    Ok(())
}
