use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::tool;
use rmcp::tool_handler;
use rmcp::tool_router;
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;

use crate::application::SearchRouter;
use crate::domain::SearchQuery;

use super::tools::SearchToolInput;

/// Server-side maximum for the number of results a single search can return.
const MAX_LIMIT: usize = 100;

/// MCP stdio server advertising the single `search_code` tool (§6).
#[derive(Clone)]
pub struct CodeIndexMcpServer {
    router: Arc<SearchRouter>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CodeIndexMcpServer {
    pub fn new(router: Arc<SearchRouter>) -> Self {
        Self {
            router,
            tool_router: Self::tool_router(),
        }
    }

    /// Search indexed repositories for code matching a query. Classifies the
    /// query into a symbol, relationship, flow, pattern, or concept lookup and
    /// dispatches to the corresponding retrieval strategy.
    #[tool(name = "search_code")]
    async fn search_code(&self, params: Parameters<SearchToolInput>) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let limit = input.limit.min(MAX_LIMIT).max(1);

        let mut query = SearchQuery::new(&input.query).with_repo(input.repo).with_limit(limit).with_include_tests(input.include_tests.into());
        if let Some(module) = input.module {
            query = query.with_module(module);
        }
        if let Some(cursor) = input.cursor {
            query = query.with_cursor(cursor);
        }

        let response = self.router.search(query).await.map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        let json = serde_json::to_string(&response).map_err(|e| McpError::internal_error(format!("failed to serialize response: {e}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for CodeIndexMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Semantic code search server. Use the search_code tool to find functions, \
                 classes, call relationships, and patterns across indexed repositories."
                    .into(),
            ),
        }
    }
}
