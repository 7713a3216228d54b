use crate::citation::{CitationKind, Citations};
use crate::registry::{ResourceError, ResourceHandler, ToolError, ToolHandler};
use crate::server::McpServer;
use hatch_protocol::models::MCPToolDefinition;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while building or extending a [`HatchMCP`]
#[derive(Debug, Error)]
pub enum HatchError {
    /// The server name is empty
    #[error("Invalid server name: '{0}'")]
    InvalidName(String),
    /// Registering a resource on the wrapped server failed
    #[error("Failed to register resource: {0}")]
    Registry(#[from] ResourceError),
    /// Registering a tool on the wrapped server failed
    #[error("Failed to register tool: {0}")]
    Tool(#[from] ToolError),
}

/// Wrapper around an [`McpServer`] for Hatch applications.
///
/// Building one registers two `text/plain` citation resources on the wrapped
/// server, `citation://origin/{name}` and `citation://mcp/{name}`. Citation
/// text is read at request time, so updates are visible to later reads.
///
/// ```rust,no_run
/// use hatch_mcp_server::HatchMCP;
///
/// # async fn demo() -> anyhow::Result<()> {
/// let hatch = HatchMCP::builder("arxiv")
///     .origin_citation("arXiv API, Cornell University")
///     .mcp_citation("Hatch arXiv MCP server, 2025")
///     .build()
///     .await?;
/// hatch.run_stdio().await?;
/// # Ok(())
/// # }
/// ```
pub struct HatchMCP {
    name: String,
    server: McpServer,
    citations: Arc<RwLock<Citations>>,
}

/// Builder for [`HatchMCP`]
pub struct HatchMCPBuilder {
    name: String,
    server: Option<McpServer>,
    citations: Citations,
}

impl HatchMCPBuilder {
    /// Wrap an existing server instead of creating a fresh one
    pub fn server(mut self, server: McpServer) -> Self {
        self.server = Some(server);
        self
    }

    /// Citation of the original software
    pub fn origin_citation(mut self, citation: impl Into<String>) -> Self {
        self.citations.origin = Some(citation.into());
        self
    }

    /// Citation of the MCP server implementation
    pub fn mcp_citation(mut self, citation: impl Into<String>) -> Self {
        self.citations.mcp = Some(citation.into());
        self
    }

    /// Build the wrapper and register its citation resources
    pub async fn build(self) -> Result<HatchMCP, HatchError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(HatchError::InvalidName(self.name));
        }

        let server = self.server.unwrap_or_else(|| McpServer::new(name.clone()));
        let citations = Arc::new(RwLock::new(self.citations));

        let resources = server.resources();
        for kind in CitationKind::ALL {
            let uri = kind.uri(&name);
            if resources.contains(&uri).await {
                return Err(ResourceError::Duplicate(uri).into());
            }
        }

        let mut registered: Vec<String> = Vec::new();
        for kind in CitationKind::ALL {
            let def = kind.resource(&name);
            let uri = def.uri.clone();
            if let Err(e) = resources
                .register_resource(def, citation_handler(&citations, kind))
                .await
            {
                for uri in &registered {
                    resources.unregister_resource(uri).await;
                }
                return Err(e.into());
            }
            registered.push(uri);
        }

        info!(server = %name, "Hatch MCP server initialized with citation resources");
        Ok(HatchMCP {
            name,
            server,
            citations,
        })
    }
}

fn citation_handler(citations: &Arc<RwLock<Citations>>, kind: CitationKind) -> ResourceHandler {
    let citations = Arc::clone(citations);
    Box::new(move || {
        let text = citations.read().resolve(kind);
        Box::pin(async move { Ok(text) })
    })
}

impl HatchMCP {
    /// Start building a wrapper for a server named `name`
    pub fn builder(name: impl Into<String>) -> HatchMCPBuilder {
        HatchMCPBuilder {
            name: name.into(),
            server: None,
            citations: Citations::default(),
        }
    }

    /// Wrap a fresh server without citations
    pub async fn new(name: impl Into<String>) -> Result<Self, HatchError> {
        Self::builder(name).build().await
    }

    /// Server name used in citation URIs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped server
    pub fn server(&self) -> &McpServer {
        &self.server
    }

    /// Release the wrapped server
    pub fn into_server(self) -> McpServer {
        self.server
    }

    /// Snapshot of the current citations
    pub fn citations(&self) -> Citations {
        self.citations.read().clone()
    }

    /// Text a client reading the `kind` resource receives right now
    pub fn citation_text(&self, kind: CitationKind) -> String {
        self.citations.read().resolve(kind)
    }

    /// Replace or clear a citation
    pub fn set_citation(&self, kind: CitationKind, citation: Option<String>) {
        debug!(server = %self.name, %kind, "Citation updated");
        self.citations.write().set(kind, citation);
    }

    /// Replace the origin citation
    pub fn set_origin_citation(&self, citation: impl Into<String>) {
        self.set_citation(CitationKind::Origin, Some(citation.into()));
    }

    /// Replace the MCP implementation citation
    pub fn set_mcp_citation(&self, citation: impl Into<String>) {
        self.set_citation(CitationKind::Mcp, Some(citation.into()));
    }

    /// Citation URIs keyed by kind, origin first
    pub fn citation_uris(&self) -> Vec<(&'static str, String)> {
        CitationKind::ALL
            .iter()
            .map(|kind| (kind.key(), kind.uri(&self.name)))
            .collect()
    }

    /// Register a tool on the wrapped server
    pub async fn register_tool(
        &self,
        def: MCPToolDefinition,
        handler: ToolHandler,
    ) -> Result<(), HatchError> {
        let tool_name = def.name.clone();
        self.server.tools().register_tool(def, handler).await?;
        info!(server = %self.name, tool = %tool_name, "Tool registered");
        Ok(())
    }

    /// Serve the wrapped server on stdin/stdout
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        self.server.run_stdio().await
    }
}
