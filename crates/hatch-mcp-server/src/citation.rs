//! Citation resources published by every Hatch server.

use hatch_protocol::models::MCPResourceDefinition;

/// URI scheme of citation resources
pub const CITATION_SCHEME: &str = "citation";

/// MIME type citation text is served with
pub const CITATION_MIME_TYPE: &str = "text/plain";

/// Which piece of software a citation credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationKind {
    /// The original software the server exposes
    Origin,
    /// The MCP server implementation itself
    Mcp,
}

impl std::fmt::Display for CitationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl CitationKind {
    /// Both kinds, in publication order
    pub const ALL: [CitationKind; 2] = [CitationKind::Origin, CitationKind::Mcp];

    /// Short key used in URIs and URI maps
    pub fn key(&self) -> &'static str {
        match self {
            CitationKind::Origin => "origin",
            CitationKind::Mcp => "mcp",
        }
    }

    /// Resource URI for a server named `server_name`
    pub fn uri(&self, server_name: &str) -> String {
        format!("{}://{}/{}", CITATION_SCHEME, self.key(), server_name)
    }

    /// Display name of the resource
    pub fn title(&self) -> &'static str {
        match self {
            CitationKind::Origin => "Origin Citation",
            CitationKind::Mcp => "MCP Implementation Citation",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            CitationKind::Origin => {
                "Citation information for the original software exposed by this server"
            }
            CitationKind::Mcp => "Citation information for this MCP server implementation",
        }
    }

    /// Text served when no citation was supplied
    pub fn fallback(&self) -> &'static str {
        match self {
            CitationKind::Origin => "No origin citation provided.",
            CitationKind::Mcp => "No MCP implementation citation provided.",
        }
    }

    /// Resource definition for a server named `server_name`
    pub fn resource(&self, server_name: &str) -> MCPResourceDefinition {
        MCPResourceDefinition {
            uri: self.uri(server_name),
            name: self.title().to_string(),
            description: Some(self.description().to_string()),
            mime_type: Some(CITATION_MIME_TYPE.to_string()),
        }
    }
}

/// Citation texts held by a [`crate::HatchMCP`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citations {
    /// Citation of the original software
    pub origin: Option<String>,
    /// Citation of the MCP server implementation
    pub mcp: Option<String>,
}

impl Citations {
    /// The supplied citation for `kind`, if any
    pub fn get(&self, kind: CitationKind) -> Option<&str> {
        match kind {
            CitationKind::Origin => self.origin.as_deref(),
            CitationKind::Mcp => self.mcp.as_deref(),
        }
    }

    /// Replace the citation for `kind`
    pub fn set(&mut self, kind: CitationKind, text: Option<String>) {
        match kind {
            CitationKind::Origin => self.origin = text,
            CitationKind::Mcp => self.mcp = text,
        }
    }

    /// The text a reader of the `kind` resource receives
    pub fn resolve(&self, kind: CitationKind) -> String {
        self.get(kind).unwrap_or(kind.fallback()).to_string()
    }
}
