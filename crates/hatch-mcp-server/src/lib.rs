//! Hatch MCP Server - the wrapper for MCP servers serving Hatch applications.
//!
//! [`HatchMCP`] extends an MCP server with functionality relevant to the
//! Hatch ecosystem:
//!
//! - Citations for the origin software and for the MCP server implementation,
//!   published as MCP resources.

#![warn(missing_docs)]

/// Citation kinds and texts
pub mod citation;
/// Server configuration files
pub mod config;
/// The HatchMCP wrapper
pub mod hatch_mcp;
/// Tool and resource registries
pub mod registry;
/// JSON-RPC dispatch and stdio transport
pub mod server;

pub use hatch_mcp::HatchMCP;

/// Version of this package
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Names this package publishes as its public API
pub const EXPORTS: &[&str] = &["HatchMCP"];
