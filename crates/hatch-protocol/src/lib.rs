//! Hatch Protocol - Model Context Protocol wire types
//!
//! This crate provides the message and definition types shared by the Hatch
//! MCP server crates. Field names follow the MCP JSON encoding
//! (`inputSchema`, `mimeType`, `isError`).
//!
//! # Core Types
//!
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`] - JSON-RPC 2.0 envelopes
//! - [`MCPToolDefinition`] - A callable tool and its input schema
//! - [`MCPResourceDefinition`] - A readable resource
//! - [`ResourceContents`] - Text returned by `resources/read`
//!
//! # Example
//!
//! ```rust
//! use hatch_protocol::models::{JsonRpcRequest, MCPResourceDefinition};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new(1, "resources/read", Some(json!({
//!     "uri": "citation://origin/my-server"
//! })));
//! assert!(!request.is_notification());
//!
//! let resource = MCPResourceDefinition {
//!     uri: "citation://origin/my-server".to_string(),
//!     name: "Origin Citation".to_string(),
//!     description: None,
//!     mime_type: Some("text/plain".to_string()),
//! };
//! assert_eq!(resource.mime_type.as_deref(), Some("text/plain"));
//! ```

#![warn(missing_docs)]

/// Protocol models module
pub mod models;

pub use models::*;
