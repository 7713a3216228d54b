use anyhow::Result;
use hatch_protocol::models::{MCPResourceDefinition, MCPToolDefinition, ResourceContents};
use jsonschema::Validator;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A handler function for a tool.
/// Async so long-running tools never block the transport loop.
pub type ToolHandler =
    Box<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>> + Send + Sync>;

/// A handler producing the text of a resource each time it is read.
pub type ResourceHandler =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync>;

type SharedToolHandler =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>> + Send + Sync>;
type SharedResourceHandler =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync>;

/// Registry for the tools a server exposes.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<BTreeMap<String, RegisteredTool>>>,
}

/// A registered tool with its schema validator
struct RegisteredTool {
    definition: MCPToolDefinition,
    handler: SharedToolHandler,
    validator: Validator,
}

/// Errors that can occur during tool operations
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    NotFound(String),
    /// A tool with the same name is already registered
    #[error("Tool already registered: {0}")]
    Duplicate(String),
    /// Invalid arguments provided
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    /// Schema compilation failed
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// Handler execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn compile_schema(schema: &Value) -> Result<Validator, ToolError> {
        jsonschema::validator_for(schema).map_err(|e| ToolError::SchemaError(e.to_string()))
    }

    /// Register a new tool.
    /// Fails if the input schema does not compile or the name is taken.
    pub async fn register_tool(
        &self,
        def: MCPToolDefinition,
        handler: ToolHandler,
    ) -> Result<(), ToolError> {
        let validator = match Self::compile_schema(&def.input_schema) {
            Ok(validator) => validator,
            Err(e) => {
                warn!(tool = %def.name, error = %e, "Tool cannot be registered");
                return Err(e);
            }
        };

        let mut tools = self.tools.write().await;
        if tools.contains_key(&def.name) {
            return Err(ToolError::Duplicate(def.name));
        }

        debug!(tool = %def.name, "Registered tool");
        tools.insert(
            def.name.clone(),
            RegisteredTool {
                definition: def,
                handler: Arc::from(handler),
                validator,
            },
        );
        Ok(())
    }

    /// List all registered tools, ordered by name.
    pub async fn list_tools(&self) -> Vec<MCPToolDefinition> {
        let tools = self.tools.read().await;
        tools.values().map(|t| t.definition.clone()).collect()
    }

    fn validate_args(tool: &RegisteredTool, args: &Value) -> Result<(), ToolError> {
        let errors: Vec<String> = tool
            .validator
            .iter_errors(args)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            return Ok(());
        }

        let error_msg = errors.join("; ");
        warn!(tool = %tool.definition.name, error = %error_msg, "Argument validation failed");
        Err(ToolError::InvalidArguments(error_msg))
    }

    /// Call a tool by name.
    /// Arguments are validated against the tool's input schema first.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let handler = {
            let tools = self.tools.read().await;
            let tool = tools
                .get(name)
                .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
            Self::validate_args(tool, &args)?;
            Arc::clone(&tool.handler)
        };

        handler(args)
            .await
            .map_err(|e| ToolError::ExecutionError(e.to_string()))
    }

    /// Get a tool's definition by name
    pub async fn get_tool(&self, name: &str) -> Option<MCPToolDefinition> {
        let tools = self.tools.read().await;
        tools.get(name).map(|t| t.definition.clone())
    }

    /// Unregister a tool by name
    pub async fn unregister_tool(&self, name: &str) -> bool {
        let mut tools = self.tools.write().await;
        tools.remove(name).is_some()
    }

    /// Clear all registered tools
    pub async fn clear(&self) {
        let mut tools = self.tools.write().await;
        tools.clear();
    }
}

/// Errors that can occur during resource operations
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No resource with this URI
    #[error("Resource not found: {0}")]
    NotFound(String),
    /// A resource with the same URI is already registered
    #[error("Resource already registered: {0}")]
    Duplicate(String),
    /// URI is empty or has no scheme
    #[error("Invalid resource URI: '{0}'")]
    InvalidUri(String),
    /// Handler execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

struct RegisteredResource {
    definition: MCPResourceDefinition,
    handler: SharedResourceHandler,
}

/// Registry for the resources a server exposes, keyed by URI.
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    resources: Arc<RwLock<BTreeMap<String, RegisteredResource>>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource. The handler runs on every read.
    pub async fn register_resource(
        &self,
        def: MCPResourceDefinition,
        handler: ResourceHandler,
    ) -> Result<(), ResourceError> {
        if def.uri.trim().is_empty() || !def.uri.contains("://") {
            return Err(ResourceError::InvalidUri(def.uri));
        }

        let mut resources = self.resources.write().await;
        if resources.contains_key(&def.uri) {
            return Err(ResourceError::Duplicate(def.uri));
        }

        debug!(uri = %def.uri, "Registered resource");
        resources.insert(
            def.uri.clone(),
            RegisteredResource {
                definition: def,
                handler: Arc::from(handler),
            },
        );
        Ok(())
    }

    /// List all registered resources, ordered by URI.
    pub async fn list_resources(&self) -> Vec<MCPResourceDefinition> {
        let resources = self.resources.read().await;
        resources.values().map(|r| r.definition.clone()).collect()
    }

    /// Read a resource's current contents
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContents, ResourceError> {
        let (handler, mime_type) = {
            let resources = self.resources.read().await;
            let resource = resources
                .get(uri)
                .ok_or_else(|| ResourceError::NotFound(uri.to_string()))?;
            (
                Arc::clone(&resource.handler),
                resource.definition.mime_type.clone(),
            )
        };

        let text = handler()
            .await
            .map_err(|e| ResourceError::ExecutionError(e.to_string()))?;

        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type,
            text,
        })
    }

    /// Whether a URI is registered
    pub async fn contains(&self, uri: &str) -> bool {
        self.resources.read().await.contains_key(uri)
    }

    /// Unregister a resource by URI
    pub async fn unregister_resource(&self, uri: &str) -> bool {
        let mut resources = self.resources.write().await;
        resources.remove(uri).is_some()
    }
}
