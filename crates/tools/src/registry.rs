//! Tool Registry
//!
//! Manages tool registration, discovery, and execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tyreplex_agent::TyreAdvisor;
use tyreplex_catalog::CatalogHandle;
use tyreplex_persistence::{BookingStore, LeadStore};

use crate::catalog_tools::{
    CompareBrandsTool, IdentifyVehicleTool, ListBrandsTool, PriceRangeTool, RecommendTyresTool,
    SearchVehiclesTool,
};
use crate::crm_tools::{BookFittingTool, CaptureLeadTool};
use crate::interface::{Tool, ToolError, ToolOutput, ToolSchema};

/// Tool executor trait
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// List available tools
    fn list_tools(&self) -> Vec<ToolSchema>;

    /// Get tool schema by name
    fn get_tool(&self, name: &str) -> Option<ToolSchema>;
}

/// Tool registry
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Register a boxed tool
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    /// Execute a tool, validating its arguments and enforcing the
    /// per-tool timeout.
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("Tool not found: {}", name)))?;

        tool.validate(&arguments)?;

        let timeout_secs = tool.timeout_secs();
        let timeout_duration = Duration::from_secs(timeout_secs);

        tracing::trace!(
            tool = name,
            timeout_secs = timeout_secs,
            "Executing tool with timeout"
        );

        match tokio::time::timeout(timeout_duration, tool.execute(arguments)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ToolError::timeout(name, timeout_secs)),
        }
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    fn get_tool(&self, name: &str) -> Option<ToolSchema> {
        self.tools.get(name).map(|t| t.schema())
    }
}

/// The standard tool set: six catalog queries plus lead capture and
/// fitting booking.
pub fn standard_registry(
    advisor: Arc<TyreAdvisor>,
    catalog: CatalogHandle,
    leads: Arc<dyn LeadStore>,
    bookings: Arc<dyn BookingStore>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(IdentifyVehicleTool::new(advisor));
    registry.register(RecommendTyresTool::new(catalog.clone()));
    registry.register(CompareBrandsTool::new(catalog.clone()));
    registry.register(SearchVehiclesTool::new(catalog.clone()));
    registry.register(PriceRangeTool::new(catalog.clone()));
    registry.register(ListBrandsTool::new(catalog));
    registry.register(CaptureLeadTool::new(leads));
    registry.register(BookFittingTool::new(bookings));

    tracing::info!(tools = registry.len(), "Created tool registry");

    registry
}
