//! Function-calling tools for the tyre advisor
//!
//! Each tool wraps one catalog or CRM operation behind a JSON-schema
//! interface so an LLM (or the HTTP API) can invoke it by name. The
//! registry owns the tools and enforces validation and per-tool
//! timeouts on every call.

pub mod catalog_tools;
pub mod crm_tools;
pub mod interface;
pub mod registry;

pub use catalog_tools::{
    CompareBrandsTool, IdentifyVehicleTool, ListBrandsTool, PriceRangeTool, RecommendTyresTool,
    SearchVehiclesTool,
};
pub use crm_tools::{BookFittingTool, CaptureLeadTool};
pub use interface::{
    ContentBlock, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema,
};
pub use registry::{standard_registry, ToolExecutor, ToolRegistry};
