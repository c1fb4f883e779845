//! Tool interface
//!
//! The function-calling surface handed to whatever drives the
//! conversation. Schemas are plain JSON Schema objects so any LLM runtime
//! or API client can consume them unchanged.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use tyreplex_config::constants::tools::DEFAULT_TOOL_TIMEOUT_SECS;

/// Tool execution error
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("tool {name} timed out after {seconds}s")]
    Timeout { name: String, seconds: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn timeout(name: &str, seconds: u64) -> Self {
        Self::Timeout {
            name: name.to_string(),
            seconds,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// A single block of tool output content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

/// Tool output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// JSON payload rendered as a single text block.
    pub fn json(value: Value) -> Self {
        Self::text(value.to_string())
    }

    /// First text block, if any.
    pub fn as_text(&self) -> Option<&str> {
        self.content.first().map(|block| match block {
            ContentBlock::Text { text } => text.as_str(),
        })
    }
}

/// Schema for a single tool parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    pub description: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: &str) -> Self {
        Self {
            property_type: "string".to_string(),
            description: description.to_string(),
            enum_values: None,
        }
    }

    pub fn number(description: &str) -> Self {
        Self {
            property_type: "number".to_string(),
            description: description.to_string(),
            enum_values: None,
        }
    }

    pub fn integer(description: &str) -> Self {
        Self {
            property_type: "integer".to_string(),
            description: description.to_string(),
            enum_values: None,
        }
    }

    pub fn enum_type(description: &str, values: Vec<String>) -> Self {
        Self {
            property_type: "string".to_string(),
            description: description.to_string(),
            enum_values: Some(values),
        }
    }
}

/// JSON Schema for tool input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a property, marking it required or optional.
    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        if required {
            self.required.push(name.to_string());
        }
        self.properties.insert(name.to_string(), schema);
        self
    }
}

/// Tool schema advertised to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

/// A callable tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Check required fields are present before execution.
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let schema = self.schema();
        if schema.input_schema.required.is_empty() {
            return Ok(());
        }
        let object = input
            .as_object()
            .ok_or_else(|| ToolError::invalid_params("arguments must be a JSON object"))?;
        for field in &schema.input_schema.required {
            if !object.contains_key(field) {
                return Err(ToolError::invalid_params(format!("{} is required", field)));
            }
        }
        Ok(())
    }

    fn timeout_secs(&self) -> u64 {
        DEFAULT_TOOL_TIMEOUT_SECS
    }
}
