//! Tool trait and registry — the fixed capability set the model can call.
//!
//! Tools are how the agent observes and acts on the page: snapshot the DOM,
//! take a screenshot, verify a selector, call an intercepted API, inject a
//! script. Sensitive tools declare `requires_approval` and are gated behind
//! a human yes/no before execution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ToolError;

/// A request, issued by the model, to invoke one named tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// The provider-issued call id
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as parsed JSON
    pub arguments: Value,
}

/// The normalized outcome of a tool execution.
///
/// This is the only shape the agent loop ever sees: failures (including an
/// unknown tool name) are folded into `success: false` rather than escaping
/// as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Result payload on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Failure reason on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(reason.into()),
        }
    }
}

/// A tool definition advertised to the LLM: name, description, and JSON
/// Schema for its parameters. The approval flag is deliberately not part of
/// this shape — it is an agent-side policy, not provider data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// The core Tool trait.
///
/// Each tool implements this trait and is registered in the ToolRegistry.
/// Implementations reach into external collaborators (page bridge, endpoint
/// catalog, outbound HTTP); the loop relies only on the normalized
/// `ToolResult` and the approval flag.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "capture_snapshot").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Whether invoking this tool needs explicit user approval.
    fn requires_approval(&self) -> bool {
        false
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to advertise to the LLM
/// 2. Look up approval requirements for a requested call
/// 3. Dispatch calls, normalizing every outcome into a `ToolResult`
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Whether the named tool needs user approval before execution.
    ///
    /// Unknown names report `false` — the call will fail at dispatch anyway,
    /// and there is nothing meaningful to ask the user about.
    pub fn requires_approval(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|t| t.requires_approval())
    }

    /// Dispatch a tool call, normalizing every outcome.
    ///
    /// An unknown name or a failing implementation yields a failed
    /// `ToolResult`; no error ever propagates out of this boundary.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            return ToolResult::failure(ToolError::Unknown(call.name.clone()).to_string());
        };
        match tool.execute(call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
