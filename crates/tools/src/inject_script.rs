//! Script injection tool — runs proposed JavaScript in the page.
//! Sensitive: gated behind user approval.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use pagecraft_core::bridge::PageBridge;
use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct InjectScriptTool {
    bridge: Arc<dyn PageBridge>,
}

impl InjectScriptTool {
    pub fn new(bridge: Arc<dyn PageBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for InjectScriptTool {
    fn name(&self) -> &str {
        "inject_script"
    }

    fn description(&self) -> &str {
        "Inject and run JavaScript in the current page to try out a customization. \
         Provide the code and a short description of what it does. Requires user \
         approval."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The JavaScript source to run"
                },
                "description": {
                    "type": "string",
                    "description": "What the script does, shown to the user"
                }
            },
            "required": ["code", "description"]
        })
    }

    fn requires_approval(&self) -> bool {
        true
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let code = arguments["code"]
            .as_str()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'code' argument".into()))?;
        let description = arguments["description"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'description' argument".into()))?;

        debug!(bytes = code.len(), %description, "Injecting script");

        let outcome = self
            .bridge
            .dispatch(
                "inject_script",
                json!({ "code": code, "description": description }),
            )
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "inject_script".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::ok(outcome))
    }
}
