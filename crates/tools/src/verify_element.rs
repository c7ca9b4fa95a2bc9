//! Selector verification tool — checks whether a CSS selector matches
//! anything on the page before the model commits to using it.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use pagecraft_core::bridge::PageBridge;
use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct VerifyElementTool {
    bridge: Arc<dyn PageBridge>,
}

impl VerifyElementTool {
    pub fn new(bridge: Arc<dyn PageBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for VerifyElementTool {
    fn name(&self) -> &str {
        "verify_element"
    }

    fn description(&self) -> &str {
        "Check whether a CSS selector matches elements on the current page. \
         Returns the match count. Verify selectors before using them in a script."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "selector": {
                    "type": "string",
                    "description": "The CSS selector to test"
                }
            },
            "required": ["selector"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let selector = arguments["selector"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'selector' argument".into()))?;

        let report = self
            .bridge
            .dispatch("verify_element", json!({ "selector": selector }))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "verify_element".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::ok(report))
    }
}
