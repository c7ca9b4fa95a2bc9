//! Element picker tool — activates the in-page picker overlay.
//!
//! Activation succeeds immediately; the user's actual selection arrives
//! later as an out-of-band event that the agent loop reconciles against the
//! task that activated the picker. This is why a successful activation does
//! not complete its task.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use pagecraft_core::bridge::PageBridge;
use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct PickElementTool {
    bridge: Arc<dyn PageBridge>,
}

impl PickElementTool {
    pub fn new(bridge: Arc<dyn PageBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for PickElementTool {
    fn name(&self) -> &str {
        "pick_element"
    }

    fn description(&self) -> &str {
        "Ask the user to click an element on the page. Activates a picker overlay; \
         the selected element's details arrive in a later message once the user \
         has clicked."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolResult, ToolError> {
        let ack = self
            .bridge
            .dispatch("activate_picker", json!({}))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "pick_element".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::ok(ack))
    }
}
