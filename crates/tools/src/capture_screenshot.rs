//! Screenshot tool — captures the visible tab as an image data URL.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use pagecraft_core::bridge::PageBridge;
use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct CaptureScreenshotTool {
    bridge: Arc<dyn PageBridge>,
}

impl CaptureScreenshotTool {
    pub fn new(bridge: Arc<dyn PageBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for CaptureScreenshotTool {
    fn name(&self) -> &str {
        "capture_screenshot"
    }

    fn description(&self) -> &str {
        "Take a screenshot of the visible part of the page. Returns the image as \
         a data URL. Useful for checking the visual result of a change."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolResult, ToolError> {
        let shot = self
            .bridge
            .dispatch("capture_screenshot", json!({}))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "capture_screenshot".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::ok(shot))
    }
}
