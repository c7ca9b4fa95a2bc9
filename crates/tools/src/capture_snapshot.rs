//! DOM snapshot tool — asks the page's analyzer for a structured view of
//! the current document.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use pagecraft_core::bridge::PageBridge;
use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct CaptureSnapshotTool {
    bridge: Arc<dyn PageBridge>,
}

impl CaptureSnapshotTool {
    pub fn new(bridge: Arc<dyn PageBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for CaptureSnapshotTool {
    fn name(&self) -> &str {
        "capture_snapshot"
    }

    fn description(&self) -> &str {
        "Capture a structured snapshot of the current page's DOM: notable elements, \
         their selectors, and visible text. Use this first to understand the page \
         before proposing changes."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolResult, ToolError> {
        let snapshot = self
            .bridge
            .dispatch("capture_snapshot", json!({}))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "capture_snapshot".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::ok(snapshot))
    }
}
