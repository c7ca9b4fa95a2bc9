//! Page content tool — extracts visible text, optionally scoped to a
//! selector.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use pagecraft_core::bridge::PageBridge;
use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct ReadPageContentTool {
    bridge: Arc<dyn PageBridge>,
}

impl ReadPageContentTool {
    pub fn new(bridge: Arc<dyn PageBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for ReadPageContentTool {
    fn name(&self) -> &str {
        "read_page_content"
    }

    fn description(&self) -> &str {
        "Read the visible text content of the page, or of the subtree matching \
         an optional CSS selector."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "selector": {
                    "type": "string",
                    "description": "Optional CSS selector to scope the extraction"
                }
            }
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let mut payload = json!({});
        if let Some(selector) = arguments["selector"].as_str().filter(|s| !s.is_empty()) {
            payload["selector"] = json!(selector);
        }

        let content = self
            .bridge
            .dispatch("read_page_content", payload)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "read_page_content".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::ok(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubPageBridge;

    #[tokio::test]
    async fn reads_whole_page_without_selector() {
        let bridge = Arc::new(StubPageBridge::new());
        let tool = ReadPageContentTool::new(bridge.clone());
        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.success);
        assert!(bridge.dispatched().await[0].1.get("selector").is_none());
    }

    #[tokio::test]
    async fn selector_is_forwarded() {
        let bridge = Arc::new(StubPageBridge::new());
        let tool = ReadPageContentTool::new(bridge.clone());
        tool.execute(json!({"selector": "main"})).await.unwrap();
        assert_eq!(bridge.dispatched().await[0].1["selector"], "main");
    }
}
