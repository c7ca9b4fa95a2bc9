//! API call tool — performs a real HTTP request against an intercepted
//! endpoint. Sensitive: gated behind user approval.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct CallApiTool {
    client: reqwest::Client,
}

impl CallApiTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for CallApiTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CallApiTool {
    fn name(&self) -> &str {
        "call_api"
    }

    fn description(&self) -> &str {
        "Call one of the site's API endpoints. Supports GET, POST, PUT, PATCH, \
         and DELETE with optional headers and body. Returns the status code and \
         response body. Requires user approval."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The endpoint URL"
                },
                "method": {
                    "type": "string",
                    "description": "HTTP method",
                    "enum": ["GET", "POST", "PUT", "PATCH", "DELETE"]
                },
                "headers": {
                    "type": "object",
                    "description": "Optional HTTP headers as key-value pairs",
                    "additionalProperties": { "type": "string" }
                },
                "body": {
                    "type": "string",
                    "description": "Optional request body"
                }
            },
            "required": ["url", "method"]
        })
    }

    fn requires_approval(&self) -> bool {
        true
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;
        let method = arguments["method"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'method' argument".into()))?
            .to_uppercase();

        if !matches!(method.as_str(), "GET" | "POST" | "PUT" | "PATCH" | "DELETE") {
            return Err(ToolError::InvalidArguments(format!(
                "Invalid HTTP method: {method}"
            )));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        let headers: HashMap<String, String> = arguments
            .get("headers")
            .and_then(|h| serde_json::from_value(h.clone()).ok())
            .unwrap_or_default();
        let body = arguments["body"].as_str().map(str::to_owned);

        debug!(%url, %method, "Calling site API");

        let mut request = match method.as_str() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            "PATCH" => self.client.patch(url),
            _ => self.client.delete(url),
        };
        for (name, value) in &headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "call_api".into(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        Ok(ToolResult {
            success: status < 400,
            data: Some(json!({ "status": status, "body": text })),
            error: if status < 400 {
                None
            } else {
                Some(format!("Endpoint returned HTTP {status}"))
            },
        })
    }
}
