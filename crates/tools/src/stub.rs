//! Test doubles for the page-context collaborators.
//!
//! `StubPageBridge` returns realistic canned payloads for every page command
//! so the agent loop and CLI host can run end-to-end without a browser.
//! `StaticEndpointCatalog` serves a fixed per-domain endpoint list standing
//! in for the traffic interceptor.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::sync::Mutex;

use pagecraft_core::bridge::{ApiEndpoint, EndpointCatalog, PageBridge};
use pagecraft_core::error::BridgeError;

/// A page bridge that answers every command with a canned payload and
/// records what was dispatched.
pub struct StubPageBridge {
    dispatched: Mutex<Vec<(String, Value)>>,
}

impl StubPageBridge {
    pub fn new() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
        }
    }

    /// Commands dispatched so far, in order.
    pub async fn dispatched(&self) -> Vec<(String, Value)> {
        self.dispatched.lock().await.clone()
    }
}

impl Default for StubPageBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageBridge for StubPageBridge {
    async fn dispatch(&self, command: &str, payload: Value) -> Result<Value, BridgeError> {
        self.dispatched
            .lock()
            .await
            .push((command.to_string(), payload.clone()));

        match command {
            "capture_snapshot" => Ok(json!({
                "url": "https://example.com/",
                "title": "Example Domain",
                "elements": [
                    {"tag": "header", "selector": "body > header", "text": "Example"},
                    {"tag": "main", "selector": "body > main", "text": "This domain is for use in examples."},
                ]
            })),
            "capture_screenshot" => Ok(json!({
                "image": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg=",
                "width": 1280,
                "height": 800
            })),
            "activate_picker" => Ok(json!({
                "activated": true,
                "message": "Element picker activated; waiting for the user to click an element"
            })),
            "verify_element" => {
                let selector = payload["selector"].as_str().unwrap_or_default();
                Ok(json!({
                    "selector": selector,
                    "found": !selector.contains("missing"),
                    "count": if selector.contains("missing") { 0 } else { 1 }
                }))
            }
            "read_page_content" => Ok(json!({
                "text": "Example Domain. This domain is for use in illustrative examples in documents."
            })),
            "inject_script" => Ok(json!({ "injected": true })),
            other => Err(BridgeError::Command {
                command: other.to_string(),
                reason: "unsupported stub command".into(),
            }),
        }
    }
}

/// A fixed in-memory endpoint catalog.
#[derive(Default)]
pub struct StaticEndpointCatalog {
    by_domain: HashMap<String, Vec<ApiEndpoint>>,
}

impl StaticEndpointCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observed endpoint for a domain.
    pub fn insert(&mut self, domain: impl Into<String>, endpoint: ApiEndpoint) {
        self.by_domain.entry(domain.into()).or_default().push(endpoint);
    }
}

impl EndpointCatalog for StaticEndpointCatalog {
    fn endpoints_for(&self, domain: &str) -> Vec<ApiEndpoint> {
        self.by_domain.get(domain).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_records_dispatches() {
        let bridge = StubPageBridge::new();
        bridge.dispatch("capture_snapshot", json!({})).await.unwrap();
        bridge
            .dispatch("verify_element", json!({"selector": "#nav"}))
            .await
            .unwrap();

        let calls = bridge.dispatched().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "capture_snapshot");
        assert_eq!(calls[1].1["selector"], "#nav");
    }

    #[tokio::test]
    async fn unknown_command_errors() {
        let bridge = StubPageBridge::new();
        let err = bridge.dispatch("format_disk", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("format_disk"));
    }

    #[test]
    fn catalog_lookup() {
        let mut catalog = StaticEndpointCatalog::new();
        catalog.insert(
            "example.com",
            ApiEndpoint {
                url: "https://example.com/api/v1/items".into(),
                method: "GET".into(),
                category: "data".into(),
            },
        );
        assert_eq!(catalog.endpoints_for("example.com").len(), 1);
        assert!(catalog.endpoints_for("other.com").is_empty());
    }
}
