//! Endpoint catalog tool — lists the API endpoints the traffic interceptor
//! has observed for the tab's domain.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use pagecraft_core::bridge::EndpointCatalog;
use pagecraft_core::error::ToolError;
use pagecraft_core::tool::{Tool, ToolResult};

pub struct GetApiEndpointsTool {
    catalog: Arc<dyn EndpointCatalog>,
    domain: String,
}

impl GetApiEndpointsTool {
    pub fn new(catalog: Arc<dyn EndpointCatalog>, domain: &str) -> Self {
        Self {
            catalog,
            domain: domain.to_string(),
        }
    }
}

#[async_trait]
impl Tool for GetApiEndpointsTool {
    fn name(&self) -> &str {
        "get_api_endpoints"
    }

    fn description(&self) -> &str {
        "List the API endpoints observed on this site, grouped with their HTTP \
         method and category. Use call_api to invoke one of them."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolResult, ToolError> {
        let endpoints = self.catalog.endpoints_for(&self.domain);
        Ok(ToolResult::ok(json!({
            "domain": self.domain,
            "endpoints": endpoints,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StaticEndpointCatalog;
    use pagecraft_core::bridge::ApiEndpoint;

    #[tokio::test]
    async fn lists_endpoints_for_bound_domain() {
        let mut catalog = StaticEndpointCatalog::new();
        catalog.insert(
            "example.com",
            ApiEndpoint {
                url: "https://example.com/api/v1/items".into(),
                method: "GET".into(),
                category: "data".into(),
            },
        );
        let tool = GetApiEndpointsTool::new(Arc::new(catalog), "example.com");
        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["endpoints"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_domain_yields_empty_list() {
        let tool = GetApiEndpointsTool::new(
            Arc::new(StaticEndpointCatalog::default()),
            "unobserved.example",
        );
        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.success);
        assert!(result.data.unwrap()["endpoints"].as_array().unwrap().is_empty());
    }
}
