//! Traits for the page-context collaborators.
//!
//! The DOM analyzer, screenshot capture, element picker, and script injector
//! all run inside the page; the traffic interceptor builds its endpoint
//! catalog elsewhere in the extension. This crate sees them only through
//! these traits — tool implementations hold a `PageBridge` and treat every
//! payload as opaque JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// The extension ↔ page-context messaging boundary.
#[async_trait]
pub trait PageBridge: Send + Sync {
    /// Send a named command into the page and await its JSON reply.
    async fn dispatch(
        &self,
        command: &str,
        payload: Value,
    ) -> std::result::Result<Value, BridgeError>;
}

/// One intercepted API endpoint observed on a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// Full request URL
    pub url: String,

    /// HTTP method
    pub method: String,

    /// Interceptor-assigned category (e.g., "data", "auth", "analytics")
    pub category: String,
}

/// Read-only lookup into the interceptor's per-domain endpoint catalog.
pub trait EndpointCatalog: Send + Sync {
    /// Endpoints observed for a domain. Unknown domains yield an empty list.
    fn endpoints_for(&self, domain: &str) -> Vec<ApiEndpoint>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_serialization() {
        let ep = ApiEndpoint {
            url: "https://example.com/api/v1/items".into(),
            method: "GET".into(),
            category: "data".into(),
        };
        let json = serde_json::to_string(&ep).unwrap();
        assert!(json.contains("api/v1/items"));
        let back: ApiEndpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, "GET");
    }
}
