//! The fixed tool catalog for the pagecraft agent.
//!
//! Eight tools, statically known:
//!
//! | tool               | approval |
//! |--------------------|----------|
//! | capture_snapshot   | no       |
//! | capture_screenshot | no       |
//! | pick_element       | no       |
//! | verify_element     | no       |
//! | read_page_content  | no       |
//! | get_api_endpoints  | no       |
//! | call_api           | **yes**  |
//! | inject_script      | **yes**  |
//!
//! The page-facing tools talk to the content script through a [`PageBridge`];
//! `get_api_endpoints` reads the traffic interceptor's catalog;
//! `call_api` performs real outbound HTTP.

pub mod call_api;
pub mod capture_screenshot;
pub mod capture_snapshot;
pub mod get_api_endpoints;
pub mod inject_script;
pub mod pick_element;
pub mod read_page_content;
pub mod stub;
pub mod verify_element;

use std::sync::Arc;

use pagecraft_core::bridge::{EndpointCatalog, PageBridge};
use pagecraft_core::tool::ToolRegistry;

pub use stub::{StaticEndpointCatalog, StubPageBridge};

/// Build the full registry for one tab, bound to its bridge and domain.
pub fn default_registry(
    bridge: Arc<dyn PageBridge>,
    catalog: Arc<dyn EndpointCatalog>,
    domain: impl Into<String>,
) -> ToolRegistry {
    let domain = domain.into();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(capture_snapshot::CaptureSnapshotTool::new(
        bridge.clone(),
    )));
    registry.register(Box::new(capture_screenshot::CaptureScreenshotTool::new(
        bridge.clone(),
    )));
    registry.register(Box::new(pick_element::PickElementTool::new(bridge.clone())));
    registry.register(Box::new(verify_element::VerifyElementTool::new(
        bridge.clone(),
    )));
    registry.register(Box::new(read_page_content::ReadPageContentTool::new(
        bridge.clone(),
    )));
    registry.register(Box::new(get_api_endpoints::GetApiEndpointsTool::new(
        catalog, &domain,
    )));
    registry.register(Box::new(call_api::CallApiTool::new()));
    registry.register(Box::new(inject_script::InjectScriptTool::new(bridge)));
    registry
}
