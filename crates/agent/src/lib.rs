//! # Pagecraft Agent
//!
//! The orchestration layer: the multi-turn agent loop, the session store
//! that gives every browser tab an observable conversation thread, the
//! permission broker that gates sensitive tool calls on a human verdict,
//! and the extractor that turns a final answer into a persisted script.

pub mod extract;
pub mod loop_runner;
pub mod permission;
pub mod prompt;
pub mod session_store;

pub use extract::{ExtractedScript, extract_script};
pub use loop_runner::AgentLoop;
pub use permission::PermissionBroker;
pub use session_store::SessionStore;
