//! # Pagecraft Core
//!
//! Domain types, traits, and error definitions for the pagecraft agent —
//! the background runtime that lets a user describe a website customization
//! in natural language and has an LLM propose JavaScript through a small,
//! approval-gated tool set.
//!
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against. The page-context
//! collaborators (DOM analyzer, element picker, traffic interceptor) and the
//! script storage are represented here only as traits; their implementations
//! live elsewhere.

pub mod bridge;
pub mod error;
pub mod event;
pub mod gateway;
pub mod message;
pub mod permission;
pub mod script;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use bridge::{ApiEndpoint, EndpointCatalog, PageBridge};
pub use error::{Error, Result};
pub use event::{AgentEvent, EventBus};
pub use gateway::{CompletionGateway, CompletionRequest, CompletionResponse};
pub use message::{Message, MessageToolCall, Role};
pub use permission::PermissionRequest;
pub use script::{ScriptRecord, ScriptStore};
pub use session::{AgentSession, SessionId, SessionStatus, Task, TaskStatus};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
