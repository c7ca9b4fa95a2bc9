//! Error types for the pagecraft domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all pagecraft operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("{0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Page bridge errors ---
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // --- Script store errors ---
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors from the completions API round trip.
///
/// `Api` keeps the upstream status code visible: observers need to be able
/// to tell "the model never converged" from "the network failed" from
/// "the provider rejected us", and the session error text is shown verbatim.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API Error: {status_code}: {message}")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Errors crossing the extension ↔ page-context boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Page context not reachable: {0}")]
    Disconnected(String),

    #[error("Page command '{command}' failed: {reason}")]
    Command { command: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Corrupt script record: {0}")]
    Corrupt(String),
}
