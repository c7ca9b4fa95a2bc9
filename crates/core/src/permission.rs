//! Permission request value object.
//!
//! Exists only between being raised and being resolved (approved, denied, or
//! timed out); never persisted beyond that window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::session::SessionId;

/// A suspended sensitive tool call awaiting a human yes/no.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// Unique request id
    pub id: String,

    /// Session the call belongs to
    pub session_id: SessionId,

    /// The sensitive tool being gated
    pub tool_name: String,

    /// The call's arguments, shown to the user
    pub arguments: Value,

    /// Human-readable description of what approval would allow
    pub description: String,

    /// When the request was raised
    pub created_at: DateTime<Utc>,
}

impl PermissionRequest {
    pub fn new(
        session_id: SessionId,
        tool_name: impl Into<String>,
        arguments: Value,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            tool_name: tool_name.into(),
            arguments,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
