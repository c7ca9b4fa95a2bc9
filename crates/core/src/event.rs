//! Observer surface — state-change notifications for an attached UI.
//!
//! The popup/panel may attach or detach at any time, so notifications are
//! best-effort and fire-and-forget: a missing observer never blocks or fails
//! the agent loop.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::permission::PermissionRequest;
use crate::session::AgentSession;

/// Events pushed to any attached observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Full session snapshot, emitted after every mutation.
    SessionUpdated { session: Box<AgentSession> },

    /// A sensitive tool call is suspended awaiting approval.
    PermissionRequested { request: PermissionRequest },
}

/// A broadcast-based event bus for agent events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. A UI subscribes
/// to render session state and permission prompts; tests subscribe to assert
/// on emitted events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<AgentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: AgentEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AgentEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
