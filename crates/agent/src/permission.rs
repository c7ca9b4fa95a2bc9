//! Permission broker — suspends sensitive tool calls on a human yes/no.
//!
//! Each pending request holds a oneshot sender; whichever side settles
//! first (user verdict or timeout) removes the entry, so a request resolves
//! exactly once and late verdicts are no-ops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

use pagecraft_core::{AgentEvent, EventBus, PermissionRequest};

pub struct PermissionBroker {
    pending: Mutex<HashMap<String, oneshot::Sender<bool>>>,
    events: Arc<EventBus>,
    timeout: Duration,
}

impl PermissionBroker {
    pub fn new(events: Arc<EventBus>, timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            events,
            timeout,
        }
    }

    /// Raise a request and wait for the verdict. Returns the approval
    /// decision; no answer within the timeout counts as denied.
    pub async fn request(&self, request: PermissionRequest) -> bool {
        let id = request.id.clone();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);
        self.events
            .publish(AgentEvent::PermissionRequested { request });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(approved)) => {
                debug!(request_id = %id, approved, "Permission resolved");
                approved
            }
            // Sender dropped without a verdict; treat as denial
            Ok(Err(_)) => false,
            Err(_) => {
                warn!(request_id = %id, "Permission request timed out, denying");
                self.pending.lock().await.remove(&id);
                false
            }
        }
    }

    /// Deliver the user's verdict. Returns `false` if the request is not
    /// pending anymore (already settled or timed out).
    pub async fn resolve(&self, request_id: &str, approved: bool) -> bool {
        let Some(tx) = self.pending.lock().await.remove(request_id) else {
            debug!(request_id, "Verdict for unknown or settled request, ignoring");
            return false;
        };
        tx.send(approved).is_ok()
    }

    /// Number of requests currently awaiting a verdict.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
