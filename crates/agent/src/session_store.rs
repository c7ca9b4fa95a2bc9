//! In-memory session store with tab affinity and terminal-session sweeping.
//!
//! One tab maps to at most one session. Every mutation goes through
//! [`SessionStore::update`], which publishes a full snapshot on the event
//! bus so an attached UI can re-render without diffing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use pagecraft_core::{AgentEvent, AgentSession, EventBus, SessionId, SessionStatus};

pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, AgentSession>>,
    /// tab_id → session, so a follow-up utterance lands in the same thread
    tabs: RwLock<HashMap<u64, SessionId>>,
    events: Arc<EventBus>,
}

impl SessionStore {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            tabs: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// The session for a tab, resuming the existing one if it has not been
    /// swept, otherwise creating a fresh one bound to the tab.
    pub async fn obtain(&self, tab_id: u64, domain: &str) -> AgentSession {
        let mut tabs = self.tabs.write().await;
        let mut sessions = self.sessions.write().await;

        if let Some(id) = tabs.get(&tab_id)
            && let Some(session) = sessions.get(id)
        {
            return session.clone();
        }

        let session = AgentSession::new(tab_id, domain);
        debug!(session_id = %session.id, tab_id, domain, "Created session");
        tabs.insert(tab_id, session.id.clone());
        sessions.insert(session.id.clone(), session.clone());
        self.events.publish(AgentEvent::SessionUpdated {
            session: Box::new(session.clone()),
        });
        session
    }

    /// Snapshot a session by id.
    pub async fn get(&self, id: &SessionId) -> Option<AgentSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Just the status, without cloning the whole session.
    pub async fn status(&self, id: &SessionId) -> Option<SessionStatus> {
        self.sessions.read().await.get(id).map(|s| s.status)
    }

    /// Mutate a session under the write lock and publish the new snapshot.
    ///
    /// Returns `None` if the session no longer exists (swept mid-run).
    pub async fn update<T>(
        &self,
        id: &SessionId,
        mutate: impl FnOnce(&mut AgentSession) -> T,
    ) -> Option<T> {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(id)?;
            let out = mutate(session);
            (out, session.clone())
        };
        let (out, session) = snapshot;
        self.events.publish(AgentEvent::SessionUpdated {
            session: Box::new(session),
        });
        Some(out)
    }

    /// Remove terminal sessions whose last activity is older than
    /// `retention`. Returns how many were removed.
    ///
    /// A session that re-entered `Running` between the scan and the removal
    /// is kept; terminal status is re-checked under the write lock.
    pub async fn sweep_terminal(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::hours(1));

        let candidates: Vec<SessionId> = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .filter(|s| s.status.is_terminal() && s.updated_at < cutoff)
                .map(|s| s.id.clone())
                .collect()
        };
        if candidates.is_empty() {
            return 0;
        }

        let mut removed = 0;
        let mut tabs = self.tabs.write().await;
        let mut sessions = self.sessions.write().await;
        for id in &candidates {
            let still_expired = sessions
                .get(id)
                .is_some_and(|s| s.status.is_terminal() && s.updated_at < cutoff);
            if still_expired {
                if let Some(session) = sessions.remove(id) {
                    tabs.remove(&session.tab_id);
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            info!(removed, "Swept expired sessions");
        }
        removed
    }

    /// Spawn a background task that sweeps on an interval.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration, retention: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                store.sweep_terminal(retention).await;
            }
        })
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
