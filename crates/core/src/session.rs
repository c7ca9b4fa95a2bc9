//! Agent session state — the durable record of one conversation thread
//! bound to one browser tab.
//!
//! Messages are append-only; tasks are append-only within a run but mutable
//! in place (status/result updates). Every mutator bumps `updated_at` so a
//! UI observer can order snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::message::Message;

/// Unique identifier for an agent session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a session's current run.
///
/// `Completed` and `Error` are terminal for the run; a later user message on
/// the same tab re-enters `Running` on the same session id if the session has
/// not been swept yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Error,
}

impl SessionStatus {
    /// Whether this status ends the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Status of a single task (one LLM turn or one tool call) within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    AwaitingPermission,
    Completed,
    Failed,
}

/// The UI-facing record of one step within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: String,

    /// Human-readable step description
    pub description: String,

    /// Tool being invoked, if this task wraps a tool call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// The tool call's arguments, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,

    /// Current status
    pub status: TaskStatus,

    /// Result payload once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Failure reason once failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One conversation thread bound to one browser tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    /// Session identity
    pub id: SessionId,

    /// Owning browser tab
    pub tab_id: u64,

    /// Domain of the page being customized
    pub domain: String,

    /// Current run status
    pub status: SessionStatus,

    /// Ordered conversation, append-only
    pub messages: Vec<Message>,

    /// Ordered task list, append-only
    pub tasks: Vec<Task>,

    /// The most recently produced persisted script, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_script_id: Option<String>,

    /// Human-readable failure message, set only when status = error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Bumped on every mutation
    pub updated_at: DateTime<Utc>,
}

impl AgentSession {
    /// Create a new idle session for a tab.
    pub fn new(tab_id: u64, domain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            tab_id,
            domain: domain.into(),
            status: SessionStatus::Idle,
            messages: Vec::new(),
            tasks: Vec::new(),
            active_script_id: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message. Messages are never reordered or removed.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Append a new pending task and return its id.
    pub fn add_task(
        &mut self,
        description: impl Into<String>,
        tool_name: Option<String>,
        parameters: Option<Value>,
    ) -> String {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            tool_name,
            parameters,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
        };
        let id = task.id.clone();
        self.tasks.push(task);
        self.updated_at = Utc::now();
        id
    }

    /// Update a task's status/result in place. No-op if the id is unknown.
    pub fn update_task(
        &mut self,
        task_id: &str,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<String>,
    ) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.status = status;
            if result.is_some() {
                task.result = result;
            }
            if error.is_some() {
                task.error = error;
            }
            self.updated_at = Utc::now();
        }
    }

    /// Mark the run failed with a human-readable message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Error;
        self.error = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// The oldest task for `tool_name` still awaiting permission, if any.
    ///
    /// Used to reconcile the element picker's out-of-band selection event
    /// against the task that activated the picker.
    pub fn oldest_awaiting_task(&self, tool_name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| {
            t.status == TaskStatus::AwaitingPermission && t.tool_name.as_deref() == Some(tool_name)
        })
    }
}
