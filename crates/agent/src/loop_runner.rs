//! The agent orchestration loop.
//!
//! One `submit` drives a full run: user text goes into the session, the
//! conversation plus tool schema goes to the completion gateway, requested
//! tool calls are executed strictly in order (sensitive ones gated behind
//! the permission broker), results are appended, and the cycle repeats
//! until the model answers with plain text, the iteration bound trips, the
//! provider fails, or the user stops the run.
//!
//! Every state change flows through the session store, which broadcasts a
//! snapshot, so an attached UI watches the run unfold task by task.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use pagecraft_config::AppConfig;
use pagecraft_core::{
    AgentSession, CompletionGateway, CompletionRequest, Message, MessageToolCall,
    PermissionRequest, ScriptRecord, ScriptStore, SessionId, SessionStatus, TaskStatus, ToolCall,
    ToolRegistry, ToolResult,
};

use crate::extract;
use crate::permission::PermissionBroker;
use crate::prompt;
use crate::session_store::SessionStore;

const MSG_NOT_CONFIGURED: &str = "API key not configured";
const MSG_MAX_ITERATIONS: &str = "Maximum iterations reached";
const MSG_EMPTY_RESPONSE: &str = "Provider returned an empty response";
const MSG_PERMISSION_DENIED: &str = "Permission denied by user";

/// The element picker stays open after its call succeeds; its task is
/// settled later by [`AgentLoop::element_selected`].
const PICK_ELEMENT: &str = "pick_element";

pub struct AgentLoop {
    gateway: Option<Arc<dyn CompletionGateway>>,
    tools: Arc<ToolRegistry>,
    broker: Arc<PermissionBroker>,
    sessions: Arc<SessionStore>,
    scripts: Arc<dyn ScriptStore>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_iterations: u32,
}

impl AgentLoop {
    pub fn new(
        gateway: Option<Arc<dyn CompletionGateway>>,
        tools: Arc<ToolRegistry>,
        broker: Arc<PermissionBroker>,
        sessions: Arc<SessionStore>,
        scripts: Arc<dyn ScriptStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            gateway,
            tools,
            broker,
            sessions,
            scripts,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_iterations: config.agent.max_iterations,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn broker(&self) -> &Arc<PermissionBroker> {
        &self.broker
    }

    /// Run one user utterance to completion and return the final session
    /// snapshot.
    ///
    /// `target_script_id` marks the run as an edit of an existing script:
    /// a script produced by this run overwrites that record instead of
    /// creating a new one.
    pub async fn submit(
        &self,
        tab_id: u64,
        domain: &str,
        text: &str,
        target_script_id: Option<String>,
    ) -> AgentSession {
        let session = self.sessions.obtain(tab_id, domain).await;
        let sid = session.id.clone();

        // One advancing run per session: a submit that lands while a run
        // is in flight is refused rather than interleaved.
        if session.status == SessionStatus::Running {
            warn!(session_id = %sid, tab_id, "Rejecting submit: run already in progress");
            return session;
        }

        let Some(gateway) = self.gateway.clone() else {
            warn!(session_id = %sid, "Rejecting run: no provider configured");
            self.sessions
                .update(&sid, |s| s.fail(MSG_NOT_CONFIGURED))
                .await;
            return self.sessions.get(&sid).await.unwrap_or(session);
        };

        info!(session_id = %sid, tab_id, domain, "Starting run");
        let system = prompt::system_prompt(domain);
        self.sessions
            .update(&sid, |s| {
                if s.messages.is_empty() {
                    s.append_message(Message::system(system));
                }
                if target_script_id.is_some() {
                    s.active_script_id = target_script_id;
                }
                s.status = SessionStatus::Running;
                s.error = None;
                s.append_message(Message::user(text));
            })
            .await;

        let tool_defs = self.tools.definitions();
        let mut iteration = 0u32;

        'run: loop {
            if self.sessions.status(&sid).await != Some(SessionStatus::Running) {
                break;
            }

            iteration += 1;
            if iteration > self.max_iterations {
                warn!(session_id = %sid, iteration, "Iteration bound reached");
                self.sessions
                    .update(&sid, |s| s.fail(MSG_MAX_ITERATIONS))
                    .await;
                break;
            }

            let thinking = self
                .sessions
                .update(&sid, |s| s.add_task("Thinking", None, None))
                .await
                .unwrap_or_default();
            self.sessions
                .update(&sid, |s| {
                    s.update_task(&thinking, TaskStatus::InProgress, None, None)
                })
                .await;

            let messages = self
                .sessions
                .get(&sid)
                .await
                .map(|s| s.messages)
                .unwrap_or_default();
            let request = CompletionRequest {
                model: self.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_defs.clone(),
            };

            debug!(session_id = %sid, iteration, "Requesting completion");
            let response = match gateway.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    let reason = e.to_string();
                    warn!(session_id = %sid, error = %reason, "Provider call failed");
                    self.sessions
                        .update(&sid, |s| {
                            s.update_task(&thinking, TaskStatus::Failed, None, Some(reason.clone()));
                            s.fail(reason);
                        })
                        .await;
                    break;
                }
            };
            self.sessions
                .update(&sid, |s| s.update_task(&thinking, TaskStatus::Completed, None, None))
                .await;

            // A stop issued during the round trip discards the response
            if self.sessions.status(&sid).await != Some(SessionStatus::Running) {
                break;
            }

            if response.tool_calls.is_empty() {
                match response.content.as_deref().map(str::trim) {
                    Some(content) if !content.is_empty() => {
                        self.finish_with_text(&sid, content, text).await;
                    }
                    _ => {
                        warn!(session_id = %sid, "Provider returned neither text nor tool calls");
                        self.sessions
                            .update(&sid, |s| s.fail(MSG_EMPTY_RESPONSE))
                            .await;
                    }
                }
                break;
            }

            let echoes: Vec<MessageToolCall> = response
                .tool_calls
                .iter()
                .map(|call| MessageToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                })
                .collect();
            let commentary = response.content.clone().unwrap_or_default();
            self.sessions
                .update(&sid, |s| {
                    s.append_message(Message::assistant_with_calls(commentary, echoes))
                })
                .await;

            for call in &response.tool_calls {
                if self.sessions.status(&sid).await != Some(SessionStatus::Running) {
                    break 'run;
                }
                self.execute_call(&sid, call).await;
            }
        }

        self.sessions.get(&sid).await.unwrap_or(session)
    }

    /// Pause a running session. The in-flight provider response, if any, is
    /// discarded when it lands. Returns whether anything was paused.
    pub async fn stop(&self, session_id: &SessionId) -> bool {
        self.sessions
            .update(session_id, |s| {
                if s.status == SessionStatus::Running {
                    info!(session_id = %s.id, "Pausing run");
                    s.status = SessionStatus::Paused;
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap_or(false)
    }

    /// Deliver the user's verdict for a pending permission request.
    pub async fn resolve_permission(&self, request_id: &str, approved: bool) -> bool {
        self.broker.resolve(request_id, approved).await
    }

    /// Settle the oldest element-picker task still waiting for a selection.
    /// Returns whether a matching task was found.
    pub async fn element_selected(&self, session_id: &SessionId, selection: Value) -> bool {
        self.sessions
            .update(session_id, |s| {
                let Some(task_id) = s.oldest_awaiting_task(PICK_ELEMENT).map(|t| t.id.clone())
                else {
                    return false;
                };
                s.update_task(&task_id, TaskStatus::Completed, Some(selection), None);
                true
            })
            .await
            .unwrap_or(false)
    }

    /// Run one tool call: task bookkeeping, approval gate, dispatch, and
    /// the tool-role message feeding the result back to the model.
    async fn execute_call(&self, sid: &SessionId, call: &ToolCall) {
        let task_id = self
            .sessions
            .update(sid, |s| {
                s.add_task(
                    format!("Run tool {}", call.name),
                    Some(call.name.clone()),
                    Some(call.arguments.clone()),
                )
            })
            .await
            .unwrap_or_default();

        if self.tools.requires_approval(&call.name) {
            self.sessions
                .update(sid, |s| {
                    s.update_task(&task_id, TaskStatus::AwaitingPermission, None, None)
                })
                .await;
            let request = PermissionRequest::new(
                sid.clone(),
                call.name.clone(),
                call.arguments.clone(),
                describe_call(call),
            );
            info!(session_id = %sid, tool = %call.name, request_id = %request.id, "Requesting permission");
            if !self.broker.request(request).await {
                info!(session_id = %sid, tool = %call.name, "Permission denied");
                let denial = ToolResult::failure(MSG_PERMISSION_DENIED);
                let payload = serde_json::to_string(&denial).unwrap_or_default();
                self.sessions
                    .update(sid, |s| {
                        s.update_task(
                            &task_id,
                            TaskStatus::Failed,
                            None,
                            Some(MSG_PERMISSION_DENIED.into()),
                        );
                        s.append_message(Message::tool_result(call.id.clone(), payload));
                    })
                    .await;
                return;
            }
        }

        self.sessions
            .update(sid, |s| s.update_task(&task_id, TaskStatus::InProgress, None, None))
            .await;

        debug!(session_id = %sid, tool = %call.name, "Dispatching tool call");
        let result = self.tools.dispatch(call).await;
        let payload = serde_json::to_string(&result).unwrap_or_default();
        let status = if !result.success {
            TaskStatus::Failed
        } else if call.name == PICK_ELEMENT {
            // Picker activation succeeded; the selection arrives later
            TaskStatus::AwaitingPermission
        } else {
            TaskStatus::Completed
        };
        self.sessions
            .update(sid, |s| {
                s.update_task(&task_id, status, result.data.clone(), result.error.clone());
                s.append_message(Message::tool_result(call.id.clone(), payload));
            })
            .await;
    }

    /// Final text answer: record it, persist any script it carries, and
    /// complete the run.
    async fn finish_with_text(&self, sid: &SessionId, content: &str, user_prompt: &str) {
        let mut script_id = None;
        if let Some(extracted) = extract::extract_script(content) {
            let snapshot = self.sessions.get(sid).await;
            let domain = snapshot
                .as_ref()
                .map(|s| s.domain.clone())
                .unwrap_or_default();
            let active_id = snapshot.and_then(|s| s.active_script_id);

            let record = match self.existing_record(active_id.as_deref()).await {
                Some(mut existing) => {
                    existing.name = extracted.name;
                    existing.description = extracted.description;
                    existing.code = extracted.code;
                    existing.prompt = user_prompt.to_string();
                    existing.model = self.model.clone();
                    existing.updated_at = Utc::now();
                    existing
                }
                None => ScriptRecord::new(
                    extracted.name,
                    extracted.description,
                    extracted.code,
                    domain,
                    user_prompt,
                    self.model.clone(),
                ),
            };
            match self.scripts.upsert(record.clone()).await {
                Ok(()) => {
                    info!(session_id = %sid, script_id = %record.id, name = %record.name, "Script persisted");
                    script_id = Some(record.id);
                }
                Err(e) => warn!(session_id = %sid, error = %e, "Failed to persist script"),
            }
        }

        self.sessions
            .update(sid, |s| {
                s.append_message(Message::assistant(content));
                if script_id.is_some() {
                    s.active_script_id = script_id;
                }
                s.status = SessionStatus::Completed;
            })
            .await;
        info!(session_id = %sid, "Run completed");
    }

    async fn existing_record(&self, id: Option<&str>) -> Option<ScriptRecord> {
        let id = id?;
        match self.scripts.get(id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(script_id = id, error = %e, "Script lookup failed, creating a new record");
                None
            }
        }
    }
}

/// What the approval prompt shows the user.
fn describe_call(call: &ToolCall) -> String {
    match call.name.as_str() {
        "call_api" => {
            let method = call
                .arguments
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or("GET");
            let url = call
                .arguments
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or("an unspecified URL");
            format!("Send a {method} request to {url}")
        }
        "inject_script" => "Run a script in the current page".to_string(),
        other => format!("Run the {other} tool"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pagecraft_core::error::{ProviderError, ToolError};
    use pagecraft_core::{AgentEvent, CompletionResponse, EventBus, Role, Tool};
    use pagecraft_storage::InMemoryScriptStore;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedGateway {
        responses: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<CompletionResponse, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(text_response("Nothing further.")))
        }
    }

    fn text_response(content: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(content.into()),
            tool_calls: vec![],
        }
    }

    fn calls_response(calls: Vec<(&str, &str, Value)>) -> CompletionResponse {
        CompletionResponse {
            content: None,
            tool_calls: calls
                .into_iter()
                .map(|(id, name, arguments)| ToolCall {
                    id: id.into(),
                    name: name.into(),
                    arguments,
                })
                .collect(),
        }
    }

    struct StaticTool {
        name: &'static str,
        approval: bool,
        succeed: bool,
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "test tool"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        fn requires_approval(&self) -> bool {
            self.approval
        }
        async fn execute(&self, _arguments: Value) -> Result<ToolResult, ToolError> {
            if self.succeed {
                Ok(ToolResult::ok(json!({"tool": self.name})))
            } else {
                Ok(ToolResult::failure("boom"))
            }
        }
    }

    fn test_registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for (name, approval, succeed) in [
            ("capture_snapshot", false, true),
            ("broken_tool", false, false),
            ("inject_script", true, true),
            ("call_api", true, true),
            ("pick_element", false, true),
        ] {
            registry.register(Box::new(StaticTool {
                name,
                approval,
                succeed,
            }));
        }
        Arc::new(registry)
    }

    struct Harness {
        agent: AgentLoop,
        gateway: Arc<ScriptedGateway>,
        bus: Arc<EventBus>,
        store: Arc<InMemoryScriptStore>,
        broker: Arc<PermissionBroker>,
    }

    fn harness(responses: Vec<Result<CompletionResponse, ProviderError>>) -> Harness {
        harness_with(ScriptedGateway::new(responses), Duration::from_millis(200))
    }

    fn harness_with(gateway: ScriptedGateway, permission_timeout: Duration) -> Harness {
        let bus = Arc::new(EventBus::default());
        let sessions = Arc::new(SessionStore::new(Arc::clone(&bus)));
        let broker = Arc::new(PermissionBroker::new(Arc::clone(&bus), permission_timeout));
        let store = Arc::new(InMemoryScriptStore::new());
        let gateway = Arc::new(gateway);
        let agent = AgentLoop::new(
            Some(Arc::clone(&gateway) as Arc<dyn CompletionGateway>),
            test_registry(),
            Arc::clone(&broker),
            sessions,
            Arc::clone(&store) as Arc<dyn ScriptStore>,
            &AppConfig::default(),
        );
        Harness {
            agent,
            gateway,
            bus,
            store,
            broker,
        }
    }

    /// Answer every permission prompt with the same verdict.
    fn auto_respond(harness: &Harness, verdict: bool) {
        let mut rx = harness.bus.subscribe();
        let broker = Arc::clone(&harness.broker);
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                if let AgentEvent::PermissionRequested { request } = event.as_ref() {
                    broker.resolve(&request.id, verdict).await;
                }
            }
        });
    }

    const FINAL_ANSWER: &str = "Done! This darkens the page.\n\nName: Dark Mode\n\n```javascript\ndocument.body.classList.add('dark');\n```";

    #[tokio::test]
    async fn snapshot_then_script_run() {
        let harness = harness(vec![
            Ok(calls_response(vec![(
                "call_1",
                "capture_snapshot",
                json!({}),
            )])),
            Ok(text_response(FINAL_ANSWER)),
        ]);

        let session = harness
            .agent
            .submit(1, "example.com", "make the page dark", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(harness.gateway.call_count(), 2);

        // system, user, assistant+calls, tool result, final assistant
        let roles: Vec<Role> = session.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant
            ]
        );
        assert_eq!(session.messages[3].tool_call_id.as_deref(), Some("call_1"));

        // Thinking, tool, Thinking
        assert_eq!(session.tasks.len(), 3);
        assert!(
            session
                .tasks
                .iter()
                .all(|t| t.status == TaskStatus::Completed)
        );

        let scripts = harness.store.list_for_domain("example.com").await.unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name, "Dark Mode");
        assert_eq!(scripts[0].code, "document.body.classList.add('dark');");
        assert_eq!(scripts[0].prompt, "make the page dark");
        assert_eq!(session.active_script_id.as_deref(), Some(scripts[0].id.as_str()));
    }

    #[tokio::test]
    async fn denied_permission_fails_task_but_run_continues() {
        let harness = harness(vec![
            Ok(calls_response(vec![(
                "call_1",
                "inject_script",
                json!({"code": "alert(1)"}),
            )])),
            Ok(text_response("Understood, I won't run it.")),
        ]);
        auto_respond(&harness, false);

        let session = harness
            .agent
            .submit(1, "example.com", "try the script", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        let task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("inject_script"))
            .unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("Permission denied by user"));

        // The denial went back to the model as a failed tool result
        let tool_msg = session
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_msg.content.contains("Permission denied by user"));
        assert!(tool_msg.content.contains(r#""success":false"#));
        assert_eq!(harness.gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn approved_permission_executes_tool() {
        let harness = harness(vec![
            Ok(calls_response(vec![(
                "call_1",
                "inject_script",
                json!({"code": "alert(1)"}),
            )])),
            Ok(text_response("Ran it.")),
        ]);
        auto_respond(&harness, true);

        let session = harness
            .agent
            .submit(1, "example.com", "run the script", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        let task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("inject_script"))
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({"tool": "inject_script"})));
    }

    #[tokio::test]
    async fn unanswered_permission_times_out_as_denial() {
        let harness = harness_with(
            ScriptedGateway::new(vec![
                Ok(calls_response(vec![(
                    "call_1",
                    "call_api",
                    json!({"url": "https://api.example.com/x", "method": "POST"}),
                )])),
                Ok(text_response("Skipping the call.")),
            ]),
            Duration::from_millis(30),
        );
        // Nobody answers

        let session = harness
            .agent
            .submit(1, "example.com", "post it", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        let task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("call_api"))
            .unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("Permission denied by user"));
    }

    #[tokio::test]
    async fn provider_error_fails_the_run() {
        let harness = harness(vec![Err(ProviderError::Api {
            status_code: 401,
            message: "Invalid API key".into(),
        })]);

        let session = harness
            .agent
            .submit(1, "example.com", "make the page dark", None)
            .await;

        assert_eq!(session.status, SessionStatus::Error);
        let error = session.error.unwrap();
        assert!(error.contains("API Error: 401"));
        assert!(error.contains("Invalid API key"));
        assert_eq!(session.tasks.len(), 1);
        assert_eq!(session.tasks[0].status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn iteration_bound_fails_the_run() {
        let responses = (0..10)
            .map(|_| Ok(calls_response(vec![("call_1", "capture_snapshot", json!({}))])))
            .collect();
        let harness = harness(responses);

        let session = harness
            .agent
            .submit(1, "example.com", "loop forever", None)
            .await;

        assert_eq!(session.status, SessionStatus::Error);
        assert_eq!(session.error.as_deref(), Some("Maximum iterations reached"));
        assert_eq!(harness.gateway.call_count(), 10);
        let thinking = session
            .tasks
            .iter()
            .filter(|t| t.description == "Thinking")
            .count();
        assert_eq!(thinking, 10);
    }

    #[tokio::test]
    async fn missing_gateway_rejects_immediately() {
        let bus = Arc::new(EventBus::default());
        let sessions = Arc::new(SessionStore::new(Arc::clone(&bus)));
        let broker = Arc::new(PermissionBroker::new(
            Arc::clone(&bus),
            Duration::from_secs(1),
        ));
        let store = Arc::new(InMemoryScriptStore::new());
        let agent = AgentLoop::new(
            None,
            test_registry(),
            broker,
            sessions,
            store as Arc<dyn ScriptStore>,
            &AppConfig::default(),
        );

        let session = agent.submit(1, "example.com", "anything", None).await;
        assert_eq!(session.status, SessionStatus::Error);
        assert_eq!(session.error.as_deref(), Some("API key not configured"));
        assert!(session.messages.is_empty());
    }

    #[tokio::test]
    async fn empty_provider_response_fails_the_run() {
        let harness = harness(vec![Ok(CompletionResponse {
            content: None,
            tool_calls: vec![],
        })]);

        let session = harness
            .agent
            .submit(1, "example.com", "make the page dark", None)
            .await;

        assert_eq!(session.status, SessionStatus::Error);
        assert!(session.error.unwrap().contains("empty response"));
    }

    #[tokio::test]
    async fn failing_tool_feeds_failure_back() {
        let harness = harness(vec![
            Ok(calls_response(vec![("call_1", "broken_tool", json!({}))])),
            Ok(text_response("That tool failed, giving up politely.")),
        ]);

        let session = harness
            .agent
            .submit(1, "example.com", "break something", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        let task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("broken_tool"))
            .unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("boom"));

        let tool_msg = session
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_msg.content.contains(r#""success":false"#));
    }

    #[tokio::test]
    async fn unknown_tool_call_fails_normally() {
        let harness = harness(vec![
            Ok(calls_response(vec![("call_1", "teleport", json!({}))])),
            Ok(text_response("No such tool available.")),
        ]);

        let session = harness
            .agent
            .submit(1, "example.com", "teleport me", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        let task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("teleport"))
            .unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.as_ref().unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn denial_does_not_cancel_sibling_calls() {
        let harness = harness(vec![
            Ok(calls_response(vec![
                ("call_1", "inject_script", json!({"code": "x()"})),
                ("call_2", "capture_snapshot", json!({})),
            ])),
            Ok(text_response("Carried on without the script.")),
        ]);
        auto_respond(&harness, false);

        let session = harness
            .agent
            .submit(1, "example.com", "do both", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        let snapshot_task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("capture_snapshot"))
            .unwrap();
        assert_eq!(snapshot_task.status, TaskStatus::Completed);

        // Tool results arrive in call order
        let tool_ids: Vec<&str> = session
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(tool_ids, vec!["call_1", "call_2"]);
    }

    #[tokio::test]
    async fn stop_pauses_and_discards_in_flight_response() {
        let mut gateway = ScriptedGateway::new(vec![Ok(text_response(FINAL_ANSWER))]);
        gateway.delay = Some(Duration::from_millis(80));
        let harness = harness_with(gateway, Duration::from_millis(200));
        let agent = Arc::new(harness.agent);

        let runner = {
            let agent = Arc::clone(&agent);
            tokio::spawn(
                async move { agent.submit(1, "example.com", "make it dark", None).await },
            )
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let session = agent.sessions().obtain(1, "example.com").await;
        assert!(agent.stop(&session.id).await);

        let session = runner.await.unwrap();
        assert_eq!(session.status, SessionStatus::Paused);
        // The late response was discarded, not appended
        assert!(
            session
                .messages
                .iter()
                .all(|m| m.role != Role::Assistant || m.content.is_empty())
        );
        // Resuming the same session works
        let session = agent
            .submit(1, "example.com", "carry on", None)
            .await;
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn pick_element_waits_for_selection() {
        let harness = harness(vec![
            Ok(calls_response(vec![("call_1", "pick_element", json!({}))])),
            Ok(text_response("Waiting for your selection.")),
        ]);

        let session = harness
            .agent
            .submit(1, "example.com", "change this button", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        let task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("pick_element"))
            .unwrap();
        assert_eq!(task.status, TaskStatus::AwaitingPermission);

        let selection = json!({"selector": "#buy-now", "tag": "button"});
        assert!(
            harness
                .agent
                .element_selected(&session.id, selection.clone())
                .await
        );
        let session = harness.agent.sessions().get(&session.id).await.unwrap();
        let task = session
            .tasks
            .iter()
            .find(|t| t.tool_name.as_deref() == Some("pick_element"))
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(selection));

        // A second selection has nothing left to settle
        assert!(
            !harness
                .agent
                .element_selected(&session.id, json!({}))
                .await
        );
    }

    #[tokio::test]
    async fn follow_up_overwrites_active_script() {
        let harness = harness(vec![
            Ok(text_response(FINAL_ANSWER)),
            Ok(text_response(
                "Softer now.\n\nName: Dim Mode\n\n```js\ndocument.body.classList.add('dim');\n```",
            )),
        ]);

        let first = harness
            .agent
            .submit(1, "example.com", "make the page dark", None)
            .await;
        let first_script = first.active_script_id.clone().unwrap();

        let second = harness
            .agent
            .submit(1, "example.com", "a bit softer please", None)
            .await;

        assert_eq!(second.id, first.id);
        assert_eq!(second.active_script_id.as_deref(), Some(first_script.as_str()));
        let scripts = harness.store.list_for_domain("example.com").await.unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name, "Dim Mode");
        assert_eq!(scripts[0].code, "document.body.classList.add('dim');");
    }

    #[tokio::test]
    async fn edit_targets_existing_script() {
        let harness = harness(vec![Ok(text_response(
            "Tweaked.\n\nName: Dark Mode v2\n\n```js\ndark2();\n```",
        ))]);
        let original = ScriptRecord::new(
            "Dark Mode",
            "darkens the page",
            "dark();",
            "example.com",
            "make it dark",
            "gpt-4o-mini",
        );
        let original_id = original.id.clone();
        harness.store.upsert(original).await.unwrap();

        let session = harness
            .agent
            .submit(1, "example.com", "tweak my dark mode", Some(original_id.clone()))
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.active_script_id.as_deref(), Some(original_id.as_str()));
        let stored = harness.store.get(&original_id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Dark Mode v2");
        assert_eq!(stored.code, "dark2();");
        let scripts = harness.store.list_for_domain("example.com").await.unwrap();
        assert_eq!(scripts.len(), 1);
    }

    #[tokio::test]
    async fn plain_answer_without_code_completes_without_script() {
        let harness = harness(vec![Ok(text_response(
            "That page already has a dark mode built in.",
        ))]);

        let session = harness
            .agent
            .submit(1, "example.com", "make the page dark", None)
            .await;

        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.active_script_id.is_none());
        let scripts = harness.store.list_for_domain("example.com").await.unwrap();
        assert!(scripts.is_empty());
    }

    #[tokio::test]
    async fn thinking_task_is_visibly_in_progress() {
        let harness = harness(vec![Ok(text_response(
            "That page already has a dark mode built in.",
        ))]);
        let mut rx = harness.bus.subscribe();

        let session = harness
            .agent
            .submit(1, "example.com", "make the page dark", None)
            .await;
        assert_eq!(session.status, SessionStatus::Completed);

        // Replay the broadcast snapshots and track the Thinking task's status
        let mut observed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AgentEvent::SessionUpdated { session } = event.as_ref()
                && let Some(task) = session.tasks.first()
                && observed.last() != Some(&task.status)
            {
                observed.push(task.status);
            }
        }
        assert_eq!(
            observed,
            vec![
                TaskStatus::Pending,
                TaskStatus::InProgress,
                TaskStatus::Completed
            ]
        );
    }

    #[tokio::test]
    async fn submit_while_running_is_rejected() {
        let mut gateway = ScriptedGateway::new(vec![Ok(text_response(FINAL_ANSWER))]);
        gateway.delay = Some(Duration::from_millis(80));
        let harness = harness_with(gateway, Duration::from_millis(200));
        let agent = Arc::new(harness.agent);

        let runner = {
            let agent = Arc::clone(&agent);
            tokio::spawn(
                async move { agent.submit(1, "example.com", "make it dark", None).await },
            )
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The second submit lands mid-run and must not interleave
        let rejected = agent
            .submit(1, "example.com", "also make it blue", None)
            .await;
        assert_eq!(rejected.status, SessionStatus::Running);
        assert!(
            rejected
                .messages
                .iter()
                .all(|m| m.content != "also make it blue")
        );

        let session = runner.await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(harness.gateway.call_count(), 1);
        let user_turns = session
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .count();
        assert_eq!(user_turns, 1);
    }
}
