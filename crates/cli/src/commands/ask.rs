//! `pagecraft ask` — run one customization request headlessly.
//!
//! There is no real browser here; the tools run against the stub page
//! bridge, so this command exercises the full loop (provider round trips,
//! task tracking, permission prompts, script persistence) with canned page
//! data.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pagecraft_agent::{AgentLoop, PermissionBroker, SessionStore};
use pagecraft_config::AppConfig;
use pagecraft_core::{AgentEvent, CompletionGateway, EventBus, Role, SessionStatus, TaskStatus};
use pagecraft_provider::OpenAiGateway;
use pagecraft_tools::{StaticEndpointCatalog, StubPageBridge, default_registry};

pub async fn run(
    prompt: &str,
    domain: &str,
    tab: u64,
    approve_all: bool,
    script: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_credentials() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    PAGECRAFT_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::default_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let bus = Arc::new(EventBus::default());
    let sessions = Arc::new(SessionStore::new(Arc::clone(&bus)));
    let broker = Arc::new(PermissionBroker::new(
        Arc::clone(&bus),
        Duration::from_secs(config.agent.permission_timeout_secs),
    ));
    let store = super::build_store(&config);

    let bridge = Arc::new(StubPageBridge::new());
    let catalog = Arc::new(StaticEndpointCatalog::new());
    let tools = Arc::new(default_registry(bridge, catalog, domain));

    let gateway: Arc<dyn CompletionGateway> = Arc::new(OpenAiGateway::from_config(&config)?);
    let agent = AgentLoop::new(
        Some(gateway),
        tools,
        Arc::clone(&broker),
        sessions,
        Arc::clone(&store),
        &config,
    );

    spawn_task_printer(&bus);
    spawn_permission_responder(&bus, broker, approve_all);

    println!("  {domain}: {prompt}");
    let session = agent.submit(tab, domain, prompt, script).await;

    println!();
    match session.status {
        SessionStatus::Completed => {
            if let Some(answer) = session
                .messages
                .iter()
                .rev()
                .find(|m| m.role == Role::Assistant && !m.content.is_empty())
            {
                println!("{}", answer.content);
            }
            if let Some(id) = &session.active_script_id
                && let Ok(Some(record)) = store.get(id).await
            {
                println!();
                println!("  Saved script '{}' ({})", record.name, record.id);
            }
            Ok(())
        }
        SessionStatus::Error => {
            let reason = session.error.unwrap_or_else(|| "unknown error".into());
            Err(format!("Run failed: {reason}").into())
        }
        other => Err(format!("Run ended in unexpected state: {other:?}").into()),
    }
}

/// Print each task state transition as the run unfolds.
fn spawn_task_printer(bus: &Arc<EventBus>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        let mut seen: HashMap<String, TaskStatus> = HashMap::new();
        while let Ok(event) = rx.recv().await {
            if let AgentEvent::SessionUpdated { session } = event.as_ref() {
                for task in &session.tasks {
                    if seen.get(&task.id) != Some(&task.status) {
                        seen.insert(task.id.clone(), task.status);
                        println!("  [{}] {}", status_label(task.status), task.description);
                    }
                }
            }
        }
    });
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => " . ",
        TaskStatus::InProgress => ">> ",
        TaskStatus::AwaitingPermission => " ? ",
        TaskStatus::Completed => "ok ",
        TaskStatus::Failed => "!! ",
    }
}

/// Answer permission prompts: automatically with `--approve-all`, otherwise
/// by asking on stdin. An unanswered prompt is denied by the broker timeout.
fn spawn_permission_responder(bus: &Arc<EventBus>, broker: Arc<PermissionBroker>, approve_all: bool) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let AgentEvent::PermissionRequested { request } = event.as_ref() {
                let approved = if approve_all {
                    println!("  auto-approved: {}", request.description);
                    true
                } else {
                    ask_verdict(&request.description).await
                };
                broker.resolve(&request.id, approved).await;
            }
        }
    });
}

async fn ask_verdict(description: &str) -> bool {
    let description = description.to_string();
    tokio::task::spawn_blocking(move || {
        use std::io::Write;
        println!();
        println!("  Permission required: {description}");
        print!("  Allow? [y/N] ");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    })
    .await
    .unwrap_or(false)
}
