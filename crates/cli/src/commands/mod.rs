use std::sync::Arc;

use pagecraft_config::AppConfig;
use pagecraft_core::ScriptStore;
use pagecraft_storage::{InMemoryScriptStore, JsonFileScriptStore};

pub mod ask;
pub mod scripts;

/// The script store the config asks for: file-backed when a path is set,
/// in-memory otherwise.
pub fn build_store(config: &AppConfig) -> Arc<dyn ScriptStore> {
    match &config.storage.scripts_path {
        Some(path) => Arc::new(JsonFileScriptStore::new(path)),
        None => Arc::new(InMemoryScriptStore::new()),
    }
}
