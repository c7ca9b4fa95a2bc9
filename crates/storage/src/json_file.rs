//! File-backed script store — persistent JSONL storage.
//!
//! One JSON-encoded `ScriptRecord` per line. Records are loaded into memory
//! on creation and flushed to disk on every mutation, giving fast reads with
//! durable writes. Human-inspectable, no database required.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use pagecraft_core::error::StoreError;
use pagecraft_core::script::{ScriptRecord, ScriptStore};

/// A JSONL-file-backed script store.
pub struct JsonFileScriptStore {
    path: PathBuf,
    scripts: RwLock<Vec<ScriptRecord>>,
}

impl JsonFileScriptStore {
    /// Create a store at the given path, loading existing records.
    /// A missing file means an empty store; it is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let scripts = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = scripts.len(), "Script store loaded");
        Self {
            path,
            scripts: RwLock::new(scripts),
        }
    }

    fn load_from_disk(path: &Path) -> Vec<ScriptRecord> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<ScriptRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupt script record");
                    None
                }
            })
            .collect()
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let scripts = self.scripts.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("Cannot create script directory: {e}")))?;
        }

        let mut content = String::new();
        for record in scripts.iter() {
            let line = serde_json::to_string(record)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Io(format!("Cannot write script file: {e}")))
    }
}

#[async_trait]
impl ScriptStore for JsonFileScriptStore {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn get(&self, id: &str) -> Result<Option<ScriptRecord>, StoreError> {
        Ok(self.scripts.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn upsert(&self, record: ScriptRecord) -> Result<(), StoreError> {
        {
            let mut scripts = self.scripts.write().await;
            if let Some(existing) = scripts.iter_mut().find(|r| r.id == record.id) {
                *existing = record;
            } else {
                scripts.push(record);
            }
        }
        self.flush().await
    }

    async fn list_for_domain(&self, domain: &str) -> Result<Vec<ScriptRecord>, StoreError> {
        let scripts = self.scripts.read().await;
        let mut records: Vec<ScriptRecord> = scripts
            .iter()
            .filter(|r| r.domain == domain)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let removed = {
            let mut scripts = self.scripts.write().await;
            let before = scripts.len();
            scripts.retain(|r| r.id != id);
            scripts.len() < before
        };
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }
}
