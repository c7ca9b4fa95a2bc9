//! In-memory script store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use pagecraft_core::error::StoreError;
use pagecraft_core::script::{ScriptRecord, ScriptStore};

/// Stores scripts in a map; nothing survives process exit.
pub struct InMemoryScriptStore {
    scripts: RwLock<HashMap<String, ScriptRecord>>,
}

impl InMemoryScriptStore {
    pub fn new() -> Self {
        Self {
            scripts: RwLock::new(HashMap::new()),
        }
    }

    pub async fn count(&self) -> usize {
        self.scripts.read().await.len()
    }
}

impl Default for InMemoryScriptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptStore for InMemoryScriptStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, id: &str) -> Result<Option<ScriptRecord>, StoreError> {
        Ok(self.scripts.read().await.get(id).cloned())
    }

    async fn upsert(&self, record: ScriptRecord) -> Result<(), StoreError> {
        self.scripts.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_for_domain(&self, domain: &str) -> Result<Vec<ScriptRecord>, StoreError> {
        let scripts = self.scripts.read().await;
        let mut records: Vec<ScriptRecord> = scripts
            .values()
            .filter(|r| r.domain == domain)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.scripts.write().await.remove(id).is_some())
    }
}
