//! Persisted script records and the storage trait.
//!
//! A run that ends with a fenced code block persists it here, keyed to the
//! page's domain. Storage is a simple key-value collaborator; backends live
//! in the storage crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// A persisted customization script for one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRecord {
    /// Unique script id
    pub id: String,

    /// Display name (from the assistant's `Name:` line, or a default)
    pub name: String,

    /// Short description of what the script does
    pub description: String,

    /// The JavaScript source
    pub code: String,

    /// Domain the script applies to
    pub domain: String,

    /// The user request that produced this script
    pub prompt: String,

    /// Model that generated it
    pub model: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Whether the script is active
    pub enabled: bool,

    /// Whether to run automatically on page load
    pub auto_run: bool,
}

impl ScriptRecord {
    /// Create a new enabled, non-auto-run record.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
        domain: impl Into<String>,
        prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            code: code.into(),
            domain: domain.into(),
            prompt: prompt.into(),
            model: model.into(),
            created_at: now,
            updated_at: now,
            enabled: true,
            auto_run: false,
        }
    }
}

/// The script storage trait. Backends: in-memory, JSON file.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Fetch a script by id.
    async fn get(&self, id: &str) -> std::result::Result<Option<ScriptRecord>, StoreError>;

    /// Insert or overwrite a script, keyed by its id.
    async fn upsert(&self, record: ScriptRecord) -> std::result::Result<(), StoreError>;

    /// All scripts for a domain, newest first.
    async fn list_for_domain(
        &self,
        domain: &str,
    ) -> std::result::Result<Vec<ScriptRecord>, StoreError>;

    /// Delete a script. Returns whether it existed.
    async fn delete(&self, id: &str) -> std::result::Result<bool, StoreError>;
}
