//! Script storage backends for pagecraft.
//!
//! Two implementations of [`pagecraft_core::ScriptStore`]:
//! - [`InMemoryScriptStore`] for tests and ephemeral sessions
//! - [`JsonFileScriptStore`] for durable local persistence

pub mod in_memory;
pub mod json_file;

pub use in_memory::InMemoryScriptStore;
pub use json_file::JsonFileScriptStore;
