//! Persisted agent state.
//!
//! The agent keeps a single boolean across sessions: whether metrics
//! collection was enabled when the client last detached. State is a flat
//! JSON object so several agents can share one store.

use crate::error::InspectorResult;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Key of the "metrics collection enabled" flag.
pub const PERFORMANCE_AGENT_ENABLED: &str = "PerformanceAgentEnabled";

/// Key/value store for agent state that outlives a session.
pub trait AgentState: Send {
    /// Read a boolean, returning `default` when the key is absent or not a boolean.
    fn boolean_property(&self, key: &str, default: bool) -> bool;

    /// Store a boolean.
    fn set_boolean(&mut self, key: &str, value: bool) -> InspectorResult<()>;
}

fn read_boolean(values: &Map<String, Value>, key: &str, default: bool) -> bool {
    values.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// State held in memory for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    values: Map<String, Value>,
}

impl MemoryState {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: preset a boolean.
    pub fn with_boolean(mut self, key: &str, value: bool) -> Self {
        self.values.insert(key.to_string(), Value::Bool(value));
        self
    }
}

impl AgentState for MemoryState {
    fn boolean_property(&self, key: &str, default: bool) -> bool {
        read_boolean(&self.values, key, default)
    }

    fn set_boolean(&mut self, key: &str, value: bool) -> InspectorResult<()> {
        self.values.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }
}

/// State persisted as a JSON object in a file.
///
/// Every write rewrites the whole file. The in-memory value is updated even
/// when the write fails.
#[derive(Debug, Clone)]
pub struct FileState {
    path: PathBuf,
    values: Map<String, Value>,
}

impl FileState {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store. A file that does not hold a JSON
    /// object is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> InspectorResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        "Failed to parse agent state, using defaults: {}",
                        e
                    );
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        Ok(Self { path, values })
    }

    fn save(&self) -> InspectorResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl AgentState for FileState {
    fn boolean_property(&self, key: &str, default: bool) -> bool {
        read_boolean(&self.values, key, default)
    }

    fn set_boolean(&mut self, key: &str, value: bool) -> InspectorResult<()> {
        self.values.insert(key.to_string(), Value::Bool(value));
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_state_defaults() {
        let state = MemoryState::new();
        assert!(!state.boolean_property(PERFORMANCE_AGENT_ENABLED, false));
        assert!(state.boolean_property(PERFORMANCE_AGENT_ENABLED, true));
    }

    #[test]
    fn test_memory_state_set() {
        let mut state = MemoryState::new();
        state.set_boolean(PERFORMANCE_AGENT_ENABLED, true).unwrap();
        assert!(state.boolean_property(PERFORMANCE_AGENT_ENABLED, false));

        let preset = MemoryState::new().with_boolean("Other", true);
        assert!(preset.boolean_property("Other", false));
    }

    #[test]
    fn test_file_state_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = FileState::open(dir.path().join("state.json")).unwrap();
        assert!(!state.boolean_property(PERFORMANCE_AGENT_ENABLED, false));
    }

    #[test]
    fn test_file_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut state = FileState::open(&path).unwrap();
        state.set_boolean(PERFORMANCE_AGENT_ENABLED, true).unwrap();
        assert!(path.exists());

        let reopened = FileState::open(&path).unwrap();
        assert!(reopened.boolean_property(PERFORMANCE_AGENT_ENABLED, false));
    }

    #[test]
    fn test_file_state_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let state = FileState::open(&path).unwrap();
        assert!(!state.boolean_property(PERFORMANCE_AGENT_ENABLED, false));
    }

    #[test]
    fn test_non_boolean_value_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{ "PerformanceAgentEnabled": "yes" }"#).unwrap();

        let state = FileState::open(&path).unwrap();
        assert!(state.boolean_property(PERFORMANCE_AGENT_ENABLED, true));
        assert!(!state.boolean_property(PERFORMANCE_AGENT_ENABLED, false));
    }
}
