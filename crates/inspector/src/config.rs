//! Agent configuration.

use crate::error::InspectorResult;
use crate::state::{AgentState, FileState, MemoryState, PERFORMANCE_AGENT_ENABLED};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the performance agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
    /// Key of the persisted "collection enabled" flag
    pub state_key: String,
    /// JSON file holding persisted agent state; in-memory when unset
    pub state_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            state_key: PERFORMANCE_AGENT_ENABLED.to_string(),
            state_path: None,
        }
    }
}

impl AgentConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the persisted flag key.
    pub fn with_state_key(mut self, key: &str) -> Self {
        self.state_key = key.to_string();
        self
    }

    /// Persist agent state to a JSON file.
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> InspectorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> InspectorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Open the persisted state store this config describes.
    pub fn open_state(&self) -> InspectorResult<Box<dyn AgentState>> {
        match &self.state_path {
            Some(path) => Ok(Box::new(FileState::open(path.clone())?)),
            None => Ok(Box::new(MemoryState::new())),
        }
    }
}
