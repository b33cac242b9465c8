//! Persisted key-value facts.
//!
//! Small JSON map on disk, injected into the orchestrator so "shown once"
//! style facts survive restarts without any module-level mutable state.

use crate::errors::{Result, SmcError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key for the one-time migration notice.
pub const MIGRATION_NOTICE_SHOWN: &str = "migration_notice_shown";

/// Readable/writable store of persisted boolean facts.
pub trait StateStore {
    fn get_bool(&self, key: &str) -> bool;
    fn set_bool(&mut self, key: &str, value: bool) -> Result<()>;
}

/// JSON-file-backed store. Missing or unparsable files read as empty; the
/// file and its parent directory are created on first write.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    map: Map<String, Value>,
}

impl JsonStateStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();
        Self { path, map }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SmcError::StateStore {
                path: self.path.clone(),
                detail: e.to_string(),
            })?;
        }
        let text = serde_json::to_string_pretty(&Value::Object(self.map.clone())).map_err(|e| {
            SmcError::StateStore {
                path: self.path.clone(),
                detail: e.to_string(),
            }
        })?;
        std::fs::write(&self.path, text).map_err(|e| SmcError::StateStore {
            path: self.path.clone(),
            detail: e.to_string(),
        })
    }
}

impl StateStore for JsonStateStore {
    fn get_bool(&self, key: &str) -> bool {
        self.map.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.map.insert(key.to_string(), Value::Bool(value));
        self.persist()
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    map: Map<String, Value>,
}

impl StateStore for MemoryStateStore {
    fn get_bool(&self, key: &str) -> bool {
        self.map.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.map.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }
}
