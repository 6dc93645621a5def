use crate::error::{Result, SetupError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOCK_DIR: &str = ".devup";
const LOCK_FILE: &str = "backend.json";

/// What devup remembers about the backend it last launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendLock {
    pub pid: u32,
    pub command: String,
    pub host: String,
    pub port: u16,
    pub started_at: String,
}

impl BackendLock {
    pub fn new(pid: u32, command: &str, host: &str, port: u16) -> Self {
        Self {
            pid,
            command: command.to_string(),
            host: host.to_string(),
            port,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn path(root: &Path) -> PathBuf {
        root.join(LOCK_DIR).join(LOCK_FILE)
    }

    pub fn exists(root: &Path) -> bool {
        Self::path(root).exists()
    }

    /// Read the lock. A missing file is `Ok(None)`; a corrupt one is an error.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| SetupError::io(format!("reading {}", path.display()), e))?;
        let lock = serde_json::from_str(&content).map_err(|e| SetupError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(lock))
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| SetupError::Config {
            path: Self::path(root),
            message: e.to_string(),
        })?;
        crate::utils::write_file(&Self::path(root), &content)
    }

    pub fn remove(root: &Path) -> Result<()> {
        let path = Self::path(root);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SetupError::io(format!("removing {}", path.display()), e)),
        }
    }
}
