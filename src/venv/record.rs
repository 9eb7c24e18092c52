//! On-disk record of a created environment, used for cross-run reuse

use super::VenvBackend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File written inside each persisted environment directory
pub const RECORD_FILE: &str = "noxide-env.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvRecord {
    pub identity_key: String,
    pub interpreter: PathBuf,
    pub interpreter_version: Option<String>,
    pub backend: VenvBackend,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Hash of everything that must match for an environment to be reusable
pub fn fingerprint(backend: VenvBackend, interpreter: &Path, version: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(backend.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(interpreter.to_string_lossy().as_bytes());
    hasher.update([0]);
    hasher.update(version.unwrap_or("").as_bytes());
    format!("{:x}", hasher.finalize())
}

impl EnvRecord {
    /// Load the record from an environment directory
    ///
    /// A missing or unreadable record means the directory is not reusable.
    pub async fn load(root: &Path) -> Option<Self> {
        let path = root.join(RECORD_FILE);
        let json = fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("Ignoring corrupt environment record {:?}: {}", path, e);
                None
            }
        }
    }

    pub async fn save(&self, root: &Path) -> std::io::Result<()> {
        fs::create_dir_all(root).await?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(root.join(RECORD_FILE), json).await
    }
}
