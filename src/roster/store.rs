use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs;

use crate::roster::document::RosterDocument;

/// Load/save of the roster document with crash-safe semantics.
///
/// `load` never fails the caller: an absent or unreadable file is replaced
/// by a fresh default document. `save` writes a sibling temp file and
/// renames it over the target, so a concurrent `load` observes either the
/// old or the new version, never a partial write.
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> RosterDocument {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        "Unreadable roster document at {}: {}; replacing with defaults",
                        self.path.display(),
                        e
                    );
                    self.reset_to_default().await
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No roster document at {}; creating defaults",
                    self.path.display()
                );
                self.reset_to_default().await
            }
            Err(e) => {
                warn!(
                    "Failed to read roster document at {}: {}; replacing with defaults",
                    self.path.display(),
                    e
                );
                self.reset_to_default().await
            }
        }
    }

    pub async fn save(&self, doc: &RosterDocument) -> Result<(), String> {
        let json = serde_json::to_vec_pretty(doc)
            .map_err(|e| format!("Failed to serialize roster document: {}", e))?;

        let tmp = self.tmp_path();
        fs::write(&tmp, &json)
            .await
            .map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| format!("Failed to replace {}: {}", self.path.display(), e))?;

        Ok(())
    }

    async fn reset_to_default(&self) -> RosterDocument {
        let doc = RosterDocument::default();
        if let Err(e) = self.save(&doc).await {
            warn!("Failed to persist default roster document: {}", e);
        }
        doc
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
