use crate::Result;
use std::path::{Path, PathBuf};
use tracing;

/// Writes the regenerated draft text to disk each tick.
///
/// The write goes to a sibling temp file followed by a rename, so a
/// reader (the browser-automation collaborator picks the file up
/// asynchronously) never observes a half-written draft.
pub struct DraftFileSink {
    path: PathBuf,
}

impl DraftFileSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub async fn write(&self, draft: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, draft).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), bytes = draft.len(), "Draft updated");
        Ok(())
    }
}
