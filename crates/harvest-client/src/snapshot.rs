use std::path::{Path, PathBuf};

use harvest_core::error::AppError;
use harvest_core::traits::FeedSource;

/// Offline feed that replays saved page snapshots.
///
/// Reads every `*.html` file in a directory, in file-name order. Each
/// scroll moves to the next file; once they run out the last one is
/// served again, like a feed that has stopped loading.
#[derive(Debug, Clone)]
pub struct SnapshotFeed {
    files: Vec<PathBuf>,
    position: usize,
}

impl SnapshotFeed {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            AppError::IoError(format!("Cannot read snapshot dir {}: {e}", dir.display()))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(AppError::ConfigError(format!(
                "No .html snapshots found in {}",
                dir.display()
            )));
        }

        tracing::info!(count = files.len(), dir = %dir.display(), "Loaded feed snapshots");
        Ok(Self { files, position: 0 })
    }

    /// The file the next snapshot will read.
    pub fn current(&self) -> &Path {
        let idx = self.position.saturating_sub(1).min(self.files.len() - 1);
        &self.files[idx]
    }
}

impl FeedSource for SnapshotFeed {
    async fn scroll_by(&mut self, _pixels: u32) -> Result<(), AppError> {
        self.position += 1;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String, AppError> {
        let path = self.current().to_path_buf();
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::IoError(format!("Cannot read {}: {e}", path.display())))
    }
}
