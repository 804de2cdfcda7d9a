use std::path::{Component, Path, PathBuf};

use harvest_core::error::AppError;
use harvest_core::models::UploadReceipt;
use harvest_core::traits::Uploader;

/// Uploader that writes batch files under a local directory.
///
/// Mirrors the remote layout (`data/raw/{context}-posts/...`) below `root`,
/// creating directories as needed and overwriting existing files.
#[derive(Debug, Clone)]
pub struct LocalUploader {
    root: PathBuf,
}

impl LocalUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a store path below `root`, refusing anything that would
    /// escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::IoError(format!("Refusing unsafe path '{path}'")));
        }
        Ok(self.root.join(relative))
    }
}

impl Uploader for LocalUploader {
    async fn upload(
        &self,
        path: &str,
        content: &str,
        _message: &str,
    ) -> Result<UploadReceipt, AppError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::IoError(format!("Cannot create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&target, content)
            .await
            .map_err(|e| AppError::IoError(format!("Cannot write {}: {e}", target.display())))?;

        tracing::debug!(path = %target.display(), bytes = content.len(), "Wrote batch file");
        Ok(UploadReceipt {
            path: path.to_string(),
            sha: None,
            location: Some(target.display().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_below_root_creating_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = LocalUploader::new(dir.path());

        let receipt = uploader
            .upload("data/raw/mentalhealth-posts/a.csv", "Post ID\n", "msg")
            .await
            .unwrap();

        let written = dir.path().join("data/raw/mentalhealth-posts/a.csv");
        assert_eq!(std::fs::read_to_string(&written).unwrap(), "Post ID\n");
        assert_eq!(receipt.path, "data/raw/mentalhealth-posts/a.csv");
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = LocalUploader::new(dir.path());
        uploader.upload("a.json", "[]", "m").await.unwrap();
        uploader.upload("a.json", "[1]", "m").await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.json")).unwrap(), "[1]");
    }

    #[tokio::test]
    async fn rejects_parent_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = LocalUploader::new(dir.path());
        let err = uploader.upload("../escape.csv", "x", "m").await.unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
    }
}
