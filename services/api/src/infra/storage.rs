use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;
use uuid::Uuid;

use crate::domain::repository::PhotoStorage;

/// Directory under the static root that holds uploaded photos.
pub const PHOTO_DIR: &str = "photos";

/// Stores photos on the local filesystem below `root`, which is also served under `/static`.
#[derive(Clone)]
pub struct LocalPhotoStorage {
    pub root: PathBuf,
}

impl LocalPhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a stored relative path, refusing anything that escapes the root.
    fn resolve(&self, file_path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(file_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            anyhow::bail!("refusing path outside static root: {file_path}");
        }
        Ok(self.root.join(relative))
    }
}

impl PhotoStorage for LocalPhotoStorage {
    async fn store(&self, id: Uuid, extension: &str, bytes: &[u8]) -> anyhow::Result<String> {
        let file_path = format!("{PHOTO_DIR}/{id}.{extension}");
        let path = self.resolve(&file_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(file_path)
    }

    async fn remove(&self, file_path: &str) -> anyhow::Result<()> {
        let path = self.resolve(file_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}
