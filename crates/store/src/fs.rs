//! Filesystem content store.
//!
//! A key maps to `root/<key>`, so a mirror of the object bucket on local disk
//! (e.g. `data/reddit/staged/r/s/japan/abc/1f2e.txt`) is served as-is.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use teidaishu_core::content::ContentStore;
use teidaishu_core::error::StoreError;
use tracing::trace;

pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key under the root. Keys that would leave the root are refused.
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StoreError::Read {
                key: key.to_string(),
                reason: "key escapes the content root".into(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    fn name(&self) -> &str {
        "fs"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %path.display(), "Content miss");
                Ok(None)
            }
            Err(e) => Err(StoreError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
