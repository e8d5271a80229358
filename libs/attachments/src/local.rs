//! Filesystem-backed attachment store for development.

use crate::error::{AttachmentError, AttachmentResult};
use crate::AttachmentStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `bucket/key` under the root. Both parts must be single plain
    /// path components so a crafted key cannot escape the root.
    fn object_path(&self, bucket: &str, key: &str) -> AttachmentResult<PathBuf> {
        for part in [bucket, key] {
            if part.is_empty()
                || part.contains('/')
                || part.contains('\\')
                || part.contains("..")
                || part.starts_with('.')
            {
                return Err(AttachmentError::UnsafeName(part.to_string()));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl AttachmentStore for LocalStore {
    async fn put_object(&self, bucket: &str, key: &str, content: Vec<u8>)
        -> AttachmentResult<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> AttachmentResult<Option<Vec<u8>>> {
        let path = self.object_path(bucket, key)?;
        if !Path::new(&path).exists() {
            return Ok(None);
        }
        Ok(Some(tokio::fs::read(&path).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_object_key;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let key = new_object_key();

        store
            .put_object("burn2025", &key, b"jpeg bytes".to_vec())
            .await
            .unwrap();
        let read = store.get_object("burn2025", &key).await.unwrap();
        assert_eq!(read.as_deref(), Some(b"jpeg bytes".as_slice()));
    }

    #[tokio::test]
    async fn missing_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.get_object("burn2025", "nothere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn path_escapes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        for name in ["../etc", "a/b", "..", ".hidden", ""] {
            assert!(matches!(
                store.get_object("burn2025", name).await,
                Err(AttachmentError::UnsafeName(_))
            ));
        }
    }
}
