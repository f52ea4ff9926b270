//! Filesystem-backed blob store.

use folio_error::{FolioResult, StorageError, StorageErrorKind};
use folio_interface::BlobStore;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Filesystem blob store serving uploads from a public base URL.
///
/// Blobs are written to `{root}/{path}` with a temp-file + rename so a
/// partially written file is never visible under its final name. The
/// returned URL is `{base_url}/{path}`, which a static file server is
/// expected to serve from `root`.
///
/// # Examples
///
/// ```no_run
/// use folio_storage::FileSystemBlobStore;
/// use folio_interface::BlobStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileSystemBlobStore::new("/var/folio/blobs", "https://assets.folio.press")?;
/// let url = store.upload(b"png bytes", "image/png", "stories/7/covers/front.png").await?;
/// assert_eq!(url, "https://assets.folio.press/stories/7/covers/front.png");
/// # Ok(())
/// # }
/// ```
pub struct FileSystemBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FileSystemBlobStore {
    /// Create a new filesystem blob store rooted at `root`.
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(root, base_url))]
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> FolioResult<Self> {
        let root = root.into();
        let base_url = base_url.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(path = %root.display(), "Created filesystem blob store");
        Ok(Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Compute SHA-256 hash of data.
    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Resolve a logical blob path under the root, rejecting traversal.
    fn resolve(&self, path: &str) -> FolioResult<PathBuf> {
        let path = path.trim_start_matches('/');
        if path.is_empty() || Path::new(path).components().any(|c| {
            matches!(
                c,
                std::path::Component::ParentDir | std::path::Component::RootDir
            )
        }) {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(path.to_string())).into());
        }
        Ok(self.root.join(path))
    }
}

#[async_trait::async_trait]
impl BlobStore for FileSystemBlobStore {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len(), mime = %mime, path = %path))]
    async fn upload(&self, bytes: &[u8], mime: &str, path: &str) -> FolioResult<String> {
        let target = self.resolve(path)?;
        let hash = Self::compute_hash(bytes);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Same content already present under the final name: nothing to do.
        if target.exists() {
            if let Ok(existing) = std::fs::read(&target) {
                if Self::compute_hash(&existing) == hash {
                    tracing::debug!(hash = %hash, "Blob unchanged, skipping rewrite");
                    return Ok(format!("{}/{}", self.base_url, path.trim_start_matches('/')));
                }
            }
        }

        // Atomic write: temp file + rename.
        let tmp = target.with_extension(format!("tmp-{}", &hash[..8]));
        std::fs::write(&tmp, bytes).map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!("{}: {}", tmp.display(), e)))
        })?;
        std::fs::rename(&tmp, &target).map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "{}: {}",
                target.display(),
                e
            )))
        })?;

        tracing::info!(hash = %hash, size = bytes.len(), "Stored blob");
        Ok(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
    }

    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> FolioResult<Vec<u8>> {
        let path = url.strip_prefix(&self.base_url).ok_or_else(|| {
            StorageError::new(StorageErrorKind::InvalidPath(format!(
                "URL {} is not served by this store",
                url
            )))
        })?;
        let target = self.resolve(path)?;

        std::fs::read(&target).map_err(|e| {
            StorageError::new(StorageErrorKind::Read(format!(
                "{}: {}",
                target.display(),
                e
            )))
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> (FileSystemBlobStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("folio_blob_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let store = FileSystemBlobStore::new(&dir, "https://assets.test").unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_upload_and_fetch_round_trip() {
        let (store, dir) = temp_store("round_trip");

        let url = store
            .upload(b"front cover bytes", "image/png", "stories/1/front.png")
            .await
            .unwrap();
        assert_eq!(url, "https://assets.test/stories/1/front.png");

        let bytes = store.fetch(&url).await.unwrap();
        assert_eq!(bytes, b"front cover bytes");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_upload_is_idempotent_for_same_content() {
        let (store, dir) = temp_store("idempotent");

        let url1 = store
            .upload(b"same bytes", "image/png", "a/b.png")
            .await
            .unwrap();
        let url2 = store
            .upload(b"same bytes", "image/png", "a/b.png")
            .await
            .unwrap();
        assert_eq!(url1, url2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_rejects_parent_traversal() {
        let (store, dir) = temp_store("traversal");

        let result = store.upload(b"x", "image/png", "../escape.png").await;
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_fetch_unknown_base_url_fails() {
        let (store, dir) = temp_store("unknown_base");

        let result = store.fetch("https://elsewhere.test/a.png").await;
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
