//! Object storage seam. Requests name inputs and outputs as `(bucket, key)`
//! pairs; [`LocalStore`] maps them onto a directory tree so the handler can
//! run against a filesystem.
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal get/put object store.
pub trait ObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;
    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Human-readable location used in responses.
    fn location(&self, bucket: &str, key: &str) -> String {
        format!("store://{}/{}", bucket, key)
    }
}

/// Store rooted at a directory: object `bucket/key` lives at `root/bucket/key`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object to a path, refusing keys that escape the bucket.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            let rel = Path::new(part);
            if part.is_empty()
                || rel
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(StorageError::InvalidKey(format!("{}/{}", bucket, key)));
            }
            path.push(rel);
        }
        Ok(path)
    }
}

impl ObjectStore for LocalStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        if !path.is_file() {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        let bytes = fs::read(&path)?;
        debug!("Fetched {} bytes from {:?}", bytes.len(), path);
        Ok(bytes)
    }

    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!("Stored {} bytes at {:?}", bytes.len(), path);
        Ok(())
    }
}
