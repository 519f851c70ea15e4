//! Filesystem-backed object storage for generated artifacts and uploads.
//!
//! Keys are caller-namespaced (`{user_id}/{timestamp}-name.ext`) and resolve
//! strictly below the storage root. Public URLs are derived from the key and
//! a configured base URL; the bytes are served back by the public router.

use std::fmt::Write as FmtWrite;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::application::generation::{ArtifactStore, ArtifactStoreError};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key")]
    InvalidKey,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("empty payload")]
    EmptyPayload,
}

/// Metadata describing a stored object.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub key: String,
    pub checksum: String,
    pub size_bytes: i64,
}

#[derive(Debug)]
pub struct ReceiptStorage {
    root: PathBuf,
    public_base_url: String,
}

impl ReceiptStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, public_base_url: String) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url,
        })
    }

    pub async fn store(&self, key: &str, data: Bytes) -> Result<StoredArtifact, StorageError> {
        if data.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        let absolute = self.resolve(key)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let checksum = hex_from_bytes(&hasher.finalize());
        let size_bytes = data.len() as i64;

        debug!(
            target = "recibo::storage",
            key = %key,
            size_bytes,
            checksum = %checksum,
            "artifact stored"
        );

        Ok(StoredArtifact {
            key: key.to_string(),
            checksum,
            size_bytes,
        })
    }

    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let absolute = self.resolve(key)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove a stored object. Missing files are treated as success.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let absolute = self.resolve(key)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(StorageError::InvalidKey);
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for ReceiptStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), ArtifactStoreError> {
        self.store(key, bytes)
            .await
            .map(|_| ())
            .map_err(|err| ArtifactStoreError::Write(err.to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        self.url_for(key)
    }
}

fn hex_from_bytes(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = FmtWrite::write_fmt(&mut output, format_args!("{byte:02x}"));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, ReceiptStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = ReceiptStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:3000/storage".to_string(),
        )
        .expect("storage");
        (dir, storage)
    }

    #[tokio::test]
    async fn stores_and_reads_back() {
        let (_dir, storage) = storage();
        let stored = storage
            .store("user/1-receipt.pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .expect("store");
        assert_eq!(stored.size_bytes, 8);

        let data = storage.read("user/1-receipt.pdf").await.expect("read");
        assert_eq!(&data[..], b"%PDF-1.4");
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_dir, storage) = storage();
        let error = storage
            .store("../escape.pdf", Bytes::from_static(b"data"))
            .await
            .expect_err("must reject");
        assert!(matches!(error, StorageError::InvalidKey));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, storage) = storage();
        storage
            .store("user/2-receipt.png", Bytes::from_static(b"png"))
            .await
            .expect("store");
        storage.delete("user/2-receipt.png").await.expect("delete");
        storage
            .delete("user/2-receipt.png")
            .await
            .expect("second delete");
    }

    #[test]
    fn public_url_joins_base_and_key() {
        let (_dir, storage) = storage();
        assert_eq!(
            storage.url_for("user/3-receipt.pdf"),
            "http://localhost:3000/storage/user/3-receipt.pdf"
        );
    }
}
