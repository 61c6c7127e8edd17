use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::models::Item;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection file is not valid JSON: {0}")]
    Decode(serde_json::Error),
    #[error("Failed to encode collection: {0}")]
    Encode(serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Owns the single JSON file holding the whole collection.
///
/// Readers call `load` directly and never block. Mutations (see `items.rs`)
/// hold `write_lock` across their load-mutate-replace cycle, so two
/// concurrent writers cannot silently drop each other's change.
pub struct DocumentStore {
    path: PathBuf,
    pub(super) write_lock: Mutex<()>,
}

impl DocumentStore {
    /// Open the store, creating the data directory and an empty collection
    /// file on first boot.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let path = data_dir.as_ref().join("shopping-list.json");
        if !path.exists() {
            std::fs::write(&path, b"[]")?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Read and parse the whole collection, insertion order preserved.
    ///
    /// A missing file is an empty collection. A file that fails to parse is
    /// fatal for the request -- it is never replaced with an empty list, so a
    /// corrupt document cannot silently wipe the data.
    pub async fn load(&self) -> Result<Vec<Item>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(StoreError::Decode),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Serialize the full collection and swap it in atomically: write a
    /// uniquely named temp file in the same directory, fsync, then rename
    /// over the target. A concurrent `load` observes either the old or the
    /// new content, never a partial write, and a failed write leaves the
    /// previous file untouched.
    pub async fn replace(&self, items: &[Item]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(items).map_err(StoreError::Encode)?;

        let tmp = self
            .path
            .with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));

        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result.map_err(Into::into)
    }

    /// Location of the collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
