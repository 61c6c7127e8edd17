use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image blobs as write-once files on local disk.
///
/// Names are collision-resistant, so concurrent uploads never contend and
/// saves need no locking. No existence cache is kept -- the filesystem is the
/// source of truth.
pub struct BlobStore {
    base_path: PathBuf,
}

impl BlobStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Start streaming a new blob.
    ///
    /// The generated name combines the current time, a random token, and the
    /// declared filename's extension; it is never reused. Bytes accumulate in
    /// a `.part` staging file until `finish` renames it into place, so a
    /// half-written upload is never visible under a servable name.
    pub async fn create(&self, declared_filename: &str) -> Result<BlobWriter, BlobError> {
        let name = unique_name(declared_filename);
        let final_path = self.base_path.join(&name);
        let staging_path = self.base_path.join(format!("{name}.part"));
        let file = tokio::fs::File::create(&staging_path).await?;

        Ok(BlobWriter {
            file,
            final_path,
            staging_path,
            name,
            committed: false,
        })
    }

    /// Remove a blob if it exists. A missing file is not an error: cleanup
    /// may race with manual removal or run twice.
    pub async fn delete(&self, name: &str) -> Result<(), BlobError> {
        let Some(path) = self.blob_path(name) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Open a blob for reading, with its length. Returns `None` when the
    /// name is unknown or is not a plain file name.
    pub async fn open(&self, name: &str) -> Result<Option<(tokio::fs::File, u64)>, BlobError> {
        let Some(path) = self.blob_path(name) else {
            return Ok(None);
        };
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok(Some((file, len)))
    }

    /// Resolve a client-supplied name, refusing anything that could escape
    /// the blob directory or touch an in-flight staging file.
    fn blob_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.ends_with(".part")
        {
            return None;
        }
        Some(self.base_path.join(name))
    }
}

fn unique_name(declared_filename: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let token = uuid::Uuid::new_v4().simple();
    match Path::new(declared_filename)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) => format!("{timestamp}-{token}.{ext}"),
        None => format!("{timestamp}-{token}"),
    }
}

/// An in-flight blob upload.
///
/// Dropping the writer without `finish` removes the staging file, which
/// covers explicit aborts and requests cancelled mid-stream alike.
pub struct BlobWriter {
    file: tokio::fs::File,
    final_path: PathBuf,
    staging_path: PathBuf,
    name: String,
    committed: bool,
}

impl BlobWriter {
    /// Append a chunk of the upload stream.
    pub async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), BlobError> {
        self.file.write_all(&chunk).await?;
        Ok(())
    }

    /// Fsync and rename the staging file into place, making the blob visible
    /// under its final name. Returns that name for the record to reference.
    pub async fn finish(mut self) -> Result<String, BlobError> {
        self.file.sync_all().await?;
        tokio::fs::rename(&self.staging_path, &self.final_path).await?;
        self.committed = true;
        Ok(self.name.clone())
    }

    /// Discard the upload; the staging file is removed on drop.
    pub fn abort(self) {}
}

impl Drop for BlobWriter {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.staging_path);
        }
    }
}
