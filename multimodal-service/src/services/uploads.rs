//! Transient on-disk buffering of uploaded files.
//!
//! A [`TempUpload`] owns its file: dropping it (or calling
//! [`TempUpload::close`]) removes the file, so a handler that returns early
//! on an error still leaves nothing behind.

use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to buffer upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload buffering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Directory that request uploads are buffered into.
#[derive(Debug, Clone)]
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `data` to a fresh file in the upload directory.
    ///
    /// `file_name` only contributes its extension to the temp file's name.
    pub async fn buffer(&self, data: Bytes, file_name: &str) -> Result<TempUpload, UploadError> {
        let dir = self.dir.clone();
        let suffix = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let path = tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
            let mut file = tempfile::Builder::new()
                .prefix("upload-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&data)?;
            file.flush()?;
            Ok(file.into_temp_path())
        })
        .await??;

        tracing::debug!(path = %path.display(), "Buffered upload to temporary file");

        Ok(TempUpload { path })
    }
}

/// A request-scoped file removed on drop.
#[derive(Debug)]
pub struct TempUpload {
    path: TempPath,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the buffered bytes back.
    pub async fn read(&self) -> Result<Vec<u8>, UploadError> {
        Ok(fs::read(&*self.path).await?)
    }

    /// Remove the file now, reporting a failure instead of swallowing it.
    pub fn close(self) -> Result<(), UploadError> {
        Ok(self.path.close()?)
    }
}
