use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to prepare upload directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write staged upload {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Temporary files written for one request.
///
/// Every file created through [`StagedUploads::create`] is tracked from the
/// moment it is opened, so a half-written part is still removed by
/// [`StagedUploads::discard`]. Dropping the set without discarding it removes
/// the files synchronously.
#[derive(Debug)]
pub struct StagedUploads {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl StagedUploads {
    pub async fn prepare(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| UploadError::Prepare {
                path: dir.clone(),
                source,
            })?;
        Ok(Self {
            dir,
            paths: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Opens a new file with a random name under the upload directory.
    pub async fn create(&mut self) -> Result<StagedFile, UploadError> {
        let path = self.dir.join(Uuid::now_v7().simple().to_string());
        let file = File::create(&path)
            .await
            .map_err(|source| UploadError::Write {
                path: path.clone(),
                source,
            })?;
        self.paths.push(path.clone());
        Ok(StagedFile {
            path,
            file,
            written: 0,
        })
    }

    /// Removes every tracked file. Returns how many were actually deleted;
    /// files already gone are skipped.
    pub async fn discard(mut self) -> usize {
        let mut removed = 0;
        for path in std::mem::take(&mut self.paths) {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to remove staged upload");
                }
            }
        }
        debug!(removed, dir = %self.dir.display(), "staged uploads discarded");
        removed
    }
}

impl Drop for StagedUploads {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            if let Err(err) = std::fs::remove_file(&path) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %err, "failed to remove staged upload on drop");
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: File,
    written: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|source| UploadError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flushes the file and returns its path and size in bytes.
    pub async fn finish(mut self) -> Result<(PathBuf, u64), UploadError> {
        self.file
            .flush()
            .await
            .map_err(|source| UploadError::Write {
                path: self.path.clone(),
                source,
            })?;
        Ok((self.path, self.written))
    }
}
