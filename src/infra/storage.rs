//! Filesystem-backed storage for generated PDFs.

use std::{
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, sync::Mutex, task};
use tracing::info;

use crate::domain::output::{OutputFile, OutputFileId};

use super::retention;

/// Errors that can occur while interacting with the output directory.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid stored file name")]
    InvalidName,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::InvalidName => true,
            StorageError::Io(err) => err.kind() == io::ErrorKind::NotFound,
            StorageError::Task(_) => false,
        }
    }
}

/// Flat directory of `<token>.pdf` files bounded to the newest `keep_count`.
#[derive(Debug)]
pub struct OutputStore {
    root: PathBuf,
    keep_count: usize,
    // Eviction passes run one at a time.
    eviction: Mutex<()>,
}

impl OutputStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, keep_count: usize) -> Result<Self, io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            keep_count,
            eviction: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keep_count(&self) -> usize {
        self.keep_count
    }

    /// Persist a rendered PDF under a fresh identifier.
    ///
    /// Bytes land in a temporary file inside the output directory first and are
    /// renamed into place, so readers and eviction never observe a partial PDF.
    pub async fn persist(&self, pdf: Bytes) -> Result<OutputFile, StorageError> {
        let root = self.root.clone();
        task::spawn_blocking(move || write_atomically(&root, &pdf))
            .await
            .map_err(|err| StorageError::Task(err.to_string()))?
    }

    /// Read a stored PDF by its file name.
    pub async fn read(&self, file_name: &str) -> Result<Bytes, StorageError> {
        let absolute = self.resolve(file_name)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Run one retention pass. Concurrent callers queue behind each other.
    pub async fn evict(&self) -> Result<(), StorageError> {
        let _guard = self.eviction.lock().await;
        let root = self.root.clone();
        let keep_count = self.keep_count;
        task::spawn_blocking(move || retention::enforce_limit(&root, keep_count))
            .await
            .map_err(|err| StorageError::Task(err.to_string()))
    }

    /// Check that the output directory is still reachable.
    pub async fn probe(&self) -> Result<(), StorageError> {
        let metadata = fs::metadata(&self.root).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(StorageError::Io(io::Error::new(
                io::ErrorKind::NotADirectory,
                "output path is not a directory",
            )))
        }
    }

    fn resolve(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(file_name);
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(relative)),
            _ => Err(StorageError::InvalidName),
        }
    }
}

fn write_atomically(root: &Path, pdf: &[u8]) -> Result<OutputFile, StorageError> {
    let id = OutputFileId::generate();
    let file_name = id.file_name();
    let path = root.join(&file_name);

    let mut staged = tempfile::Builder::new()
        .prefix(".stampa-")
        .suffix(".part")
        .tempfile_in(root)?;
    staged.write_all(pdf)?;
    staged.flush()?;
    // Dropping a failed `persist` removes the staged file.
    staged.persist_noclobber(&path).map_err(|err| err.error)?;

    info!(
        target = "infra::storage",
        op = "storage::persist",
        path = %path.display(),
        size_bytes = pdf.len(),
        "Stored generated PDF"
    );

    Ok(OutputFile {
        file_name,
        path,
        size_bytes: pdf.len() as u64,
    })
}
