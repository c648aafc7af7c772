use std::path::{Path, PathBuf};

use bytes::Bytes;

const EMPTY_DOCUMENT: &[u8] = b"{}";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where the serialized registry lives between process runs.
pub trait Persistence: Send {
    fn load(&self) -> Result<Bytes, PersistenceError>;
    fn save(&self, document: Bytes) -> Result<(), PersistenceError>;
}

/// A single JSON document on disk, rewritten whole on every save.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Opens the document at `path`, creating it with an empty registry if it
    /// doesn't exist yet.
    pub fn open<P>(path: P) -> Result<Self, PersistenceError>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        if !path.exists() {
            tracing::warn!("database file {:?} doesn't exist, creating it", path);
            write_document(&path, EMPTY_DOCUMENT)?;
        }
        Ok(FileBackend { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for FileBackend {
    fn load(&self) -> Result<Bytes, PersistenceError> {
        std::fs::read(&self.path)
            .map(Bytes::from)
            .map_err(|source| PersistenceError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, document: Bytes) -> Result<(), PersistenceError> {
        write_document(&self.path, &document)
    }
}

/// Writes to a sibling temporary file and renames it over `path`, so readers
/// only ever see a complete document.
fn write_document(path: &Path, document: &[u8]) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, document).map_err(write_err)?;
    std::fs::rename(&tmp_path, path).map_err(write_err)?;
    tracing::trace!("wrote {} bytes to {:?}", document.len(), path);
    Ok(())
}

#[cfg(test)]
pub use memory::MemoryBackend;
