use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("data directory missing or not writable: {0}")]
    DataDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(String),
    #[error("{0} is locked by another process")]
    Locked(PathBuf),
}

/// Create `dir` if needed and check that files can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => {
            return Err(PersistError::DataDir(format!("{} is not a directory", dir.display())))
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::DataDir(e.to_string()))?
        }
        Err(err) => return Err(PersistError::DataDir(err.to_string())),
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::DataDir(e.to_string()))?;
    Ok(())
}

/// Replaces `{dir}/{filename}` through a synced temp file and a rename, so
/// readers see either the old or the new content.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_ref())?;
        tmp.as_file_mut().sync_all()?;

        let target = self.dir.join(filename);
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Exclusive advisory lock on a file inside a data directory, shared by every
/// process that opens the directory. Released on drop.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    /// Wait until the lock is free.
    pub fn acquire(dir: &Path, name: &str) -> Result<Self, PersistError> {
        let (file, path) = open_lock_file(dir, name)?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file, path })
    }

    /// Fail with [`PersistError::Locked`] instead of waiting.
    pub fn try_acquire(dir: &Path, name: &str) -> Result<Self, PersistError> {
        let (file, path) = open_lock_file(dir, name)?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Self { file, path }),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(PersistError::Locked(path))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(dir: &Path, name: &str) -> Result<(File, PathBuf), PersistError> {
    ensure_output_dir(dir)?;
    let path = dir.join(name);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    Ok((file, path))
}
