use crate::domain::ports::Storage;
use crate::utils::error::{ExportError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes exports to the local filesystem through a temp file in the
/// target directory, renamed over the final path once fully written.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    /// Runs `fill` against a temp file and commits it to `path` only if it
    /// succeeds. On any error the temp file is removed and `path` is untouched.
    pub fn write_with<F>(&self, path: &Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let dir = parent_dir(path);
        fs::create_dir_all(&dir).map_err(|e| ExportError::write_failure(&dir, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(".export-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| ExportError::write_failure(&dir, e))?;
        tracing::trace!(temp = %temp.path().display(), "acquired temp file");

        fill(temp.as_file_mut())?;
        commit(temp, path)
    }
}

impl Storage for LocalStorage {
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.write_with(path, |out| {
            out.write_all(data)
                .map_err(|e| ExportError::write_failure(path, e))
        })
    }
}

fn commit(mut temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.flush()
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| ExportError::write_failure(path, e))?;

    temp.persist(path)
        .map_err(|e| ExportError::write_failure(path, e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
