//! Tolerant JSON loading and atomic JSON writes.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::StoreError;

/// Loads `path` as JSON, falling back to `T::default()` when the file is
/// missing, unreadable, or malformed. `what` names the data in log lines.
///
/// Never fails: a damaged file is logged and treated as empty.
pub fn load_or_default<T>(path: &Path, what: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no existing {what} file; starting empty");
            return T::default();
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "failed to read {what} file; starting empty"
            );
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => {
            tracing::info!(path = %path.display(), "loaded existing {what}");
            value
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "failed to decode {what} JSON; starting empty"
            );
            T::default()
        }
    }
}

/// Serializes `value` into a temporary file next to `path` and fsyncs it,
/// without touching `path` itself.
///
/// The returned file is removed on drop unless passed to [`commit`], so an
/// aborted write leaves the durable file exactly as it was.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory or temp file cannot be
/// created or flushed, or [`StoreError::Serialize`] if `value` fails to
/// serialize.
pub fn stage<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<NamedTempFile, StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut staged = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| StoreError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;
        writer.flush().map_err(io_err)?;
    }
    staged.as_file().sync_all().map_err(io_err)?;
    Ok(staged)
}

/// Atomically renames a staged file over `path`.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the rename fails; the staged file is
/// removed and `path` is left untouched.
pub fn commit(staged: NamedTempFile, path: &Path) -> Result<(), StoreError> {
    staged.persist(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// [`stage`] followed by [`commit`].
///
/// # Errors
///
/// See [`stage`] and [`commit`].
pub fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let staged = stage(path, value)?;
    commit(staged, path)
}
