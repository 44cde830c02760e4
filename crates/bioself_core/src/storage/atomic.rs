//! Temp-file + fsync + rename persistence.

use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug)]
pub enum FileError {
    StoreNotFound(PathBuf),
    Io(io::Error),
}

impl Display for FileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreNotFound(path) => write!(f, "store not found: {}", path.display()),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreNotFound(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

/// Reads the whole store file.
///
/// # Errors
/// - `StoreNotFound` when nothing exists at `path`.
/// - `Io` for any other read failure.
pub fn read_all(path: &Path) -> Result<Vec<u8>, FileError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(FileError::StoreNotFound(path.to_path_buf()))
        }
        Err(err) => Err(FileError::Io(err)),
    }
}

/// Replaces `path` with `bytes` so readers only ever observe complete content.
///
/// # Side effects
/// - Creates `.<name>.<uuid>.tmp` next to `path`, fsyncs it, renames it over
///   the target, then fsyncs the parent directory on Unix.
/// - Removes the temp file when any step before the rename fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp_path = temp_sibling_path(path)?;
    if let Err(err) = write_then_rename(&tmp_path, path, bytes) {
        if let Err(cleanup_err) = fs::remove_file(&tmp_path) {
            if cleanup_err.kind() != io::ErrorKind::NotFound {
                warn!(
                    "event=store_tmp_cleanup module=storage status=error error={}",
                    cleanup_err
                );
            }
        }
        return Err(err);
    }
    sync_parent_dir(path);
    Ok(())
}

/// Writes the first blob at `path`, failing with `AlreadyExists` if any file
/// is already there.
///
/// The temp file is fsynced and then hard-linked to the target, so the link
/// either publishes complete content or fails without touching an existing
/// file. The temp name is always removed afterwards.
pub fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp_path = temp_sibling_path(path)?;
    let result = write_temp(&tmp_path, bytes).and_then(|()| fs::hard_link(&tmp_path, path));
    if let Err(cleanup_err) = fs::remove_file(&tmp_path) {
        if cleanup_err.kind() != io::ErrorKind::NotFound {
            warn!(
                "event=store_tmp_cleanup module=storage status=error error={}",
                cleanup_err
            );
        }
    }
    result?;
    sync_parent_dir(path);
    Ok(())
}

/// Returns a unique temp path in the same directory as `path`.
pub fn temp_sibling_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("store path has no file name: {}", path.display()),
        )
    })?;
    let tmp_name = format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        Uuid::new_v4().simple()
    );
    Ok(parent_dir(path).join(tmp_name))
}

fn write_temp(tmp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn write_then_rename(tmp_path: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    write_temp(tmp_path, bytes)?;
    fs::rename(tmp_path, target)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    // The rename is only durable once the directory entry is flushed.
    if let Ok(dir) = File::open(parent_dir(path)) {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
