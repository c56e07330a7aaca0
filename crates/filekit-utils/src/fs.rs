use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::{FileSystemError, FileSystemResult};

/// Result of a best-effort file removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

pub trait FileSystemProvider {
    /// Creates a directory structure if it doesn't exist.
    ///
    /// Creation goes through [`std::fs::create_dir_all`], which tolerates the directory
    /// appearing concurrently, so callers racing on the same parent never observe a spurious
    /// "already exists" failure.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory could not be created.
    /// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filekit_utils::error::FileSystemResult;
    /// use filekit_utils::fs::{FileSystemProvider, StandardFileSystemProvider};
    ///
    /// fn main() -> FileSystemResult<()> {
    ///     let fs = StandardFileSystemProvider;
    ///     fs.ensure_dir_exists("/tmp/filekit-doc/win32/bin")?;
    ///     Ok(())
    /// }
    /// ```
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Removes a single file, reporting whether it was there.
    ///
    /// A missing file is reported as [`RemoveOutcome::NotFound`] rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError::File`] for any failure other than the file not existing.
    fn remove_file<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<RemoveOutcome>;

    /// Reserves a fresh, uniquely named empty file inside `dir` and returns its path.
    ///
    /// The file is left on disk; removing it is the caller's job.
    fn reserve_temp_file<P: AsRef<Path>>(
        &self,
        dir: P,
        prefix: &str,
        suffix: &str,
    ) -> FileSystemResult<PathBuf>;
}

#[derive(Default, Clone)]
pub struct StandardFileSystemProvider;

impl FileSystemProvider for StandardFileSystemProvider {
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();

        if let Err(err) = fs::create_dir_all(path) {
            if path.exists() && !path.is_dir() {
                return Err(FileSystemError::NotADirectory {
                    path: path.to_path_buf(),
                });
            }
            return Err(FileSystemError::Directory {
                path: path.to_path_buf(),
                action: "create",
                source: err,
            });
        }

        if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    fn remove_file<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<RemoveOutcome> {
        let path = path.as_ref();

        match fs::remove_file(path) {
            Ok(()) => Ok(RemoveOutcome::Removed),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(RemoveOutcome::NotFound),
            Err(err) => {
                Err(FileSystemError::File {
                    path: path.to_path_buf(),
                    action: "remove",
                    source: err,
                })
            }
        }
    }

    fn reserve_temp_file<P: AsRef<Path>>(
        &self,
        dir: P,
        prefix: &str,
        suffix: &str,
    ) -> FileSystemResult<PathBuf> {
        let dir = dir.as_ref();

        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .rand_bytes(12)
            .tempfile_in(dir)
            .map_err(|err| {
                FileSystemError::File {
                    path: dir.to_path_buf(),
                    action: "reserve temporary",
                    source: err,
                }
            })?;

        file.into_temp_path().keep().map_err(|err| {
            FileSystemError::File {
                path: err.path.to_path_buf(),
                action: "persist temporary",
                source: err.error,
            }
        })
    }
}

/// Creates a directory structure if it doesn't exist.
///
/// See [`FileSystemProvider::ensure_dir_exists`] for detailed documentation.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.ensure_dir_exists(path)
}

/// Removes a file, treating a missing file as success.
///
/// See [`FileSystemProvider::remove_file`] for detailed documentation.
pub fn remove_file<P: AsRef<Path>>(path: P) -> FileSystemResult<RemoveOutcome> {
    StandardFileSystemProvider.remove_file(path)
}

/// Reserves a uniquely named file in `dir`.
///
/// See [`FileSystemProvider::reserve_temp_file`] for detailed documentation.
pub fn reserve_temp_file<P: AsRef<Path>>(
    dir: P,
    prefix: &str,
    suffix: &str,
) -> FileSystemResult<PathBuf> {
    StandardFileSystemProvider.reserve_temp_file(dir, prefix, suffix)
}
