use std::{
    fs::{self, DirBuilder, OpenOptions, Permissions},
    io::{ErrorKind, Write},
    os::unix::fs::DirBuilderExt,
    path::{Path, PathBuf},
};

use tracing::trace;

use crate::error::{FileSystemError, FileSystemResult};

/// Mode for directories created under the user's XDG base directories.
pub const USER_DIR_MODE: u32 = 0o700;

pub trait FileSystemProvider {
    /// Creates a directory structure if it doesn't exist.
    ///
    /// Missing components are created with `mode`. If the directory already exists its
    /// permissions are left untouched. If the path exists but is not a directory, this function
    /// returns an error.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory could not be created.
    /// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use protoreg_utils::error::FileSystemResult;
    /// use protoreg_utils::fs::{FileSystemProvider, StandardFileSystemProvider, USER_DIR_MODE};
    ///
    /// fn main() -> FileSystemResult<()> {
    ///     let fs = StandardFileSystemProvider;
    ///     fs.ensure_dir_exists("/tmp/protoreg-doc/applications", USER_DIR_MODE)?;
    ///     Ok(())
    /// }
    /// ```
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P, mode: u32) -> FileSystemResult<()>;

    /// Removes a single file.
    ///
    /// Unlike a best-effort cleanup, a missing file is reported: the returned
    /// [`FileSystemError::File`] answers `true` to [`FileSystemError::is_not_found`].
    fn remove_file<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Replaces the contents of `path` with `contents`.
    ///
    /// The data is written to a hidden temporary file next to `path`, flushed, and renamed over
    /// the destination, so readers see either the old file or the complete new one. The parent
    /// directory must already exist.
    ///
    /// If `path` already exists, symlinks are followed so the link itself stays in place and its
    /// target is replaced, and the file keeps its permissions.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::NoParent`] if `path` has no parent directory.
    /// * [`FileSystemError::File`] if creating, writing or renaming fails. The temporary file is
    ///   removed on failure.
    fn write_atomic<P: AsRef<Path>>(&self, path: P, contents: &[u8]) -> FileSystemResult<()>;

    /// Reads a UTF-8 file, returning `None` if it does not exist.
    fn read_optional<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<Option<String>>;

    /// Returns `true` if `path` exists and is a regular file, following symlinks.
    fn is_file<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<bool>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFileSystemProvider;

impl FileSystemProvider for StandardFileSystemProvider {
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P, mode: u32) -> FileSystemResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            trace!(path = %path.display(), mode = %format!("{mode:o}"), "creating directory");
            DirBuilder::new()
                .recursive(true)
                .mode(mode)
                .create(path)
                .map_err(|err| FileSystemError::Directory {
                    path: path.to_path_buf(),
                    action: "create",
                    source: err,
                })?;
        } else if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    fn remove_file<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        fs::remove_file(path).map_err(|err| FileSystemError::File {
            path: path.to_path_buf(),
            action: "remove",
            source: err,
        })
    }

    fn write_atomic<P: AsRef<Path>>(&self, path: P, contents: &[u8]) -> FileSystemResult<()> {
        let (path, permissions) = resolve_existing(path.as_ref())?;
        let tmp_path = temporary_sibling(&path)?;

        let result = (|| {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(contents)?;
            if let Some(permissions) = permissions {
                file.set_permissions(permissions)?;
            }
            file.sync_all()?;
            drop(file);
            fs::rename(&tmp_path, &path)
        })();

        result.map_err(|err| {
            let _ = fs::remove_file(&tmp_path);
            FileSystemError::File {
                path: path.clone(),
                action: "write",
                source: err,
            }
        })
    }

    fn is_file<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<bool> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(FileSystemError::File {
                    path: path.to_path_buf(),
                    action: "inspect",
                    source: err,
                })
            }
        }
    }

    fn read_optional<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<Option<String>> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(FileSystemError::File {
                    path: path.to_path_buf(),
                    action: "read",
                    source: err,
                })
            }
        }
    }
}

/// Follows symlinks of an existing file and returns its real path with its permissions.
///
/// A path that does not exist yet is returned unchanged, without permissions.
fn resolve_existing(path: &Path) -> FileSystemResult<(PathBuf, Option<Permissions>)> {
    let resolved = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok((path.to_path_buf(), None)),
        Err(err) => {
            return Err(FileSystemError::File {
                path: path.to_path_buf(),
                action: "resolve",
                source: err,
            });
        }
    };

    let metadata = fs::metadata(&resolved).map_err(|err| {
        FileSystemError::File {
            path: resolved.clone(),
            action: "inspect",
            source: err,
        }
    })?;
    if resolved != path {
        trace!(path = %path.display(), target = %resolved.display(), "writing through symlink");
    }
    Ok((resolved, Some(metadata.permissions())))
}

fn temporary_sibling(path: &Path) -> FileSystemResult<PathBuf> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(FileSystemError::NoParent {
            path: path.to_path_buf(),
        });
    };
    Ok(parent.join(format!(".{}.tmp", name.to_string_lossy())))
}

/// Creates a directory structure if it doesn't exist.
///
/// This is a convenience function that creates a [`StandardFileSystemProvider`] and calls
/// [`FileSystemProvider::ensure_dir_exists`] on it.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P, mode: u32) -> FileSystemResult<()> {
    StandardFileSystemProvider.ensure_dir_exists(path, mode)
}

/// Removes a single file, reporting a missing file as an error.
///
/// See [`FileSystemProvider::remove_file`] for detailed documentation.
pub fn remove_file<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.remove_file(path)
}

/// Atomically replaces the contents of a file.
///
/// See [`FileSystemProvider::write_atomic`] for detailed documentation.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> FileSystemResult<()> {
    StandardFileSystemProvider.write_atomic(path, contents)
}

/// Checks whether a regular file exists at `path`.
///
/// See [`FileSystemProvider::is_file`] for detailed documentation.
pub fn is_file<P: AsRef<Path>>(path: P) -> FileSystemResult<bool> {
    StandardFileSystemProvider.is_file(path)
}

/// Reads a UTF-8 file if it exists.
///
/// See [`FileSystemProvider::read_optional`] for detailed documentation.
pub fn read_optional<P: AsRef<Path>>(path: P) -> FileSystemResult<Option<String>> {
    StandardFileSystemProvider.read_optional(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_exists_creates_with_mode() {
        let dir = tempdir().unwrap();
        let new_dir = dir.path().join("share").join("applications");
        ensure_dir_exists(&new_dir, USER_DIR_MODE).unwrap();
        assert!(new_dir.is_dir());

        let mode = fs::metadata(&new_dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, USER_DIR_MODE);
    }

    #[test]
    fn test_ensure_dir_exists_already_exists() {
        let dir = tempdir().unwrap();
        ensure_dir_exists(dir.path(), USER_DIR_MODE).unwrap();
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_ensure_dir_exists_file_collision() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file.txt");
        fs::write(&file_path, "hello").unwrap();
        assert!(matches!(
            ensure_dir_exists(&file_path, USER_DIR_MODE),
            Err(FileSystemError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_remove_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("entry.desktop");
        fs::write(&file_path, "[Desktop Entry]\n").unwrap();
        remove_file(&file_path).unwrap();
        assert!(!file_path.exists());
    }

    #[test]
    fn test_remove_file_missing_is_reported() {
        let dir = tempdir().unwrap();
        let err = remove_file(dir.path().join("missing.desktop")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("mimeapps.list");
        fs::write(&file_path, "a much longer original content").unwrap();

        write_atomic(&file_path, b"short").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "short");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_write_atomic_keeps_permissions() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("mimeapps.list");
        fs::write(&file_path, "old").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o600)).unwrap();

        write_atomic(&file_path, b"new").unwrap();

        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new");
    }

    #[test]
    fn test_write_atomic_through_symlink() {
        let dir = tempdir().unwrap();
        let dotfiles = dir.path().join("dotfiles");
        fs::create_dir(&dotfiles).unwrap();
        let target = dotfiles.join("mimeapps.list");
        fs::write(&target, "old").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).unwrap();

        let config = dir.path().join("config");
        fs::create_dir(&config).unwrap();
        let link = config.join("mimeapps.list");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        write_atomic(&link, b"new").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_dir(&config).unwrap().count(), 1);
    }

    #[test]
    fn test_is_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("app1-opener.desktop");
        assert!(!is_file(&file_path).unwrap());
        assert!(!is_file(dir.path()).unwrap());

        fs::write(&file_path, "[Desktop Entry]\n").unwrap();
        assert!(is_file(&file_path).unwrap());
    }

    #[test]
    fn test_write_atomic_missing_parent() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing").join("file");
        let err = write_atomic(&file_path, b"data").unwrap_err();
        assert!(matches!(err, FileSystemError::File { action: "write", .. }));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_read_optional() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file");
        assert!(read_optional(&file_path).unwrap().is_none());

        fs::write(&file_path, "content").unwrap();
        assert_eq!(read_optional(&file_path).unwrap().as_deref(), Some("content"));
    }

    #[test]
    fn test_write_atomic_permission_denied() {
        let dir = tempdir().unwrap();
        let read_only_dir = dir.path().join("read_only");
        fs::create_dir(&read_only_dir).unwrap();

        let mut perms = fs::metadata(&read_only_dir).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&read_only_dir, perms).unwrap();

        let result = write_atomic(read_only_dir.join("file"), b"data");

        // Cleanup: Set back to writable to allow tempdir to be removed.
        let mut perms = fs::metadata(&read_only_dir).unwrap().permissions();
        perms.set_readonly(false);
        fs::set_permissions(&read_only_dir, perms).unwrap();

        // Root ignores directory permissions.
        if !is_root() {
            assert!(result.is_err());
        }
    }

    fn is_root() -> bool {
        fs::metadata("/proc/self")
            .map(|meta| std::os::unix::fs::MetadataExt::uid(&meta) == 0)
            .unwrap_or(false)
    }
}
