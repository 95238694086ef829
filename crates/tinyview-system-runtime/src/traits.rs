/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the SystemRuntime trait and supporting types for the runtime abstraction layer.
 *
 * The template engine never touches std::fs directly. Everything it needs from
 * the filesystem goes through this trait:
 * - NativeRuntime: Full filesystem access using std
 * - MemoryRuntime: In-memory virtual filesystem
 * - RootedRuntime: Confines another runtime to a boundary directory
 */

use std::io;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug)]
pub enum RuntimeError {
    /// Standard I/O error
    Io(io::Error),

    /// Path does not exist
    NotFound(PathBuf),

    /// A directory operation was attempted on something that is not a directory
    NotADirectory(PathBuf),

    /// Path is outside allowed boundary
    PathViolation(PathBuf),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
            RuntimeError::NotFound(path) => write!(f, "Path not found: {}", path.display()),
            RuntimeError::NotADirectory(path) => {
                write!(f, "Not a directory: {}", path.display())
            }
            RuntimeError::PathViolation(path) => {
                write!(f, "Path outside allowed boundary: {}", path.display())
            }
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> Self {
        RuntimeError::Io(e)
    }
}

impl RuntimeError {
    /// True when the error means "nothing there" rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            RuntimeError::NotFound(_) => true,
            RuntimeError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Trait defining the filesystem operations the template engine consumes.
///
/// The engine needs a handful of capabilities: list a directory, check that
/// a path exists (or is a link), and read a file. Implementations decide where the bytes
/// come from.
pub trait SystemRuntime: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // FILE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Read entire file contents as bytes.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read file as string with UTF-8 encoding.
    ///
    /// Default implementation reads bytes and converts to string.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            RuntimeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in file: {}", e),
            ))
        })
    }

    /// Check if path exists, optionally filtering by type.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool>;

    /// Check if path exists and is a file.
    fn is_file(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::File))
    }

    /// Check if path exists and is a directory.
    fn is_dir(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::Directory))
    }

    /// Check if path is itself a symbolic link (the link is not followed).
    ///
    /// Runtimes without links answer `false`.
    fn is_symlink(&self, _path: &Path) -> RuntimeResult<bool> {
        Ok(false)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DIRECTORY OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// List directory entries (excluding . and ..).
    ///
    /// Entries are full paths (the directory joined with the entry name).
    /// No ordering is promised; callers that need a stable order sort.
    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>>;
}

impl<R: SystemRuntime + ?Sized> SystemRuntime for std::sync::Arc<R> {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        (**self).file_read(path)
    }

    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        (**self).file_read_string(path)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        (**self).path_exists(path, kind)
    }

    fn is_symlink(&self, path: &Path) -> RuntimeResult<bool> {
        (**self).is_symlink(path)
    }

    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        (**self).dir_list(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display() {
        let err = RuntimeError::NotFound(PathBuf::from("/site/missing.html"));
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("/site/missing.html"));

        let err = RuntimeError::PathViolation(PathBuf::from("/secret/file"));
        assert!(err.to_string().contains("outside allowed boundary"));

        let err = RuntimeError::NotADirectory(PathBuf::from("/site/page.html"));
        assert!(err.to_string().contains("Not a directory"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(RuntimeError::NotFound(PathBuf::from("/x")).is_not_found());
        assert!(
            RuntimeError::Io(io::Error::new(io::ErrorKind::NotFound, "gone")).is_not_found()
        );
        assert!(!RuntimeError::PathViolation(PathBuf::from("/x")).is_not_found());
        assert!(
            !RuntimeError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "no"))
                .is_not_found()
        );
    }
}
