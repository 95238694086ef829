/*
 * rooted.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * RootedRuntime: confines another runtime to a boundary directory.
 *
 * This runtime:
 * - Uses decorator pattern wrapping any SystemRuntime
 * - Rejects every path that is not lexically under the boundary
 * - Rejects paths containing `..` components outright
 */

use std::path::{Component, Path, PathBuf};

use crate::traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

/// A runtime that only answers for paths under `boundary`.
///
/// The check is lexical. A symlink inside the boundary may point anywhere;
/// walkers should ask [`SystemRuntime::is_symlink`] before descending.
#[derive(Debug)]
pub struct RootedRuntime<R: SystemRuntime> {
    inner: R,
    boundary: PathBuf,
}

impl<R: SystemRuntime> RootedRuntime<R> {
    /// Create a new RootedRuntime wrapping the given runtime.
    pub fn new(inner: R, boundary: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            boundary: boundary.into(),
        }
    }

    /// The directory every path must lie under.
    pub fn boundary(&self) -> &Path {
        &self.boundary
    }

    /// Check whether `path` is inside the boundary.
    pub fn permits(&self, path: &Path) -> bool {
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        !escapes && path.starts_with(&self.boundary)
    }

    fn check(&self, path: &Path) -> RuntimeResult<()> {
        if self.permits(path) {
            Ok(())
        } else {
            tracing::debug!(path = %path.display(), boundary = %self.boundary.display(), "path outside boundary");
            Err(RuntimeError::PathViolation(path.to_path_buf()))
        }
    }
}

impl<R: SystemRuntime> SystemRuntime for RootedRuntime<R> {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.check(path)?;
        self.inner.file_read(path)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        // Existence outside the boundary is not observable.
        if !self.permits(path) {
            return Ok(false);
        }
        self.inner.path_exists(path, kind)
    }

    fn is_symlink(&self, path: &Path) -> RuntimeResult<bool> {
        if !self.permits(path) {
            return Ok(false);
        }
        self.inner.is_symlink(path)
    }

    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        self.check(path)?;
        let entries = self.inner.dir_list(path)?;
        Ok(entries.into_iter().filter(|p| self.permits(p)).collect())
    }
}
