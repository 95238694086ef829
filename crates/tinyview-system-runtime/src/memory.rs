/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * MemoryRuntime implementation for in-memory sites.
 *
 * Useful for tests and for embedding templates that never live on disk.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

/// In-memory filesystem.
///
/// The VFS supports:
/// - Files with arbitrary byte content
/// - Directory structure (automatically created when files are added)
///
/// All paths are absolute after normalization. Relative paths are taken
/// relative to `/`.
#[derive(Debug, Default)]
pub struct VirtualFileSystem {
    /// File contents, keyed by normalized absolute path
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Directory entries (automatically includes parents of all files)
    directories: BTreeSet<PathBuf>,
}

impl VirtualFileSystem {
    /// Create a new empty virtual filesystem containing only `/`.
    pub fn new() -> Self {
        let mut vfs = Self::default();
        vfs.directories.insert(PathBuf::from("/"));
        vfs
    }

    /// Add a file to the virtual filesystem.
    ///
    /// This will automatically create all parent directories.
    pub fn add_file(&mut self, path: &Path, contents: Vec<u8>) {
        let normalized = normalize_path(path);
        if let Some(parent) = normalized.parent() {
            self.add_directory_and_parents(parent);
        }
        self.files.insert(normalized, contents);
    }

    /// Remove a file from the virtual filesystem.
    ///
    /// Returns true if the file existed and was removed.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        self.files.remove(&normalize_path(path)).is_some()
    }

    /// Add a directory (and all parent directories).
    pub fn add_directory(&mut self, path: &Path) {
        let normalized = normalize_path(path);
        self.add_directory_and_parents(&normalized);
    }

    /// List contents of a directory.
    pub fn list_directory(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        let normalized = normalize_path(path);

        if !self.directories.contains(&normalized) {
            if self.files.contains_key(&normalized) {
                return Err(RuntimeError::NotADirectory(normalized));
            }
            return Err(RuntimeError::NotFound(normalized));
        }

        let mut entries: BTreeSet<PathBuf> = BTreeSet::new();

        for file_path in self.files.keys() {
            if file_path.parent() == Some(normalized.as_path()) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent() == Some(normalized.as_path()) && dir_path != &normalized {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    /// Check if a path is a file.
    pub fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    /// Check if a path is a directory.
    pub fn is_directory(&self, path: &Path) -> bool {
        self.directories.contains(&normalize_path(path))
    }

    /// Read file contents.
    pub fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let normalized = normalize_path(path);
        self.files
            .get(&normalized)
            .cloned()
            .ok_or(RuntimeError::NotFound(normalized))
    }

    fn add_directory_and_parents(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

/// Normalize a path to an absolute path without `.` or `..` components.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Can't go above root
                normalized.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Runtime backed by a [`VirtualFileSystem`].
///
/// Uses RwLock to satisfy the Send + Sync bounds of [`SystemRuntime`].
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    vfs: RwLock<VirtualFileSystem>,
}

impl MemoryRuntime {
    /// Create a new runtime with an empty filesystem.
    pub fn new() -> Self {
        Self {
            vfs: RwLock::new(VirtualFileSystem::new()),
        }
    }

    /// Add a file (parents are created implicitly).
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.write_vfs().add_file(path.as_ref(), contents.into());
    }

    /// Add an empty directory.
    pub fn add_directory(&self, path: impl AsRef<Path>) {
        self.write_vfs().add_directory(path.as_ref());
    }

    /// Remove a file. Returns true if it existed.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        self.write_vfs().remove_file(path.as_ref())
    }

    fn read_vfs(&self) -> std::sync::RwLockReadGuard<'_, VirtualFileSystem> {
        // A poisoned lock only means another thread panicked mid-write; the
        // maps themselves are still structurally valid.
        self.vfs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_vfs(&self) -> std::sync::RwLockWriteGuard<'_, VirtualFileSystem> {
        self.vfs.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl SystemRuntime for MemoryRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.read_vfs().read_file(path)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let vfs = self.read_vfs();
        Ok(match kind {
            None => vfs.is_file(path) || vfs.is_directory(path),
            Some(PathKind::File) => vfs.is_file(path),
            Some(PathKind::Directory) => vfs.is_directory(path),
        })
    }

    fn dir_list(&self, path: &Path) -> RuntimeResult<Vec<PathBuf>> {
        self.read_vfs().list_directory(path)
    }
}
