/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template and asset path resolution.
//!
//! A bare filename (`"header.html"`) is mapped to a file by searching a
//! directory tree under the document root and matching base names.
//!
//! # Search order
//!
//! The walk is breadth-first: every file directly inside a directory is
//! considered before any file in its subdirectories, so the shallowest match
//! wins. Within one directory, entries are visited in byte-wise order of their
//! names. The result for a given filesystem snapshot is therefore stable no
//! matter what order the filesystem lists entries in.
//!
//! Entries whose name starts with `.` are skipped entirely (files are never
//! matched, directories are never entered). Symbolic links are skipped the
//! same way, so link cycles terminate and a link pointing out of the document
//! root is never followed.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tinyview_system_runtime::{RuntimeError, SystemRuntime};

use crate::error::ResolveError;

/// Filenames matching this are absolute URLs and bypass the filesystem.
static ABSOLUTE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?:)?//").expect("absolute URL pattern is valid")
});

/// Directory depth at which the walk gives up.
const MAX_WALK_DEPTH: usize = 64;

/// Check whether `filename` is an absolute URL (`http://`, `https://`, `//`).
pub fn is_absolute_url(filename: &str) -> bool {
    ABSOLUTE_URL.is_match(filename)
}

/// Clean up a document root: trailing separators and `.` components are
/// dropped, and a root with nothing else left (`"."`, `"./"`, `""`) is the
/// current directory, `.`.
pub(crate) fn normalize_root(root: &Path) -> PathBuf {
    let normalized: PathBuf = root
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// Options for a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Return the match relative to the document root (`/assets/main.css`)
    /// instead of as an absolute filesystem path.
    pub root_relative: bool,
    /// Descend into subdirectories of the search root.
    pub recursive: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            root_relative: false,
            recursive: true,
        }
    }
}

impl ResolveOptions {
    /// Absolute result, recursive search.
    pub fn absolute() -> Self {
        Self::default()
    }

    /// Root-relative result, recursive search.
    pub fn root_relative() -> Self {
        Self {
            root_relative: true,
            recursive: true,
        }
    }

    /// Only look directly inside the search root.
    pub fn flat(mut self) -> Self {
        self.recursive = false;
        self
    }
}

/// The outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// The filename was an absolute URL and was passed through untouched.
    Url(String),
    /// Absolute filesystem path (always under the document root).
    Absolute(PathBuf),
    /// Path relative to the document root, with a leading `/`.
    RootRelative(String),
}

impl ResolvedPath {
    /// The filesystem path, if this is an absolute result.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ResolvedPath::Absolute(path) => Some(path),
            _ => None,
        }
    }

}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedPath::Url(url) => f.write_str(url),
            ResolvedPath::Absolute(path) => write!(f, "{}", path.display()),
            ResolvedPath::RootRelative(path) => f.write_str(path),
        }
    }
}

/// Maps bare filenames to paths under a document root.
#[derive(Clone)]
pub struct PathResolver {
    document_root: PathBuf,
    runtime: Arc<dyn SystemRuntime>,
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("document_root", &self.document_root)
            .finish_non_exhaustive()
    }
}

impl PathResolver {
    /// Create a resolver rooted at `document_root`.
    ///
    /// Trailing separators and `.` components are dropped from the root; a
    /// root with nothing else left is the current directory.
    pub fn new(document_root: impl AsRef<Path>, runtime: Arc<dyn SystemRuntime>) -> Self {
        Self {
            document_root: normalize_root(document_root.as_ref()),
            runtime,
        }
    }

    /// The document root every result lies under.
    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    /// The filesystem collaborator used for walking.
    pub fn runtime(&self) -> &Arc<dyn SystemRuntime> {
        &self.runtime
    }

    /// Compute the directory a search starts from.
    ///
    /// An empty `search_root` means the document root. Otherwise the document
    /// root prefix (if present) and any leading or trailing separators are
    /// removed, and the remainder is joined back under the document root.
    /// `"assets/css"`, `"/assets/css/"` and `"<root>/assets/css"` all give the
    /// same directory. A `..` component is rejected.
    pub fn search_root(&self, search_root: &str) -> Result<PathBuf, ResolveError> {
        let trimmed = search_root.trim();
        if trimmed.is_empty() {
            return Ok(self.document_root.clone());
        }

        let given = Path::new(trimmed);
        let relative = given.strip_prefix(&self.document_root).unwrap_or(given);

        let mut effective = self.document_root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => effective.push(part),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    return Err(ResolveError::OutsideRoot(search_root.to_string()));
                }
            }
        }
        Ok(effective)
    }

    /// Resolve `filename` by searching under `search_root`.
    ///
    /// Absolute URLs are returned unchanged without touching the filesystem.
    pub fn resolve(
        &self,
        filename: &str,
        search_root: &str,
        options: ResolveOptions,
    ) -> Result<ResolvedPath, ResolveError> {
        if filename.is_empty() {
            return Err(ResolveError::EmptyFilename);
        }
        if is_absolute_url(filename) {
            return Ok(ResolvedPath::Url(filename.to_string()));
        }

        let root = self.search_root(search_root)?;
        tracing::trace!(filename, root = %root.display(), recursive = options.recursive, "searching");

        let found = self.find(filename, &root, options.recursive)?;
        let Some(path) = found else {
            tracing::debug!(filename, root = %root.display(), "not found");
            return Err(ResolveError::NotFound {
                filename: filename.to_string(),
                search_root: root,
            });
        };

        tracing::debug!(filename, path = %path.display(), "resolved");
        if options.root_relative {
            Ok(ResolvedPath::RootRelative(self.root_relative(&path)))
        } else {
            Ok(ResolvedPath::Absolute(path))
        }
    }

    /// Express a path under the document root as `/a/b/c`.
    pub fn root_relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.document_root).unwrap_or(path);
        let mut out = String::new();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                out.push('/');
                out.push_str(&part.to_string_lossy());
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    /// Breadth-first search for a file named `filename` under `root`.
    fn find(
        &self,
        filename: &str,
        root: &Path,
        recursive: bool,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        queue.push_back((root.to_path_buf(), 0));

        while let Some((dir, depth)) = queue.pop_front() {
            let mut entries = match self.runtime.dir_list(&dir) {
                Ok(entries) => entries,
                Err(e) if depth == 0 => {
                    return match e {
                        RuntimeError::NotFound(_)
                        | RuntimeError::NotADirectory(_)
                        | RuntimeError::PathViolation(_) => Ok(None),
                        other if other.is_not_found() => Ok(None),
                        other => Err(other.into()),
                    };
                }
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

            for entry in entries {
                let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if name.starts_with('.') {
                    continue;
                }
                if self.runtime.is_symlink(&entry)? {
                    continue;
                }
                if self.runtime.is_dir(&entry)? {
                    if recursive && depth < MAX_WALK_DEPTH {
                        queue.push_back((entry, depth + 1));
                    }
                    continue;
                }
                if name == filename {
                    return Ok(Some(entry));
                }
            }
        }

        Ok(None)
    }
}
