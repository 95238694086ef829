/*
 * groups.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Named search roots for groups of supporting files.

use std::collections::HashMap;

/// Group holding the page templates.
pub const HTML: &str = "html";
/// Group holding stylesheets referenced by `css` declarations.
pub const CSS: &str = "css";
/// Group holding scripts referenced by `script` declarations.
pub const JS: &str = "js";

/// Mapping from group name (`"html"`, `"css"`, `"js"`, ...) to a directory.
///
/// Paths are stored as given and only validated when a search walks them.
/// An empty lookup result means "search the whole document root".
#[derive(Debug, Clone, Default)]
pub struct GroupPaths {
    paths: HashMap<String, String>,
}

impl GroupPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the directory for a group.
    pub fn set(&mut self, name: impl Into<String>, path: impl Into<String>) {
        let name = name.into();
        let path = path.into();
        tracing::debug!(group = %name, path = %path, "group path set");
        self.paths.insert(name, path);
    }

    /// The registered directory, if any. Empty registrations count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.paths
            .get(name)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    /// The search root for a group: the registered directory, or `""`
    /// (the document root) when the group is unregistered.
    pub fn search_root(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Iterate over all registrations.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
