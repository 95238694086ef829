/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Site configuration (`_tinyview.yml`).
//!
//! ```yaml
//! paths:
//!   html: templates
//!   css: assets/css
//!   js: assets/js
//! link-root: view
//! vars:
//!   site_name: Example
//! head:
//!   - { kind: meta, value: { name: charset, content: utf-8 } }
//!   - { kind: css, value: main.css }
//!   - { kind: script, value: /vendor/x.js, path: true }
//! strict: false
//! max-include-depth: 50
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tinyview_system_runtime::SystemRuntime;

use crate::engine::Engine;
use crate::error::ConfigError;
use crate::scope::Scope;

/// File names probed at the document root, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["_tinyview.yml", "_tinyview.yaml"];

/// One entry of the `head` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeadEntry {
    pub kind: String,
    pub value: Value,
    /// The value carries its own directory (scripts only).
    #[serde(default)]
    pub path: bool,
}

/// Parsed site configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SiteConfig {
    /// Group name to directory.
    pub paths: BTreeMap<String, String>,
    pub link_root: Option<String>,
    pub vars: Scope,
    pub head: Vec<HeadEntry>,
    pub strict: Option<bool>,
    pub max_include_depth: Option<usize>,

    /// File the configuration was read from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl SiteConfig {
    /// Look for a configuration file at the document root.
    ///
    /// Returns `Ok(None)` when there is none.
    pub fn discover(
        document_root: impl AsRef<Path>,
        runtime: &dyn SystemRuntime,
    ) -> Result<Option<Self>, ConfigError> {
        let root = document_root.as_ref();
        for name in CONFIG_FILE_NAMES {
            let path = root.join(name);
            if !runtime.is_file(&path).unwrap_or(false) {
                continue;
            }
            let content = runtime
                .file_read_string(&path)
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
            let mut config = Self::parse(&content, &path)?;
            config.source = Some(path);
            tracing::debug!(config = ?config.source, "loaded site configuration");
            return Ok(Some(config));
        }
        Ok(None)
    }

    /// Parse configuration text. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty file is a valid, empty configuration
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply the configuration to an engine.
    ///
    /// Paths and options go first so head entries resolve against them.
    /// Head entries that fail are recorded on the engine and reported with
    /// every render.
    pub fn apply(&self, engine: &mut Engine) {
        for (name, path) in &self.paths {
            engine.set_group_path(name.clone(), path.clone());
        }

        let options = engine.options_mut();
        if let Some(link_root) = &self.link_root {
            options.link_root = link_root.clone();
        }
        if let Some(strict) = self.strict {
            options.strict = strict;
        }
        if let Some(depth) = self.max_include_depth {
            options.max_include_depth = depth;
        }

        for (name, value) in &self.vars {
            engine.set_var(name.clone(), value.clone());
        }

        for entry in &self.head {
            if let Err(e) = engine.declare_value(&entry.kind, &entry.value, entry.path) {
                tracing::debug!(kind = %entry.kind, error = %e, "configured head entry skipped");
            }
        }
    }
}
