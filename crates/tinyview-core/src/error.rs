/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for tinyview-core.
//!
//! Every failure in the core is non-fatal to the page as a whole: callers
//! receive one of these values and decide whether to degrade or abort.

use std::path::PathBuf;

use thiserror::Error;
use tinyview_system_runtime::RuntimeError;

/// Errors from the path resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing with this base name exists under the search root.
    #[error("'{filename}' not found under {search_root}")]
    NotFound {
        filename: String,
        search_root: PathBuf,
    },

    /// An empty filename was given.
    #[error("empty filename")]
    EmptyFilename,

    /// The search root tried to climb out of the document root.
    #[error("search root escapes the document root: {0}")]
    OutsideRoot(String),

    /// The filesystem collaborator failed for a reason other than absence.
    #[error("filesystem error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl ResolveError {
    /// True when the failure means "absent" (as opposed to bad input or I/O).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

/// Errors from head declarations.
#[derive(Debug, Error)]
pub enum HeadError {
    /// The declaration kind is not one of title/meta/link/css/script/custom.
    #[error("unknown head declaration kind '{0}'")]
    UnknownKind(String),

    /// The declaration value has the wrong shape.
    #[error("invalid {kind} declaration: {message}")]
    Invalid { kind: &'static str, message: String },

    /// A referenced asset could not be located.
    #[error("{kind} asset unavailable: {source}")]
    Unresolved {
        kind: &'static str,
        #[source]
        source: ResolveError,
    },
}

impl HeadError {
    pub(crate) fn invalid(kind: &'static str, message: impl Into<String>) -> Self {
        HeadError::Invalid {
            kind,
            message: message.into(),
        }
    }
}

/// Errors raised while parsing or executing a template body.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Error parsing the directive syntax.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// Template source is not valid UTF-8 or could not be read.
    #[error("could not read template: {0}")]
    Read(#[from] RuntimeError),
}

/// Errors from the composition engine.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// No outer template has been set (or it was cleared by `reset`).
    #[error("no outer template set")]
    NoOuterTemplate,

    /// The outer template was set but the file has since disappeared.
    #[error("outer template no longer exists: {0}")]
    OuterTemplateMissing(PathBuf),

    /// The template could not be located.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The template body failed.
    #[error("template {path} failed: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// Include nesting exceeded the configured limit.
    #[error("include depth limit ({max_depth}) exceeded at {filename}")]
    RecursionLimit { filename: String, max_depth: usize },

    /// The variable bag passed in was not a mapping.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Strict mode is on and the render collected error diagnostics.
    #[error("render produced {count} error diagnostic(s) in strict mode")]
    Strict { count: usize },

    /// Writing to the caller's output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading site configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result type for composition operations.
pub type Result<T> = std::result::Result<T, CompositionError>;
