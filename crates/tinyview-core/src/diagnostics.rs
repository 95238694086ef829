/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Diagnostics collected during a render.
//!
//! Failures inside a composition (a missing include, a malformed head
//! declaration) never abort the page. They are recorded here instead, and
//! the caller receives the full list alongside the rendered output.

use std::fmt;
use std::path::{Path, PathBuf};

/// Include target or asset not found.
pub const NOT_FOUND: &str = "TV-NOT-FOUND";
/// Malformed head declaration.
pub const INVALID_DECLARATION: &str = "TV-INVALID-DECLARATION";
/// Empty filename or a variable bag that is not a mapping.
pub const INVALID_INPUT: &str = "TV-INVALID-INPUT";
/// http-equiv mapping carried more than one pair; only the first is used.
pub const HTTP_EQUIV_PAIRS: &str = "TV-HTTP-EQUIV-PAIRS";
/// A nested template body failed to parse or execute.
pub const TEMPLATE: &str = "TV-TEMPLATE";
/// Include depth limit exceeded.
pub const RECURSION: &str = "TV-RECURSION";

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub code: &'static str,
    pub message: String,
    /// Template that was executing when the diagnostic was raised, if any.
    pub source: Option<PathBuf>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
        };
        write!(f, "{}[{}]: {}", kind, self.code, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (in {})", source.display())?;
        }
        Ok(())
    }
}

/// Collector for diagnostic messages during a render.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty diagnostic collector.
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic message.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::Error => tracing::warn!(code = diagnostic.code, "{}", diagnostic.message),
            DiagnosticKind::Warning => {
                tracing::debug!(code = diagnostic.code, "{}", diagnostic.message)
            }
        }
        self.diagnostics.push(diagnostic);
    }

    /// Add an error with a code.
    pub fn error(&mut self, code: &'static str, message: impl Into<String>, source: Option<&Path>) {
        self.add(Diagnostic {
            kind: DiagnosticKind::Error,
            code,
            message: message.into(),
            source: source.map(Path::to_path_buf),
        });
    }

    /// Add a warning with a code.
    pub fn warn(&mut self, code: &'static str, message: impl Into<String>, source: Option<&Path>) {
        self.add(Diagnostic {
            kind: DiagnosticKind::Warning,
            code,
            message: message.into(),
            source: source.map(Path::to_path_buf),
        });
    }

    /// Check if any errors were collected (warnings don't count).
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of error-kind diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Error)
            .count()
    }

    /// Get a reference to the collected diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the collector and return the diagnostics in the order raised.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Check if the collector is empty.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_collector_new() {
        let collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_warnings_are_not_errors() {
        let mut collector = DiagnosticCollector::new();
        collector.warn(NOT_FOUND, "missing.html not found", None);

        assert!(!collector.is_empty());
        assert!(!collector.has_errors());
        assert_eq!(collector.diagnostics()[0].code, NOT_FOUND);
    }

    #[test]
    fn test_error_count_and_order() {
        let mut collector = DiagnosticCollector::new();
        collector.error(INVALID_DECLARATION, "first", None);
        collector.warn(NOT_FOUND, "second", None);
        collector.error(TEMPLATE, "third", Some(Path::new("/site/a.html")));

        assert_eq!(collector.error_count(), 2);
        let messages: Vec<_> = collector
            .into_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_display_includes_code_and_source() {
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::Error,
            code: TEMPLATE,
            message: "unterminated directive".to_string(),
            source: Some(PathBuf::from("/site/header.html")),
        };
        assert_eq!(
            diagnostic.to_string(),
            "error[TV-TEMPLATE]: unterminated directive (in /site/header.html)"
        );
    }
}
