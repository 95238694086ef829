/*
 * executor.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template body execution.
//!
//! The engine decides *which* file runs and with which variables; a
//! [`TemplateExecutor`] decides what running it means. The default is the
//! directive language in [`crate::template`]; [`PassthroughExecutor`] copies
//! the body unchanged.

use std::path::PathBuf;

use crate::engine::RenderContext;
use crate::error::TemplateError;

/// A template body loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// File contents.
    pub text: String,
}

/// Executes one template body against a render context.
pub trait TemplateExecutor: Send + Sync {
    /// Run the body, writing output and issuing includes/declarations
    /// through `ctx`.
    ///
    /// Returning an error discards whatever the body wrote.
    fn execute(
        &self,
        template: &TemplateSource,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError>;
}

/// Writes the template body verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughExecutor;

impl TemplateExecutor for PassthroughExecutor {
    fn execute(
        &self,
        template: &TemplateSource,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        ctx.write(&template.text);
        Ok(())
    }
}
