/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! Builds an [`Engine`] for the document root, applies the site
//! configuration and command-line settings (command line wins), renders
//! the outer template and writes the page to a file or stdout.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use tinyview_core::{Diagnostic, DiagnosticKind, Engine, SiteConfig};
use tinyview_system_runtime::{NativeRuntime, SystemRuntime};

use super::{parse_key_value, parse_scalar};

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Outer template file name
    pub template: String,
    /// Document root
    pub root: PathBuf,
    /// Group paths (NAME=PATH)
    pub groups: Vec<String>,
    /// Instance variables (KEY=VALUE)
    pub vars: Vec<String>,
    /// YAML file of instance variables
    pub vars_file: Option<PathBuf>,
    /// Output file ('-' or none for stdout)
    pub output: Option<PathBuf>,
    /// Fail on error diagnostics
    pub strict: bool,
    /// Skip _tinyview.yml
    pub no_config: bool,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let engine = build_engine(&args)?;

    let diagnostics = match &args.output {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let diagnostics = engine
                .render_to_output(&mut writer)
                .context("Render failed")?;
            info!(output = %path.display(), "wrote page");
            diagnostics
        }
        _ => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            engine.render_to_output(&mut lock).context("Render failed")?
        }
    };

    summarize(&diagnostics);
    Ok(())
}

/// Set up an engine from configuration and arguments.
pub fn build_engine(args: &RenderArgs) -> Result<Engine> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Document root does not exist: {}", args.root.display()))?;

    let runtime: Arc<dyn SystemRuntime> = Arc::new(NativeRuntime::new());
    let mut engine = Engine::with_runtime(&root, runtime.clone());

    let config = if args.no_config {
        None
    } else {
        SiteConfig::discover(&root, runtime.as_ref())?
    };
    if let Some(config) = config {
        config.apply(&mut engine);
    }

    for group in &args.groups {
        let (name, path) = parse_key_value(group)?;
        engine.set_group_path(name, path);
    }

    if let Some(vars_file) = &args.vars_file {
        let content = std::fs::read_to_string(vars_file)
            .with_context(|| format!("Failed to read {}", vars_file.display()))?;
        let value: serde_json::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", vars_file.display()))?;
        engine
            .set_vars(value)
            .with_context(|| format!("Invalid variables file {}", vars_file.display()))?;
    }

    for var in &args.vars {
        let (key, raw) = parse_key_value(var)?;
        engine.set_var(key, parse_scalar(raw));
    }

    if args.strict {
        engine.options_mut().strict = true;
    }

    let outer = engine
        .set_outer(&args.template)
        .with_context(|| format!("Cannot locate template '{}'", args.template))?;
    info!(template = %outer.display(), root = %root.display(), "rendering");

    Ok(engine)
}

fn summarize(diagnostics: &[Diagnostic]) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Error)
        .count();
    if errors > 0 {
        warn!(
            errors,
            warnings = diagnostics.len() - errors,
            "page rendered with problems"
        );
    }
}
