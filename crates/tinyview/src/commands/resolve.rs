/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolve command implementation.
//!
//! Prints where a bare file name resolves under a document root, using the
//! same search the engine uses for templates and assets.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use tinyview_core::{PathResolver, ResolveOptions, ResolvedPath};
use tinyview_system_runtime::{NativeRuntime, RootedRuntime};

/// Arguments for the resolve command
#[derive(Debug)]
pub struct ResolveArgs {
    pub filename: String,
    pub root: PathBuf,
    /// Search root (document root when absent)
    pub search_root: Option<String>,
    pub relative: bool,
    pub flat: bool,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs) -> Result<()> {
    let resolved = resolve(&args)?;
    println!("{}", resolved);
    Ok(())
}

fn resolve(args: &ResolveArgs) -> Result<ResolvedPath> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Document root does not exist: {}", args.root.display()))?;
    let runtime = RootedRuntime::new(NativeRuntime::new(), root.clone());
    let resolver = PathResolver::new(&root, Arc::new(runtime));

    let mut options = if args.relative {
        ResolveOptions::root_relative()
    } else {
        ResolveOptions::absolute()
    };
    if args.flat {
        options = options.flat();
    }

    let search_root = args.search_root.as_deref().unwrap_or("");
    resolver
        .resolve(&args.filename, search_root, options)
        .with_context(|| format!("Could not resolve '{}'", args.filename))
}
