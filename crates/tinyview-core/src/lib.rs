/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template resolution and composition for tinyview.
//!
//! A page is an outer template that includes other templates, each of
//! which may include more and may contribute `<head>` content. This crate
//! provides:
//!
//! - [`PathResolver`]: maps a bare filename (`"header.html"`) to a file by
//!   searching under a document root, with URL passthrough
//! - [`GroupPaths`]: named search roots (`html`, `css`, `js`, ...)
//! - [`HeadAggregator`]: collects title/meta/link/css/script/custom
//!   declarations and renders them in a fixed order
//! - [`Engine`]: sets the outer template, runs includes with per-include
//!   variable overrides, and captures the whole tree's output
//!
//! Template bodies are executed by a pluggable [`TemplateExecutor`]; the
//! default is the directive language in [`template`].
//!
//! # Example
//!
//! ```ignore
//! use tinyview_core::{Engine, HeadDeclaration};
//!
//! let mut engine = Engine::new("/var/www/site");
//! engine.set_group_path("css", "assets/css");
//! engine.set_var("title", "Home");
//! engine.declare(HeadDeclaration::css("main.css"))?;
//! engine.set_outer("page.html")?;
//!
//! let page = engine.render()?;
//! for diagnostic in &page.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! print!("{}", page.html);
//! ```

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod executor;
pub mod groups;
pub mod head;
mod output;
pub mod resolver;
pub mod scope;
pub mod template;

// Re-export main types at crate root
pub use config::{HeadEntry, SiteConfig};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind};
pub use engine::{Engine, EngineOptions, RenderContext, RenderedPage};
pub use error::{CompositionError, ConfigError, HeadError, ResolveError, Result, TemplateError};
pub use executor::{PassthroughExecutor, TemplateExecutor, TemplateSource};
pub use groups::GroupPaths;
pub use head::{Attributes, HeadAggregator, HeadDeclaration, MetaContent, MetaTag};
pub use resolver::{PathResolver, ResolveOptions, ResolvedPath, is_absolute_url};
pub use scope::{Scope, ScopeView, render_value};
pub use template::{DirectiveExecutor, Template};
