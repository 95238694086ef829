/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Composition engine.
//!
//! An [`Engine`] holds everything that outlives a single render: the
//! document root, group paths, instance variables, head declarations made
//! up front, and the outer template. Each render builds a fresh
//! [`HeadAggregator`] and [`DiagnosticCollector`] (seeded from the engine)
//! and threads them through every nested include by `&mut`.
//!
//! ```text
//! Idle --set_outer--> Ready --render--> (Rendering) --> Ready
//!   ^                   |
//!   +------reset--------+
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tinyview_system_runtime::{NativeRuntime, RootedRuntime, SystemRuntime};

use crate::diagnostics::{self, Diagnostic, DiagnosticCollector};
use crate::error::{CompositionError, HeadError, ResolveError, Result, TemplateError};
use crate::executor::{TemplateExecutor, TemplateSource};
use crate::groups::{self, GroupPaths};
use crate::head::{AssetContext, HeadAggregator, HeadDeclaration};
use crate::output::OutputBuffer;
use crate::resolver::{PathResolver, ResolveOptions, ResolvedPath, normalize_root};
use crate::scope::{Scope, ScopeView};
use crate::template::DirectiveExecutor;

/// Default limit on include nesting.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 50;

/// Default search root for `link` declarations.
pub const DEFAULT_LINK_ROOT: &str = "view";

/// Tunables for an [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Fail the render when any error diagnostic was collected.
    pub strict: bool,
    /// Maximum include nesting below the outer template.
    pub max_include_depth: usize,
    /// Directory `link` hrefs are resolved against.
    pub link_root: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            link_root: DEFAULT_LINK_ROOT.to_string(),
        }
    }
}

/// Result of a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// The complete output.
    pub html: String,
    /// Head markup, one line per declaration.
    pub head: Vec<String>,
    /// Non-fatal problems, in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
}

/// Template composition engine.
pub struct Engine {
    resolver: PathResolver,
    groups: GroupPaths,
    vars: Scope,
    head: HeadAggregator,
    pending: DiagnosticCollector,
    outer: Option<PathBuf>,
    executor: Arc<dyn TemplateExecutor>,
    options: EngineOptions,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("document_root", &self.resolver.document_root())
            .field("groups", &self.groups)
            .field("outer", &self.outer)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine over the native filesystem.
    pub fn new(document_root: impl AsRef<Path>) -> Self {
        Self::with_runtime(document_root, Arc::new(NativeRuntime::new()))
    }

    /// Create an engine over any filesystem collaborator.
    ///
    /// The runtime is confined to the document root: nothing outside it is
    /// ever listed or read.
    pub fn with_runtime(document_root: impl AsRef<Path>, runtime: Arc<dyn SystemRuntime>) -> Self {
        let root = normalize_root(document_root.as_ref());
        let rooted: Arc<dyn SystemRuntime> = Arc::new(RootedRuntime::new(runtime, root.clone()));
        Self {
            resolver: PathResolver::new(root, rooted),
            groups: GroupPaths::new(),
            vars: Scope::new(),
            head: HeadAggregator::new(),
            pending: DiagnosticCollector::new(),
            outer: None,
            executor: Arc::new(DirectiveExecutor::new()),
            options: EngineOptions::default(),
        }
    }

    /// Replace the template executor.
    pub fn with_executor(mut self, executor: Arc<dyn TemplateExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the engine options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut EngineOptions {
        &mut self.options
    }

    pub fn document_root(&self) -> &Path {
        self.resolver.document_root()
    }

    /// The resolver used for templates and assets.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Register the directory for a group of supporting files.
    pub fn set_group_path(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.groups.set(name, path);
    }

    /// Directory searched for a group: the registered one, or the document
    /// root when the group is unregistered.
    pub fn group_path(&self, name: &str) -> std::result::Result<PathBuf, ResolveError> {
        self.resolver.search_root(self.groups.search_root(name))
    }

    pub fn groups(&self) -> &GroupPaths {
        &self.groups
    }

    /// Set one instance variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Set every entry of a mapping as an instance variable.
    ///
    /// Anything but a mapping is rejected and leaves the scope unchanged.
    pub fn set_vars(&mut self, vars: Value) -> Result<()> {
        match vars {
            Value::Object(map) => {
                self.vars.extend(map);
                Ok(())
            }
            other => Err(CompositionError::InvalidInput(format!(
                "variables must be a mapping, got {}",
                value_kind(&other)
            ))),
        }
    }

    /// The instance scope.
    pub fn vars(&self) -> &Scope {
        &self.vars
    }

    /// Declare head content before rendering.
    ///
    /// These declarations seed every subsequent render. A failure is
    /// returned and also recorded so it shows up in each render's
    /// diagnostics.
    pub fn declare(&mut self, declaration: HeadDeclaration) -> std::result::Result<(), HeadError> {
        let assets = AssetContext {
            resolver: &self.resolver,
            groups: &self.groups,
            link_root: &self.options.link_root,
        };
        declare_into(&mut self.head, &assets, &mut self.pending, None, declaration)
    }

    /// Declare head content from a loosely-typed value.
    pub fn declare_value(
        &mut self,
        kind: &str,
        value: &Value,
        value_is_path: bool,
    ) -> std::result::Result<(), HeadError> {
        match HeadDeclaration::from_value(kind, value, value_is_path) {
            Ok(declaration) => self.declare(declaration),
            Err(e) => {
                self.pending
                    .error(diagnostics::INVALID_DECLARATION, e.to_string(), None);
                Err(e)
            }
        }
    }

    /// Head declarations made on the engine so far.
    pub fn head(&self) -> &HeadAggregator {
        &self.head
    }

    /// Locate and remember the outer template.
    ///
    /// Searches the `html` group (or the document root). On failure the
    /// previous outer template is kept.
    pub fn set_outer(&mut self, filename: &str) -> Result<PathBuf> {
        let path = self.locate_template(filename)?;
        tracing::debug!(outer = %path.display(), "outer template set");
        self.outer = Some(path.clone());
        Ok(path)
    }

    /// The active outer template.
    pub fn outer(&self) -> Option<&Path> {
        self.outer.as_deref()
    }

    /// Forget the outer template, the instance scope and the failures of
    /// up-front declarations.
    ///
    /// Group paths and successful head declarations are kept.
    pub fn reset(&mut self) {
        self.outer = None;
        self.vars.clear();
        self.pending = DiagnosticCollector::new();
    }

    /// Render the outer template and everything it includes.
    pub fn render(&self) -> Result<RenderedPage> {
        let outer = self.outer.as_deref().ok_or(CompositionError::NoOuterTemplate)?;
        let _span = tracing::debug_span!("render", outer = %outer.display()).entered();

        if !self.resolver.runtime().is_file(outer).unwrap_or(false) {
            return Err(CompositionError::OuterTemplateMissing(outer.to_path_buf()));
        }
        let source = read_template(self.resolver.runtime().as_ref(), outer).map_err(|source| {
            CompositionError::Template {
                path: outer.to_path_buf(),
                source,
            }
        })?;

        let mut head = self.head.clone();
        let mut diagnostics = self.pending.clone();

        let output = {
            let mut ctx = RenderContext {
                shared: Shared {
                    resolver: &self.resolver,
                    groups: &self.groups,
                    vars: &self.vars,
                    executor: self.executor.as_ref(),
                    options: &self.options,
                },
                head: &mut head,
                diagnostics: &mut diagnostics,
                out: OutputBuffer::new(),
                scope: ScopeView::new(&self.vars),
                template: outer,
                depth: 0,
            };
            self.executor
                .execute(&source, &mut ctx)
                .map_err(|source| CompositionError::Template {
                    path: outer.to_path_buf(),
                    source,
                })?;
            ctx.out
        };

        let html = output.finish(&head.render());

        if self.options.strict && diagnostics.has_errors() {
            for diagnostic in diagnostics.diagnostics() {
                tracing::error!("{}", diagnostic);
            }
            return Err(CompositionError::Strict {
                count: diagnostics.error_count(),
            });
        }

        tracing::debug!(
            bytes = html.len(),
            diagnostics = diagnostics.diagnostics().len(),
            "render complete"
        );
        Ok(RenderedPage {
            html,
            head: head.render_lines(),
            diagnostics: diagnostics.into_diagnostics(),
        })
    }

    /// Render and return the output.
    pub fn render_to_string(&self) -> Result<String> {
        self.render().map(|page| page.html)
    }

    /// Render and write the output to `out`.
    ///
    /// Nothing is written unless the whole tree rendered.
    pub fn render_to_output<W: Write + ?Sized>(&self, out: &mut W) -> Result<Vec<Diagnostic>> {
        let page = self.render()?;
        out.write_all(page.html.as_bytes())?;
        out.flush()?;
        Ok(page.diagnostics)
    }

    fn locate_template(&self, filename: &str) -> Result<PathBuf> {
        locate_template(&self.resolver, &self.groups, filename)
    }
}

/// Read-only engine state shared by every body in one render.
#[derive(Clone, Copy)]
struct Shared<'a> {
    resolver: &'a PathResolver,
    groups: &'a GroupPaths,
    vars: &'a Scope,
    executor: &'a dyn TemplateExecutor,
    options: &'a EngineOptions,
}

/// A template body's window into the composition.
///
/// Output written here is kept only if the body finishes successfully.
pub struct RenderContext<'a> {
    shared: Shared<'a>,
    head: &'a mut HeadAggregator,
    diagnostics: &'a mut DiagnosticCollector,
    out: OutputBuffer,
    scope: ScopeView<'a>,
    template: &'a Path,
    depth: usize,
}

impl<'a> RenderContext<'a> {
    /// Variables visible to this body.
    pub fn scope(&self) -> ScopeView<'a> {
        self.scope
    }

    /// Path of the executing template.
    pub fn template_path(&self) -> &Path {
        self.template
    }

    /// Include nesting level (0 for the outer template).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Append text to the output.
    pub fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Mark where the aggregated head markup goes.
    pub fn head_slot(&mut self) {
        self.out.push_head_slot();
    }

    /// Render another template in place.
    ///
    /// The target is searched in the `html` group. Its body sees the
    /// instance scope with `overrides` on top. Any failure is recorded as a
    /// diagnostic before it is returned, so callers are free to ignore the
    /// error and carry on.
    pub fn include(
        &mut self,
        filename: &str,
        overrides: Option<Scope>,
    ) -> std::result::Result<PathBuf, CompositionError> {
        let source_path = self.template;
        if self.depth >= self.shared.options.max_include_depth {
            let err = CompositionError::RecursionLimit {
                filename: filename.to_string(),
                max_depth: self.shared.options.max_include_depth,
            };
            self.diagnostics
                .error(diagnostics::RECURSION, err.to_string(), Some(source_path));
            return Err(err);
        }

        let path = match locate_template(self.shared.resolver, self.shared.groups, filename) {
            Ok(path) => path,
            Err(err) => {
                let code = match &err {
                    CompositionError::Resolve(
                        ResolveError::EmptyFilename | ResolveError::OutsideRoot(_),
                    ) => diagnostics::INVALID_INPUT,
                    _ => diagnostics::NOT_FOUND,
                };
                self.diagnostics
                    .error(code, format!("include failed: {}", err), Some(source_path));
                return Err(err);
            }
        };

        let _span = tracing::debug_span!("include", file = %path.display(), depth = self.depth + 1)
            .entered();

        let result = match read_template(self.shared.resolver.runtime().as_ref(), &path) {
            Ok(source) => {
                let mut child = RenderContext {
                    shared: self.shared,
                    head: &mut *self.head,
                    diagnostics: &mut *self.diagnostics,
                    out: OutputBuffer::new(),
                    scope: ScopeView::with_overrides(self.shared.vars, overrides.as_ref()),
                    template: &path,
                    depth: self.depth + 1,
                };
                match self.shared.executor.execute(&source, &mut child) {
                    Ok(()) => Ok(child.out),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => {
                self.out.append(output);
                Ok(path)
            }
            Err(source) => {
                self.diagnostics.error(
                    diagnostics::TEMPLATE,
                    source.to_string(),
                    Some(path.as_path()),
                );
                Err(CompositionError::Template { path, source })
            }
        }
    }

    /// Declare head content.
    pub fn declare(&mut self, declaration: HeadDeclaration) -> std::result::Result<(), HeadError> {
        let assets = AssetContext {
            resolver: self.shared.resolver,
            groups: self.shared.groups,
            link_root: &self.shared.options.link_root,
        };
        declare_into(
            self.head,
            &assets,
            self.diagnostics,
            Some(self.template),
            declaration,
        )
    }

    /// Declare head content from a loosely-typed value.
    pub fn declare_value(
        &mut self,
        kind: &str,
        value: &Value,
        value_is_path: bool,
    ) -> std::result::Result<(), HeadError> {
        match HeadDeclaration::from_value(kind, value, value_is_path) {
            Ok(declaration) => self.declare(declaration),
            Err(e) => {
                self.diagnostics.error(
                    diagnostics::INVALID_DECLARATION,
                    e.to_string(),
                    Some(self.template),
                );
                Err(e)
            }
        }
    }

    /// Diagnostics for the whole render.
    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticCollector {
        self.diagnostics
    }
}

/// Resolve a template name against the `html` group to an absolute path.
fn locate_template(resolver: &PathResolver, groups: &GroupPaths, filename: &str) -> Result<PathBuf> {
    let resolved = resolver.resolve(
        filename,
        groups.search_root(groups::HTML),
        ResolveOptions::absolute(),
    )?;
    match resolved {
        ResolvedPath::Absolute(path) => Ok(path),
        // Templates must be local files
        other => Err(ResolveError::NotFound {
            filename: other.to_string(),
            search_root: resolver.document_root().to_path_buf(),
        }
        .into()),
    }
}

fn read_template(
    runtime: &dyn SystemRuntime,
    path: &Path,
) -> std::result::Result<TemplateSource, TemplateError> {
    let text = runtime.file_read_string(path)?;
    Ok(TemplateSource {
        path: path.to_path_buf(),
        text,
    })
}

fn declare_into(
    head: &mut HeadAggregator,
    assets: &AssetContext<'_>,
    diagnostics: &mut DiagnosticCollector,
    source: Option<&Path>,
    declaration: HeadDeclaration,
) -> std::result::Result<(), HeadError> {
    let ignored = declaration.ignored_http_equiv_pairs();
    match head.declare(declaration, assets) {
        Ok(()) => {
            if ignored > 0 {
                diagnostics.warn(
                    diagnostics::HTTP_EQUIV_PAIRS,
                    format!("http-equiv meta has {} extra pair(s); only the first is used", ignored),
                    source,
                );
            }
            Ok(())
        }
        Err(e) => {
            let code = match &e {
                HeadError::Unresolved { source, .. } if source.is_not_found() => {
                    diagnostics::NOT_FOUND
                }
                _ => diagnostics::INVALID_DECLARATION,
            };
            diagnostics.error(code, e.to_string(), source);
            Err(e)
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
