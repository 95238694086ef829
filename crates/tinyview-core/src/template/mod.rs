/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Default template language.
//!
//! A thin directive syntax over otherwise literal text:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `$$` | a literal `$` |
//! | `$name$`, `$a.b$` | value from scope (missing → empty) |
//! | `$head()$` | the aggregated head markup |
//! | `$include("f.html", k=v)$` | render another template here |
//! | `$title(..)$`, `$meta(..)$`, `$link(..)$`, `$css(..)$`, `$script(..)$`, `$custom(..)$` | head declarations |
//! | `$-- text` | comment to end of line |
//!
//! There are no expressions, conditionals or loops. A body is parsed in
//! full before anything runs, so a syntax error produces no output at all.

pub mod ast;
pub mod evaluator;
pub mod parser;

use crate::engine::RenderContext;
use crate::error::TemplateError;
use crate::executor::{TemplateExecutor, TemplateSource};

use ast::Node;

/// A parsed template body.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse a template body.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            nodes: parser::parse(source)?,
        })
    }

    /// Run the body against a render context.
    pub fn evaluate(&self, ctx: &mut RenderContext<'_>) {
        evaluator::evaluate(&self.nodes, ctx);
    }
}

/// Executor for the directive language.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveExecutor;

impl DirectiveExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateExecutor for DirectiveExecutor {
    fn execute(
        &self,
        template: &TemplateSource,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        Template::parse(&template.text)?.evaluate(ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tinyview_system_runtime::MemoryRuntime;

    use crate::diagnostics;
    use crate::engine::Engine;
    use crate::groups;

    fn engine(files: &[(&str, &str)]) -> Engine {
        let runtime = MemoryRuntime::new();
        runtime.add_directory("/site");
        for (path, contents) in files {
            runtime.add_file(path, *contents);
        }
        Engine::with_runtime("/site", Arc::new(runtime))
    }

    fn render(e: &mut Engine, outer: &str) -> String {
        e.set_outer(outer).unwrap();
        e.render_to_string().unwrap()
    }

    #[test]
    fn test_interpolation() {
        let mut e = engine(&[("/site/page.html", "<h1>$site.name$</h1><p>$missing$</p>")]);
        e.set_var("site", json!({"name": "Example"}));
        assert_eq!(render(&mut e, "page.html"), "<h1>Example</h1><p></p>");
    }

    #[test]
    fn test_include_overrides_shadow_instance() {
        let mut e = engine(&[
            ("/site/page.html", "[$title$]$include(\"part.html\", title=\"About\")$[$title$]"),
            ("/site/parts/part.html", "($title$/$lang$)"),
        ]);
        e.set_var("title", "Home");
        e.set_var("lang", "en");
        assert_eq!(render(&mut e, "page.html"), "[Home](About/en)[Home]");
    }

    #[test]
    fn test_override_from_scope_reference() {
        let mut e = engine(&[
            ("/site/page.html", "$include(\"card.html\", person=people.ann)$"),
            ("/site/card.html", "$person.name$ ($person.age$)"),
        ]);
        e.set_var("people", json!({"ann": {"name": "Ann", "age": 41}}));
        assert_eq!(render(&mut e, "page.html"), "Ann (41)");
    }

    #[test]
    fn test_grandchild_sees_instance_plus_own_overrides() {
        let mut e = engine(&[
            ("/site/page.html", "$include(\"a.html\", x=\"from-page\")$"),
            ("/site/a.html", "a:$x$ $include(\"b.html\", y=\"from-a\")$"),
            ("/site/b.html", "b:$x$/$y$"),
        ]);
        e.set_var("x", "instance");
        assert_eq!(render(&mut e, "page.html"), "a:from-page b:instance/from-a");
    }

    #[test]
    fn test_head_declarations_from_later_includes_are_visible() {
        let mut e = engine(&[
            ("/site/page.html", "<head>\n$head()$</head>\n$title(\"Page\")$$include(\"body.html\")$"),
            ("/site/body.html", "$css(\"site.css\")$<main/>"),
            ("/site/assets/site.css", ""),
        ]);
        e.set_group_path(groups::CSS, "assets");
        assert_eq!(
            render(&mut e, "page.html"),
            "<head>\n<title>Page</title>\n<link rel=\"stylesheet\" href=\"/assets/site.css\">\n</head>\n<main/>"
        );
    }

    #[test]
    fn test_nested_parse_error_discards_only_that_include() {
        let mut e = engine(&[
            ("/site/page.html", "before|$include(\"bad.html\")$|after"),
            ("/site/bad.html", "partial output $title(\"x\""),
        ]);
        e.set_outer("page.html").unwrap();
        let page = e.render().unwrap();
        assert_eq!(page.html, "before||after");
        assert_eq!(page.diagnostics.len(), 1);
        assert_eq!(page.diagnostics[0].code, diagnostics::TEMPLATE);
        assert_eq!(
            page.diagnostics[0].source.as_deref(),
            Some(std::path::Path::new("/site/bad.html"))
        );
    }

    #[test]
    fn test_http_equiv_extra_pairs_warn() {
        let mut e = engine(&[(
            "/site/page.html",
            "$meta(\"http-equiv\", refresh=\"30\", expires=\"0\")$$head()$",
        )]);
        e.set_outer("page.html").unwrap();
        let page = e.render().unwrap();
        assert_eq!(page.html, "<meta http-equiv=\"refresh\" content=\"30\">\n");
        assert_eq!(page.diagnostics.len(), 1);
        assert_eq!(page.diagnostics[0].code, diagnostics::HTTP_EQUIV_PAIRS);
    }

    #[test]
    fn test_invalid_declaration_is_recorded_and_skipped() {
        let mut e = engine(&[(
            "/site/page.html",
            "$link(rel=\"icon\")$$custom(\"<!-- ok -->\")$$head()$",
        )]);
        e.set_outer("page.html").unwrap();
        let page = e.render().unwrap();
        assert_eq!(page.html, "<!-- ok -->\n");
        assert_eq!(page.diagnostics[0].code, diagnostics::INVALID_DECLARATION);
    }

    #[test]
    fn test_empty_include_name_is_invalid_input() {
        let mut e = engine(&[("/site/page.html", "x$include(nothing)$y")]);
        e.set_outer("page.html").unwrap();
        let page = e.render().unwrap();
        assert_eq!(page.html, "xy");
        assert_eq!(page.diagnostics[0].code, diagnostics::INVALID_INPUT);
    }

    #[test]
    fn test_script_with_path() {
        let mut e = engine(&[
            ("/site/page.html", "$script(path=\"/vendor/lib/x.js\")$$head()$"),
            ("/site/vendor/lib/x.js", ""),
            ("/site/assets/js/x.js", ""),
        ]);
        e.set_group_path(groups::JS, "assets/js");
        assert_eq!(
            render(&mut e, "page.html"),
            "<script src=\"/vendor/lib/x.js\"></script>\n"
        );
    }
}
