/*
 * head.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Head-section aggregation.
//!
//! Any template in a composition can declare `<head>` content: a title,
//! meta tags, stylesheet and other links, scripts, or raw markup. The
//! [`HeadAggregator`] collects those declarations in order and renders them
//! as one block, always in the same section order:
//!
//! 1. `<title>` (last declaration wins)
//! 2. `<meta>` tags
//! 3. `<link>` tags (including `css` declarations)
//! 4. `<script>` tags
//! 5. custom markup, verbatim
//!
//! Asset references (`href` of links, script sources) are resolved through
//! the [`PathResolver`] at declaration time and stored root-relative.

use serde_json::Value;

use crate::error::HeadError;
use crate::groups::{self, GroupPaths};
use crate::resolver::{PathResolver, ResolveOptions};
use crate::scope::render_value;

/// Ordered attribute list for a `<link>` tag.
pub type Attributes = Vec<(String, String)>;

/// Content of a meta declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaContent {
    /// Plain content (for `charset` and named metas).
    Text(String),
    /// Key/value pairs (for `http-equiv`). Only the first pair is rendered.
    Pairs(Vec<(String, String)>),
}

/// A single meta declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    pub name: String,
    pub content: MetaContent,
}

impl MetaTag {
    /// `<meta name="..." content="...">` (or `charset` when name is "charset").
    pub fn named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: MetaContent::Text(content.into()),
        }
    }

    /// `<meta charset="...">`
    pub fn charset(charset: impl Into<String>) -> Self {
        Self::named("charset", charset)
    }

    /// `<meta http-equiv="..." content="...">`
    pub fn http_equiv(header: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: "http-equiv".to_string(),
            content: MetaContent::Pairs(vec![(header.into(), content.into())]),
        }
    }
}

/// A typed head declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadDeclaration {
    Title(String),
    Meta(MetaTag),
    /// A `<link>`; must carry `rel` and `href`.
    Link(Attributes),
    /// Stylesheet sugar; must carry `href`. `rel` is forced to `stylesheet`.
    Css(Attributes),
    /// A script source. With `contains_path`, the directory part of `src`
    /// is the search root; otherwise the `js` group is searched.
    Script { src: String, contains_path: bool },
    /// Raw markup, emitted verbatim.
    Custom(String),
}

impl HeadDeclaration {
    pub fn title(title: impl Into<String>) -> Self {
        HeadDeclaration::Title(title.into())
    }

    pub fn css(href: impl Into<String>) -> Self {
        HeadDeclaration::Css(vec![("href".to_string(), href.into())])
    }

    pub fn script(src: impl Into<String>) -> Self {
        HeadDeclaration::Script {
            src: src.into(),
            contains_path: false,
        }
    }

    pub fn script_at(path: impl Into<String>) -> Self {
        HeadDeclaration::Script {
            src: path.into(),
            contains_path: true,
        }
    }

    /// Short name of the declaration kind.
    pub fn kind(&self) -> &'static str {
        match self {
            HeadDeclaration::Title(_) => "title",
            HeadDeclaration::Meta(_) => "meta",
            HeadDeclaration::Link(_) => "link",
            HeadDeclaration::Css(_) => "css",
            HeadDeclaration::Script { .. } => "script",
            HeadDeclaration::Custom(_) => "custom",
        }
    }

    /// Number of http-equiv pairs beyond the first, which rendering ignores.
    pub fn ignored_http_equiv_pairs(&self) -> usize {
        match self {
            HeadDeclaration::Meta(MetaTag {
                name,
                content: MetaContent::Pairs(pairs),
            }) if name == "http-equiv" => pairs.len().saturating_sub(1),
            _ => 0,
        }
    }

    /// Build a declaration from a loosely-typed value.
    ///
    /// `kind` is one of `title`, `meta`, `link`, `css`, `script` (or `js`),
    /// `custom`. The value shapes are:
    /// - title, custom: a scalar
    /// - meta: `{name, content}`, where content is a mapping for http-equiv
    /// - link: a mapping of attributes
    /// - css: a string (the href) or a mapping of attributes
    /// - script: a string
    pub fn from_value(kind: &str, value: &Value, value_is_path: bool) -> Result<Self, HeadError> {
        match kind {
            "title" => Ok(HeadDeclaration::Title(scalar("title", value)?)),
            "meta" => {
                let map = value
                    .as_object()
                    .ok_or_else(|| HeadError::invalid("meta", "expected a {name, content} mapping"))?;
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| HeadError::invalid("meta", "missing name"))?;
                let content = match map.get("content") {
                    Some(Value::Object(pairs)) => MetaContent::Pairs(
                        pairs
                            .iter()
                            .map(|(k, v)| (k.clone(), render_value(v)))
                            .collect(),
                    ),
                    Some(other) => MetaContent::Text(scalar("meta", other)?),
                    None => return Err(HeadError::invalid("meta", "missing content")),
                };
                Ok(HeadDeclaration::Meta(MetaTag {
                    name: name.to_string(),
                    content,
                }))
            }
            "link" => Ok(HeadDeclaration::Link(attributes("link", value)?)),
            "css" => match value {
                Value::String(href) => Ok(HeadDeclaration::css(href.clone())),
                other => Ok(HeadDeclaration::Css(attributes("css", other)?)),
            },
            "script" | "js" => Ok(HeadDeclaration::Script {
                src: scalar("script", value)?,
                contains_path: value_is_path,
            }),
            "custom" => Ok(HeadDeclaration::Custom(scalar("custom", value)?)),
            other => Err(HeadError::UnknownKind(other.to_string())),
        }
    }
}

fn scalar(kind: &'static str, value: &Value) -> Result<String, HeadError> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(render_value(value)),
        _ => Err(HeadError::invalid(kind, "expected a string")),
    }
}

fn attributes(kind: &'static str, value: &Value) -> Result<Attributes, HeadError> {
    let map = value
        .as_object()
        .ok_or_else(|| HeadError::invalid(kind, "expected a mapping of attributes"))?;
    map.iter()
        .map(|(k, v)| match v {
            Value::Object(_) | Value::Array(_) => Err(HeadError::invalid(
                kind,
                format!("attribute '{}' must be a scalar", k),
            )),
            _ => Ok((k.clone(), render_value(v))),
        })
        .collect()
}

/// Where asset references are looked up.
#[derive(Debug, Clone, Copy)]
pub struct AssetContext<'a> {
    pub resolver: &'a PathResolver,
    pub groups: &'a GroupPaths,
    /// Search root for `link` hrefs.
    pub link_root: &'a str,
}

/// Collected head declarations for one composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadAggregator {
    title: Option<String>,
    meta: Vec<MetaTag>,
    links: Vec<Attributes>,
    scripts: Vec<String>,
    custom: Vec<String>,
}

impl HeadAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration.
    ///
    /// A failed declaration leaves the aggregator untouched.
    pub fn declare(
        &mut self,
        declaration: HeadDeclaration,
        assets: &AssetContext<'_>,
    ) -> Result<(), HeadError> {
        match declaration {
            HeadDeclaration::Title(title) => {
                self.title = Some(title);
            }
            HeadDeclaration::Meta(meta) => {
                validate_meta(&meta)?;
                self.meta.push(meta);
            }
            HeadDeclaration::Link(mut attrs) => {
                validate_attribute_names("link", &attrs)?;
                if !has_attr(&attrs, "rel") {
                    return Err(HeadError::invalid("link", "missing rel"));
                }
                resolve_href("link", &mut attrs, assets.link_root, assets)?;
                self.links.push(attrs);
            }
            HeadDeclaration::Css(mut attrs) => {
                validate_attribute_names("css", &attrs)?;
                match attrs.iter_mut().find(|(k, _)| k == "rel") {
                    Some((_, rel)) => *rel = "stylesheet".to_string(),
                    None => attrs.push(("rel".to_string(), "stylesheet".to_string())),
                }
                let root = assets.groups.search_root(groups::CSS);
                resolve_href("css", &mut attrs, root, assets)?;
                self.links.push(attrs);
            }
            HeadDeclaration::Script { src, contains_path } => {
                if src.is_empty() {
                    return Err(HeadError::invalid("script", "empty source"));
                }
                let (file, root) = if contains_path {
                    match src.rsplit_once('/') {
                        Some((dir, file)) => (file, dir),
                        None => (src.as_str(), ""),
                    }
                } else {
                    (src.as_str(), assets.groups.search_root(groups::JS))
                };
                let resolved = assets
                    .resolver
                    .resolve(file, root, ResolveOptions::root_relative())
                    .map_err(|source| HeadError::Unresolved {
                        kind: "script",
                        source,
                    })?;
                self.scripts.push(resolved.to_string());
            }
            HeadDeclaration::Custom(markup) => {
                self.custom.push(markup);
            }
        }
        Ok(())
    }

    /// Current title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Resolved `<link>` attribute lists, in declaration order.
    pub fn links(&self) -> &[Attributes] {
        &self.links
    }

    /// Resolved script sources, in declaration order.
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Meta declarations, in declaration order.
    pub fn meta(&self) -> &[MetaTag] {
        &self.meta
    }

    /// True when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.meta.is_empty()
            && self.links.is_empty()
            && self.scripts.is_empty()
            && self.custom.is_empty()
    }

    /// Render every declaration, one markup line per entry, in section order.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(title) = &self.title {
            lines.push(format!("<title>{}</title>", title));
        }

        for meta in &self.meta {
            lines.extend(render_meta(meta));
        }

        for attrs in &self.links {
            let rel = attrs
                .iter()
                .find(|(k, _)| k == "rel")
                .map(|(_, v)| v.as_str())
                .unwrap_or_default();
            let mut link = format!("<link rel=\"{}\"", quote_attr(rel));
            for (key, value) in attrs.iter().filter(|(k, _)| k != "rel") {
                link.push_str(&format!(" {}=\"{}\"", key, quote_attr(value)));
            }
            link.push('>');
            lines.push(link);
        }

        for src in &self.scripts {
            lines.push(format!("<script src=\"{}\"></script>", quote_attr(src)));
        }

        lines.extend(self.custom.iter().cloned());
        lines
    }

    /// Render the whole block; every line ends with a newline.
    pub fn render(&self) -> String {
        self.render_lines()
            .into_iter()
            .map(|line| line + "\n")
            .collect()
    }
}

fn render_meta(meta: &MetaTag) -> Option<String> {
    match (meta.name.as_str(), &meta.content) {
        ("charset", MetaContent::Text(charset)) => {
            Some(format!("<meta charset=\"{}\">", quote_attr(charset)))
        }
        ("http-equiv", MetaContent::Pairs(pairs)) => {
            // Only the first pair is consumed.
            let (header, content) = pairs.first()?;
            Some(format!(
                "<meta http-equiv=\"{}\" content=\"{}\">",
                quote_attr(header),
                quote_attr(content)
            ))
        }
        (name, MetaContent::Text(content)) => Some(format!(
            "<meta name=\"{}\" content=\"{}\">",
            quote_attr(name),
            quote_attr(content)
        )),
        (_, MetaContent::Pairs(_)) => None,
    }
}

fn validate_meta(meta: &MetaTag) -> Result<(), HeadError> {
    if meta.name.is_empty() {
        return Err(HeadError::invalid("meta", "missing name"));
    }
    match (meta.name.as_str(), &meta.content) {
        ("http-equiv", MetaContent::Pairs(pairs)) if pairs.is_empty() => Err(HeadError::invalid(
            "meta",
            "http-equiv needs a {header: content} mapping",
        )),
        ("http-equiv", MetaContent::Text(_)) => Err(HeadError::invalid(
            "meta",
            "http-equiv needs a {header: content} mapping",
        )),
        ("http-equiv", MetaContent::Pairs(_)) => Ok(()),
        (name, MetaContent::Pairs(_)) => Err(HeadError::invalid(
            "meta",
            format!("'{}' content must be a string", name),
        )),
        _ => Ok(()),
    }
}

fn has_attr(attrs: &Attributes, name: &str) -> bool {
    attrs.iter().any(|(k, v)| k == name && !v.is_empty())
}

fn validate_attribute_names(kind: &'static str, attrs: &Attributes) -> Result<(), HeadError> {
    let bad = attrs.iter().find(|(k, _)| {
        k.is_empty()
            || k.chars()
                .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '='))
    });
    match bad {
        Some((k, _)) => Err(HeadError::invalid(
            kind,
            format!("invalid attribute name '{}'", k),
        )),
        None => Ok(()),
    }
}

fn resolve_href(
    kind: &'static str,
    attrs: &mut Attributes,
    search_root: &str,
    assets: &AssetContext<'_>,
) -> Result<(), HeadError> {
    let href = attrs
        .iter_mut()
        .find(|(k, _)| k == "href")
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HeadError::invalid(kind, "missing href"))?;
    let resolved = assets
        .resolver
        .resolve(href, search_root, ResolveOptions::root_relative())
        .map_err(|source| HeadError::Unresolved { kind, source })?;
    *href = resolved.to_string();
    Ok(())
}

/// Make a value safe inside a double-quoted attribute. Everything else is
/// emitted as given, so values that are already entity-encoded stay intact.
fn quote_attr(s: &str) -> String {
    s.replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tinyview_system_runtime::MemoryRuntime;

    struct Fixture {
        resolver: PathResolver,
        paths: GroupPaths,
    }

    impl Fixture {
        fn new() -> Self {
            let runtime = MemoryRuntime::new();
            runtime.add_file("/site/assets/css/main.css", "");
            runtime.add_file("/site/assets/css/print.css", "");
            runtime.add_file("/site/assets/js/app.js", "");
            runtime.add_file("/site/vendor/lib/jquery.js", "");
            runtime.add_file("/site/view/favicon.ico", "");
            let mut paths = GroupPaths::new();
            paths.set(groups::CSS, "/site/assets/css");
            paths.set(groups::JS, "assets/js");
            Self {
                resolver: PathResolver::new("/site", Arc::new(runtime)),
                paths,
            }
        }

        fn assets(&self) -> AssetContext<'_> {
            AssetContext {
                resolver: &self.resolver,
                groups: &self.paths,
                link_root: "view",
            }
        }
    }

    #[test]
    fn test_title_last_write_wins() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        head.declare(HeadDeclaration::title("First"), &fx.assets()).unwrap();
        head.declare(HeadDeclaration::title("Second"), &fx.assets()).unwrap();
        assert_eq!(head.render_lines(), vec!["<title>Second</title>"]);
    }

    #[test]
    fn test_charset_meta() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl =
            HeadDeclaration::from_value("meta", &json!({"name": "charset", "content": "utf-8"}), false)
                .unwrap();
        head.declare(decl, &fx.assets()).unwrap();
        assert_eq!(head.render_lines(), vec!["<meta charset=\"utf-8\">"]);
    }

    #[test]
    fn test_http_equiv_uses_first_pair_only() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::from_value(
            "meta",
            &json!({"name": "http-equiv", "content": {"refresh": "30", "expires": "0"}}),
            false,
        )
        .unwrap();
        assert_eq!(decl.ignored_http_equiv_pairs(), 1);
        head.declare(decl, &fx.assets()).unwrap();
        assert_eq!(
            head.render_lines(),
            vec!["<meta http-equiv=\"refresh\" content=\"30\">"]
        );
    }

    #[test]
    fn test_named_meta() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        head.declare(
            HeadDeclaration::Meta(MetaTag::named("description", "A \"quoted\" page")),
            &fx.assets(),
        )
        .unwrap();
        assert_eq!(
            head.render_lines(),
            vec!["<meta name=\"description\" content=\"A &quot;quoted&quot; page\">"]
        );
    }

    #[test]
    fn test_values_are_not_entity_encoded() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let a = fx.assets();
        head.declare(HeadDeclaration::title("Tom &amp; Jerry"), &a).unwrap();
        head.declare(
            HeadDeclaration::Meta(MetaTag::named("keywords", "cats & mice <3")),
            &a,
        )
        .unwrap();
        assert_eq!(
            head.render_lines(),
            vec![
                "<title>Tom &amp; Jerry</title>",
                "<meta name=\"keywords\" content=\"cats & mice <3\">",
            ]
        );
    }

    #[test]
    fn test_css_resolves_against_css_group() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::from_value("css", &json!({"href": "main.css"}), false).unwrap();
        head.declare(decl, &fx.assets()).unwrap();
        assert_eq!(
            head.render_lines(),
            vec!["<link rel=\"stylesheet\" href=\"/assets/css/main.css\">"]
        );
    }

    #[test]
    fn test_css_keeps_extra_attributes_in_order() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::from_value(
            "css",
            &json!({"media": "print", "href": "print.css", "rel": "alternate"}),
            false,
        )
        .unwrap();
        head.declare(decl, &fx.assets()).unwrap();
        assert_eq!(
            head.render_lines(),
            vec!["<link rel=\"stylesheet\" media=\"print\" href=\"/assets/css/print.css\">"]
        );
    }

    #[test]
    fn test_link_rel_first() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::from_value(
            "link",
            &json!({"href": "favicon.ico", "type": "image/x-icon", "rel": "icon"}),
            false,
        )
        .unwrap();
        head.declare(decl, &fx.assets()).unwrap();
        assert_eq!(
            head.render_lines(),
            vec!["<link rel=\"icon\" href=\"/view/favicon.ico\" type=\"image/x-icon\">"]
        );
    }

    #[test]
    fn test_link_without_href_is_rejected() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::from_value("link", &json!({"rel": "icon"}), false).unwrap();
        let err = head.declare(decl, &fx.assets()).unwrap_err();
        assert!(matches!(err, HeadError::Invalid { kind: "link", .. }));
        assert!(head.is_empty());
    }

    #[test]
    fn test_link_with_unresolvable_href_is_dropped() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::Link(vec![
            ("rel".to_string(), "icon".to_string()),
            ("href".to_string(), "missing.ico".to_string()),
        ]);
        assert!(matches!(
            head.declare(decl, &fx.assets()),
            Err(HeadError::Unresolved { kind: "link", .. })
        ));
        assert!(head.links().is_empty());
    }

    #[test]
    fn test_link_to_absolute_url() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::Link(vec![
            ("rel".to_string(), "preconnect".to_string()),
            ("href".to_string(), "https://fonts.example.com".to_string()),
        ]);
        head.declare(decl, &fx.assets()).unwrap();
        assert_eq!(
            head.render_lines(),
            vec!["<link rel=\"preconnect\" href=\"https://fonts.example.com\">"]
        );
    }

    #[test]
    fn test_scripts() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        head.declare(HeadDeclaration::script("app.js"), &fx.assets()).unwrap();
        head.declare(HeadDeclaration::script_at("/vendor/lib/jquery.js"), &fx.assets())
            .unwrap();
        assert_eq!(head.scripts(), ["/assets/js/app.js", "/vendor/lib/jquery.js"]);
    }

    #[test]
    fn test_missing_script_appends_nothing() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        assert!(head.declare(HeadDeclaration::script("nope.js"), &fx.assets()).is_err());
        head.declare(HeadDeclaration::script("app.js"), &fx.assets()).unwrap();
        assert_eq!(
            head.render_lines(),
            vec!["<script src=\"/assets/js/app.js\"></script>"]
        );
    }

    #[test]
    fn test_custom_is_verbatim() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let markup = "<!--[if lt IE 9]><script src=\"html5shiv.js\"></script><![endif]-->";
        head.declare(HeadDeclaration::Custom(markup.to_string()), &fx.assets())
            .unwrap();
        assert_eq!(head.render_lines(), vec![markup]);
    }

    #[test]
    fn test_section_order() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let a = fx.assets();
        head.declare(HeadDeclaration::Custom("<!-- custom -->".into()), &a).unwrap();
        head.declare(HeadDeclaration::script("app.js"), &a).unwrap();
        head.declare(HeadDeclaration::css("main.css"), &a).unwrap();
        head.declare(HeadDeclaration::Meta(MetaTag::charset("utf-8")), &a).unwrap();
        head.declare(HeadDeclaration::title("Home & Away"), &a).unwrap();
        head.declare(HeadDeclaration::Meta(MetaTag::named("author", "Ann")), &a).unwrap();

        insta::assert_snapshot!(head.render(), @r#"
        <title>Home & Away</title>
        <meta charset="utf-8">
        <meta name="author" content="Ann">
        <link rel="stylesheet" href="/assets/css/main.css">
        <script src="/assets/js/app.js"></script>
        <!-- custom -->
        "#);
    }

    #[test]
    fn test_from_value_shapes() {
        assert!(matches!(
            HeadDeclaration::from_value("bogus", &json!("x"), false),
            Err(HeadError::UnknownKind(_))
        ));
        assert!(HeadDeclaration::from_value("link", &json!("style.css"), false).is_err());
        assert!(HeadDeclaration::from_value("meta", &json!({"content": "x"}), false).is_err());
        assert!(HeadDeclaration::from_value("title", &json!(["a"]), false).is_err());
        assert_eq!(
            HeadDeclaration::from_value("js", &json!("/vendor/x.js"), true).unwrap(),
            HeadDeclaration::script_at("/vendor/x.js")
        );
    }

    #[test]
    fn test_invalid_meta_shapes() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let text_equiv = HeadDeclaration::Meta(MetaTag::named("http-equiv", "refresh"));
        assert!(head.declare(text_equiv, &fx.assets()).is_err());
        let empty_pairs = HeadDeclaration::Meta(MetaTag {
            name: "http-equiv".into(),
            content: MetaContent::Pairs(vec![]),
        });
        assert!(head.declare(empty_pairs, &fx.assets()).is_err());
        assert!(head.is_empty());
    }

    #[test]
    fn test_bad_attribute_name() {
        let fx = Fixture::new();
        let mut head = HeadAggregator::new();
        let decl = HeadDeclaration::Link(vec![
            ("rel".into(), "icon".into()),
            ("href".into(), "favicon.ico".into()),
            ("on load".into(), "x".into()),
        ]);
        assert!(head.declare(decl, &fx.assets()).is_err());
    }
}
