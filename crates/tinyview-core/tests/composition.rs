/*
 * composition.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end composition tests against a real directory tree.
 */

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use tinyview_core::diagnostics;
use tinyview_core::{
    CompositionError, Engine, HeadDeclaration, MetaTag, ResolveOptions, ResolvedPath, SiteConfig,
};
use tinyview_system_runtime::NativeRuntime;

/// A temporary site with the given files.
fn site(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (path, contents) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().expect("fixture path has a parent"))
            .expect("create fixture dirs");
        fs::write(&full, contents).expect("write fixture");
    }
    dir
}

fn root(dir: &TempDir) -> PathBuf {
    dir.path().to_path_buf()
}

#[test]
fn outer_template_found_under_document_root() {
    let dir = site(&[("templates/page.html", "page")]);
    let mut engine = Engine::new(root(&dir));
    let path = engine.set_outer("page.html").unwrap();
    assert_eq!(path, dir.path().join("templates/page.html"));
}

#[test]
fn charset_meta_renders_alone() {
    let dir = site(&[("page.html", "$head()$")]);
    let mut engine = Engine::new(root(&dir));
    engine
        .declare_value("meta", &json!({"name": "charset", "content": "utf-8"}), false)
        .unwrap();
    engine.set_outer("page.html").unwrap();
    let page = engine.render().unwrap();
    assert_eq!(page.head, vec!["<meta charset=\"utf-8\">"]);
    assert!(page.diagnostics.is_empty());
}

#[test]
fn css_resolves_root_relative() {
    let dir = site(&[("page.html", "$head()$"), ("assets/css/main.css", "body{}")]);
    let mut engine = Engine::new(root(&dir));
    engine.set_group_path("css", dir.path().join("assets/css").to_string_lossy().into_owned());
    engine
        .declare_value("css", &json!({"href": "main.css"}), false)
        .unwrap();
    engine.set_outer("page.html").unwrap();
    assert_eq!(
        engine.render_to_string().unwrap(),
        "<link rel=\"stylesheet\" href=\"/assets/css/main.css\">\n"
    );
}

#[test]
fn missing_include_leaves_rest_of_page() {
    let dir = site(&[
        ("page.html", "<body>\n$include(\"missing.html\")$$include(\"footer.html\")$</body>"),
        ("footer.html", "<footer/>\n"),
    ]);
    let mut engine = Engine::new(root(&dir));
    engine.set_outer("page.html").unwrap();
    let page = engine.render().unwrap();
    assert_eq!(page.html, "<body>\n<footer/>\n</body>");
    assert_eq!(page.diagnostics.len(), 1);
    assert_eq!(page.diagnostics[0].code, diagnostics::NOT_FOUND);
}

#[test]
fn shallowest_duplicate_wins_every_time() {
    let dir = site(&[
        ("z/deep/header.html", "deep"),
        ("a/header.html", "shallow-a"),
        ("b/header.html", "shallow-b"),
    ]);
    let engine = Engine::new(root(&dir));
    let first = engine
        .resolver()
        .resolve("header.html", "", ResolveOptions::absolute())
        .unwrap();
    for _ in 0..5 {
        let again = engine
            .resolver()
            .resolve("header.html", "", ResolveOptions::absolute())
            .unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(first, ResolvedPath::Absolute(dir.path().join("a/header.html")));
}

#[test]
fn dot_directories_are_skipped() {
    let dir = site(&[(".git/page.html", "hidden"), ("site/page.html", "visible")]);
    let mut engine = Engine::new(root(&dir));
    engine.set_outer("page.html").unwrap();
    assert_eq!(engine.render_to_string().unwrap(), "visible");
}

#[test]
fn search_root_forms_are_equivalent() {
    let dir = site(&[("assets/js/app.js", "")]);
    let engine = Engine::new(root(&dir));
    let absolute = format!("{}/assets/js/", dir.path().display());
    for search_root in ["assets/js", "/assets/js", "assets/js/", absolute.as_str()] {
        assert_eq!(
            engine
                .resolver()
                .resolve("app.js", search_root, ResolveOptions::root_relative())
                .unwrap(),
            ResolvedPath::RootRelative("/assets/js/app.js".to_string()),
            "search root {:?}",
            search_root
        );
    }
}

#[test]
fn full_page_composition() {
    let dir = site(&[
        (
            "templates/layout.html",
            "<!DOCTYPE html>\n<html>\n<head>\n$head()$</head>\n<body>\n$include(\"nav.html\", active=\"home\")$$include(\"content.html\")$</body>\n</html>\n",
        ),
        (
            "templates/partials/nav.html",
            "$-- navigation bar\n<nav class=\"$active$\">$site$</nav>\n",
        ),
        (
            "templates/partials/content.html",
            "$title(\"Welcome\")$$script(\"app.js\")$<main>$greeting$ $$5</main>\n",
        ),
        ("assets/css/main.css", ""),
        ("assets/js/app.js", ""),
    ]);

    let mut engine = Engine::new(root(&dir));
    engine.set_group_path("html", "templates");
    engine.set_group_path("css", "assets/css");
    engine.set_group_path("js", "assets/js");
    engine.set_var("site", "Example");
    engine.set_var("greeting", "Hello");
    engine.declare(HeadDeclaration::Meta(MetaTag::charset("utf-8"))).unwrap();
    engine.declare(HeadDeclaration::css("main.css")).unwrap();
    engine.set_outer("layout.html").unwrap();

    let page = engine.render().unwrap();
    assert!(page.diagnostics.is_empty(), "{:?}", page.diagnostics);
    insta::assert_snapshot!(page.html, @r#"
    <!DOCTYPE html>
    <html>
    <head>
    <title>Welcome</title>
    <meta charset="utf-8">
    <link rel="stylesheet" href="/assets/css/main.css">
    <script src="/assets/js/app.js"></script>
    </head>
    <body>
    <nav class="home">Example</nav>
    <main>Hello $5</main>
    </body>
    </html>
    "#);
}

#[test]
fn render_to_output_writes_to_sink() {
    let dir = site(&[("page.html", "out")]);
    let mut engine = Engine::new(root(&dir));
    engine.set_outer("page.html").unwrap();
    let mut sink: Vec<u8> = Vec::new();
    let diagnostics = engine.render_to_output(&mut sink).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(String::from_utf8(sink).unwrap(), "out");
}

#[test]
fn deleted_outer_template_is_reported() {
    let dir = site(&[("page.html", "x")]);
    let mut engine = Engine::new(root(&dir));
    engine.set_outer("page.html").unwrap();
    fs::remove_file(dir.path().join("page.html")).unwrap();
    assert!(matches!(
        engine.render(),
        Err(CompositionError::OuterTemplateMissing(_))
    ));
}

#[test]
fn engine_is_reusable_after_reset() {
    let dir = site(&[("one.html", "1:$v$"), ("two.html", "2:$v$")]);
    let mut engine = Engine::new(root(&dir));
    engine.set_var("v", "a");
    engine.set_outer("one.html").unwrap();
    assert_eq!(engine.render_to_string().unwrap(), "1:a");
    assert_eq!(engine.render_to_string().unwrap(), "1:a");

    engine.reset();
    engine.set_outer("two.html").unwrap();
    assert_eq!(engine.render_to_string().unwrap(), "2:");
}

#[test]
fn site_config_from_disk() {
    let dir = site(&[
        (
            "_tinyview.yml",
            "paths:\n  html: pages\nvars:\n  name: World\nhead:\n  - { kind: title, value: Configured }\n",
        ),
        ("pages/index.html", "$head()$Hello, $name$!"),
    ]);
    let config = SiteConfig::discover(dir.path(), &NativeRuntime::new())
        .unwrap()
        .expect("config present");
    let mut engine = Engine::new(root(&dir));
    config.apply(&mut engine);
    engine.set_outer("index.html").unwrap();
    assert_eq!(
        engine.render_to_string().unwrap(),
        "<title>Configured</title>\nHello, World!"
    );
}

#[test]
fn resolved_paths_stay_under_root() {
    let dir = site(&[("inner/file.html", "")]);
    let outside = site(&[("file.html", "")]);
    let engine = Engine::new(root(&dir));
    let resolved = engine
        .resolver()
        .resolve("file.html", "", ResolveOptions::absolute())
        .unwrap();
    let path: &Path = resolved.as_path().unwrap();
    assert!(path.starts_with(dir.path()));
    assert!(!path.starts_with(outside.path()));
}
