/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive AST types.

/// A node in a parsed template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text to be output as-is.
    Literal(String),

    /// Variable interpolation: `$var$` or `$obj.field$`
    Variable(VariableRef),

    /// Head placement marker: `$head()$`
    HeadSlot,

    /// Host call: `$include("x.html", k=v)$`, `$css("main.css")$`, ...
    Call(Call),
}

/// Reference to a scope value by dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub path: Vec<String>,
}

impl VariableRef {
    pub fn segments(&self) -> Vec<&str> {
        self.path.iter().map(String::as_str).collect()
    }
}

impl std::fmt::Display for VariableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.join("."))
    }
}

/// The host operations a body can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Include,
    Title,
    Meta,
    Link,
    Css,
    Script,
    Custom,
}

impl CallKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "include" => CallKind::Include,
            "title" => CallKind::Title,
            "meta" => CallKind::Meta,
            "link" => CallKind::Link,
            "css" => CallKind::Css,
            "script" => CallKind::Script,
            "custom" => CallKind::Custom,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            CallKind::Include => "include",
            CallKind::Title => "title",
            CallKind::Meta => "meta",
            CallKind::Link => "link",
            CallKind::Css => "css",
            CallKind::Script => "script",
            CallKind::Custom => "custom",
        }
    }
}

/// A host call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: CallKind,
    /// Positional arguments, in order.
    pub positional: Vec<Expr>,
    /// Named arguments, in order.
    pub named: Vec<(String, Expr)>,
    /// 1-based line of the opening `$`.
    pub line: usize,
}

/// An argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Bool(bool),
    Var(VariableRef),
}
