/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive parser.
//!
//! A small hand-written scanner. Text outside `$...$` is literal; a `$`
//! that does not start a well-formed variable reference or call is kept as
//! literal text too, so prose like `costs $5` needs no escaping. Once a
//! call's `(` has been seen, any malformation is a hard parse error.

use crate::error::TemplateError;

use super::ast::{Call, CallKind, Expr, Node, VariableRef};

/// Parse a template body into nodes.
pub fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    Parser::new(source).parse()
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    column: usize,
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
    column: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.column = mark.column;
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        self.error_at(self.mark(), message)
    }

    fn error_at(&self, mark: Mark, message: impl Into<String>) -> TemplateError {
        TemplateError::Parse {
            message: message.into(),
            line: mark.line,
            column: mark.column,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn parse(mut self) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if c != '$' {
                text.push(c);
                self.bump();
                continue;
            }

            let start = self.mark();
            self.bump();
            match self.peek() {
                Some('$') => {
                    self.bump();
                    text.push('$');
                }
                Some('-') if self.rest().starts_with("--") => {
                    // Comment runs to end of line, newline included
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some(c) if is_ident_start(c) => match self.directive(start)? {
                    Some(node) => {
                        if !text.is_empty() {
                            nodes.push(Node::Literal(std::mem::take(&mut text)));
                        }
                        nodes.push(node);
                    }
                    None => {
                        self.reset(start);
                        self.bump();
                        text.push('$');
                    }
                },
                _ => text.push('$'),
            }
        }

        if !text.is_empty() {
            nodes.push(Node::Literal(text));
        }
        Ok(nodes)
    }

    /// Parse what follows an opening `$`. `None` means "not a directive".
    fn directive(&mut self, start: Mark) -> Result<Option<Node>, TemplateError> {
        let path = self.path();
        match self.peek() {
            Some('$') => {
                self.bump();
                Ok(Some(Node::Variable(VariableRef { path })))
            }
            Some('(') => {
                if path.len() != 1 {
                    return Err(self.error_at(start, format!("'{}' is not a function name", path.join("."))));
                }
                let name = &path[0];
                self.bump();
                let (positional, named) = self.arguments()?;
                if self.peek() != Some('$') {
                    return Err(self.error("expected '$' to close directive"));
                }
                self.bump();

                if name == "head" {
                    if !positional.is_empty() || !named.is_empty() {
                        return Err(self.error_at(start, "head() takes no arguments"));
                    }
                    return Ok(Some(Node::HeadSlot));
                }

                let kind = CallKind::from_name(name)
                    .ok_or_else(|| self.error_at(start, format!("unknown function '{}'", name)))?;
                check_arity(kind, &positional, &named).map_err(|msg| self.error_at(start, msg))?;
                Ok(Some(Node::Call(Call {
                    kind,
                    positional,
                    named,
                    line: start.line,
                })))
            }
            _ => Ok(None),
        }
    }

    fn ident(&mut self) -> String {
        let begin = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        self.src[begin..self.pos].to_string()
    }

    /// `ident(.ident)*`; the caller has checked the first character.
    fn path(&mut self) -> Vec<String> {
        let mut path = vec![self.ident()];
        while self.rest().starts_with('.')
            && self.rest()[1..].chars().next().is_some_and(is_ident_start)
        {
            self.bump();
            path.push(self.ident());
        }
        path
    }

    fn arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), TemplateError> {
        let mut positional = Vec::new();
        let mut named: Vec<(String, Expr)> = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.bump();
            return Ok((positional, named));
        }

        loop {
            self.skip_whitespace();
            let arg_start = self.mark();
            let mut is_named = false;
            if self.peek().is_some_and(is_ident_start) {
                let key = self.ident();
                self.skip_whitespace();
                if self.peek() == Some('=') {
                    self.bump();
                    self.skip_whitespace();
                    if named.iter().any(|(k, _)| *k == key) {
                        return Err(self.error_at(arg_start, format!("duplicate argument '{}'", key)));
                    }
                    let value = self.expr()?;
                    named.push((key, value));
                    is_named = true;
                } else {
                    self.reset(arg_start);
                }
            }
            if !is_named {
                positional.push(self.expr()?);
            }

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {
                    self.skip_whitespace();
                    if self.peek() == Some(')') {
                        self.bump();
                        break;
                    }
                }
                Some(')') => break,
                Some(c) => return Err(self.error(format!("expected ',' or ')', found '{}'", c))),
                None => return Err(self.error("unterminated argument list")),
            }
        }

        Ok((positional, named))
    }

    fn expr(&mut self) -> Result<Expr, TemplateError> {
        match self.peek() {
            Some('"') => self.string().map(Expr::Str),
            Some(c) if c.is_ascii_digit() || c == '-' => self.integer(),
            Some(c) if is_ident_start(c) => {
                let path = self.path();
                Ok(match path.as_slice() {
                    [word] if word == "true" => Expr::Bool(true),
                    [word] if word == "false" => Expr::Bool(false),
                    _ => Expr::Var(VariableRef { path }),
                })
            }
            Some(c) => Err(self.error(format!("unexpected '{}' in argument", c))),
            None => Err(self.error("unterminated argument list")),
        }
    }

    fn string(&mut self) -> Result<String, TemplateError> {
        let start = self.mark();
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => return Err(self.error(format!("unknown escape '\\{}'", c))),
                    None => return Err(self.error_at(start, "unterminated string")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error_at(start, "unterminated string")),
            }
        }
    }

    fn integer(&mut self) -> Result<Expr, TemplateError> {
        let start = self.mark();
        let begin = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let digits = &self.src[begin..self.pos];
        digits
            .parse::<i64>()
            .map(Expr::Int)
            .map_err(|_| self.error_at(start, format!("invalid integer '{}'", digits)))
    }
}

fn check_arity(kind: CallKind, positional: &[Expr], named: &[(String, Expr)]) -> Result<(), String> {
    let ok = match kind {
        CallKind::Include => positional.len() == 1,
        CallKind::Title | CallKind::Custom => positional.len() == 1 && named.is_empty(),
        CallKind::Meta => {
            (positional.len() == 2 && named.is_empty())
                || (positional.len() == 1 && !named.is_empty())
        }
        CallKind::Link => positional.is_empty() && !named.is_empty(),
        CallKind::Css => {
            (positional.len() == 1 && named.is_empty()) || (positional.is_empty() && !named.is_empty())
        }
        CallKind::Script => {
            (positional.len() == 1 && named.is_empty())
                || (positional.is_empty() && named.len() == 1 && named[0].0 == "path")
        }
    };
    if ok {
        return Ok(());
    }
    let usage = match kind {
        CallKind::Include => "include(\"file.html\", name=value, ...)",
        CallKind::Title => "title(\"text\")",
        CallKind::Custom => "custom(\"markup\")",
        CallKind::Meta => "meta(name, content) or meta(\"http-equiv\", header=\"value\")",
        CallKind::Link => "link(rel=..., href=..., ...)",
        CallKind::Css => "css(\"file.css\") or css(href=..., ...)",
        CallKind::Script => "script(\"file.js\") or script(path=\"/dir/file.js\")",
    };
    Err(format!("wrong arguments to {}; expected {}", kind.name(), usage))
}
