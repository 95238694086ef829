/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive evaluation.
//!
//! Walks parsed nodes and turns them into output and host calls on the
//! [`RenderContext`]. Failed includes and declarations are recorded by the
//! context itself, so evaluation simply moves on to the next node.

use serde_json::{Map, Value};

use crate::engine::RenderContext;
use crate::scope::{Scope, ScopeView, render_value};

use super::ast::{Call, CallKind, Expr, Node};

/// Evaluate nodes against a render context.
pub fn evaluate(nodes: &[Node], ctx: &mut RenderContext<'_>) {
    for node in nodes {
        evaluate_node(node, ctx);
    }
}

fn evaluate_node(node: &Node, ctx: &mut RenderContext<'_>) {
    match node {
        Node::Literal(text) => ctx.write(text),
        Node::Variable(var) => {
            let rendered = ctx
                .scope()
                .get_path(&var.segments())
                .map(render_value)
                .unwrap_or_default();
            ctx.write(&rendered);
        }
        Node::HeadSlot => ctx.head_slot(),
        Node::Call(call) => evaluate_call(call, ctx),
    }
}

fn evaluate_call(call: &Call, ctx: &mut RenderContext<'_>) {
    let scope = ctx.scope();
    tracing::trace!(call = call.kind.name(), line = call.line, "evaluating");

    match call.kind {
        CallKind::Include => {
            let filename = render_value(&positional(call, 0, scope));
            let overrides = if call.named.is_empty() {
                None
            } else {
                Some(named(call, scope))
            };
            // Failure is already recorded as a diagnostic
            let _ = ctx.include(&filename, overrides);
        }
        CallKind::Title | CallKind::Custom => {
            let _ = ctx.declare_value(call.kind.name(), &positional(call, 0, scope), false);
        }
        CallKind::Meta => {
            let content = if call.named.is_empty() {
                positional(call, 1, scope)
            } else {
                Value::Object(named(call, scope))
            };
            let mut meta = Map::new();
            meta.insert("name".to_string(), positional(call, 0, scope));
            meta.insert("content".to_string(), content);
            let _ = ctx.declare_value("meta", &Value::Object(meta), false);
        }
        CallKind::Link => {
            let _ = ctx.declare_value("link", &Value::Object(named(call, scope)), false);
        }
        CallKind::Css => {
            let value = if call.named.is_empty() {
                positional(call, 0, scope)
            } else {
                Value::Object(named(call, scope))
            };
            let _ = ctx.declare_value("css", &value, false);
        }
        CallKind::Script => match call.named.first() {
            Some((_, path)) => {
                let _ = ctx.declare_value("script", &resolve_expr(path, scope), true);
            }
            None => {
                let _ = ctx.declare_value("script", &positional(call, 0, scope), false);
            }
        },
    }
}

fn positional(call: &Call, index: usize, scope: ScopeView<'_>) -> Value {
    call.positional
        .get(index)
        .map_or(Value::Null, |expr| resolve_expr(expr, scope))
}

fn named(call: &Call, scope: ScopeView<'_>) -> Scope {
    call.named
        .iter()
        .map(|(key, expr)| (key.clone(), resolve_expr(expr, scope)))
        .collect()
}

/// Turn an argument into a value. Missing variables become null.
fn resolve_expr(expr: &Expr, scope: ScopeView<'_>) -> Value {
    match expr {
        Expr::Str(s) => Value::String(s.clone()),
        Expr::Int(n) => Value::from(*n),
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Var(var) => scope.get_path(&var.segments()).cloned().unwrap_or_default(),
    }
}
