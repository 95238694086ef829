/*
 * scope.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Variable scope types.
//!
//! Values are plain `serde_json::Value`s so callers can hand over data of
//! any shape. A template body never sees a merged copy of its variables;
//! it reads through a [`ScopeView`], which checks the per-include overrides
//! first and falls back to the engine's instance scope.

use serde_json::{Map, Value};

/// A set of named variables. Keys are unique; order is preserved but not
/// significant for lookup.
pub type Scope = Map<String, Value>;

/// Two-level read-only view of the variables visible to one template body.
#[derive(Debug, Clone, Copy)]
pub struct ScopeView<'a> {
    instance: &'a Scope,
    overrides: Option<&'a Scope>,
}

impl<'a> ScopeView<'a> {
    /// View of the instance scope alone (the outer template).
    pub fn new(instance: &'a Scope) -> Self {
        Self {
            instance,
            overrides: None,
        }
    }

    /// View of the instance scope with `overrides` applied on top.
    pub fn with_overrides(instance: &'a Scope, overrides: Option<&'a Scope>) -> Self {
        Self {
            instance,
            overrides,
        }
    }

    /// Look up a variable, override first.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.overrides
            .and_then(|o| o.get(name))
            .or_else(|| self.instance.get(name))
    }

    /// Look up a dotted path (e.g. `["page", "title"]`).
    ///
    /// Only the first segment goes through the two-level lookup; the rest
    /// walk into nested mappings of whichever value won.
    pub fn get_path(&self, path: &[&str]) -> Option<&'a Value> {
        let (first, rest) = path.split_first()?;
        let mut value = self.get(first)?;
        for segment in rest {
            value = value.as_object()?.get(*segment)?;
        }
        Some(value)
    }

}

/// Render a value as text for interpolation.
///
/// - String: returned as-is
/// - Number: decimal representation
/// - Bool: "true" or "" (empty for false)
/// - Array: concatenation of rendered elements
/// - Object: "true"
/// - Null: ""
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        Value::Array(items) => items.iter().map(render_value).collect(),
        Value::Object(_) => "true".to_string(),
    }
}
