//! Command implementations for the tinyview CLI
//!
//! Each command module handles the CLI interface and delegates to
//! tinyview-core for the actual work.

pub mod render;
pub mod resolve;

use anyhow::{Result, bail};
use serde_json::Value;

/// Split a `KEY=VALUE` argument.
pub fn parse_key_value(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("expected KEY=VALUE, got '{}'", arg),
    }
}

/// Read a command-line value as a YAML scalar.
///
/// Numbers and booleans keep their type; anything that is not a scalar
/// (or fails to parse) is taken as a plain string.
pub fn parse_scalar(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::String(raw.to_string());
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
