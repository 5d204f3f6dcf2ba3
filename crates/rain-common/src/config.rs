//! YAML configuration loading with environment variable substitution.
//!
//! Supports `${VAR}` (must be set) and `${VAR:-default}` (default when unset
//! or empty) anywhere in the file text.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{RainError, RainResult};

/// Read a YAML file, expand environment variables and deserialize it.
pub fn load_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> RainResult<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        RainError::Configuration(format!("failed to read {}: {e}", path.display()))
    })?;

    let expanded = expand_env_vars(&content)?;

    serde_yaml::from_str(&expanded).map_err(|e| {
        RainError::Configuration(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Expand `${VAR}` and `${VAR:-default}` references in `content`.
pub fn expand_env_vars(content: &str) -> RainResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => {
                        return Err(RainError::Configuration(format!(
                            "unclosed variable substitution: ${{{var_expr}"
                        )))
                    }
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> RainResult<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).map_err(|_| {
            RainError::Configuration(format!("environment variable {} not set", expr.trim()))
        })
    }
}
