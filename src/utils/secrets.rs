use std::env;

use crate::errors::{AppError, AppResult};

/// Resolves a secret from a named environment variable first, then an inline value.
pub fn resolve_secret(
    field: &str,
    inline: Option<&str>,
    env_key: Option<&str>,
) -> AppResult<String> {
    if let Some(key) = env_key {
        if let Some(value) = env::var(key).ok().filter(|v| !v.trim().is_empty()) {
            return Ok(value);
        }
    }

    inline
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| match env_key {
            Some(key) => AppError::Config(format!(
                "{field} must be provided (inline or via environment variable {key})"
            )),
            None => AppError::Config(format!("{field} must be provided")),
        })
}
