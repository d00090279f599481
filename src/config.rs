// src/config.rs

//! Configuration loading utilities.
//!
//! The TOML file supplies everything except the API key; a few settings can
//! be overridden from the environment after the file is read.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

pub const ENV_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_QUERY_COOLDOWN_MS: &str = "QUERY_COOLDOWN_MS";
pub const ENV_MAX_RESULTS: &str = "YOUTUBE_MAX_RESULTS";

/// Load configuration from a TOML file and apply environment overrides.
///
/// A missing or unreadable file falls back to defaults; a malformed
/// override value is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path);
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`. Blank values are ignored.
pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(key) = get(ENV_API_KEY) {
        config.youtube.api_key = Some(key);
    }
    if let Some(raw) = get(ENV_QUERY_COOLDOWN_MS) {
        config.crawler.query_cooldown_ms = parse_number(ENV_QUERY_COOLDOWN_MS, &raw)?;
    }
    if let Some(raw) = get(ENV_MAX_RESULTS) {
        config.youtube.max_results = parse_number(ENV_MAX_RESULTS, &raw)?;
    }
    Ok(config)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| AppError::config(format!("{key}={raw:?} is not a valid number: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let config = apply_overrides(
            Config::default(),
            env(&[
                (ENV_API_KEY, " key-123 "),
                (ENV_QUERY_COOLDOWN_MS, "250"),
                (ENV_MAX_RESULTS, "20"),
            ]),
        )
        .unwrap();

        assert_eq!(config.youtube.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.crawler.query_cooldown_ms, 250);
        assert_eq!(config.youtube.max_results, 20);
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = apply_overrides(Config::default(), env(&[(ENV_API_KEY, "  ")])).unwrap();
        assert!(config.youtube.api_key.is_none());
        assert!(!config.youtube.has_credential());
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let result = apply_overrides(Config::default(), env(&[(ENV_QUERY_COOLDOWN_MS, "soon")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(tmp.path().join("config.toml"));
        assert_eq!(config.crawler.artist, "Metallica");
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [crawler]
            artist = "Megadeth"

            [[queries]]
            query = "Rust in Peace"
            category = "concert"
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.crawler.artist, "Megadeth");
        assert_eq!(config.queries.len(), 1);
        assert!(config.youtube.api_key.is_none());
    }
}
