// src/services/filter.rs

//! Keyword relevance pre-filter.

use crate::models::FilterConfig;
use crate::utils::text::normalize_keywords;

/// Cheap admit/reject decision over a candidate's visible text.
///
/// Matching is case-insensitive substring matching over
/// `title + description + channel`. False positives are expected; the
/// completeness gate prunes them later.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    required: Vec<String>,
    excluded: Vec<String>,
}

impl ContentFilter {
    pub fn new(required: &[String], excluded: &[String]) -> Self {
        Self {
            required: normalize_keywords(required),
            excluded: normalize_keywords(excluded),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.required_keywords, &config.exclude_keywords)
    }

    /// Admit only text that hits a required keyword and no excluded one.
    pub fn admit(&self, title: &str, description: &str, channel_title: &str) -> bool {
        let text = format!("{title} {description} {channel_title}").to_lowercase();

        if !self.required.iter().any(|k| text.contains(k.as_str())) {
            return false;
        }
        !self.excluded.iter().any(|k| text.contains(k.as_str()))
    }
}
