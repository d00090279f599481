//! Query plan entries and search options.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of recording a query is hunting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryCategory {
    Concert,
    Interview,
}

impl QueryCategory {
    /// Guess the category from the query text alone.
    pub fn infer(query: &str) -> Self {
        let lower = query.to_lowercase();
        if lower.contains("concert") || lower.contains("live") {
            QueryCategory::Concert
        } else {
            QueryCategory::Interview
        }
    }

    /// Suffix appended to the base query before searching.
    pub fn augmentation(&self) -> &'static str {
        match self {
            QueryCategory::Concert => "concert live full show",
            QueryCategory::Interview => "interview full",
        }
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryCategory::Concert => f.write_str("concert"),
            QueryCategory::Interview => f.write_str("interview"),
        }
    }
}

/// One entry of the query plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Query as configured (also recorded as provenance)
    pub query: String,

    /// Declared category; inferred from the text when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<QueryCategory>,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>, category: QueryCategory) -> Self {
        Self {
            query: query.into(),
            category: Some(category),
        }
    }

    /// Create an entry without a declared category.
    pub fn untyped(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
        }
    }

    pub fn resolved_category(&self) -> QueryCategory {
        self.category
            .unwrap_or_else(|| QueryCategory::infer(&self.query))
    }

    /// Build the upstream search string.
    ///
    /// The artist name is prefixed unless the query already mentions it.
    pub fn search_text(&self, artist: &str) -> String {
        let query = self.query.trim();
        let base = if artist.is_empty() || query.to_lowercase().contains(&artist.to_lowercase()) {
            query.to_string()
        } else {
            format!("{artist} {query}")
        };
        format!("{} {}", base, self.resolved_category().augmentation())
    }
}

/// Result ordering requested from the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchOrder {
    #[default]
    Relevance,
    Date,
    ViewCount,
    Rating,
    Title,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::Relevance => "relevance",
            SearchOrder::Date => "date",
            SearchOrder::ViewCount => "viewCount",
            SearchOrder::Rating => "rating",
            SearchOrder::Title => "title",
        }
    }
}
