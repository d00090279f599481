//! Video records at each stage of ingestion.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Kind of recording, assigned by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Concert,
    Interview,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Concert => "concert",
            ContentType::Interview => "interview",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unverified hit from a keyword search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Platform-assigned video id
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    /// Raw publish timestamp as returned by the search endpoint
    pub published_at: String,
}

/// Supplementary data looked up by video id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    pub external_id: String,
    /// ISO-8601 period, e.g. `PT2H10M0S`
    pub duration: String,
    pub view_count: Option<u64>,
    pub published_at: Option<String>,
    pub channel_id: String,
    pub channel_title: String,
}

/// A candidate fused with its detail record and derived fields.
///
/// Created by the enrichment merger, tagged in place by the capability
/// stages, and handed once to storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedVideo {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail_url: String,
    pub channel_id: String,
    pub channel_title: String,

    /// Raw duration encoding from the detail record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub duration_seconds: u64,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Best-known date of the recorded event
    #[serde(default)]
    pub date_event: Option<NaiveDate>,

    pub content_type: ContentType,
    pub quality_score: i32,
    pub is_complete: bool,
    #[serde(default)]
    pub quality_tags: Vec<String>,
    #[serde(default)]
    pub tour_name: Option<String>,
    pub is_official: bool,

    /// Query string that produced the hit
    pub search_query: String,
}

impl EnrichedVideo {
    /// Start a record from candidate fields only.
    pub fn from_candidate(candidate: Candidate) -> Self {
        Self {
            url: watch_url(&candidate.external_id),
            external_id: candidate.external_id,
            title: candidate.title,
            description: candidate.description,
            thumbnail_url: candidate.thumbnail_url,
            channel_id: candidate.channel_id,
            channel_title: candidate.channel_title,
            ..Self::default()
        }
    }

    /// Year of the event date, if known.
    pub fn event_year(&self) -> Option<i32> {
        self.date_event.map(|d| d.year())
    }

    /// Tags joined for display.
    pub fn tags_label(&self) -> String {
        self.quality_tags.join(" • ")
    }
}

/// Public watch page for a video id.
pub fn watch_url(external_id: &str) -> String {
    format!("{WATCH_URL}{external_id}")
}
