//! Persistence gateway for enriched videos.
//!
//! Every backend upserts by external id: writing the same id twice refreshes
//! the row instead of failing or duplicating it.
//!
//! ## Directory Structure (`LocalStore`)
//!
//! ```text
//! storage/
//! ├── config.toml          # Crawler configuration
//! ├── videos.json          # All stored videos, keyed by external id
//! ├── sync_history.json    # One entry per ingestion run
//! └── *.lock               # Advisory write locks
//! ```

pub mod local;
pub mod memory;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ContentType, EnrichedVideo, SyncRecord};

// Re-export for convenience
pub use local::LocalStore;
pub use memory::MemoryStore;

/// A persisted video with bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVideo {
    #[serde(flatten)]
    pub video: EnrichedVideo,
    /// First insert
    pub created_at: DateTime<Utc>,
    /// Last upsert
    pub updated_at: DateTime<Utc>,
}

/// Query filter for count and list operations. Empty fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub content_type: Option<ContentType>,
    /// Matches the year of the event date
    pub year: Option<i32>,
    /// Case-insensitive exact tour name
    pub tour_name: Option<String>,
    pub quality: Option<QualityFilter>,
}

/// Quality dimension of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityFilter {
    /// A quality tag such as "HD", compared case-insensitively
    Tag(String),
    Official,
    Complete,
}

impl QualityFilter {
    pub fn matches(&self, video: &EnrichedVideo) -> bool {
        match self {
            QualityFilter::Tag(tag) => video
                .quality_tags
                .iter()
                .any(|t| t.eq_ignore_ascii_case(tag)),
            QualityFilter::Official => video.is_official,
            QualityFilter::Complete => video.is_complete,
        }
    }
}

impl FromStr for QualityFilter {
    type Err = Infallible;

    /// "official" and "complete" select the flags; anything else names a tag.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_ascii_lowercase().as_str() {
            "official" => QualityFilter::Official,
            "complete" => QualityFilter::Complete,
            _ => QualityFilter::Tag(s.to_string()),
        })
    }
}

impl VideoFilter {
    pub fn content_type(content_type: ContentType) -> Self {
        Self {
            content_type: Some(content_type),
            ..Self::default()
        }
    }

    pub fn matches(&self, video: &EnrichedVideo) -> bool {
        if self.content_type.is_some_and(|t| t != video.content_type) {
            return false;
        }
        if self.year.is_some() && self.year != video.event_year() {
            return false;
        }
        if self.quality.as_ref().is_some_and(|q| !q.matches(video)) {
            return false;
        }
        match (&self.tour_name, &video.tour_name) {
            (None, _) => true,
            (Some(wanted), Some(tour)) => wanted.eq_ignore_ascii_case(tour),
            (Some(_), None) => false,
        }
    }
}

/// Trait for video storage backends.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert or refresh videos by external id.
    ///
    /// Returns the number of ids that were not stored before. Repeated ids
    /// within one batch resolve to the last occurrence.
    async fn upsert_batch(&self, videos: &[EnrichedVideo]) -> Result<usize>;

    async fn count(&self, filter: &VideoFilter) -> Result<usize>;

    /// Videos ordered by event date (unknown last), then external id.
    async fn list(
        &self,
        filter: &VideoFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StoredVideo>>;

    async fn get(&self, external_id: &str) -> Result<Option<StoredVideo>>;

    /// Distinct tour names present in the store, sorted.
    async fn tour_names(&self) -> Result<Vec<String>>;

    /// Append an ingestion run to the sync history.
    async fn record_sync(&self, record: &SyncRecord) -> Result<()>;

    async fn last_sync(&self) -> Result<Option<SyncRecord>>;
}

/// Merge a batch into an id-keyed row map; returns how many ids were new.
pub(crate) fn apply_upsert(
    rows: &mut HashMap<String, StoredVideo>,
    videos: &[EnrichedVideo],
    now: DateTime<Utc>,
) -> usize {
    let mut added = 0;
    for video in videos {
        match rows.get_mut(&video.external_id) {
            Some(row) => {
                row.video = video.clone();
                row.updated_at = now;
            }
            None => {
                rows.insert(
                    video.external_id.clone(),
                    StoredVideo {
                        video: video.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                added += 1;
            }
        }
    }
    added
}

fn by_event_date(a: &StoredVideo, b: &StoredVideo) -> Ordering {
    let (a, b) = (&a.video, &b.video);
    match (a.date_event, b.date_event) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.external_id.cmp(&b.external_id))
}

/// Filter, sort and page stored rows.
pub(crate) fn select<'a>(
    rows: impl Iterator<Item = &'a StoredVideo>,
    filter: &VideoFilter,
    offset: usize,
    limit: usize,
) -> Vec<StoredVideo> {
    let mut matched: Vec<&StoredVideo> = rows.filter(|r| filter.matches(&r.video)).collect();
    matched.sort_by(|a, b| by_event_date(a, b));
    matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

pub(crate) fn distinct_tours<'a>(rows: impl Iterator<Item = &'a StoredVideo>) -> Vec<String> {
    rows.filter_map(|r| r.video.tour_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
