// src/models/mod.rs

//! Domain models for the archive crawler.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod query;
mod sync;
mod video;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, FilterConfig, ScoringConfig, StorageConfig, TagRule, TourRule,
    UPSTREAM_PAGE_LIMIT, YouTubeConfig,
};
pub use query::{QueryCategory, QuerySpec, SearchOrder};
pub use sync::{SyncRecord, SyncState};
pub use video::{Candidate, ContentType, DetailRecord, EnrichedVideo, watch_url};
