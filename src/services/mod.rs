//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Upstream transport (`YouTubeApi` behind the `VideoApi` trait)
//! - Paginated search and batched detail lookup (`SearchClient`)
//! - Keyword pre-filtering (`ContentFilter`)
//! - Detail merging and event dates (`Enricher`)
//! - Pluggable tagging strategies (`Capabilities`)

mod capabilities;
mod classifier;
mod enrich;
mod filter;
mod scorer;
mod search;
mod tours;
pub mod youtube;

pub use capabilities::{Capabilities, Classifier, Scorer, TourDetector};
pub use classifier::KeywordClassifier;
pub use enrich::{Enricher, merge};
pub use filter::ContentFilter;
pub use scorer::HeuristicScorer;
pub use search::SearchClient;
pub use tours::KeywordTourDetector;
pub use youtube::{SearchPage, SearchRequest, VideoApi, YouTubeApi};
