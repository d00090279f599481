// src/services/capabilities.rs

//! Pluggable tagging strategies consumed by the crawl.
//!
//! Each strategy sees a snapshot of the record and returns plain values;
//! none of them holds a reference back into the pipeline.

use std::sync::Arc;

use crate::models::{Config, ContentType, EnrichedVideo};
use crate::services::{HeuristicScorer, KeywordClassifier, KeywordTourDetector};

/// Assigns the content type of a record.
pub trait Classifier: Send + Sync {
    fn classify(&self, video: &EnrichedVideo) -> ContentType;
}

/// Scores records and decides the completeness gate.
pub trait Scorer: Send + Sync {
    fn score(&self, video: &EnrichedVideo) -> i32;

    /// Whether the record is a full-length recording of its kind.
    fn is_complete(&self, video: &EnrichedVideo, content_type: ContentType) -> bool;

    /// Quality labels, in the scorer's own precedence order.
    fn tags(&self, video: &EnrichedVideo) -> Vec<String>;

    fn is_official_channel(&self, channel_title: &str) -> bool;
}

/// Finds the tour a recording belongs to.
pub trait TourDetector: Send + Sync {
    fn detect_tour(&self, title: &str) -> Option<String>;
}

/// The strategy set used by one crawl.
#[derive(Clone)]
pub struct Capabilities {
    pub classifier: Arc<dyn Classifier>,
    pub scorer: Arc<dyn Scorer>,
    pub tours: Arc<dyn TourDetector>,
}

impl Capabilities {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        scorer: Arc<dyn Scorer>,
        tours: Arc<dyn TourDetector>,
    ) -> Self {
        Self {
            classifier,
            scorer,
            tours,
        }
    }

    /// Keyword and heuristic strategies driven by configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(KeywordClassifier::from_config(&config.scoring)),
            Arc::new(HeuristicScorer::new(config.scoring.clone())),
            Arc::new(KeywordTourDetector::new(&config.tours)),
        )
    }
}
