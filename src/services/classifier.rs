// src/services/classifier.rs

use crate::models::{ContentType, EnrichedVideo, ScoringConfig};
use crate::services::Classifier;
use crate::utils::text::{contains_term, normalize_keywords};

/// Calls a record an interview when its title carries an interview term.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    interview_keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(interview_keywords: &[String]) -> Self {
        Self {
            interview_keywords: normalize_keywords(interview_keywords),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(&config.interview_keywords)
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, video: &EnrichedVideo) -> ContentType {
        let title = video.title.to_lowercase();
        if self
            .interview_keywords
            .iter()
            .any(|k| contains_term(&title, k))
        {
            ContentType::Interview
        } else {
            ContentType::Concert
        }
    }
}
