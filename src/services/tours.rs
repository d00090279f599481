// src/services/tours.rs

use crate::models::TourRule;
use crate::services::TourDetector;
use crate::utils::text::{contains_term, normalize_keywords};

/// Matches titles against ordered tour rules; the first hit wins.
#[derive(Debug, Clone)]
pub struct KeywordTourDetector {
    rules: Vec<(String, Vec<String>)>,
}

impl KeywordTourDetector {
    pub fn new(rules: &[TourRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| (rule.name.clone(), normalize_keywords(&rule.keywords)))
            .collect();
        Self { rules }
    }
}

impl TourDetector for KeywordTourDetector {
    fn detect_tour(&self, title: &str) -> Option<String> {
        let title = title.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| contains_term(&title, k)))
            .map(|(name, _)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;

    fn detector() -> KeywordTourDetector {
        KeywordTourDetector::new(&Config::default().tours)
    }

    #[test]
    fn test_detect_tour() {
        let d = detector();
        assert_eq!(
            d.detect_tour("Metallica - Wherever We May Roam Tour, San Diego 1992").as_deref(),
            Some("Wherever We May Roam")
        );
        assert_eq!(
            d.detect_tour("Metallica M72 Tour Amsterdam 2023").as_deref(),
            Some("M72 World Tour")
        );
        assert_eq!(d.detect_tour("Metallica - Live in Moscow 1991"), None);
    }

    #[test]
    fn test_first_rule_wins() {
        let rules = vec![
            TourRule {
                name: "A".to_string(),
                keywords: vec!["roam".to_string()],
            },
            TourRule {
                name: "B".to_string(),
                keywords: vec!["nowhere else to roam".to_string()],
            },
        ];
        let d = KeywordTourDetector::new(&rules);
        assert_eq!(d.detect_tour("Nowhere Else To Roam 1993").as_deref(), Some("A"));
    }
}
