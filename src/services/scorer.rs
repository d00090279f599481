// src/services/scorer.rs

//! Default scoring strategy.
//!
//! Points come from length, reach, official origin, quality tags and a known
//! event date. The total is clamped to `0..=100`.

use crate::models::{ContentType, EnrichedVideo, ScoringConfig};
use crate::services::Scorer;
use crate::utils::text::{contains_term, normalize_keywords};

const OFFICIAL_TAG: &str = "Official";
const OFFICIAL_POINTS: i32 = 20;
const DATED_POINTS: i32 = 5;
const MAX_SCORE: i32 = 100;

/// (minimum seconds, points), longest first.
const DURATION_POINTS: [(u64, i32); 3] = [(3600, 30), (2400, 20), (600, 10)];

/// (minimum views, points), largest first.
const VIEW_POINTS: [(u64, i32); 4] = [(1_000_000, 20), (100_000, 15), (10_000, 10), (1_000, 5)];

/// A tag rule with its keywords already lowercased.
#[derive(Debug, Clone)]
struct CompiledTag {
    tag: String,
    keywords: Vec<String>,
    points: i32,
}

/// Rule-based scorer driven by [`ScoringConfig`].
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    official_channels: Vec<String>,
    min_concert_secs: u64,
    min_interview_secs: u64,
    tags: Vec<CompiledTag>,
}

impl HeuristicScorer {
    pub fn new(config: ScoringConfig) -> Self {
        let tags = config
            .tag_rules
            .into_iter()
            .map(|rule| CompiledTag {
                keywords: normalize_keywords(&rule.keywords),
                tag: rule.tag,
                points: rule.points,
            })
            .collect();

        Self {
            official_channels: normalize_keywords(&config.official_channels),
            min_concert_secs: config.min_concert_secs,
            min_interview_secs: config.min_interview_secs,
            tags,
        }
    }

    fn matched_tags<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a CompiledTag> + 'a {
        self.tags
            .iter()
            .filter(move |rule| rule.keywords.iter().any(|k| contains_term(title, k)))
    }
}

fn tier_points(value: u64, tiers: &[(u64, i32)]) -> i32 {
    tiers
        .iter()
        .find(|(min, _)| value >= *min)
        .map_or(0, |(_, points)| *points)
}

impl Scorer for HeuristicScorer {
    fn score(&self, video: &EnrichedVideo) -> i32 {
        let title = video.title.to_lowercase();

        let mut score = tier_points(video.duration_seconds, &DURATION_POINTS);
        score += tier_points(video.view_count.unwrap_or(0), &VIEW_POINTS);
        if self.is_official_channel(&video.channel_title) {
            score += OFFICIAL_POINTS;
        }
        score += self.matched_tags(&title).map(|t| t.points).sum::<i32>();
        if video.date_event.is_some() {
            score += DATED_POINTS;
        }

        score.clamp(0, MAX_SCORE)
    }

    fn is_complete(&self, video: &EnrichedVideo, content_type: ContentType) -> bool {
        let min = match content_type {
            ContentType::Concert => self.min_concert_secs,
            ContentType::Interview => self.min_interview_secs,
        };
        video.duration_seconds >= min
    }

    fn tags(&self, video: &EnrichedVideo) -> Vec<String> {
        let title = video.title.to_lowercase();
        let mut tags = Vec::new();
        if self.is_official_channel(&video.channel_title) {
            tags.push(OFFICIAL_TAG.to_string());
        }
        tags.extend(self.matched_tags(&title).map(|t| t.tag.clone()));
        tags
    }

    fn is_official_channel(&self, channel_title: &str) -> bool {
        let channel = channel_title.trim().to_lowercase();
        !channel.is_empty() && self.official_channels.iter().any(|c| *c == channel)
    }
}
