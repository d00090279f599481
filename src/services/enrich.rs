// src/services/enrich.rs

//! Enrichment merger.
//!
//! Fuses detail records into candidates and resolves the canonical event
//! date. A missing detail record is not an error: the candidate's own
//! fields are used instead.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Candidate, DetailRecord, EnrichedVideo};
use crate::services::SearchClient;
use crate::utils::{parse_duration, parse_timestamp, resolve_event_date};

/// Service that turns candidates into enriched records.
pub struct Enricher {
    search: Arc<SearchClient>,
}

impl Enricher {
    pub fn new(search: Arc<SearchClient>) -> Self {
        Self { search }
    }

    /// Enrich one candidate with a single-id detail lookup.
    pub async fn enrich(&self, candidate: Candidate) -> EnrichedVideo {
        let ids = [candidate.external_id.clone()];
        let detail = self
            .search
            .fetch_details(&ids)
            .await
            .into_iter()
            .find(|d| d.external_id == candidate.external_id);
        merge(candidate, detail)
    }

    /// Enrich many candidates with batched detail lookups.
    ///
    /// Output order follows input order, one record per candidate.
    pub async fn enrich_all(&self, candidates: Vec<Candidate>) -> Vec<EnrichedVideo> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let ids: Vec<String> = candidates.iter().map(|c| c.external_id.clone()).collect();
        let details: HashMap<String, DetailRecord> = self
            .search
            .fetch_details(&ids)
            .await
            .into_iter()
            .map(|d| (d.external_id.clone(), d))
            .collect();

        if details.len() < candidates.len() {
            log::debug!(
                "Details found for {}/{} candidates",
                details.len(),
                candidates.len()
            );
        }

        candidates
            .into_iter()
            .map(|candidate| {
                // A repeated id gets the same detail record each time.
                let detail = details.get(&candidate.external_id).cloned();
                merge(candidate, detail)
            })
            .collect()
    }
}

/// Merge a candidate with its (optional) detail record.
///
/// Detail fields are authoritative; the candidate's publish timestamp is
/// the fallback.
pub fn merge(candidate: Candidate, detail: Option<DetailRecord>) -> EnrichedVideo {
    let candidate_published = candidate.published_at.clone();
    let mut video = EnrichedVideo::from_candidate(candidate);

    let raw_published = match detail {
        Some(detail) => {
            video.duration_seconds = parse_duration(&detail.duration);
            video.duration = Some(detail.duration).filter(|d| !d.is_empty());
            video.view_count = detail.view_count;
            if !detail.channel_id.is_empty() {
                video.channel_id = detail.channel_id;
            }
            if !detail.channel_title.is_empty() {
                video.channel_title = detail.channel_title;
            }
            detail
                .published_at
                .filter(|p| !p.is_empty())
                .unwrap_or(candidate_published)
        }
        None => candidate_published,
    };

    video.published_at = parse_timestamp(&raw_published);
    video.date_event = resolve_event_date(&video.title, video.published_at.as_ref());
    video
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::error::{AppError, Result};
    use crate::models::YouTubeConfig;
    use crate::services::youtube::{SearchPage, SearchRequest, VideoApi};

    fn moscow() -> Candidate {
        Candidate {
            external_id: "abc123".to_string(),
            title: "Metallica - Live in Moscow 1991".to_string(),
            channel_title: "Metallica".to_string(),
            published_at: "2011-04-02T10:00:00Z".to_string(),
            ..Candidate::default()
        }
    }

    fn moscow_detail() -> DetailRecord {
        DetailRecord {
            external_id: "abc123".to_string(),
            duration: "PT2H10M0S".to_string(),
            view_count: Some(500_000),
            published_at: Some("1991-09-28T00:00:00Z".to_string()),
            channel_id: "UC1".to_string(),
            channel_title: "Metallica".to_string(),
        }
    }

    struct DetailApi {
        fail: bool,
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl VideoApi for DetailApi {
        fn has_credential(&self) -> bool {
            true
        }

        async fn search_page(&self, _: &SearchRequest, _: Option<&str>) -> Result<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn video_details(&self, ids: &[String]) -> Result<Vec<DetailRecord>> {
            self.calls.lock().unwrap().push(ids.to_vec());
            if self.fail {
                return Err(AppError::upstream("videos.list", "HTTP 400"));
            }
            Ok(ids
                .iter()
                .filter(|id| id.as_str() == "abc123")
                .map(|_| moscow_detail())
                .collect())
        }
    }

    fn enricher(fail: bool) -> (Enricher, Arc<DetailApi>) {
        let api = Arc::new(DetailApi {
            fail,
            calls: Mutex::new(Vec::new()),
        });
        let search = SearchClient::new(api.clone(), YouTubeConfig::default());
        (Enricher::new(Arc::new(search)), api)
    }

    #[test]
    fn test_merge_detail_is_authoritative() {
        let video = merge(moscow(), Some(moscow_detail()));
        assert_eq!(video.duration_seconds, 7800);
        assert_eq!(video.view_count, Some(500_000));
        assert_eq!(video.channel_id, "UC1");
        assert_eq!(
            video.published_at.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(1991, 9, 28).unwrap()
        );
        assert_eq!(video.date_event, NaiveDate::from_ymd_opt(1991, 9, 28));
    }

    #[test]
    fn test_merge_without_detail_uses_candidate() {
        let video = merge(moscow(), None);
        assert_eq!(video.duration_seconds, 0);
        assert_eq!(video.view_count, None);
        assert_eq!(
            video.published_at.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2011, 4, 2).unwrap()
        );
        // Re-upload year differs from the title year.
        assert_eq!(video.date_event, NaiveDate::from_ymd_opt(1991, 1, 1));
    }

    #[test]
    fn test_merge_without_any_date() {
        let candidate = Candidate {
            external_id: "x".to_string(),
            title: "Metallica full show".to_string(),
            published_at: "garbage".to_string(),
            ..Candidate::default()
        };
        let video = merge(candidate, None);
        assert!(video.published_at.is_none());
        assert!(video.date_event.is_none());
    }

    #[tokio::test]
    async fn test_enrich_single_id() {
        let (enricher, api) = enricher(false);
        let video = enricher.enrich(moscow()).await;
        assert_eq!(video.duration_seconds, 7800);
        assert_eq!(api.calls.lock().unwrap().clone(), vec![vec!["abc123".to_string()]]);
    }

    #[tokio::test]
    async fn test_enrich_all_batches_and_keeps_order() {
        let (enricher, api) = enricher(false);
        let other = Candidate {
            external_id: "zzz".to_string(),
            title: "Metallica Seattle 1989".to_string(),
            ..Candidate::default()
        };
        let videos = enricher.enrich_all(vec![other, moscow()]).await;

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].external_id, "zzz");
        assert_eq!(videos[0].duration_seconds, 0);
        assert_eq!(videos[1].duration_seconds, 7800);
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detail_failure_degrades_to_candidate() {
        let (enricher, _) = enricher(true);
        let video = enricher.enrich(moscow()).await;
        assert_eq!(video.external_id, "abc123");
        assert_eq!(video.duration_seconds, 0);
        assert!(video.published_at.is_some());
    }
}
