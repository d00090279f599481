// src/services/search.rs

//! Search client service.
//!
//! Wraps a `VideoApi` with pagination, id batching and bounded retry, and
//! turns upstream failures into empty results so a bad query never stops
//! the crawl.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Candidate, DetailRecord, SearchOrder, UPSTREAM_PAGE_LIMIT, YouTubeConfig};
use crate::services::youtube::{SearchRequest, VideoApi};

/// Service for keyword search and detail lookup against the upstream.
pub struct SearchClient {
    api: Arc<dyn VideoApi>,
    config: YouTubeConfig,
    detail_concurrency: usize,
}

impl SearchClient {
    /// Create a search client over the given transport.
    pub fn new(api: Arc<dyn VideoApi>, config: YouTubeConfig) -> Self {
        Self {
            api,
            config,
            detail_concurrency: 1,
        }
    }

    /// Allow this many detail batches in flight at once.
    pub fn with_detail_concurrency(mut self, concurrency: usize) -> Self {
        self.detail_concurrency = concurrency.max(1);
        self
    }

    /// Search for long-form videos. Never fails: any problem yields an empty list.
    pub async fn search(&self, query: &str, max_results: u32, order: SearchOrder) -> Vec<Candidate> {
        self.try_search(query, max_results, order)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Search failed for '{}': {}", query, e);
                Vec::new()
            })
    }

    /// Search, reporting a failure of the first page as an error.
    ///
    /// `max_results` is the page size (clamped to 1..=50); up to `max_pages`
    /// pages are followed. A missing credential is not an error here: it
    /// yields no results. Failures on later pages keep what was already
    /// collected.
    pub async fn try_search(
        &self,
        query: &str,
        max_results: u32,
        order: SearchOrder,
    ) -> Result<Vec<Candidate>> {
        if !self.api.has_credential() {
            log::debug!("No API credential configured, skipping search for '{}'", query);
            return Ok(Vec::new());
        }

        let per_page = max_results.clamp(1, UPSTREAM_PAGE_LIMIT);
        let max_pages = self.config.max_pages.max(1);
        let wanted = per_page as usize * max_pages as usize;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..max_pages {
            let remaining = wanted.saturating_sub(candidates.len());
            if remaining == 0 {
                break;
            }
            let request = SearchRequest {
                query: query.to_string(),
                max_results: per_page.min(remaining as u32),
                order,
            };

            let result = self
                .with_retry("search.list", || {
                    self.api.search_page(&request, page_token.as_deref())
                })
                .await;

            let result = match result {
                Ok(result) => result,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    log::warn!("Search page {} failed for '{}': {}", page + 1, query, e);
                    break;
                }
            };

            for candidate in result.candidates {
                if candidates.len() < wanted && seen.insert(candidate.external_id.clone()) {
                    candidates.push(candidate);
                }
            }

            match result.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Search '{}' returned {} candidates", query, candidates.len());
        Ok(candidates)
    }

    /// Look up detail records, splitting ids into upstream-sized batches.
    ///
    /// Batches that fail are logged and skipped; the rest are returned in
    /// batch order.
    pub async fn fetch_details(&self, ids: &[String]) -> Vec<DetailRecord> {
        if ids.is_empty() || !self.api.has_credential() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let unique: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let batches: Vec<Vec<String>> = unique
            .chunks(self.config.batch_size())
            .map(<[String]>::to_vec)
            .collect();

        let mut results = stream::iter(batches)
            .map(|batch| async move {
                let result = self
                    .with_retry("videos.list", || self.api.video_details(&batch))
                    .await;
                (batch.len(), result)
            })
            .buffered(self.detail_concurrency);

        let mut details = Vec::new();
        while let Some((size, result)) = results.next().await {
            match result {
                Ok(records) => details.extend(records),
                Err(e) => log::warn!("Detail lookup for {} ids failed: {}", size, e),
            }
        }
        details
    }

    /// Run an upstream call, retrying transient failures with doubling backoff.
    async fn with_retry<T, F, Fut>(&self, context: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut delay = Duration::from_millis(self.config.retry_backoff_ms);
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        context,
                        e,
                        attempt,
                        self.config.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::AppError;
    use crate::services::youtube::SearchPage;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            external_id: id.to_string(),
            title: format!("Metallica {id}"),
            ..Candidate::default()
        }
    }

    /// Serves two pages, can fail a set number of times first.
    ///
    /// With `endless` set, every page is full and carries a next token.
    struct PagedApi {
        credential: bool,
        endless: bool,
        transient_failures: AtomicUsize,
        hard_failure: bool,
        search_calls: AtomicUsize,
        detail_batches: Mutex<Vec<usize>>,
    }

    impl PagedApi {
        fn new() -> Self {
            Self {
                credential: true,
                endless: false,
                transient_failures: AtomicUsize::new(0),
                hard_failure: false,
                search_calls: AtomicUsize::new(0),
                detail_batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VideoApi for PagedApi {
        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn search_page(
            &self,
            request: &SearchRequest,
            page_token: Option<&str>,
        ) -> Result<SearchPage> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self.hard_failure {
                return Err(AppError::upstream("search.list", "HTTP 403: quota"));
            }
            if self
                .transient_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AppError::upstream_transient("search.list", "HTTP 503"));
            }
            assert!((1..=50).contains(&request.max_results));
            if self.endless {
                let page = page_token.unwrap_or("p1");
                return Ok(SearchPage {
                    candidates: (0..request.max_results)
                        .map(|i| candidate(&format!("{page}-{i}")))
                        .collect(),
                    next_page_token: Some(format!("{page}+")),
                });
            }
            Ok(match page_token {
                None => SearchPage {
                    candidates: vec![candidate("a"), candidate("b")],
                    next_page_token: Some("p2".to_string()),
                },
                Some(_) => SearchPage {
                    candidates: vec![candidate("b"), candidate("c")],
                    next_page_token: None,
                },
            })
        }

        async fn video_details(&self, ids: &[String]) -> Result<Vec<DetailRecord>> {
            self.detail_batches.lock().unwrap().push(ids.len());
            Ok(ids
                .iter()
                .map(|id| DetailRecord {
                    external_id: id.clone(),
                    duration: "PT1H".to_string(),
                    ..DetailRecord::default()
                })
                .collect())
        }
    }

    fn config(max_pages: u32) -> YouTubeConfig {
        YouTubeConfig {
            max_pages,
            retry_backoff_ms: 1,
            ..YouTubeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_single_page_by_default() {
        let client = SearchClient::new(Arc::new(PagedApi::new()), config(1));
        let results = client.search("q", 50, SearchOrder::Relevance).await;
        let ids: Vec<_> = results.iter().map(|c| c.external_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_pagination_dedups_ids() {
        let client = SearchClient::new(Arc::new(PagedApi::new()), config(3));
        let results = client.search("q", 50, SearchOrder::Relevance).await;
        let ids: Vec<_> = results.iter().map(|c| c.external_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_full_pages_are_followed_up_to_max_pages() {
        let mut api = PagedApi::new();
        api.endless = true;
        let api = Arc::new(api);
        let client = SearchClient::new(api.clone(), config(3));

        let results = client.search("q", 50, SearchOrder::Relevance).await;

        assert_eq!(results.len(), 150);
        assert_eq!(api.search_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_page_size_caps_each_page() {
        let client = SearchClient::new(Arc::new(PagedApi::new()), config(1));
        let results = client.search("q", 1, SearchOrder::Relevance).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_max_results_is_clamped() {
        let mut api = PagedApi::new();
        api.endless = true;
        let api = Arc::new(api);
        let client = SearchClient::new(api.clone(), config(2));

        let results = client.search("q", 0, SearchOrder::Relevance).await;

        assert_eq!(results.len(), 2);
        assert_eq!(api.search_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_yields_empty() {
        let mut api = PagedApi::new();
        api.credential = false;
        let api = Arc::new(api);
        let client = SearchClient::new(api.clone(), config(1));
        assert!(client.try_search("q", 50, SearchOrder::Relevance).await.unwrap().is_empty());
        assert!(client.fetch_details(&["a".to_string()]).await.is_empty());
        assert_eq!(api.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let api = PagedApi::new();
        api.transient_failures.store(2, Ordering::SeqCst);
        let api = Arc::new(api);
        let client = SearchClient::new(api.clone(), config(1));
        let results = client.search("q", 50, SearchOrder::Relevance).await;
        assert_eq!(results.len(), 2);
        assert_eq!(api.search_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_hard_failure_is_empty_and_not_retried() {
        let mut api = PagedApi::new();
        api.hard_failure = true;
        let api = Arc::new(api);
        let client = SearchClient::new(api.clone(), config(1));

        assert!(client.search("q", 50, SearchOrder::Relevance).await.is_empty());
        assert!(client.try_search("q", 50, SearchOrder::Relevance).await.is_err());
        assert_eq!(api.search_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_details_are_batched() {
        let api = Arc::new(PagedApi::new());
        let mut cfg = config(1);
        cfg.detail_batch_size = 2;
        let client = SearchClient::new(api.clone(), cfg).with_detail_concurrency(2);

        let ids: Vec<String> = ["a", "b", "c", "a", "d", "e"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let details = client.fetch_details(&ids).await;

        assert_eq!(details.len(), 5);
        let mut batches = api.detail_batches.lock().unwrap().clone();
        batches.sort();
        assert_eq!(batches, vec![1, 2, 2]);
    }
}
