// src/pipeline/crawl.rs

//! Crawl orchestration.
//!
//! Walks the query plan one query at a time: search, pre-filter, enrich,
//! tag, then the completeness gate. A failed query counts as zero results
//! and the crawl moves on. Nothing here writes to storage.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Config, EnrichedVideo, QueryCategory, QuerySpec, SearchOrder};
use crate::services::{Capabilities, ContentFilter, Enricher, SearchClient, VideoApi};

/// Lifecycle of one orchestrator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlState::Idle => "idle",
            CrawlState::Running => "running",
            CrawlState::Completed => "completed",
            CrawlState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What happened to one query of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub category: QueryCategory,
    /// Text actually sent upstream
    pub search_text: String,
    pub candidates: usize,
    pub filtered_out: usize,
    pub incomplete: usize,
    pub kept: usize,
    /// Upstream error text when the search itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryReport {
    fn new(spec: &QuerySpec, category: QueryCategory, search_text: String) -> Self {
        Self {
            query: spec.query.clone(),
            category,
            search_text,
            candidates: 0,
            filtered_out: 0,
            incomplete: 0,
            kept: 0,
            error: None,
        }
    }
}

/// Result of a finished crawl pass.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Records that passed every gate, in plan order
    pub videos: Vec<EnrichedVideo>,
    pub queries: Vec<QueryReport>,
}

impl CrawlOutcome {
    pub fn failed_queries(&self) -> usize {
        self.queries.iter().filter(|q| q.error.is_some()).count()
    }
}

/// Per-crawl knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub artist: String,
    pub query_cooldown: Duration,
    /// Page size passed to each search
    pub max_results: u32,
    pub order: SearchOrder,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            artist: config.crawler.artist.clone(),
            query_cooldown: Duration::from_millis(config.crawler.query_cooldown_ms),
            max_results: config.youtube.page_size(),
            order: config.youtube.order,
        }
    }
}

/// Keep only the plan entries of one category; `None` keeps everything.
pub fn select_plan(plan: &[QuerySpec], category: Option<QueryCategory>) -> Vec<QuerySpec> {
    plan.iter()
        .filter(|spec| category.is_none_or(|c| spec.resolved_category() == c))
        .cloned()
        .collect()
}

/// Drives one crawl pass over a query plan.
pub struct CrawlOrchestrator {
    search: Arc<SearchClient>,
    enricher: Enricher,
    filter: ContentFilter,
    capabilities: Capabilities,
    settings: CrawlSettings,
    state: CrawlState,
}

impl CrawlOrchestrator {
    pub fn new(
        search: Arc<SearchClient>,
        filter: ContentFilter,
        capabilities: Capabilities,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            enricher: Enricher::new(Arc::clone(&search)),
            search,
            filter,
            capabilities,
            settings,
            state: CrawlState::Idle,
        }
    }

    /// Wire the default services and strategies over the given transport.
    pub fn from_config(config: &Config, api: Arc<dyn VideoApi>) -> Self {
        let search = SearchClient::new(api, config.youtube.clone())
            .with_detail_concurrency(config.crawler.detail_concurrency);
        Self::new(
            Arc::new(search),
            ContentFilter::from_config(&config.filter),
            Capabilities::from_config(config),
            CrawlSettings::from_config(config),
        )
    }

    /// Swap the tagging strategies.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Run the plan once. An orchestrator cannot be reused.
    ///
    /// Cancellation is honored between queries and at every upstream call
    /// or cooldown; a cancelled crawl fails with [`AppError::Cancelled`] and
    /// returns none of its partial results.
    pub async fn run(
        &mut self,
        plan: &[QuerySpec],
        cancel: &CancellationToken,
    ) -> Result<CrawlOutcome> {
        if self.state != CrawlState::Idle {
            return Err(AppError::InvalidState(format!(
                "crawl is already {}",
                self.state
            )));
        }

        self.state = CrawlState::Running;
        let result = self.crawl(plan, cancel).await;
        self.state = match &result {
            Ok(_) => CrawlState::Completed,
            Err(_) => CrawlState::Failed,
        };
        result
    }

    async fn crawl(&self, plan: &[QuerySpec], cancel: &CancellationToken) -> Result<CrawlOutcome> {
        log::info!("Crawl starting with {} queries", plan.len());
        let mut outcome = CrawlOutcome::default();

        for (index, spec) in plan.iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("Crawl cancelled before query {}/{}", index + 1, plan.len());
                return Err(AppError::Cancelled);
            }

            let (videos, report) = self.run_query(spec, cancel).await?;
            log::info!(
                "[{}/{}] '{}': {} candidates, {} filtered, {} incomplete, {} kept",
                index + 1,
                plan.len(),
                report.query,
                report.candidates,
                report.filtered_out,
                report.incomplete,
                report.kept
            );
            outcome.videos.extend(videos);
            outcome.queries.push(report);

            let is_last = index + 1 == plan.len();
            if !is_last && !self.settings.query_cooldown.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(AppError::Cancelled),
                    _ = tokio::time::sleep(self.settings.query_cooldown) => {}
                }
            }
        }

        log::info!(
            "Crawl finished: {} videos kept, {} failed queries",
            outcome.videos.len(),
            outcome.failed_queries()
        );
        Ok(outcome)
    }

    async fn run_query(
        &self,
        spec: &QuerySpec,
        cancel: &CancellationToken,
    ) -> Result<(Vec<EnrichedVideo>, QueryReport)> {
        let category = spec.resolved_category();
        let search_text = spec.search_text(&self.settings.artist);
        log::info!("Searching: {} ({})", spec.query, category);

        let found = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            found = self.search.try_search(&search_text, self.settings.max_results, self.settings.order) => found,
        };

        let mut report = QueryReport::new(spec, category, search_text);
        let candidates = found.unwrap_or_else(|e| {
            log::warn!("Search failed for '{}': {}", spec.query, e);
            report.error = Some(e.to_string());
            Vec::new()
        });
        report.candidates = candidates.len();

        let admitted: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| self.filter.admit(&c.title, &c.description, &c.channel_title))
            .collect();
        report.filtered_out = report.candidates - admitted.len();

        if admitted.is_empty() {
            return Ok((Vec::new(), report));
        }

        let enriched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            enriched = self.enricher.enrich_all(admitted) => enriched,
        };

        let mut kept = Vec::with_capacity(enriched.len());
        for video in enriched {
            match self.tag(video, &spec.query) {
                Some(video) => kept.push(video),
                None => report.incomplete += 1,
            }
        }
        report.kept = kept.len();

        Ok((kept, report))
    }

    /// Apply the strategies; `None` when the completeness gate rejects.
    fn tag(&self, mut video: EnrichedVideo, query: &str) -> Option<EnrichedVideo> {
        let caps = &self.capabilities;

        let content_type = caps.classifier.classify(&video);
        video.content_type = content_type;
        video.quality_score = caps.scorer.score(&video);
        video.is_complete = caps.scorer.is_complete(&video, content_type);
        if !video.is_complete {
            log::debug!(
                "Dropping incomplete {} '{}' ({}s)",
                content_type,
                video.title,
                video.duration_seconds
            );
            return None;
        }

        video.quality_tags = caps.scorer.tags(&video);
        video.tour_name = caps.tours.detect_tour(&video.title);
        video.is_official = caps.scorer.is_official_channel(&video.channel_title);
        video.search_query = query.to_string();
        Some(video)
    }
}
