// src/pipeline/ingest.rs

//! Ingestion entry point: crawl, then persist in one batch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, QueryCategory, QuerySpec, SyncRecord};
use crate::pipeline::crawl::{CrawlOrchestrator, QueryReport, select_plan};
use crate::services::{VideoApi, YouTubeApi};
use crate::storage::VideoStore;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub sync_type: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records handed to storage
    pub kept: usize,
    /// Rows that did not exist before
    pub added: usize,
    /// Distinct ids that already existed and were overwritten
    pub refreshed: usize,
    pub failed_queries: usize,
    pub queries: Vec<QueryReport>,
}

/// Crawl `plan` and upsert the result into `store`.
///
/// Every run leaves a sync record. When the crawl or the write fails, a
/// failed record is attempted before the error is returned.
pub async fn ingest(
    orchestrator: &mut CrawlOrchestrator,
    store: &dyn VideoStore,
    plan: &[QuerySpec],
    sync_type: &str,
    cancel: &CancellationToken,
) -> Result<IngestReport> {
    let started_at = Utc::now();

    let outcome = match orchestrator.run(plan, cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            record_failure(store, sync_type, started_at, &e).await;
            return Err(e);
        }
    };

    let kept = outcome.videos.len();
    let distinct = outcome
        .videos
        .iter()
        .map(|v| v.external_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let added = match store.upsert_batch(&outcome.videos).await {
        Ok(added) => added,
        Err(e) => {
            log::error!("Failed to store {} videos: {}", kept, e);
            record_failure(store, sync_type, started_at, &e).await;
            return Err(e);
        }
    };

    let record = SyncRecord::success(sync_type, started_at, added);
    if let Err(e) = store.record_sync(&record).await {
        log::warn!("Failed to record sync status: {}", e);
    }

    let report = IngestReport {
        sync_type: sync_type.to_string(),
        started_at,
        finished_at: record.finished_at,
        kept,
        added,
        refreshed: distinct.saturating_sub(added),
        failed_queries: outcome.failed_queries(),
        queries: outcome.queries,
    };
    log::info!(
        "Ingestion complete: {} kept, {} added, {} refreshed, {} failed queries",
        report.kept,
        report.added,
        report.refreshed,
        report.failed_queries
    );
    Ok(report)
}

async fn record_failure(
    store: &dyn VideoStore,
    sync_type: &str,
    started_at: DateTime<Utc>,
    error: &AppError,
) {
    let record = SyncRecord::failed(sync_type, started_at, error);
    if let Err(e) = store.record_sync(&record).await {
        log::warn!("Failed to record sync failure: {}", e);
    }
}

/// Run a full ingestion against the YouTube Data API.
///
/// Fails with [`AppError::MissingCredential`] when no API key is set;
/// `category` restricts the plan to one kind of query.
pub async fn run_ingestion(
    config: &Config,
    store: &dyn VideoStore,
    category: Option<QueryCategory>,
    cancel: &CancellationToken,
) -> Result<IngestReport> {
    let api = Arc::new(YouTubeApi::new(config.youtube.clone()));
    run_ingestion_with(config, api, store, category, cancel).await
}

/// [`run_ingestion`] over an arbitrary transport.
pub async fn run_ingestion_with(
    config: &Config,
    api: Arc<dyn VideoApi>,
    store: &dyn VideoStore,
    category: Option<QueryCategory>,
    cancel: &CancellationToken,
) -> Result<IngestReport> {
    if !api.has_credential() {
        return Err(AppError::MissingCredential);
    }

    let plan = select_plan(&config.queries, category);
    let sync_type = category.map_or_else(|| "full".to_string(), |c| c.to_string());

    let mut orchestrator = CrawlOrchestrator::from_config(config, api);
    ingest(&mut orchestrator, store, &plan, &sync_type, cancel).await
}
