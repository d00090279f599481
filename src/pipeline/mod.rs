//! Pipeline entry points for crawler operations.
//!
//! - `CrawlOrchestrator`: Walk the query plan and tag surviving videos
//! - `run_ingestion`: Crawl, then upsert the result into a `VideoStore`

pub mod crawl;
pub mod ingest;

pub use crawl::{CrawlOrchestrator, CrawlOutcome, CrawlSettings, CrawlState, QueryReport, select_plan};
pub use ingest::{IngestReport, ingest, run_ingestion, run_ingestion_with};
