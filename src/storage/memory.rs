//! In-process storage, used by tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{EnrichedVideo, SyncRecord};
use crate::storage::{StoredVideo, VideoFilter, VideoStore, apply_upsert, distinct_tours, select};

#[derive(Debug, Default)]
struct State {
    videos: HashMap<String, StoredVideo>,
    history: Vec<SyncRecord>,
}

/// Volatile `VideoStore` backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full sync history, oldest first.
    pub async fn history(&self) -> Vec<SyncRecord> {
        self.state.read().await.history.clone()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn upsert_batch(&self, videos: &[EnrichedVideo]) -> Result<usize> {
        let mut state = self.state.write().await;
        Ok(apply_upsert(&mut state.videos, videos, Utc::now()))
    }

    async fn count(&self, filter: &VideoFilter) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state.videos.values().filter(|r| filter.matches(&r.video)).count())
    }

    async fn list(
        &self,
        filter: &VideoFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StoredVideo>> {
        let state = self.state.read().await;
        Ok(select(state.videos.values(), filter, offset, limit))
    }

    async fn get(&self, external_id: &str) -> Result<Option<StoredVideo>> {
        Ok(self.state.read().await.videos.get(external_id).cloned())
    }

    async fn tour_names(&self) -> Result<Vec<String>> {
        Ok(distinct_tours(self.state.read().await.videos.values()))
    }

    async fn record_sync(&self, record: &SyncRecord) -> Result<()> {
        self.state.write().await.history.push(record.clone());
        Ok(())
    }

    async fn last_sync(&self) -> Result<Option<SyncRecord>> {
        Ok(self.state.read().await.history.last().cloned())
    }
}
