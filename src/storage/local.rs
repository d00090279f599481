//! Local filesystem storage implementation.
//!
//! Keeps the whole archive in two JSON documents under one directory.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── videos.json          # Stored videos, sorted by external id
//! ├── videos.lock          # Advisory lock for videos.json
//! ├── sync_history.json    # Ingestion runs, oldest first
//! └── sync_history.lock    # Advisory lock for sync_history.json
//! ```
//!
//! Writes go to a temp file and are renamed into place, so a crash never
//! leaves a half-written document. Read-modify-write cycles hold an
//! exclusive file lock, so separate processes sharing a directory cannot
//! drop each other's rows.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs4::fs_std::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{EnrichedVideo, SyncRecord};
use crate::storage::{StoredVideo, VideoFilter, VideoStore, apply_upsert, distinct_tours, select};

const VIDEOS_KEY: &str = "videos.json";
const HISTORY_KEY: &str = "sync_history.json";
const VIDEOS_LOCK: &str = "videos.lock";
const HISTORY_LOCK: &str = "sync_history.lock";

/// Sync records kept on disk; older entries are dropped.
const MAX_HISTORY: usize = 500;

/// Local filesystem storage backend.
pub struct LocalStore {
    root_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Block until this process holds the exclusive lock file `key`.
    ///
    /// The lock is released when the returned handle is dropped.
    async fn lock_file(&self, key: &str) -> Result<std::fs::File> {
        tokio::fs::create_dir_all(&self.root_dir).await?;
        let path = self.path(key);
        tokio::task::spawn_blocking(move || -> Result<std::fs::File> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| AppError::storage(format!("lock task failed: {e}")))?
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read JSON data, returning None if the file doesn't exist.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::storage(format!("{} is corrupt: {}", path.display(), e)))
    }

    async fn load_videos(&self) -> Result<HashMap<String, StoredVideo>> {
        let rows: Vec<StoredVideo> = self.read_json(VIDEOS_KEY).await?.unwrap_or_default();
        Ok(rows
            .into_iter()
            .map(|r| (r.video.external_id.clone(), r))
            .collect())
    }

    async fn save_videos(&self, rows: HashMap<String, StoredVideo>) -> Result<()> {
        let mut rows: Vec<StoredVideo> = rows.into_values().collect();
        rows.sort_by(|a, b| a.video.external_id.cmp(&b.video.external_id));
        self.write_json(VIDEOS_KEY, &rows).await
    }

    async fn load_history(&self) -> Result<Vec<SyncRecord>> {
        Ok(self.read_json(HISTORY_KEY).await?.unwrap_or_default())
    }
}

#[async_trait]
impl VideoStore for LocalStore {
    async fn upsert_batch(&self, videos: &[EnrichedVideo]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let _file_lock = self.lock_file(VIDEOS_LOCK).await?;

        let mut rows = self.load_videos().await?;
        let added = apply_upsert(&mut rows, videos, Utc::now());
        let total = rows.len();
        self.save_videos(rows).await?;

        log::info!(
            "Stored {} videos in {} ({} new, {} total)",
            videos.len(),
            self.path(VIDEOS_KEY).display(),
            added,
            total
        );
        Ok(added)
    }

    async fn count(&self, filter: &VideoFilter) -> Result<usize> {
        let rows = self.load_videos().await?;
        Ok(rows.values().filter(|r| filter.matches(&r.video)).count())
    }

    async fn list(
        &self,
        filter: &VideoFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StoredVideo>> {
        let rows = self.load_videos().await?;
        Ok(select(rows.values(), filter, offset, limit))
    }

    async fn get(&self, external_id: &str) -> Result<Option<StoredVideo>> {
        Ok(self.load_videos().await?.remove(external_id))
    }

    async fn tour_names(&self) -> Result<Vec<String>> {
        let rows = self.load_videos().await?;
        Ok(distinct_tours(rows.values()))
    }

    async fn record_sync(&self, record: &SyncRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let _file_lock = self.lock_file(HISTORY_LOCK).await?;

        let mut history = self.load_history().await?;
        history.push(record.clone());
        if history.len() > MAX_HISTORY {
            let excess = history.len() - MAX_HISTORY;
            history.drain(..excess);
        }
        self.write_json(HISTORY_KEY, &history).await
    }

    async fn last_sync(&self) -> Result<Option<SyncRecord>> {
        Ok(self.load_history().await?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SyncState;
    use crate::storage::tests::video;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upsert_persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        let batch = vec![video("b", Some((1991, 9, 28))), video("a", None)];

        let store = LocalStore::new(tmp.path());
        assert_eq!(store.upsert_batch(&batch).await.unwrap(), 2);

        let reopened = LocalStore::new(tmp.path());
        assert_eq!(reopened.upsert_batch(&batch).await.unwrap(), 0);
        assert_eq!(reopened.count(&VideoFilter::default()).await.unwrap(), 2);

        let listed = reopened.list(&VideoFilter::default(), 0, 10).await.unwrap();
        assert_eq!(listed[0].video.external_id, "b");
        assert!(listed[0].updated_at >= listed[0].created_at);
    }

    #[tokio::test]
    async fn test_empty_store_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path().join("nested"));

        assert_eq!(store.count(&VideoFilter::default()).await.unwrap(), 0);
        assert!(store.last_sync().await.unwrap().is_none());
        assert!(store.tour_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store.upsert_batch(&[video("a", None)]).await.unwrap();

        assert!(tmp.path().join(VIDEOS_KEY).exists());
        assert!(!tmp.path().join("videos.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(VIDEOS_KEY), b"{ not json").unwrap();
        let store = LocalStore::new(tmp.path());

        let result = store.upsert_batch(&[video("a", None)]).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_stores_keep_every_row() {
        let tmp = TempDir::new().unwrap();
        let first = LocalStore::new(tmp.path());
        let second = LocalStore::new(tmp.path());
        first.upsert_batch(&[video("seed", None)]).await.unwrap();

        let left: Vec<_> = (0..20).map(|i| video(&format!("left-{i}"), None)).collect();
        let right: Vec<_> = (0..20).map(|i| video(&format!("right-{i}"), None)).collect();
        let (a, b) = tokio::join!(
            async {
                let mut added = 0;
                for v in &left {
                    added += first.upsert_batch(std::slice::from_ref(v)).await.unwrap();
                }
                added
            },
            async {
                let mut added = 0;
                for v in &right {
                    added += second.upsert_batch(std::slice::from_ref(v)).await.unwrap();
                }
                added
            }
        );

        assert_eq!((a, b), (20, 20));
        let reopened = LocalStore::new(tmp.path());
        assert_eq!(reopened.count(&VideoFilter::default()).await.unwrap(), 41);
    }

    #[tokio::test]
    async fn test_sync_history_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store
            .record_sync(&SyncRecord::success("full", Utc::now(), 7))
            .await
            .unwrap();
        let last = store.last_sync().await.unwrap().unwrap();
        assert_eq!(last.status, SyncState::Success);
        assert_eq!(last.videos_added, 7);
    }
}
