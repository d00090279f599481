//! Ingestion run history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final state of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Success,
    Failed,
}

/// One row of sync history, written after every ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub sync_type: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub videos_added: usize,
    pub status: SyncState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SyncRecord {
    pub fn success(
        sync_type: impl Into<String>,
        started_at: DateTime<Utc>,
        videos_added: usize,
    ) -> Self {
        Self {
            sync_type: sync_type.into(),
            started_at,
            finished_at: Utc::now(),
            videos_added,
            status: SyncState::Success,
            error_message: None,
        }
    }

    pub fn failed(
        sync_type: impl Into<String>,
        started_at: DateTime<Utc>,
        error: impl ToString,
    ) -> Self {
        Self {
            sync_type: sync_type.into(),
            started_at,
            finished_at: Utc::now(),
            videos_added: 0,
            status: SyncState::Failed,
            error_message: Some(error.to_string()),
        }
    }
}
