// src/services/youtube.rs

//! YouTube Data API v3 transport.
//!
//! `VideoApi` is the seam between the pipeline and the network: the real
//! implementation talks to `search.list` and `videos.list`, tests plug in a
//! fake. Implementations surface every failure as an error; turning those
//! into empty results is the search client's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Candidate, DetailRecord, SearchOrder, YouTubeConfig};
use crate::utils::text::decode_entities;

/// Parameters for one keyword search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    pub order: SearchOrder,
}

/// One page of search hits.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    pub next_page_token: Option<String>,
}

/// Upstream operations the pipeline depends on.
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Whether a credential is configured at all.
    fn has_credential(&self) -> bool;

    /// Fetch one page of long-form search results.
    async fn search_page(&self, request: &SearchRequest, page_token: Option<&str>)
    -> Result<SearchPage>;

    /// Look up details for at most one upstream batch of ids.
    async fn video_details(&self, ids: &[String]) -> Result<Vec<DetailRecord>>;
}

/// `VideoApi` backed by the public YouTube Data API.
///
/// The HTTP client is built on first use and reused for the lifetime of
/// this value.
pub struct YouTubeApi {
    config: YouTubeConfig,
    http: OnceCell<Client>,
}

impl YouTubeApi {
    pub fn new(config: YouTubeConfig) -> Self {
        Self {
            config,
            http: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client> {
        self.http
            .get_or_try_init(|| async {
                log::debug!("Initializing YouTube HTTP client");
                let client = Client::builder()
                    .user_agent(&self.config.user_agent)
                    .timeout(Duration::from_secs(self.config.timeout_secs))
                    .build()?;
                Ok::<Client, AppError>(client)
            })
            .await
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{name}"))?)
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AppError::MissingCredential)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        context: &str,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T> {
        let key = self.api_key()?;
        let response = self
            .client()
            .await?
            .get(url)
            .query(params)
            .query(&[("key", key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("HTTP {}: {}", status.as_u16(), api_error_message(&body));
            return Err(if is_transient(status) {
                AppError::upstream_transient(context, message)
            } else {
                AppError::upstream(context, message)
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl VideoApi for YouTubeApi {
    fn has_credential(&self) -> bool {
        self.config.has_credential()
    }

    async fn search_page(
        &self,
        request: &SearchRequest,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("q", request.query.clone()),
            ("type", "video".to_string()),
            ("maxResults", request.max_results.to_string()),
            ("order", request.order.as_str().to_string()),
            ("videoDuration", "long".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response: SearchListResponse = self
            .get_json("search.list", self.endpoint("search")?, &params)
            .await?;
        Ok(response.into_page())
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<DetailRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = [
            ("part", "snippet,contentDetails,statistics".to_string()),
            ("id", ids.join(",")),
        ];
        let response: VideoListResponse = self
            .get_json("videos.list", self.endpoint("videos")?, &params)
            .await?;
        Ok(response.items.into_iter().map(DetailRecord::from).collect())
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Pull the human-readable message out of a Google API error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| {
            let reason = e
                .errors
                .first()
                .and_then(|d| d.reason.as_deref())
                .unwrap_or("unknown");
            format!("{} ({reason})", e.message)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

impl SearchListResponse {
    fn into_page(self) -> SearchPage {
        let candidates = self
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                let snippet = item.snippet.unwrap_or_default();
                Some(Candidate {
                    external_id: id,
                    title: decode_entities(&snippet.title),
                    description: decode_entities(&snippet.description),
                    thumbnail_url: snippet.thumbnails.best_url(),
                    channel_id: snippet.channel_id,
                    channel_title: decode_entities(&snippet.channel_title),
                    published_at: snippet.published_at,
                })
            })
            .collect();
        SearchPage {
            candidates,
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: String,
    channel_id: String,
    channel_title: String,
    published_at: String,
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best_url(&self) -> String {
        [&self.high, &self.default, &self.medium]
            .into_iter()
            .flatten()
            .map(|t| t.url.clone())
            .next()
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    /// The API encodes counts as decimal strings
    view_count: Option<String>,
}

impl From<VideoItem> for DetailRecord {
    fn from(item: VideoItem) -> Self {
        let snippet = item.snippet.unwrap_or_default();
        DetailRecord {
            external_id: item.id,
            duration: item
                .content_details
                .and_then(|c| c.duration)
                .unwrap_or_default(),
            view_count: item
                .statistics
                .and_then(|s| s.view_count)
                .and_then(|v| v.parse().ok()),
            published_at: Some(snippet.published_at).filter(|p| !p.is_empty()),
            channel_id: snippet.channel_id,
            channel_title: decode_entities(&snippet.channel_title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_JSON: &str = r#"{
        "kind": "youtube#searchListResponse",
        "nextPageToken": "CAUQAA",
        "items": [
            {
                "id": { "kind": "youtube#video", "videoId": "abc123" },
                "snippet": {
                    "publishedAt": "2011-04-02T10:00:00Z",
                    "channelId": "UCbulh9WdLtEXiooRcYK7SWw",
                    "title": "Metallica - Live in Moscow 1991 &amp; more",
                    "description": "Tushino airfield",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/vi/abc123/default.jpg" },
                        "high": { "url": "https://i.ytimg.com/vi/abc123/hqdefault.jpg" }
                    },
                    "channelTitle": "Metallica"
                }
            },
            {
                "id": { "kind": "youtube#channel", "channelId": "UCxyz" },
                "snippet": { "title": "A channel" }
            }
        ]
    }"#;

    const VIDEOS_JSON: &str = r#"{
        "items": [
            {
                "id": "abc123",
                "snippet": {
                    "publishedAt": "1991-09-28T00:00:00Z",
                    "channelId": "UCbulh9WdLtEXiooRcYK7SWw",
                    "channelTitle": "Metallica",
                    "title": "Metallica - Live in Moscow 1991",
                    "thumbnails": {}
                },
                "contentDetails": { "duration": "PT2H10M0S" },
                "statistics": { "viewCount": "500000" }
            },
            {
                "id": "nostats",
                "contentDetails": { "duration": "PT5M" }
            }
        ]
    }"#;

    #[test]
    fn test_search_response_to_candidates() {
        let response: SearchListResponse = serde_json::from_str(SEARCH_JSON).unwrap();
        let page = response.into_page();

        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        assert_eq!(page.candidates.len(), 1);
        let c = &page.candidates[0];
        assert_eq!(c.external_id, "abc123");
        assert_eq!(c.title, "Metallica - Live in Moscow 1991 & more");
        assert_eq!(c.thumbnail_url, "https://i.ytimg.com/vi/abc123/hqdefault.jpg");
        assert_eq!(c.channel_title, "Metallica");
        assert_eq!(c.published_at, "2011-04-02T10:00:00Z");
    }

    #[test]
    fn test_video_response_to_details() {
        let response: VideoListResponse = serde_json::from_str(VIDEOS_JSON).unwrap();
        let details: Vec<DetailRecord> =
            response.items.into_iter().map(DetailRecord::from).collect();

        assert_eq!(details[0].duration, "PT2H10M0S");
        assert_eq!(details[0].view_count, Some(500_000));
        assert_eq!(details[0].published_at.as_deref(), Some("1991-09-28T00:00:00Z"));

        assert_eq!(details[1].external_id, "nostats");
        assert_eq!(details[1].view_count, None);
        assert_eq!(details[1].published_at, None);
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":403,"message":"quota exceeded","errors":[{"reason":"quotaExceeded"}]}}"#;
        assert_eq!(api_error_message(body), "quota exceeded (quotaExceeded)");
        assert_eq!(api_error_message("gateway down"), "gateway down");
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_endpoint_join() {
        let mut config = YouTubeConfig::default();
        config.base_url = "http://localhost:9000/youtube/v3/".to_string();
        let api = YouTubeApi::new(config);
        assert_eq!(
            api.endpoint("search").unwrap().as_str(),
            "http://localhost:9000/youtube/v3/search"
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_an_error_not_a_panic() {
        let api = YouTubeApi::new(YouTubeConfig::default());
        assert!(!api.has_credential());
        let err = api.video_details(&["abc123".to_string()]).await.unwrap_err();
        assert!(matches!(err, AppError::MissingCredential));
    }
}
