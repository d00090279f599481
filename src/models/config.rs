//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{QueryCategory, QuerySpec, SearchOrder};

/// Upstream limit on ids per detail lookup and results per search page.
pub const UPSTREAM_PAGE_LIMIT: u32 = 50;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Crawl pacing and query augmentation
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Relevance pre-filter keywords
    #[serde(default)]
    pub filter: FilterConfig,

    /// Query plan, processed in order
    #[serde(default = "defaults::queries")]
    pub queries: Vec<QuerySpec>,

    /// Default scorer and classifier settings
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Tour detection rules, first match wins
    #[serde(default = "defaults::tours")]
    pub tours: Vec<TourRule>,

    /// Persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.youtube.timeout_secs == 0 {
            return Err(AppError::validation("youtube.timeout_secs must be > 0"));
        }
        if self.youtube.user_agent.trim().is_empty() {
            return Err(AppError::validation("youtube.user_agent is empty"));
        }
        url::Url::parse(&self.youtube.base_url)
            .map_err(|e| AppError::validation(format!("youtube.base_url is invalid: {e}")))?;
        if self.crawler.detail_concurrency == 0 {
            return Err(AppError::validation("crawler.detail_concurrency must be > 0"));
        }
        if self.filter.required_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::validation("filter.required_keywords is empty"));
        }
        if self.queries.is_empty() {
            return Err(AppError::validation("No queries defined"));
        }
        if let Some(q) = self.queries.iter().find(|q| q.query.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "Query plan contains a blank query ({:?})",
                q.category
            )));
        }
        if self.tours.iter().any(|t| t.name.trim().is_empty()) {
            return Err(AppError::validation("Tour rule with empty name"));
        }
        if self.scoring.tag_rules.iter().any(|t| t.tag.trim().is_empty()) {
            return Err(AppError::validation("Tag rule with empty tag"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube: YouTubeConfig::default(),
            crawler: CrawlerConfig::default(),
            filter: FilterConfig::default(),
            queries: defaults::queries(),
            scoring: ScoringConfig::default(),
            tours: defaults::tours(),
            storage: StorageConfig::default(),
        }
    }
}

/// Upstream API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// API key; only ever taken from the environment
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Data API root
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Results requested per search page
    #[serde(default = "defaults::max_results")]
    pub max_results: u32,

    /// Search pages followed per query
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Result ordering
    #[serde(default)]
    pub order: SearchOrder,

    /// Ids per detail lookup
    #[serde(default = "defaults::detail_batch_size")]
    pub detail_batch_size: usize,

    /// Retries for transient upstream failures
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl YouTubeConfig {
    /// Results per page, clamped to what the upstream accepts.
    pub fn page_size(&self) -> u32 {
        self.max_results.clamp(1, UPSTREAM_PAGE_LIMIT)
    }

    /// Detail batch size, clamped to what the upstream accepts.
    pub fn batch_size(&self) -> usize {
        self.detail_batch_size.clamp(1, UPSTREAM_PAGE_LIMIT as usize)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_results: defaults::max_results(),
            max_pages: defaults::max_pages(),
            order: SearchOrder::default(),
            detail_batch_size: defaults::detail_batch_size(),
            max_retries: defaults::max_retries(),
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

/// Crawl pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Artist name prefixed to queries that lack it
    #[serde(default = "defaults::artist")]
    pub artist: String,

    /// Pause between queries in milliseconds
    #[serde(default = "defaults::query_cooldown")]
    pub query_cooldown_ms: u64,

    /// Detail batches fetched concurrently within one query
    #[serde(default = "defaults::detail_concurrency")]
    pub detail_concurrency: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            artist: defaults::artist(),
            query_cooldown_ms: defaults::query_cooldown(),
            detail_concurrency: defaults::detail_concurrency(),
        }
    }
}

/// Keyword pre-filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// At least one must appear in title, description or channel
    #[serde(default = "defaults::required_keywords")]
    pub required_keywords: Vec<String>,

    /// None may appear
    #[serde(default = "defaults::exclude_keywords")]
    pub exclude_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            required_keywords: defaults::required_keywords(),
            exclude_keywords: defaults::exclude_keywords(),
        }
    }
}

/// Settings for the default classifier and scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Channel titles treated as official
    #[serde(default = "defaults::official_channels")]
    pub official_channels: Vec<String>,

    /// Shortest concert accepted as complete
    #[serde(default = "defaults::min_concert_secs")]
    pub min_concert_secs: u64,

    /// Shortest interview accepted as complete
    #[serde(default = "defaults::min_interview_secs")]
    pub min_interview_secs: u64,

    /// Title terms marking an interview
    #[serde(default = "defaults::interview_keywords")]
    pub interview_keywords: Vec<String>,

    /// Quality tags in display order
    #[serde(default = "defaults::tag_rules")]
    pub tag_rules: Vec<TagRule>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            official_channels: defaults::official_channels(),
            min_concert_secs: defaults::min_concert_secs(),
            min_interview_secs: defaults::min_interview_secs(),
            interview_keywords: defaults::interview_keywords(),
            tag_rules: defaults::tag_rules(),
        }
    }
}

/// A quality tag and the title terms that earn it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRule {
    pub tag: String,
    pub keywords: Vec<String>,
    /// Score bonus when the tag applies
    #[serde(default)]
    pub points: i32,
}

/// A tour name and the title terms that identify it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON store, relative to the config file's directory
    #[serde(default = "defaults::storage_dir")]
    pub dir: String,
}

impl StorageConfig {
    /// Store root for a config loaded from `config_dir`.
    ///
    /// Absolute paths are used as given.
    pub fn resolve(&self, config_dir: &Path) -> PathBuf {
        let dir = Path::new(self.dir.trim());
        if dir.is_absolute() {
            dir.to_path_buf()
        } else if dir.as_os_str().is_empty() || dir == Path::new(".") {
            config_dir.to_path_buf()
        } else {
            config_dir.join(dir)
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
        }
    }
}

mod defaults {
    use super::{QueryCategory, QuerySpec, TagRule, TourRule};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // YouTube defaults
    pub fn base_url() -> String {
        "https://www.googleapis.com/youtube/v3".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; archive-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_results() -> u32 {
        50
    }
    pub fn max_pages() -> u32 {
        1
    }
    pub fn detail_batch_size() -> usize {
        50
    }
    pub fn max_retries() -> u32 {
        2
    }
    pub fn retry_backoff() -> u64 {
        500
    }

    // Crawler defaults
    pub fn artist() -> String {
        "Metallica".into()
    }
    pub fn query_cooldown() -> u64 {
        1000
    }
    pub fn detail_concurrency() -> usize {
        2
    }

    // Filter defaults
    pub fn required_keywords() -> Vec<String> {
        strings(&[
            "metallica",
            "hetfield",
            "ulrich",
            "hammett",
            "trujillo",
            "newsted",
            "cliff burton",
        ])
    }
    pub fn exclude_keywords() -> Vec<String> {
        strings(&[
            "cover",
            "reaction",
            "reacts",
            "tutorial",
            "lesson",
            "karaoke",
            "tribute",
            "parody",
            "guitar hero",
            "how to play",
            "backing track",
        ])
    }

    // Query plan defaults
    pub fn queries() -> Vec<QuerySpec> {
        let concerts = [
            "Seattle 1989",
            "Moscow 1991 Tushino",
            "Live Shit Binge & Purge San Diego 1992",
            "Cunning Stunts Fort Worth 1997",
            "S&M Berkeley 1999",
            "Orgullo Pasion y Gloria Mexico 2009",
            "Quebec Magnetic 2009",
            "Francais Pour Une Nuit Nimes 2009",
            "M72 World Tour",
        ];
        let interviews = [
            "Cliff Burton 1986",
            "James Hetfield",
            "Lars Ulrich",
            "Kirk Hammett",
            "Robert Trujillo",
            "Jason Newsted",
        ];
        concerts
            .iter()
            .map(|q| QuerySpec::new(*q, QueryCategory::Concert))
            .chain(
                interviews
                    .iter()
                    .map(|q| QuerySpec::new(*q, QueryCategory::Interview)),
            )
            .collect()
    }

    // Scoring defaults
    pub fn official_channels() -> Vec<String> {
        strings(&["Metallica", "MetallicaTV", "Metallica - Topic"])
    }
    pub fn min_concert_secs() -> u64 {
        40 * 60
    }
    pub fn min_interview_secs() -> u64 {
        10 * 60
    }
    pub fn interview_keywords() -> Vec<String> {
        strings(&[
            "interview",
            "интервью",
            "press conference",
            "q&a",
            "podcast",
            "talks about",
            "in conversation",
        ])
    }
    pub fn tag_rules() -> Vec<TagRule> {
        let rule = |tag: &str, keywords: &[&str], points: i32| TagRule {
            tag: tag.to_string(),
            keywords: strings(keywords),
            points,
        };
        vec![
            rule("Pro-Shot", &["pro-shot", "proshot", "pro shot", "multicam"], 15),
            rule("4K", &["4k", "2160p"], 12),
            rule("HD", &["hd", "1080p", "720p"], 10),
            rule("Remastered", &["remaster", "remastered"], 10),
            rule("Full Show", &["full concert", "full show", "complete show"], 10),
            rule("Soundboard", &["soundboard", "sbd"], 5),
            rule("Audience", &["audience", "amateur"], -5),
        ]
    }

    // Tour defaults
    pub fn tours() -> Vec<TourRule> {
        let rule = |name: &str, keywords: &[&str]| TourRule {
            name: name.to_string(),
            keywords: strings(keywords),
        };
        vec![
            rule("Kill 'Em All for One", &["kill 'em all for one", "kill em all for one"]),
            rule("Damage, Inc.", &["damage inc tour", "damage, inc. tour"]),
            rule("Damaged Justice", &["damaged justice"]),
            rule("Wherever We May Roam", &["wherever we may roam"]),
            rule("Nowhere Else to Roam", &["nowhere else to roam"]),
            rule("Monsters of Rock", &["monsters of rock"]),
            rule("Poor Touring Me", &["poor touring me"]),
            rule("Poor Re-Touring Me", &["poor re-touring me", "poor retouring me"]),
            rule("Garage Remains the Same", &["garage remains the same"]),
            rule("Madly in Anger with the World", &["madly in anger"]),
            rule("World Magnetic", &["world magnetic"]),
            rule("WorldWired", &["worldwired", "world wired"]),
            rule("M72 World Tour", &["m72"]),
        ]
    }

    // Storage defaults
    pub fn storage_dir() -> String {
        ".".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_required_keywords() {
        let mut config = Config::default();
        config.filter.required_keywords = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_query_plan() {
        let mut config = Config::default();
        config.queries.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.youtube.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.youtube.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn page_and_batch_sizes_are_clamped() {
        let mut config = YouTubeConfig::default();
        config.max_results = 500;
        config.detail_batch_size = 0;
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.batch_size(), 1);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            query_cooldown_ms = 0

            [[queries]]
            query = "Moscow 1991"
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.query_cooldown_ms, 0);
        assert_eq!(config.crawler.artist, "Metallica");
        assert_eq!(config.queries.len(), 1);
        assert!(!config.tours.is_empty());
        assert!(config.youtube.api_key.is_none());
    }

    #[test]
    fn storage_dir_resolves_against_config_dir() {
        let base = Path::new("/data");
        assert_eq!(StorageConfig::default().resolve(base), PathBuf::from("/data"));

        let nested = StorageConfig {
            dir: "archive".to_string(),
        };
        assert_eq!(nested.resolve(base), PathBuf::from("/data/archive"));

        let absolute = StorageConfig {
            dir: "/srv/videos".to_string(),
        };
        assert_eq!(absolute.resolve(base), PathBuf::from("/srv/videos"));
    }

    #[test]
    fn api_key_never_serialized() {
        let mut config = Config::default();
        config.youtube.api_key = Some("secret".to_string());
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("secret"));
    }
}
