//! # Core Configuration Module
//!
//! Settings for the content core: where the store and the local content
//! mirror live, which remote source to sync from, how media URLs are built
//! and how the query endpoints are rate limited.
//!
//! ## Usage
//!
//! ### Builder
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, GitHubSourceConfig, SourceConfig};
//!
//! let config = CoreConfig::builder()
//!     .database_path("/srv/site/posts.db")
//!     .content_dir("/srv/site/content")
//!     .source(SourceConfig::GitHub(GitHubSourceConfig::new("owner", "notes")))
//!     .build()?;
//! ```
//!
//! ### Environment
//!
//! [`CoreConfig::from_env`] reads the variables the sync trigger has always
//! used:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `GITHUB_USERNAME` | Repository owner | required with `GITHUB_REPO` |
//! | `GITHUB_REPO` | Repository name | required with `GITHUB_USERNAME` |
//! | `GITHUB_TOKEN` | Access token | none (anonymous) |
//! | `GITHUB_CONTENT_PATH` | Sub-directory to sync | repository root |
//! | `CONTENT_SOURCE_DIR` | Sync from a local tree instead of GitHub | unset |
//! | `POSTS_DB_PATH` | SQLite database file | `posts.db` |
//! | `CONTENT_DIR` | Local content mirror | `content` |
//! | `S3_BASE_URL` | Audio base URL | [`DEFAULT_AUDIO_BASE_URL`] |
//! | `S3_BASE_URL_ALBUMS` | Album artwork base URL | unset |
//! | `RATE_LIMIT_PER_MINUTE` | Query requests per client per minute | `100` |
//! | `REQUEST_TIMEOUT_SECS` | Network timeout | `30` |
//!
//! ## Error Handling
//!
//! `build()` and `from_env()` validate eagerly and return
//! [`Error::Config`] or [`Error::MissingVariable`] with an actionable message.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_AUDIO_BASE_URL: &str = "https://personal-website-audio.s3.amazonaws.com/audio";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// GitHub repository holding the markdown documents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubSourceConfig {
    pub owner: String,
    pub repo: String,
    /// Personal access token; `None` uses anonymous, low-quota access
    pub token: Option<String>,
    /// Directory inside the repository to sync, `""` for the root
    pub root_path: String,
    pub api_base_url: String,
}

impl GitHubSourceConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token: None,
            root_path: String::new(),
            api_base_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = path.into().trim_matches('/').to_string();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for GitHubSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSourceConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("root_path", &self.root_path)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Where the sync engine reads documents from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    GitHub(GitHubSourceConfig),
    /// A local directory tree of markdown files
    LocalDirectory(PathBuf),
}

/// A named shortcut to a tag playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioStation {
    pub id: String,
    pub name: String,
    /// Tag resolved through the playlist resolver
    pub tag: String,
}

impl RadioStation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tag: tag.into(),
        }
    }
}

/// Stations offered when none are configured.
pub fn default_radio_stations() -> Vec<RadioStation> {
    vec![
        RadioStation::new("jazz", "Seasonal Jazz", "jazz"),
        RadioStation::new("piano", "Piano", "piano"),
        RadioStation::new("strings", "Strings", "string"),
    ]
}

/// Token bucket settings for the query endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Bucket capacity, refilled evenly over `window`
    pub requests_per_window: u32,
    pub window: Duration,
    /// Buckets untouched for this long are dropped
    pub idle_eviction: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 100,
            window: Duration::from_secs(60),
            idle_eviction: Duration::from_secs(60 * 60),
        }
    }
}

/// Core configuration. Use [`CoreConfigBuilder`] or [`CoreConfig::from_env`].
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Local mirror of the synced markdown files; list views read bodies from here
    pub content_dir: PathBuf,

    /// Remote document source; `None` disables sync
    pub source: Option<SourceConfig>,

    /// Base URL that root-relative audio paths are appended to
    pub audio_base_url: String,

    /// Base URL for album artwork images
    pub artwork_base_url: Option<String>,

    /// Timeout applied to each network call made by the sync engine
    pub request_timeout: Duration,

    pub rate_limit: RateLimitConfig,

    pub radio_stations: Vec<RadioStation>,

    /// Page size used when a query does not specify one
    pub default_page_size: u32,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut builder = CoreConfig::builder()
            .database_path(get("POSTS_DB_PATH").unwrap_or_else(|| "posts.db".to_string()))
            .content_dir(get("CONTENT_DIR").unwrap_or_else(|| "content".to_string()));

        if let Some(dir) = get("CONTENT_SOURCE_DIR") {
            builder = builder.source(SourceConfig::LocalDirectory(PathBuf::from(dir)));
        } else {
            match (get("GITHUB_USERNAME"), get("GITHUB_REPO")) {
                (Some(owner), Some(repo)) => {
                    let mut github = GitHubSourceConfig::new(owner, repo);
                    if let Some(token) = get("GITHUB_TOKEN") {
                        github = github.with_token(token);
                    }
                    if let Some(path) = get("GITHUB_CONTENT_PATH") {
                        github = github.with_root_path(path);
                    }
                    builder = builder.source(SourceConfig::GitHub(github));
                }
                (Some(_), None) => {
                    return Err(Error::missing(
                        "GITHUB_REPO",
                        "set it alongside GITHUB_USERNAME",
                    ))
                }
                (None, Some(_)) => {
                    return Err(Error::missing(
                        "GITHUB_USERNAME",
                        "set it alongside GITHUB_REPO",
                    ))
                }
                (None, None) => {}
            }
        }

        if let Some(url) = get("S3_BASE_URL") {
            builder = builder.audio_base_url(url);
        }
        if let Some(url) = get("S3_BASE_URL_ALBUMS") {
            builder = builder.artwork_base_url(url);
        }
        if let Some(value) = get("RATE_LIMIT_PER_MINUTE") {
            let per_minute = value.parse::<u32>().map_err(|_| {
                Error::Config(format!(
                    "RATE_LIMIT_PER_MINUTE must be a positive integer, got '{}'",
                    value
                ))
            })?;
            builder = builder.rate_limit(RateLimitConfig {
                requests_per_window: per_minute,
                ..RateLimitConfig::default()
            });
        }
        if let Some(value) = get("REQUEST_TIMEOUT_SECS") {
            let secs = value.parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "REQUEST_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    value
                ))
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// The configured GitHub source, if any.
    pub fn github(&self) -> Option<&GitHubSourceConfig> {
        match &self.source {
            Some(SourceConfig::GitHub(github)) => Some(github),
            _ => None,
        }
    }

    pub fn radio_station(&self, id: &str) -> Option<&RadioStation> {
        self.radio_stations.iter().find(|station| station.id == id)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.content_dir.as_os_str().is_empty() {
            return Err(Error::Config("Content directory cannot be empty".to_string()));
        }

        validate_url("Audio base URL", &self.audio_base_url)?;
        if let Some(url) = &self.artwork_base_url {
            validate_url("Artwork base URL", url)?;
        }

        if let Some(SourceConfig::GitHub(github)) = &self.source {
            if github.owner.is_empty() || github.repo.is_empty() {
                return Err(Error::Config(
                    "GitHub source requires both owner and repository".to_string(),
                ));
            }
            validate_url("GitHub API URL", &github.api_base_url)?;
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.rate_limit.requests_per_window == 0 || self.rate_limit.window.is_zero() {
            return Err(Error::Config(
                "Rate limit must allow at least one request per non-empty window".to_string(),
            ));
        }

        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Default page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let mut seen = HashSet::new();
        for station in &self.radio_stations {
            if station.tag.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Radio station '{}' has an empty tag",
                    station.id
                )));
            }
            if !seen.insert(station.id.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate radio station id '{}'",
                    station.id
                )));
            }
        }

        Ok(())
    }
}

fn validate_url(label: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} must start with http:// or https://, got '{}'",
            label, url
        )))
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    content_dir: Option<PathBuf>,
    source: Option<SourceConfig>,
    audio_base_url: Option<String>,
    artwork_base_url: Option<String>,
    request_timeout: Option<Duration>,
    rate_limit: Option<RateLimitConfig>,
    radio_stations: Option<Vec<RadioStation>>,
    default_page_size: Option<u32>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn content_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.content_dir = Some(path.into());
        self
    }

    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = Some(source);
        self
    }

    pub fn audio_base_url(mut self, url: impl Into<String>) -> Self {
        self.audio_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn artwork_base_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn radio_stations(mut self, stations: Vec<RadioStation>) -> Self {
        self.radio_stations = Some(stations);
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a required path is missing or a value
    /// fails [`CoreConfig::validate`].
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let content_dir = self.content_dir.ok_or_else(|| {
            Error::Config(
                "Content directory is required. Use .content_dir() to set it.".to_string(),
            )
        })?;

        let config = CoreConfig {
            database_path,
            content_dir,
            source: self.source,
            audio_base_url: self
                .audio_base_url
                .unwrap_or_else(|| DEFAULT_AUDIO_BASE_URL.to_string()),
            artwork_base_url: self.artwork_base_url,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            rate_limit: self.rate_limit.unwrap_or_default(),
            radio_stations: self.radio_stations.unwrap_or_else(default_radio_stations),
            default_page_size: self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfig::builder()
            .database_path("posts.db")
            .content_dir("content")
            .build()
            .unwrap();

        assert_eq!(config.audio_base_url, DEFAULT_AUDIO_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit.requests_per_window, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.default_page_size, 10);
        assert!(config.source.is_none());
        assert_eq!(config.radio_stations.len(), 3);
    }

    #[test]
    fn test_builder_requires_database_path() {
        let result = CoreConfig::builder().content_dir("content").build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Database path is required"));
    }

    #[test]
    fn test_builder_requires_content_dir() {
        let result = CoreConfig::builder().database_path("posts.db").build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Content directory is required"));
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base_urls() {
        let config = CoreConfig::builder()
            .database_path("posts.db")
            .content_dir("content")
            .audio_base_url("https://cdn.example.com/audio/")
            .artwork_base_url("https://cdn.example.com/albums/")
            .build()
            .unwrap();

        assert_eq!(config.audio_base_url, "https://cdn.example.com/audio");
        assert_eq!(
            config.artwork_base_url.as_deref(),
            Some("https://cdn.example.com/albums")
        );
    }

    #[test]
    fn test_rejects_relative_audio_url() {
        let result = CoreConfig::builder()
            .database_path("posts.db")
            .content_dir("content")
            .audio_base_url("/audio")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_duplicate_station_ids() {
        let result = CoreConfig::builder()
            .database_path("posts.db")
            .content_dir("content")
            .radio_stations(vec![
                RadioStation::new("jazz", "Jazz", "jazz"),
                RadioStation::new("jazz", "More Jazz", "bebop"),
            ])
            .build();

        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_from_lookup_github() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("GITHUB_USERNAME", "owner"),
            ("GITHUB_REPO", "notes"),
            ("GITHUB_TOKEN", "ghp_secret"),
            ("S3_BASE_URL", "https://audio.example.com"),
            ("RATE_LIMIT_PER_MINUTE", "20"),
        ]))
        .unwrap();

        let github = config.github().unwrap();
        assert_eq!(github.owner, "owner");
        assert_eq!(github.repo, "notes");
        assert_eq!(github.token.as_deref(), Some("ghp_secret"));
        assert_eq!(config.audio_base_url, "https://audio.example.com");
        assert_eq!(config.rate_limit.requests_per_window, 20);
        assert_eq!(config.database_path, PathBuf::from("posts.db"));
    }

    #[test]
    fn test_from_lookup_requires_repo_with_username() {
        let result = CoreConfig::from_lookup(lookup(&[("GITHUB_USERNAME", "owner")]));

        match result {
            Err(Error::MissingVariable { name, .. }) => assert_eq!(name, "GITHUB_REPO"),
            other => panic!("expected missing GITHUB_REPO, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_local_directory_wins() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("CONTENT_SOURCE_DIR", "/srv/notes"),
            ("GITHUB_USERNAME", "owner"),
        ]))
        .unwrap();

        assert_eq!(
            config.source,
            Some(SourceConfig::LocalDirectory(PathBuf::from("/srv/notes")))
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let result = CoreConfig::from_lookup(lookup(&[("RATE_LIMIT_PER_MINUTE", "lots")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let github = GitHubSourceConfig::new("owner", "repo").with_token("ghp_secret");
        let debug = format!("{:?}", github);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
