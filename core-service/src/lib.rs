//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! clock) into the content core and exposes the operations a host calls:
//! paginated post queries, tag and radio playlists, sync runs and player
//! sessions. Every query passes a per-client rate gate first.
//!
//! Desktop and server hosts enable the `desktop-shims` feature, which brings
//! in `bridge-desktop` and the GitHub document source.

pub mod api;
pub mod error;
pub mod rate_limit;

pub use api::{PlaylistResponse, PostsQuery, PostsResponse};
pub use error::{CoreError, Result};
pub use rate_limit::RateLimiter;

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient,
    playback::MediaElement,
    storage::{DocumentSource, FileSystemAccess},
    time::{Clock, SystemClock},
};
use core_library::{
    db, Category, ContentMirror, DatabaseConfig, LibraryError, PlaylistResolver, Post,
    PostQueryService, PostRepository, SqlitePostRepository,
};
use core_playback::{PlaybackStateMachine, PlayerConfig};
use core_runtime::config::{CoreConfig, RadioStation, SourceConfig};
use core_runtime::events::{CoreEvent, EventBus};
use core_sync::{LocalDirectorySource, SyncConfig, SyncCoordinator, SyncMode, SyncReport};
use sqlx::SqlitePool;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, instrument, warn};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub filesystem: Arc<dyn FileSystemAccess>,
    /// Overrides the source built from [`CoreConfig::source`]
    pub source: Option<Arc<dyn DocumentSource>>,
    pub clock: Arc<dyn Clock>,
    pub event_bus: Arc<EventBus>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles, with the
    /// system clock and a fresh event bus.
    pub fn new(http_client: Arc<dyn HttpClient>, filesystem: Arc<dyn FileSystemAccess>) -> Self {
        Self {
            http_client,
            filesystem,
            source: None,
            clock: Arc::new(SystemClock),
            event_bus: Arc::new(EventBus::default()),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// reqwest-backed HTTP and tokio-backed filesystem.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop(config: &CoreConfig) -> Result<Self> {
        let http_client = bridge_desktop::ReqwestHttpClient::with_timeout(config.request_timeout)
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
        Ok(Self::new(
            Arc::new(http_client),
            Arc::new(bridge_desktop::TokioFileSystem::new()),
        ))
    }
}

struct ServiceInner {
    config: CoreConfig,
    deps: CoreDependencies,
    pool: SqlitePool,
    query: PostQueryService,
    playlists: PlaylistResolver,
    sync: Option<SyncCoordinator>,
    /// Serializes sync runs; the store has a single writer
    sync_lock: Mutex<()>,
    rate_limiter: RateLimiter,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Validate `config`, open the database and wire every component.
    pub async fn new(config: CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;
        let pool = db::create_pool(DatabaseConfig::new(&config.database_path)).await?;
        Self::with_pool(config, deps, pool)
    }

    /// Wire the service around an existing pool.
    pub fn with_pool(config: CoreConfig, deps: CoreDependencies, pool: SqlitePool) -> Result<Self> {
        let posts: Arc<dyn PostRepository> = Arc::new(SqlitePostRepository::new(pool.clone()));
        let mirror = ContentMirror::new(Arc::clone(&deps.filesystem), config.content_dir.clone());
        let query = PostQueryService::new(Arc::clone(&posts), mirror);

        let mut playlists = PlaylistResolver::new(
            Arc::clone(&posts),
            config.audio_base_url.clone(),
            config.radio_stations.clone(),
        );
        if let Some(url) = &config.artwork_base_url {
            playlists = playlists.with_artwork_base_url(url.clone());
        }

        let sync = resolve_source(&config, &deps)?.map(|source| {
            SyncCoordinator::new(
                SyncConfig {
                    request_timeout: config.request_timeout,
                },
                source,
                Arc::clone(&posts),
                Arc::clone(&deps.filesystem),
                config.content_dir.clone(),
                Arc::clone(&deps.clock),
                Arc::clone(&deps.event_bus),
            )
        });
        if sync.is_none() {
            info!("No document source configured; sync is disabled");
        }

        let rate_limiter = RateLimiter::new(config.rate_limit, Arc::clone(&deps.clock));

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                deps,
                pool,
                query,
                playlists,
                sync,
                sync_lock: Mutex::new(()),
                rate_limiter,
            }),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> &CoreDependencies {
        &self.inner.deps
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.inner.deps.event_bus.subscribe()
    }

    pub async fn health_check(&self) -> Result<()> {
        Ok(db::health_check(&self.inner.pool).await?)
    }

    fn admit(&self, client: &str) -> Result<()> {
        self.inner.rate_limiter.check(client).map_err(|retry_after| {
            warn!(client, ?retry_after, "Request rejected by rate limiter");
            CoreError::RateLimited { retry_after }
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// One page of visible posts.
    #[instrument(skip(self))]
    pub async fn posts(&self, client: &str, query: PostsQuery) -> Result<PostsResponse> {
        self.admit(client)?;
        let category = parse_category(query.category.as_deref())?;
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(self.inner.config.default_page_size);

        let page = self
            .inner
            .query
            .get_sorted_posts(category, page, limit)
            .await?;
        Ok(page.into())
    }

    pub async fn post(&self, client: &str, slug: &str) -> Result<Option<Post>> {
        self.admit(client)?;
        Ok(self.inner.query.get_post_by_slug(slug).await?)
    }

    pub async fn home_post(&self, client: &str) -> Result<Option<Post>> {
        self.admit(client)?;
        Ok(self.inner.query.get_home_post().await?)
    }

    pub async fn categories(&self, client: &str) -> Result<Vec<Category>> {
        self.admit(client)?;
        Ok(self.inner.query.categories().await?)
    }

    /// Tracks for every post tagged exactly `tag`.
    #[instrument(skip(self))]
    pub async fn playlist(&self, client: &str, tag: &str) -> Result<PlaylistResponse> {
        self.admit(client)?;
        let tracks = self.inner.playlists.resolve_by_tag(tag).await?;
        Ok(PlaylistResponse { tracks })
    }

    /// Audio tracks of one category, optionally narrowed to a genre tag.
    #[instrument(skip(self))]
    pub async fn category_playlist(
        &self,
        client: &str,
        category: &str,
        tag: Option<&str>,
    ) -> Result<PlaylistResponse> {
        self.admit(client)?;
        let category = parse_category(Some(category))?.ok_or_else(|| {
            CoreError::Library(LibraryError::InvalidInput {
                field: "category".to_string(),
                message: "category is required".to_string(),
            })
        })?;
        let tracks = self
            .inner
            .playlists
            .resolve_by_category(category, tag)
            .await?;
        Ok(PlaylistResponse { tracks })
    }

    #[instrument(skip(self))]
    pub async fn radio_station(&self, client: &str, station_id: &str) -> Result<PlaylistResponse> {
        self.admit(client)?;
        let tracks = self.inner.playlists.resolve_radio_station(station_id).await?;
        Ok(PlaylistResponse { tracks })
    }

    pub fn radio_stations(&self) -> &[RadioStation] {
        self.inner.playlists.radio_stations()
    }

    // ------------------------------------------------------------------
    // Sync and playback
    // ------------------------------------------------------------------

    /// Run one sync pass. Concurrent calls wait for the running pass.
    pub async fn sync(&self, mode: SyncMode) -> Result<SyncReport> {
        let coordinator = self
            .inner
            .sync
            .as_ref()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "document source".to_string(),
                message: "set GITHUB_USERNAME and GITHUB_REPO, or CONTENT_SOURCE_DIR".to_string(),
            })?;

        let _guard = self.inner.sync_lock.lock().await;
        Ok(coordinator.run(mode).await?)
    }

    /// A new player session publishing on the service event bus.
    pub fn new_player(
        &self,
        media: Arc<dyn MediaElement>,
        config: PlayerConfig,
    ) -> PlaybackStateMachine {
        PlaybackStateMachine::new(media, self.inner.deps.event_bus.as_ref().clone(), config)
    }
}

/// Build a service for a desktop or server host.
///
/// ```ignore
/// let config = CoreConfig::from_env()?;
/// let core = core_service::bootstrap_desktop(config).await?;
/// let report = core.sync(SyncMode::Full).await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(config: CoreConfig) -> Result<CoreService> {
    let deps = CoreDependencies::desktop(&config)?;
    CoreService::new(config, deps).await
}

fn resolve_source(
    config: &CoreConfig,
    deps: &CoreDependencies,
) -> Result<Option<Arc<dyn DocumentSource>>> {
    if let Some(source) = &deps.source {
        return Ok(Some(Arc::clone(source)));
    }

    let source: Arc<dyn DocumentSource> = match &config.source {
        None => return Ok(None),
        Some(SourceConfig::LocalDirectory(root)) => Arc::new(LocalDirectorySource::new(
            Arc::clone(&deps.filesystem),
            root.clone(),
        )),
        #[cfg(feature = "desktop-shims")]
        Some(SourceConfig::GitHub(github)) => Arc::new(
            provider_github::GitHubDocumentSource::new(
                Arc::clone(&deps.http_client),
                github.clone(),
            )
            .with_timeout(config.request_timeout),
        ),
        #[cfg(not(feature = "desktop-shims"))]
        Some(SourceConfig::GitHub(_)) => {
            return Err(CoreError::CapabilityMissing {
                capability: "github".to_string(),
                message: "enable the desktop-shims feature".to_string(),
            })
        }
    };

    info!(source = %source.name(), "Document source ready");
    Ok(Some(source))
}

fn parse_category(value: Option<&str>) -> Result<Option<Category>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => Category::parse(value).map(Some).ok_or_else(|| {
            CoreError::Library(LibraryError::InvalidInput {
                field: "category".to_string(),
                message: format!("unknown category '{}'", value),
            })
        }),
    }
}
