//! The catalog service.

use bridge_traits::http::HttpClient;
use core_auth::{ClientCredentials, ClientCredentialsIssuer, Credential, CredentialCache};
use core_catalog::{join_successful_keyed, FetchOrchestrator, FetchResult, Pager};
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use core_runtime::CatalogConfig;
use provider_catalog_api::loaders;
use provider_catalog_api::types::{
    Album, AlbumGroup, Artist, Category, PagingObject, Playlist, PlaylistTrack, SearchItem,
    SearchType, Show, SimplifiedAlbum, SimplifiedEpisode, SimplifiedPlaylist, Track,
};
use provider_catalog_api::CatalogConnector;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::dashboard::{CategoryPlaylists, HomeDashboard};
use crate::error::Result;

/// Primary façade exposed to host applications.
///
/// Cheap to clone; clones share the credential cache and event bus.
#[derive(Clone)]
pub struct CatalogService {
    orchestrator: FetchOrchestrator,
    connector: Arc<CatalogConnector>,
    event_bus: EventBus,
    page_size: u32,
    dashboard_category_limit: u32,
}

impl CatalogService {
    /// Builds the service from a validated configuration.
    ///
    /// # Errors
    ///
    /// `CapabilityMissing` when no HTTP client was injected and no desktop
    /// default is compiled in; `InitializationFailed` when the default client
    /// cannot be built.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        config.validate()?;

        let http_client = resolve_http_client(&config)?;
        let event_bus = EventBus::new(config.event_buffer_size);

        let issuer = ClientCredentialsIssuer::new(
            config.token_url.clone(),
            Arc::clone(&http_client),
            Arc::clone(&config.clock),
        )
        .with_timeout(config.request_timeout);

        let credentials = CredentialCache::new(
            Arc::new(issuer),
            ClientCredentials::new(config.client_id.clone(), config.client_secret.clone()),
            Arc::clone(&config.clock),
        )
        .with_refresh_leeway(config.credential_refresh_leeway_secs)
        .with_event_bus(event_bus.clone());

        let orchestrator =
            FetchOrchestrator::new(Arc::new(credentials)).with_event_bus(event_bus.clone());

        let connector = CatalogConnector::new(http_client, config.api_base_url.clone())
            .with_market(config.market.clone())
            .with_timeout(config.request_timeout);

        info!(
            api_base_url = %config.api_base_url,
            market = ?config.market,
            page_size = config.page_size,
            "Catalog service initialized"
        );

        Ok(Self {
            orchestrator,
            connector: Arc::new(connector),
            event_bus,
            page_size: config.page_size,
            dashboard_category_limit: config.dashboard_category_limit,
        })
    }

    /// Credential and fetch-failure events.
    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // ----- one-shot fetches -----

    pub async fn album(&self, album_id: &str) -> Result<FetchResult<Album>> {
        let connector = &self.connector;
        self.fetch("album", move |credential| async move {
            connector.album(&credential, album_id).await
        })
        .await
    }

    pub async fn artist(&self, artist_id: &str) -> Result<FetchResult<Artist>> {
        let connector = &self.connector;
        self.fetch("artist", move |credential| async move {
            connector.artist(&credential, artist_id).await
        })
        .await
    }

    pub async fn artist_top_tracks(&self, artist_id: &str) -> Result<FetchResult<Vec<Track>>> {
        let connector = &self.connector;
        self.fetch("artist_top_tracks", move |credential| async move {
            connector.artist_top_tracks(&credential, artist_id).await
        })
        .await
    }

    pub async fn playlist(&self, playlist_id: &str) -> Result<FetchResult<Playlist>> {
        let connector = &self.connector;
        self.fetch("playlist", move |credential| async move {
            connector.playlist(&credential, playlist_id).await
        })
        .await
    }

    pub async fn show(&self, show_id: &str) -> Result<FetchResult<Show>> {
        let connector = &self.connector;
        self.fetch("show", move |credential| async move {
            connector.show(&credential, show_id).await
        })
        .await
    }

    pub async fn track(&self, track_id: &str) -> Result<FetchResult<Track>> {
        let connector = &self.connector;
        self.fetch("track", move |credential| async move {
            connector.track(&credential, track_id).await
        })
        .await
    }

    // ----- paged lists -----

    pub fn artist_albums(
        &self,
        artist_id: impl Into<String>,
        include_groups: Vec<AlbumGroup>,
    ) -> Pager<SimplifiedAlbum> {
        self.pager(loaders::artist_albums(
            self.orchestrator.clone(),
            Arc::clone(&self.connector),
            artist_id,
            include_groups,
        ))
    }

    pub fn playlist_tracks(&self, playlist_id: impl Into<String>) -> Pager<PlaylistTrack> {
        self.pager(loaders::playlist_tracks(
            self.orchestrator.clone(),
            Arc::clone(&self.connector),
            playlist_id,
        ))
    }

    pub fn show_episodes(&self, show_id: impl Into<String>) -> Pager<SimplifiedEpisode> {
        self.pager(loaders::show_episodes(
            self.orchestrator.clone(),
            Arc::clone(&self.connector),
            show_id,
        ))
    }

    pub fn search(&self, query: impl Into<String>, search_type: SearchType) -> Pager<SearchItem> {
        self.pager(loaders::search(
            self.orchestrator.clone(),
            Arc::clone(&self.connector),
            query,
            search_type,
        ))
    }

    // ----- composite -----

    /// New releases, featured playlists and the first categories with their
    /// playlists.
    ///
    /// The three top-level sections are fetched concurrently, then one
    /// playlists request per category. Failed sections come back empty and
    /// failed categories are left out.
    ///
    /// # Errors
    ///
    /// Only non-remote failures (credential issuance, decoding) fail the
    /// whole dashboard.
    #[instrument(skip(self))]
    pub async fn home_dashboard(&self) -> Result<HomeDashboard> {
        let (new_releases, featured_playlists, categories) = futures::try_join!(
            self.new_releases(),
            self.featured_playlists(),
            self.categories()
        )?;

        let categories = match categories.into_data() {
            Some(page) => self.playlists_per_category(page.items).await?,
            None => Vec::new(),
        };

        let dashboard = HomeDashboard {
            new_releases: items_or_empty(new_releases),
            featured_playlists: items_or_empty(featured_playlists),
            categories,
        };

        debug!(
            new_releases = dashboard.new_releases.len(),
            featured_playlists = dashboard.featured_playlists.len(),
            categories = dashboard.categories.len(),
            "Home dashboard assembled"
        );
        Ok(dashboard)
    }

    async fn new_releases(&self) -> Result<FetchResult<PagingObject<SimplifiedAlbum>>> {
        let connector = &self.connector;
        let limit = self.page_size;
        self.fetch("new_releases", move |credential| async move {
            connector.new_releases(&credential, limit, 0).await
        })
        .await
    }

    async fn featured_playlists(&self) -> Result<FetchResult<PagingObject<SimplifiedPlaylist>>> {
        let connector = &self.connector;
        let limit = self.page_size;
        self.fetch("featured_playlists", move |credential| async move {
            connector.featured_playlists(&credential, limit, 0).await
        })
        .await
    }

    async fn categories(&self) -> Result<FetchResult<PagingObject<Category>>> {
        if self.dashboard_category_limit == 0 {
            return Ok(FetchResult::Success(PagingObject {
                items: Vec::new(),
                limit: 0,
                offset: 0,
                total: 0,
                next: None,
                previous: None,
            }));
        }

        let connector = &self.connector;
        let limit = self.dashboard_category_limit;
        self.fetch("categories", move |credential| async move {
            connector.categories(&credential, limit, 0).await
        })
        .await
    }

    async fn playlists_per_category(
        &self,
        categories: Vec<Category>,
    ) -> Result<Vec<CategoryPlaylists>> {
        let connector = &self.connector;
        let orchestrator = &self.orchestrator;
        let limit = self.page_size;

        let fetches = categories
            .into_iter()
            .take(self.dashboard_category_limit as usize)
            .map(move |category| {
                let category_id = category.id.clone();
                let fetch = async move {
                    orchestrator
                        .run_authenticated("category_playlists", move |credential| async move {
                            connector
                                .category_playlists(&credential, &category_id, limit, 0)
                                .await
                        })
                        .await
                };
                (category, fetch)
            });

        let fetched = join_successful_keyed(fetches).await?;

        Ok(fetched
            .into_iter()
            .map(|(category, playlists)| CategoryPlaylists {
                id: category.id,
                name: category.name,
                playlists: playlists.items,
            })
            .collect())
    }

    async fn fetch<T, F, Fut>(&self, operation: &str, call: F) -> Result<FetchResult<T>>
    where
        F: FnOnce(Arc<Credential>) -> Fut,
        Fut: Future<Output = core_catalog::Result<T>>,
    {
        Ok(self.orchestrator.run_authenticated(operation, call).await?)
    }

    fn pager<T: Send + 'static>(&self, loader: Arc<dyn core_catalog::PageLoader<T>>) -> Pager<T> {
        Pager::from_loader(self.page_size, loader)
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("connector", &self.connector)
            .field("page_size", &self.page_size)
            .field("dashboard_category_limit", &self.dashboard_category_limit)
            .finish()
    }
}

fn items_or_empty<T>(result: FetchResult<PagingObject<T>>) -> Vec<T> {
    result.into_data().map(|page| page.items).unwrap_or_default()
}

fn resolve_http_client(config: &CatalogConfig) -> Result<Arc<dyn HttpClient>> {
    match &config.http_client {
        Some(client) => Ok(Arc::clone(client)),
        None => default_http_client(config),
    }
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
fn default_http_client(config: &CatalogConfig) -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::with_timeout(config.request_timeout)
        .map_err(|e| crate::ServiceError::InitializationFailed(e.to_string()))?;
    debug!("Using the desktop HTTP client");
    Ok(Arc::new(client))
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
fn default_http_client(config: &CatalogConfig) -> Result<Arc<dyn HttpClient>> {
    Ok(config.require_http_client()?)
}
