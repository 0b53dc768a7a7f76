//! Catalog Web API connector
//!
//! Typed calls for the album, artist, playlist, show, track, search and
//! browse endpoints. Every call takes the credential to authenticate with;
//! obtaining and refreshing it is the orchestrator's job.

use bridge_traits::http::{HttpClient, HttpRequest};
use core_auth::Credential;
use core_catalog::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::decode_response;
use crate::types::{
    Album, AlbumGroup, Artist, CategoriesResponse, Category, NewReleasesResponse, PagingObject,
    Playlist, PlaylistTrack, PlaylistsResponse, SearchItem, SearchResponse, SearchType, Show,
    SimplifiedAlbum, SimplifiedEpisode, SimplifiedPlaylist, TopTracksResponse, Track,
};

/// Market used by endpoints that require one when none is configured.
const FALLBACK_MARKET: &str = "US";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameters in request order.
type Query = Vec<(&'static str, String)>;

/// Catalog Web API connector
///
/// # Example
///
/// ```ignore
/// use provider_catalog_api::CatalogConnector;
///
/// let connector = CatalogConnector::new(http_client, "https://api.spotify.com/v1")
///     .with_market(Some("SE".to_string()));
/// let page = connector.artist_albums(&credential, "0TnOYISbd1XYRBk9myaseg", &[], 20, 0).await?;
/// ```
#[derive(Clone)]
pub struct CatalogConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    market: Option<String>,
    timeout: Duration,
}

impl CatalogConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            market: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// ISO 3166-1 alpha-2 market sent with market-aware requests.
    pub fn with_market(mut self, market: Option<String>) -> Self {
        self.market = market;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn market(&self) -> Option<&str> {
        self.market.as_deref()
    }

    // ----- one-shot endpoints -----

    #[instrument(skip(self, credential))]
    pub async fn album(&self, credential: &Credential, album_id: &str) -> Result<Album> {
        let path = format!("/albums/{}", urlencoding::encode(album_id));
        self.get_json(credential, &path, self.market_query("market"))
            .await
    }

    #[instrument(skip(self, credential))]
    pub async fn artist(&self, credential: &Credential, artist_id: &str) -> Result<Artist> {
        let path = format!("/artists/{}", urlencoding::encode(artist_id));
        self.get_json(credential, &path, Vec::new()).await
    }

    /// The artist's most popular tracks. The endpoint requires a market.
    #[instrument(skip(self, credential))]
    pub async fn artist_top_tracks(
        &self,
        credential: &Credential,
        artist_id: &str,
    ) -> Result<Vec<Track>> {
        let path = format!("/artists/{}/top-tracks", urlencoding::encode(artist_id));
        let market = self.market.as_deref().unwrap_or(FALLBACK_MARKET).to_string();
        let response: TopTracksResponse = self
            .get_json(credential, &path, vec![("market", market)])
            .await?;
        Ok(response.tracks)
    }

    #[instrument(skip(self, credential))]
    pub async fn playlist(&self, credential: &Credential, playlist_id: &str) -> Result<Playlist> {
        let path = format!("/playlists/{}", urlencoding::encode(playlist_id));
        self.get_json(credential, &path, self.market_query("market"))
            .await
    }

    #[instrument(skip(self, credential))]
    pub async fn show(&self, credential: &Credential, show_id: &str) -> Result<Show> {
        let path = format!("/shows/{}", urlencoding::encode(show_id));
        self.get_json(credential, &path, self.market_query("market"))
            .await
    }

    #[instrument(skip(self, credential))]
    pub async fn track(&self, credential: &Credential, track_id: &str) -> Result<Track> {
        let path = format!("/tracks/{}", urlencoding::encode(track_id));
        self.get_json(credential, &path, self.market_query("market"))
            .await
    }

    // ----- paged endpoints -----

    /// Albums of an artist. An empty `include_groups` lets the API decide.
    #[instrument(skip(self, credential, include_groups))]
    pub async fn artist_albums(
        &self,
        credential: &Credential,
        artist_id: &str,
        include_groups: &[AlbumGroup],
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<SimplifiedAlbum>> {
        let path = format!("/artists/{}/albums", urlencoding::encode(artist_id));
        let mut query = self.market_query("market");
        if !include_groups.is_empty() {
            let groups: Vec<&str> = include_groups.iter().map(AlbumGroup::as_str).collect();
            query.push(("include_groups", groups.join(",")));
        }
        push_paging(&mut query, limit, offset);

        self.get_json(credential, &path, query).await
    }

    #[instrument(skip(self, credential))]
    pub async fn playlist_tracks(
        &self,
        credential: &Credential,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<PlaylistTrack>> {
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let mut query = self.market_query("market");
        push_paging(&mut query, limit, offset);

        self.get_json(credential, &path, query).await
    }

    #[instrument(skip(self, credential))]
    pub async fn show_episodes(
        &self,
        credential: &Credential,
        show_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<SimplifiedEpisode>> {
        let path = format!("/shows/{}/episodes", urlencoding::encode(show_id));
        let mut query = self.market_query("market");
        push_paging(&mut query, limit, offset);

        self.get_json(credential, &path, query).await
    }

    /// Searches one result type.
    ///
    /// A response without the requested section is treated as an empty
    /// result at `offset`.
    #[instrument(skip(self, credential))]
    pub async fn search(
        &self,
        credential: &Credential,
        query_text: &str,
        search_type: SearchType,
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<SearchItem>> {
        let mut query: Query = vec![
            ("q", query_text.to_string()),
            ("type", search_type.as_str().to_string()),
        ];
        query.extend(self.market_query("market"));
        push_paging(&mut query, limit, offset);

        let response: SearchResponse = self.get_json(credential, "/search", query).await?;

        Ok(response.into_items(search_type).unwrap_or_else(|| {
            debug!(search_type = search_type.as_str(), "Search response has no matching section");
            PagingObject {
                items: Vec::new(),
                limit,
                offset,
                total: 0,
                next: None,
                previous: None,
            }
        }))
    }

    #[instrument(skip(self, credential))]
    pub async fn new_releases(
        &self,
        credential: &Credential,
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<SimplifiedAlbum>> {
        let mut query = self.market_query("country");
        push_paging(&mut query, limit, offset);

        let response: NewReleasesResponse = self
            .get_json(credential, "/browse/new-releases", query)
            .await?;
        Ok(response.albums)
    }

    #[instrument(skip(self, credential))]
    pub async fn featured_playlists(
        &self,
        credential: &Credential,
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<SimplifiedPlaylist>> {
        let mut query = self.market_query("country");
        push_paging(&mut query, limit, offset);

        let response: PlaylistsResponse = self
            .get_json(credential, "/browse/featured-playlists", query)
            .await?;
        Ok(response.playlists)
    }

    #[instrument(skip(self, credential))]
    pub async fn categories(
        &self,
        credential: &Credential,
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<Category>> {
        let mut query = self.market_query("country");
        push_paging(&mut query, limit, offset);

        let response: CategoriesResponse = self
            .get_json(credential, "/browse/categories", query)
            .await?;
        Ok(response.categories)
    }

    #[instrument(skip(self, credential))]
    pub async fn category_playlists(
        &self,
        credential: &Credential,
        category_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<PagingObject<SimplifiedPlaylist>> {
        let path = format!(
            "/browse/categories/{}/playlists",
            urlencoding::encode(category_id)
        );
        let mut query = self.market_query("country");
        push_paging(&mut query, limit, offset);

        let response: PlaylistsResponse = self.get_json(credential, &path, query).await?;
        Ok(response.playlists)
    }

    // ----- plumbing -----

    fn market_query(&self, key: &'static str) -> Query {
        self.market
            .iter()
            .map(|market| (key, market.clone()))
            .collect()
    }

    fn url(&self, path: &str, query: &Query) -> String {
        if query.is_empty() {
            return format!("{}{}", self.base_url, path);
        }

        let encoded: Vec<String> = query
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        format!("{}{}?{}", self.base_url, path, encoded.join("&"))
    }

    /// Single GET attempt; the response is decoded or mapped to an error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: Query,
    ) -> Result<T> {
        let url = self.url(path, &query);
        debug!(url = %url, "GET");

        let request = HttpRequest::get(url)
            .header("Authorization", credential.authorization_header())
            .header("Accept", "application/json")
            .timeout(self.timeout);

        let response = self.http_client.execute(request).await?;
        decode_response(&response)
    }
}

fn push_paging(query: &mut Query, limit: u32, offset: u32) {
    query.push(("limit", limit.to_string()));
    query.push(("offset", offset.to_string()));
}

impl std::fmt::Debug for CatalogConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConnector")
            .field("base_url", &self.base_url)
            .field("market", &self.market)
            .field("timeout", &self.timeout)
            .finish()
    }
}
