//! Catalog API response types
//!
//! Data structures for deserializing catalog Web API responses. Only the
//! fields the client uses are modelled; unknown fields are ignored.

use core_catalog::RemotePage;
use serde::{Deserialize, Serialize};

/// Offset/limit paging wrapper used by every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingObject<T> {
    pub items: Vec<T>,
    pub limit: u32,
    pub offset: u32,
    pub total: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> PagingObject<T> {
    /// Items remaining after this page: `total - (offset + items.len())`.
    pub fn items_after(&self) -> u32 {
        let seen = u64::from(self.offset) + self.items.len() as u64;
        u32::try_from(u64::from(self.total).saturating_sub(seen)).unwrap_or(u32::MAX)
    }

    pub fn into_remote_page(self) -> RemotePage<T> {
        RemotePage::from_total(self.items, self.offset, self.total)
    }

    pub fn map<U, F>(self, f: F) -> PagingObject<U>
    where
        F: FnMut(T) -> U,
    {
        PagingObject {
            items: self.items.into_iter().map(f).collect(),
            limit: self.limit,
            offset: self.offset,
            total: self.total,
            next: self.next,
            previous: self.previous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub followers: Option<Followers>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedAlbum {
    pub id: String,
    pub name: String,
    pub album_type: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub album_type: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub tracks: PagingObject<SimplifiedTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedTrack {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    pub album: SimplifiedAlbum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Track count reference embedded in simplified playlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracksRef {
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub tracks: Option<TracksRef>,
}

/// Playlist entry. `track` is absent for local files and removed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub followers: Option<Followers>,
    pub tracks: PagingObject<PlaylistTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedShow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub total_episodes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub total_episodes: Option<u32>,
    pub episodes: PagingObject<SimplifiedEpisode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedEpisode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_ms: u64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icons: Vec<Image>,
}

/// `GET /browse/new-releases`
#[derive(Debug, Deserialize)]
pub struct NewReleasesResponse {
    pub albums: PagingObject<SimplifiedAlbum>,
}

/// `GET /browse/featured-playlists` and `GET /browse/categories/{id}/playlists`
#[derive(Debug, Deserialize)]
pub struct PlaylistsResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub playlists: PagingObject<SimplifiedPlaylist>,
}

/// `GET /browse/categories`
#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    pub categories: PagingObject<Category>,
}

/// `GET /artists/{id}/top-tracks`
#[derive(Debug, Deserialize)]
pub struct TopTracksResponse {
    pub tracks: Vec<Track>,
}

/// `GET /search`; only the section matching the requested type is present.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub albums: Option<PagingObject<SimplifiedAlbum>>,
    #[serde(default)]
    pub artists: Option<PagingObject<Artist>>,
    #[serde(default)]
    pub playlists: Option<PagingObject<SimplifiedPlaylist>>,
    #[serde(default)]
    pub tracks: Option<PagingObject<Track>>,
    #[serde(default)]
    pub shows: Option<PagingObject<SimplifiedShow>>,
    #[serde(default)]
    pub episodes: Option<PagingObject<SimplifiedEpisode>>,
}

impl SearchResponse {
    /// Extracts the section for `search_type` as uniform [`SearchItem`]s.
    pub fn into_items(self, search_type: SearchType) -> Option<PagingObject<SearchItem>> {
        match search_type {
            SearchType::Album => self.albums.map(|page| page.map(SearchItem::Album)),
            SearchType::Artist => self.artists.map(|page| page.map(SearchItem::Artist)),
            SearchType::Playlist => self.playlists.map(|page| page.map(SearchItem::Playlist)),
            SearchType::Track => self.tracks.map(|page| page.map(SearchItem::Track)),
            SearchType::Show => self.shows.map(|page| page.map(SearchItem::Show)),
            SearchType::Episode => self.episodes.map(|page| page.map(SearchItem::Episode)),
        }
    }
}

/// Kinds of search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchType {
    Album,
    Artist,
    Playlist,
    Track,
    Show,
    Episode,
}

impl SearchType {
    /// Value of the `type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Album => "album",
            SearchType::Artist => "artist",
            SearchType::Playlist => "playlist",
            SearchType::Track => "track",
            SearchType::Show => "show",
            SearchType::Episode => "episode",
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "item", rename_all = "snake_case")]
pub enum SearchItem {
    Album(SimplifiedAlbum),
    Artist(Artist),
    Playlist(SimplifiedPlaylist),
    Track(Track),
    Show(SimplifiedShow),
    Episode(SimplifiedEpisode),
}

impl SearchItem {
    pub fn id(&self) -> &str {
        match self {
            SearchItem::Album(album) => &album.id,
            SearchItem::Artist(artist) => &artist.id,
            SearchItem::Playlist(playlist) => &playlist.id,
            SearchItem::Track(track) => &track.id,
            SearchItem::Show(show) => &show.id,
            SearchItem::Episode(episode) => &episode.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SearchItem::Album(album) => &album.name,
            SearchItem::Artist(artist) => &artist.name,
            SearchItem::Playlist(playlist) => &playlist.name,
            SearchItem::Track(track) => &track.name,
            SearchItem::Show(show) => &show.name,
            SearchItem::Episode(episode) => &episode.name,
        }
    }
}

/// Album groups accepted by the artist-albums endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlbumGroup {
    Album,
    Single,
    AppearsOn,
    Compilation,
}

impl AlbumGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumGroup::Album => "album",
            AlbumGroup::Single => "single",
            AlbumGroup::AppearsOn => "appears_on",
            AlbumGroup::Compilation => "compilation",
        }
    }
}
