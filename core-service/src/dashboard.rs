//! Composite home screen data.

use provider_catalog_api::types::{SimplifiedAlbum, SimplifiedPlaylist};
use serde::Serialize;

/// Everything the home screen shows, fetched in one go.
///
/// A section whose fetch failed is empty; see the `FetchFailed` events for
/// the reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HomeDashboard {
    pub new_releases: Vec<SimplifiedAlbum>,
    pub featured_playlists: Vec<SimplifiedPlaylist>,
    /// Only categories whose playlists were fetched, in category order.
    pub categories: Vec<CategoryPlaylists>,
}

/// A browse category together with its playlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPlaylists {
    pub id: String,
    pub name: String,
    pub playlists: Vec<SimplifiedPlaylist>,
}
