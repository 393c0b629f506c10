//! Endpoints catalogue de la Web API (albums, artistes, playlists, browse, search)
//!
//! Les structures de réponse sont volontairement permissives : presque tous
//! les champs ont une valeur par défaut, la Web API omettant ou mettant à
//! `null` de nombreux champs selon le contexte.

use super::{Page, SpotifyApi};
use crate::error::Result;
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// Image (pochette, photo d'artiste, vignette de catégorie)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Première image d'une liste (la plus grande chez Spotify)
pub fn first_image(images: &[Image]) -> Option<String> {
    images
        .iter()
        .map(|i| i.url.as_str())
        .find(|url| !url.is_empty())
        .map(str::to_string)
}

/// Tolère `"images": null`
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Artiste simplifié (dans une piste ou un album)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

/// Artiste complet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Album simplifié
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub available_markets: Option<Vec<String>>,
}

/// Album complet avec sa première page de pistes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub tracks: Page<Track>,
}

impl Album {
    pub fn to_ref(&self) -> AlbumRef {
        AlbumRef {
            id: self.id.clone(),
            name: self.name.clone(),
            uri: self.uri.clone(),
            artists: self.artists.clone(),
            images: self.images.clone(),
            release_date: None,
            available_markets: None,
        }
    }
}

/// Piste
///
/// `album` est absent pour les pistes obtenues via `/albums/{id}/tracks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    /// Absent quand la requête précise `market`
    #[serde(default)]
    pub available_markets: Option<Vec<String>>,
    #[serde(default)]
    pub is_playable: Option<bool>,
    #[serde(default)]
    pub is_local: bool,
}

/// Album sauvegardé dans la bibliothèque
#[derive(Debug, Clone, Deserialize)]
pub struct SavedAlbum {
    pub album: Album,
}

/// Piste sauvegardée dans la bibliothèque
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTrack {
    pub track: Track,
}

/// Entrée d'une playlist (la piste peut être `null`)
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrack {
    #[serde(default)]
    pub track: Option<Track>,
}

/// Entrée de l'historique d'écoute
#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
}

/// Propriétaire d'une playlist
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Playlist simplifiée
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub owner: Owner,
}

/// Playlist complète avec sa première page de pistes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FullPlaylist {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub tracks: Page<PlaylistTrack>,
}

/// Catégorie de la rubrique "Browse"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub icons: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct FeaturedPlaylistsResponse {
    #[serde(default)]
    playlists: Page<Playlist>,
}

#[derive(Debug, Deserialize)]
struct NewReleasesResponse {
    #[serde(default)]
    albums: Page<AlbumRef>,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Page<Category>,
}

#[derive(Debug, Deserialize)]
struct CategoryPlaylistsResponse {
    #[serde(default)]
    playlists: Page<Playlist>,
}

#[derive(Debug, Deserialize)]
struct TopTracksResponse {
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct RelatedArtistsResponse {
    #[serde(default)]
    artists: Vec<Artist>,
}

/// Résultats de recherche (une page par type)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub artists: Option<Page<Artist>>,
    #[serde(default)]
    pub albums: Option<Page<AlbumRef>>,
    #[serde(default)]
    pub playlists: Option<Page<Playlist>>,
    #[serde(default)]
    pub tracks: Option<Page<Track>>,
}

/// Paramètre `market` : le marché connu, sinon celui du token
fn market_param(market: Option<&str>) -> &str {
    market.filter(|m| !m.is_empty()).unwrap_or("from_token")
}

impl SpotifyApi {
    // ============ Browse ============

    /// Playlists mises en avant (première page)
    pub async fn get_featured_playlists(&self) -> Result<Vec<Playlist>> {
        debug!("Fetching featured playlists");
        let page = self
            .get_wrapped_page("/browse/featured-playlists", &[], 0, |r: FeaturedPlaylistsResponse| {
                r.playlists
            })
            .await?;
        Ok(page.items)
    }

    /// Nouveautés (première page)
    pub async fn get_new_releases(&self) -> Result<Vec<AlbumRef>> {
        debug!("Fetching new releases");
        let page = self
            .get_wrapped_page("/browse/new-releases", &[], 0, |r: NewReleasesResponse| r.albums)
            .await?;
        Ok(page.items)
    }

    /// Catégories (première page)
    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        debug!("Fetching categories");
        let page = self
            .get_wrapped_page("/browse/categories", &[], 0, |r: CategoriesResponse| {
                r.categories
            })
            .await?;
        Ok(page.items)
    }

    /// Toutes les playlists d'une catégorie
    pub async fn get_category_playlists(&self, category_id: &str) -> Result<Vec<Playlist>> {
        debug!("Fetching playlists of category {}", category_id);
        self.get_all_wrapped(
            &format!("/browse/categories/{}/playlists", category_id),
            &[],
            |r: CategoryPlaylistsResponse| r.playlists,
        )
        .await
    }

    // ============ Playlists ============

    /// En-tête d'une playlist (nom, pochette, première page de pistes)
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<FullPlaylist> {
        debug!("Fetching playlist {}", playlist_id);
        self.get(&format!("/playlists/{}", playlist_id), &[]).await
    }

    /// Toutes les pistes d'une playlist, dans l'ordre, sans les entrées vides
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        debug!("Fetching tracks of playlist {}", playlist_id);
        let entries: Vec<PlaylistTrack> = self
            .get_all(&format!("/playlists/{}/tracks", playlist_id), &[])
            .await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.track)
            .filter(|track| !track.uri.is_empty())
            .collect())
    }

    // ============ Albums ============

    pub async fn get_album(&self, album_id: &str) -> Result<Album> {
        debug!("Fetching album {}", album_id);
        self.get(&format!("/albums/{}", album_id), &[]).await
    }

    /// Toutes les pistes d'un album (sans objet `album` imbriqué)
    pub async fn get_album_tracks(&self, album_id: &str) -> Result<Vec<Track>> {
        debug!("Fetching tracks of album {}", album_id);
        self.get_all(&format!("/albums/{}/tracks", album_id), &[])
            .await
    }

    // ============ Artistes ============

    pub async fn get_artist(&self, artist_id: &str) -> Result<Artist> {
        debug!("Fetching artist {}", artist_id);
        self.get(&format!("/artists/{}", artist_id), &[]).await
    }

    pub async fn get_artist_top_tracks(
        &self,
        artist_id: &str,
        market: Option<&str>,
    ) -> Result<Vec<Track>> {
        debug!("Fetching top tracks of artist {}", artist_id);
        let response: TopTracksResponse = self
            .get(
                &format!("/artists/{}/top-tracks", artist_id),
                &[("market", market_param(market))],
            )
            .await?;
        Ok(response.tracks)
    }

    /// Albums et singles d'un artiste
    pub async fn get_artist_albums(&self, artist_id: &str) -> Result<Vec<AlbumRef>> {
        debug!("Fetching albums of artist {}", artist_id);
        self.get_all(
            &format!("/artists/{}/albums", artist_id),
            &[("include_groups", "album,single")],
        )
        .await
    }

    pub async fn get_related_artists(&self, artist_id: &str) -> Result<Vec<Artist>> {
        debug!("Fetching artists related to {}", artist_id);
        let response: RelatedArtistsResponse = self
            .get(&format!("/artists/{}/related-artists", artist_id), &[])
            .await?;
        Ok(response.artists)
    }

    // ============ Pistes / recherche ============

    pub async fn get_track(&self, track_id: &str) -> Result<Track> {
        debug!("Fetching track {}", track_id);
        self.get(&format!("/tracks/{}", track_id), &[]).await
    }

    /// Recherche multi-types, une page par type
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        debug!("Searching for '{}'", query);
        let limit = super::PAGE_LIMIT.to_string();
        self.get(
            "/search",
            &[
                ("q", query),
                ("type", "artist,album,playlist,track"),
                ("limit", limit.as_str()),
            ],
        )
        .await
    }
}
