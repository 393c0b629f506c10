//! Page artiste : pipeline d'étapes indépendantes
//!
//! Chaque étape (titres populaires, albums, fiche, artistes similaires) est
//! récupérée séparément ; une étape en échec est journalisée et notée dans
//! [`ArtistPage::failed`] sans empêcher l'assemblage des autres.

use super::mapping::{album_item, artist_item, filter_by_market, song_items};
use crate::api::SpotifyApi;
use crate::api::catalog::{AlbumRef, Artist, Track, first_image};
use crate::error::Result;
use crate::models::{AudioQuality, NavigationInfo, NavigationList, NavigationNode, SERVICE_NAME};
use std::fmt;
use tracing::warn;

/// Étapes de construction de la page artiste, dans l'ordre d'affichage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistStage {
    TopTracks,
    Albums,
    Info,
    RelatedArtists,
}

impl fmt::Display for ArtistStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtistStage::TopTracks => "top tracks",
            ArtistStage::Albums => "albums",
            ArtistStage::Info => "artist info",
            ArtistStage::RelatedArtists => "related artists",
        };
        f.write_str(name)
    }
}

/// Page artiste assemblée
#[derive(Debug, Clone)]
pub struct ArtistPage {
    pub node: NavigationNode,
    /// Étapes en échec (page partielle si non vide)
    pub failed: Vec<ArtistStage>,
}

impl ArtistPage {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Résultats bruts des étapes
struct StageResults {
    top_tracks: Result<Vec<Track>>,
    albums: Result<Vec<AlbumRef>>,
    info: Result<Artist>,
    related: Result<Vec<Artist>>,
}

async fn fetch_stages(api: &SpotifyApi, artist_id: &str, market: Option<&str>) -> StageResults {
    let (top_tracks, albums, info, related) = tokio::join!(
        api.get_artist_top_tracks(artist_id, market),
        api.get_artist_albums(artist_id),
        api.get_artist(artist_id),
        api.get_related_artists(artist_id),
    );
    StageResults {
        top_tracks,
        albums,
        info,
        related,
    }
}

/// Garde la valeur d'une étape, ou note son échec
fn stage<T>(
    artist_id: &str,
    stage: ArtistStage,
    result: Result<T>,
    failed: &mut Vec<ArtistStage>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Artist {}: {} unavailable: {}", artist_id, stage, e);
            failed.push(stage);
            None
        }
    }
}

/// Construit la page d'un artiste
pub async fn artist_page(
    api: &SpotifyApi,
    quality: &AudioQuality,
    artist_id: &str,
    prev: &str,
) -> ArtistPage {
    let market = api.user_country().await;
    let results = fetch_stages(api, artist_id, market.as_deref()).await;

    let mut failed = Vec::new();
    let mut node = NavigationNode::with_prev(prev);

    if let Some(tracks) = stage(artist_id, ArtistStage::TopTracks, results.top_tracks, &mut failed)
    {
        let tracks = filter_by_market(tracks, market.as_deref());
        node.lists.push(NavigationList::tracks(
            Some("Top tracks"),
            song_items(&tracks, None, quality),
        ));
    }

    if let Some(albums) = stage(artist_id, ArtistStage::Albums, results.albums, &mut failed) {
        node.lists.push(NavigationList::folders(
            Some("Albums"),
            albums.iter().map(album_item).collect(),
        ));
    }

    if let Some(artist) = stage(artist_id, ArtistStage::Info, results.info, &mut failed) {
        node.info = Some(NavigationInfo {
            uri: format!("spotify:artist:{}", artist_id),
            title: artist.name.clone(),
            service: SERVICE_NAME.to_string(),
            kind: "artist".to_string(),
            albumart: first_image(&artist.images),
            artist: None,
        });
    }

    if let Some(related) = stage(
        artist_id,
        ArtistStage::RelatedArtists,
        results.related,
        &mut failed,
    ) {
        node.lists.push(NavigationList::folders(
            Some("Related Artists"),
            related.iter().map(artist_item).collect(),
        ));
    }

    ArtistPage { node, failed }
}
