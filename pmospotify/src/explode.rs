//! Explosion d'une URI du catalogue en liste de pistes jouables
//!
//! Utilisé par la file de lecture de l'hôte : une URI d'album, d'artiste ou
//! de playlist devient la suite ordonnée de ses pistes.

use crate::api::SpotifyApi;
use crate::browse::mapping::{filter_by_market, track_descriptor, track_descriptors};
use crate::error::{Result, SpotifyError};
use crate::models::{AudioQuality, TrackDescriptor};
use crate::uri::{SpotifyUri, track_uri};
use std::sync::Arc;
use tracing::{debug, warn};

/// Alias local : toutes les pistes de toutes les playlists de l'utilisateur
pub const ALL_PLAYLISTS_URI: &str = "spotify/playlists";

/// Résolution URI -> pistes
#[derive(Debug, Clone)]
pub struct Exploder {
    api: Arc<SpotifyApi>,
    quality: AudioQuality,
}

impl Exploder {
    pub fn new(api: Arc<SpotifyApi>, quality: AudioQuality) -> Self {
        Self { api, quality }
    }

    /// Retourne les pistes désignées par `uri`, dans l'ordre de la Web API
    ///
    /// # Errors
    ///
    /// * `SpotifyError::UnsupportedUri` - URI non reconnue
    /// * erreurs de la Web API pour la ressource demandée
    pub async fn explode(&self, uri: &str) -> Result<Vec<TrackDescriptor>> {
        debug!(uri = %uri, "Exploding URI");

        if uri.trim() == ALL_PLAYLISTS_URI {
            return self.all_playlists().await;
        }

        let Some(target) = SpotifyUri::parse(uri) else {
            warn!("Cannot explode unsupported URI: {}", uri);
            return Err(SpotifyError::UnsupportedUri(uri.to_string()));
        };

        let result = match &target {
            SpotifyUri::Track(id) => self.track(id).await,
            SpotifyUri::Album(id) => self.album(id).await,
            SpotifyUri::Artist(id) => self.artist(id).await,
            SpotifyUri::Playlist(id) | SpotifyUri::UserPlaylist { id, .. } => {
                self.playlist(id).await
            }
        };

        if let Err(e) = &result {
            warn!("Failed to explode {}: {}", target, e);
        }
        result
    }

    /// Une piste seule n'est pas filtrée par marché : elle a été demandée
    /// explicitement. Son URI est toujours celle de l'identifiant demandé.
    async fn track(&self, track_id: &str) -> Result<Vec<TrackDescriptor>> {
        let mut track = self.api.get_track(track_id).await?;
        track.uri = track_uri(track_id);
        track.is_local = false;
        Ok(track_descriptor(&track, None, &self.quality)
            .into_iter()
            .collect())
    }

    async fn album(&self, album_id: &str) -> Result<Vec<TrackDescriptor>> {
        let (album, tracks) = tokio::join!(
            self.api.get_album(album_id),
            self.api.get_album_tracks(album_id)
        );
        let album = album?.to_ref();
        let market = self.api.user_country().await;
        let tracks = filter_by_market(tracks?, market.as_deref());
        Ok(track_descriptors(&tracks, Some(&album), &self.quality))
    }

    async fn artist(&self, artist_id: &str) -> Result<Vec<TrackDescriptor>> {
        let market = self.api.user_country().await;
        let tracks = self
            .api
            .get_artist_top_tracks(artist_id, market.as_deref())
            .await?;
        let tracks = filter_by_market(tracks, market.as_deref());
        Ok(track_descriptors(&tracks, None, &self.quality))
    }

    async fn playlist(&self, playlist_id: &str) -> Result<Vec<TrackDescriptor>> {
        let tracks = self.api.get_playlist_tracks(playlist_id).await?;
        let market = self.api.user_country().await;
        let tracks = filter_by_market(tracks, market.as_deref());
        Ok(track_descriptors(&tracks, None, &self.quality))
    }

    /// Playlists parcourues dans l'ordre ; une playlist illisible est sautée
    async fn all_playlists(&self) -> Result<Vec<TrackDescriptor>> {
        let playlists = self.api.get_my_playlists().await.inspect_err(|e| {
            warn!("Failed to list user playlists: {}", e);
        })?;

        let mut descriptors = Vec::new();
        for playlist in &playlists {
            match self.playlist(&playlist.id).await {
                Ok(tracks) => descriptors.extend(tracks),
                Err(e) => warn!("Skipping playlist {}: {}", playlist.uri, e),
            }
        }
        Ok(descriptors)
    }
}
