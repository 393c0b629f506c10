//! Conversion des objets de la Web API en éléments de navigation
//!
//! Le filtrage par marché est centralisé ici : tous les résolveurs et
//! l'explosion d'URI passent par [`is_available_in`].

use crate::api::catalog::{AlbumRef, Artist, Category, Playlist, Track, first_image};
use crate::models::{
    AudioQuality, DEFAULT_ALBUMART, NavigationEntry, NavigationItem, SERVICE_NAME, TRACK_TYPE,
    TrackDescriptor,
};

/// Une piste est gardée si son marché est inconnu, si elle ne précise pas
/// ses marchés, ou si ses marchés contiennent celui de l'utilisateur.
pub fn is_available_in(track: &Track, market: Option<&str>) -> bool {
    match (market, track.available_markets.as_deref()) {
        (Some(market), Some(markets)) if !markets.is_empty() => {
            markets.iter().any(|m| m.eq_ignore_ascii_case(market))
        }
        _ => true,
    }
}

/// Filtre une liste de pistes par marché, en conservant l'ordre
pub fn filter_by_market(tracks: Vec<Track>, market: Option<&str>) -> Vec<Track> {
    tracks
        .into_iter()
        .filter(|t| is_available_in(t, market))
        .collect()
}

/// Artistes joints par `", "`
pub fn artist_names(track: &Track) -> String {
    track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convertit une piste en descripteur jouable
///
/// `album` sert de repli pour les pistes d'album, qui n'embarquent pas
/// leur album. Les pistes locales ou sans URI sont écartées.
pub fn track_descriptor(
    track: &Track,
    album: Option<&AlbumRef>,
    quality: &AudioQuality,
) -> Option<TrackDescriptor> {
    if track.is_local || track.uri.is_empty() {
        return None;
    }

    let album = track.album.as_ref().or(album);
    let albumart = album
        .and_then(|a| first_image(&a.images))
        .unwrap_or_else(|| DEFAULT_ALBUMART.to_string());

    Some(TrackDescriptor {
        service: SERVICE_NAME.to_string(),
        name: track.name.clone(),
        title: track.name.clone(),
        artist: artist_names(track),
        album: album.map(|a| a.name.clone()).unwrap_or_default(),
        albumart,
        uri: track.uri.clone(),
        duration: track.duration_ms / 1000,
        samplerate: quality.samplerate_label(),
        bitdepth: quality.bitdepth_label(),
        bitrate: quality.bitrate_label(),
        track_type: TRACK_TYPE.to_string(),
    })
}

/// Descripteurs d'une liste de pistes, dans l'ordre
pub fn track_descriptors(
    tracks: &[Track],
    album: Option<&AlbumRef>,
    quality: &AudioQuality,
) -> Vec<TrackDescriptor> {
    tracks
        .iter()
        .filter_map(|t| track_descriptor(t, album, quality))
        .collect()
}

pub fn song_items(
    tracks: &[Track],
    album: Option<&AlbumRef>,
    quality: &AudioQuality,
) -> Vec<NavigationItem> {
    track_descriptors(tracks, album, quality)
        .into_iter()
        .map(NavigationItem::Song)
        .collect()
}

pub fn playlist_item(playlist: &Playlist) -> NavigationItem {
    NavigationItem::Playlist(NavigationEntry::new(
        playlist.name.as_str(),
        playlist.uri.as_str(),
        first_image(&playlist.images),
    ))
}

pub fn album_item(album: &AlbumRef) -> NavigationItem {
    let title = match album.artists.first() {
        Some(artist) if !artist.name.is_empty() => format!("{} - {}", album.name, artist.name),
        _ => album.name.clone(),
    };
    NavigationItem::Folder(NavigationEntry::new(
        title,
        album.uri.as_str(),
        first_image(&album.images),
    ))
}

pub fn artist_item(artist: &Artist) -> NavigationItem {
    NavigationItem::Folder(NavigationEntry::new(
        artist.name.as_str(),
        artist.uri.as_str(),
        first_image(&artist.images),
    ))
}

pub fn category_item(category: &Category) -> NavigationItem {
    NavigationItem::SpotifyCategory(NavigationEntry::new(
        category.name.as_str(),
        format!("spotify/categories/{}", category.id),
        first_image(&category.icons),
    ))
}
