//! Navigation dans le catalogue Spotify
//!
//! [`BrowseResolver::resolve`] associe chaque URI de navigation à un nœud
//! [`NavigationNode`] construit depuis la Web API :
//!
//! | URI | Contenu |
//! |-----|---------|
//! | `spotify` | racine (menu + playlists mises en avant, nouveautés, catégories), en cache |
//! | `spotify/playlists` | playlists de l'utilisateur |
//! | `spotify/myalbums`, `spotify/mytracks` | bibliothèque |
//! | `spotify/mytopartists`, `spotify/mytoptracks` | tops personnels |
//! | `spotify/myrecentlyplayedtracks` | historique |
//! | `spotify/featuredplaylists`, `spotify/new`, `spotify/categories` | rubriques "Browse" |
//! | `spotify/categories/<id>` | playlists d'une catégorie |
//! | `spotify:album:<id>`, `spotify:artist:<id>`, `spotify:playlist:<id>`, `spotify:user:<u>:playlist:<id>` | pages catalogue |
//!
//! Une erreur de la Web API produit une liste vide (ou partielle) et un
//! avertissement dans les logs ; seule une URI inconnue est une erreur.

pub mod artist;
pub mod cache;
pub mod mapping;

use crate::api::SpotifyApi;
use crate::api::catalog::{Playlist, Track, first_image};
use crate::error::{Result, SpotifyError};
use crate::models::{
    AudioQuality, NavigationEntry, NavigationInfo, NavigationItem, NavigationList,
    NavigationNode, SERVICE_NAME,
};
use crate::uri::SpotifyUri;
use artist::ArtistPage;
use cache::BrowseCache;
use mapping::{album_item, artist_item, category_item, filter_by_market, playlist_item, song_items};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Racine de l'arborescence
pub const ROOT_URI: &str = "spotify";

const MY_PLAYLISTS_URI: &str = "spotify/playlists";
const MY_ALBUMS_URI: &str = "spotify/myalbums";
const MY_TRACKS_URI: &str = "spotify/mytracks";
const MY_TOP_ARTISTS_URI: &str = "spotify/mytopartists";
const MY_TOP_TRACKS_URI: &str = "spotify/mytoptracks";
const RECENTLY_PLAYED_URI: &str = "spotify/myrecentlyplayedtracks";
const FEATURED_URI: &str = "spotify/featuredplaylists";
const NEW_RELEASES_URI: &str = "spotify/new";
const CATEGORIES_URI: &str = "spotify/categories";

/// Parent de la racine dans l'arborescence de l'hôte
const HOST_ROOT_URI: &str = "/";

/// Destination d'une URI de navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseTarget {
    Root,
    MyPlaylists,
    MyAlbums,
    MyTracks,
    MyTopArtists,
    MyTopTracks,
    RecentlyPlayed,
    FeaturedPlaylists,
    NewReleases,
    Categories,
    Category(String),
    Album(String),
    Artist(String),
    Playlist(String),
}

impl BrowseTarget {
    /// Décode une URI de navigation
    pub fn parse(uri: &str) -> Option<Self> {
        let uri = uri.trim().trim_end_matches('/');
        let target = match uri {
            ROOT_URI => Self::Root,
            MY_PLAYLISTS_URI => Self::MyPlaylists,
            MY_ALBUMS_URI => Self::MyAlbums,
            MY_TRACKS_URI => Self::MyTracks,
            MY_TOP_ARTISTS_URI => Self::MyTopArtists,
            MY_TOP_TRACKS_URI => Self::MyTopTracks,
            RECENTLY_PLAYED_URI => Self::RecentlyPlayed,
            FEATURED_URI => Self::FeaturedPlaylists,
            NEW_RELEASES_URI => Self::NewReleases,
            CATEGORIES_URI => Self::Categories,
            other => {
                if let Some(id) = other.strip_prefix("spotify/categories/") {
                    if id.is_empty() || id.contains('/') {
                        return None;
                    }
                    return Some(Self::Category(id.to_string()));
                }
                match SpotifyUri::parse(other)? {
                    SpotifyUri::Album(id) => Self::Album(id),
                    SpotifyUri::Artist(id) => Self::Artist(id),
                    SpotifyUri::Playlist(id) | SpotifyUri::UserPlaylist { id, .. } => {
                        Self::Playlist(id)
                    }
                    SpotifyUri::Track(_) => return None,
                }
            }
        };
        Some(target)
    }

    /// URI du nœud parent
    pub fn prev_uri(&self) -> &'static str {
        match self {
            Self::Root => HOST_ROOT_URI,
            Self::Category(_) => CATEGORIES_URI,
            Self::Playlist(_) => MY_PLAYLISTS_URI,
            _ => ROOT_URI,
        }
    }
}

/// Résolveur de l'arborescence de navigation
#[derive(Debug, Clone)]
pub struct BrowseResolver {
    api: Arc<SpotifyApi>,
    quality: AudioQuality,
    cache: BrowseCache,
}

impl BrowseResolver {
    pub fn new(api: Arc<SpotifyApi>, quality: AudioQuality, cache: BrowseCache) -> Self {
        Self {
            api,
            quality,
            cache,
        }
    }

    /// Résout une URI de navigation
    ///
    /// # Errors
    ///
    /// * `SpotifyError::UnsupportedUri` - URI hors de l'arborescence
    pub async fn resolve(&self, uri: &str) -> Result<NavigationNode> {
        let Some(target) = BrowseTarget::parse(uri) else {
            warn!("Unsupported browse URI: {}", uri);
            return Err(SpotifyError::UnsupportedUri(uri.to_string()));
        };
        debug!(uri = %uri, "Resolving browse target {:?}", target);

        let prev = target.prev_uri();
        let node = match &target {
            BrowseTarget::Root => self.root().await,
            BrowseTarget::MyPlaylists => self.my_playlists(prev).await,
            BrowseTarget::MyAlbums => self.my_albums(prev).await,
            BrowseTarget::MyTracks => self.my_tracks(prev).await,
            BrowseTarget::MyTopArtists => self.my_top_artists(prev).await,
            BrowseTarget::MyTopTracks => self.my_top_tracks(prev).await,
            BrowseTarget::RecentlyPlayed => self.recently_played(prev).await,
            BrowseTarget::FeaturedPlaylists => self.featured_playlists(prev).await,
            BrowseTarget::NewReleases => self.new_releases(prev).await,
            BrowseTarget::Categories => self.categories(prev).await,
            BrowseTarget::Category(id) => self.category_playlists(id, prev).await,
            BrowseTarget::Album(id) => self.album(id, prev).await,
            BrowseTarget::Artist(id) => self.artist_page(id).await.node,
            BrowseTarget::Playlist(id) => self.playlist(id, prev).await,
        };
        Ok(node)
    }

    /// Vide le cache de navigation
    pub fn flush_cache(&self) {
        info!("Flushing Spotify browse cache");
        self.cache.flush();
    }

    // ============ Racine ============

    fn my_spotify_menu() -> NavigationList {
        let entries = [
            ("My Playlists", MY_PLAYLISTS_URI),
            ("My Albums", MY_ALBUMS_URI),
            ("My Tracks", MY_TRACKS_URI),
            ("My Top Artists", MY_TOP_ARTISTS_URI),
            ("My Top Tracks", MY_TOP_TRACKS_URI),
            ("My Recently Played Tracks", RECENTLY_PLAYED_URI),
            ("Featured Playlists", FEATURED_URI),
            ("What's New", NEW_RELEASES_URI),
            ("Genres & Moods", CATEGORIES_URI),
        ];
        NavigationList::folders(
            Some("My Spotify"),
            entries
                .into_iter()
                .map(|(title, uri)| {
                    NavigationItem::StreamingCategory(NavigationEntry::new(title, uri, None))
                })
                .collect(),
        )
    }

    /// Racine : menu statique et trois rubriques live chargées en parallèle
    ///
    /// Une racine dont une rubrique a échoué est servie mais pas mise en cache.
    pub async fn root(&self) -> NavigationNode {
        if let Some(node) = self.cache.get_root().await {
            debug!("Serving browse root from cache");
            return node;
        }

        let (featured, releases, categories) = tokio::join!(
            self.api.get_featured_playlists(),
            self.api.get_new_releases(),
            self.api.get_categories(),
        );

        let mut complete = true;
        let mut node = NavigationNode::with_prev(HOST_ROOT_URI);
        node.lists.push(Self::my_spotify_menu());

        match featured {
            Ok(playlists) => node.lists.push(NavigationList::folders(
                Some("Featured Playlists"),
                playlists.iter().map(playlist_item).collect(),
            )),
            Err(e) => {
                warn!("Root: featured playlists unavailable: {}", e);
                complete = false;
            }
        }

        match releases {
            Ok(albums) => node.lists.push(NavigationList::folders(
                Some("New Releases"),
                albums.iter().map(album_item).collect(),
            )),
            Err(e) => {
                warn!("Root: new releases unavailable: {}", e);
                complete = false;
            }
        }

        match categories {
            Ok(categories) => node.lists.push(NavigationList::folders(
                Some("Genres & Moods"),
                categories.iter().map(category_item).collect(),
            )),
            Err(e) => {
                warn!("Root: categories unavailable: {}", e);
                complete = false;
            }
        }

        if complete {
            self.cache.put_root(node.clone()).await;
        }
        node
    }

    // ============ Bibliothèque ============

    async fn my_playlists(&self, prev: &str) -> NavigationNode {
        match self.api.get_my_playlists().await {
            Ok(playlists) => playlists_node(prev, None, &playlists),
            Err(e) => empty_node(prev, "user playlists", &e),
        }
    }

    async fn my_albums(&self, prev: &str) -> NavigationNode {
        match self.api.get_my_albums().await {
            Ok(albums) => {
                let items = albums.iter().map(|a| album_item(&a.to_ref())).collect();
                folders_node(prev, None, items)
            }
            Err(e) => empty_node(prev, "saved albums", &e),
        }
    }

    async fn my_tracks(&self, prev: &str) -> NavigationNode {
        let result = self.api.get_my_tracks().await;
        self.tracks_node(prev, result, "saved tracks").await
    }

    async fn my_top_artists(&self, prev: &str) -> NavigationNode {
        match self.api.get_my_top_artists().await {
            Ok(artists) => folders_node(prev, None, artists.iter().map(artist_item).collect()),
            Err(e) => empty_node(prev, "top artists", &e),
        }
    }

    async fn my_top_tracks(&self, prev: &str) -> NavigationNode {
        let result = self.api.get_my_top_tracks().await;
        self.tracks_node(prev, result, "top tracks").await
    }

    async fn recently_played(&self, prev: &str) -> NavigationNode {
        let result = self.api.get_recently_played().await;
        self.tracks_node(prev, result, "recently played tracks").await
    }

    // ============ Browse ============

    async fn featured_playlists(&self, prev: &str) -> NavigationNode {
        match self.api.get_featured_playlists().await {
            Ok(playlists) => playlists_node(prev, Some("Featured Playlists"), &playlists),
            Err(e) => empty_node(prev, "featured playlists", &e),
        }
    }

    async fn new_releases(&self, prev: &str) -> NavigationNode {
        match self.api.get_new_releases().await {
            Ok(albums) => folders_node(
                prev,
                Some("New Releases"),
                albums.iter().map(album_item).collect(),
            ),
            Err(e) => empty_node(prev, "new releases", &e),
        }
    }

    async fn categories(&self, prev: &str) -> NavigationNode {
        match self.api.get_categories().await {
            Ok(categories) => folders_node(
                prev,
                Some("Genres & Moods"),
                categories.iter().map(category_item).collect(),
            ),
            Err(e) => empty_node(prev, "categories", &e),
        }
    }

    async fn category_playlists(&self, category_id: &str, prev: &str) -> NavigationNode {
        match self.api.get_category_playlists(category_id).await {
            Ok(playlists) => playlists_node(prev, None, &playlists),
            Err(e) => empty_node(prev, "category playlists", &e),
        }
    }

    // ============ Pages catalogue ============

    async fn album(&self, album_id: &str, prev: &str) -> NavigationNode {
        let (album, tracks) = tokio::join!(
            self.api.get_album(album_id),
            self.api.get_album_tracks(album_id)
        );

        let album = match album {
            Ok(album) => album,
            Err(e) => return empty_node(prev, "album", &e),
        };
        let album_ref = album.to_ref();

        let mut node = NavigationNode::with_prev(prev);
        node.info = Some(NavigationInfo {
            uri: format!("spotify:album:{}", album_id),
            title: album.name.clone(),
            service: SERVICE_NAME.to_string(),
            kind: "album".to_string(),
            albumart: first_image(&album.images),
            artist: album.artists.first().map(|a| a.name.clone()),
        });

        match tracks {
            Ok(tracks) => {
                let market = self.api.user_country().await;
                let tracks = filter_by_market(tracks, market.as_deref());
                node.lists.push(NavigationList::tracks(
                    None,
                    song_items(&tracks, Some(&album_ref), &self.quality),
                ));
            }
            Err(e) => warn!("Album {}: tracks unavailable: {}", album_id, e),
        }
        node
    }

    async fn playlist(&self, playlist_id: &str, prev: &str) -> NavigationNode {
        let (playlist, tracks) = tokio::join!(
            self.api.get_playlist(playlist_id),
            self.api.get_playlist_tracks(playlist_id)
        );

        let tracks = match tracks {
            Ok(tracks) => tracks,
            Err(e) => return empty_node(prev, "playlist tracks", &e),
        };

        let market = self.api.user_country().await;
        let tracks = filter_by_market(tracks, market.as_deref());

        let mut node = NavigationNode::with_prev(prev);
        match playlist {
            Ok(playlist) => {
                node.info = Some(NavigationInfo {
                    uri: playlist.uri.clone(),
                    title: playlist.name.clone(),
                    service: SERVICE_NAME.to_string(),
                    kind: "playlist".to_string(),
                    albumart: first_image(&playlist.images),
                    artist: None,
                });
            }
            Err(e) => warn!("Playlist {}: header unavailable: {}", playlist_id, e),
        }
        node.lists.push(NavigationList::tracks(
            None,
            song_items(&tracks, None, &self.quality),
        ));
        node
    }

    /// Page artiste, avec la liste des étapes en échec
    pub async fn artist_page(&self, artist_id: &str) -> ArtistPage {
        let prev = BrowseTarget::Artist(artist_id.to_string()).prev_uri();
        let page = artist::artist_page(&self.api, &self.quality, artist_id, prev).await;
        if !page.is_complete() {
            warn!(
                "Artist {} served partially, failed stages: {:?}",
                artist_id, page.failed
            );
        }
        page
    }

    // ============ Recherche ============

    /// Recherche multi-types : artistes, albums, playlists puis pistes
    ///
    /// Sections vides omises ; une erreur donne une liste vide.
    pub async fn search(&self, query: &str) -> Vec<NavigationList> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let results = match self.api.search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search '{}' failed: {}", query, e);
                return Vec::new();
            }
        };

        let mut lists = Vec::new();

        if let Some(artists) = results.artists.filter(|p| !p.items.is_empty()) {
            lists.push(NavigationList::folders(
                Some("Spotify Artists"),
                artists.items.iter().map(artist_item).collect(),
            ));
        }
        if let Some(albums) = results.albums.filter(|p| !p.items.is_empty()) {
            lists.push(NavigationList::folders(
                Some("Spotify Albums"),
                albums.items.iter().map(album_item).collect(),
            ));
        }
        if let Some(playlists) = results.playlists.filter(|p| !p.items.is_empty()) {
            lists.push(NavigationList::folders(
                Some("Spotify Playlists"),
                playlists.items.iter().map(playlist_item).collect(),
            ));
        }
        if let Some(tracks) = results.tracks.filter(|p| !p.items.is_empty()) {
            let market = self.api.user_country().await;
            let tracks = filter_by_market(tracks.items, market.as_deref());
            lists.push(NavigationList::tracks(
                Some("Spotify Tracks"),
                song_items(&tracks, None, &self.quality),
            ));
        }

        lists
    }

    /// Liste de pistes filtrée par marché
    async fn tracks_node(
        &self,
        prev: &str,
        result: Result<Vec<Track>>,
        what: &str,
    ) -> NavigationNode {
        match result {
            Ok(tracks) => {
                let market = self.api.user_country().await;
                let tracks = filter_by_market(tracks, market.as_deref());
                let mut node = NavigationNode::with_prev(prev);
                node.lists.push(NavigationList::tracks(
                    None,
                    song_items(&tracks, None, &self.quality),
                ));
                node
            }
            Err(e) => empty_node(prev, what, &e),
        }
    }
}

fn playlists_node(prev: &str, title: Option<&str>, playlists: &[Playlist]) -> NavigationNode {
    folders_node(prev, title, playlists.iter().map(playlist_item).collect())
}

fn folders_node(prev: &str, title: Option<&str>, items: Vec<NavigationItem>) -> NavigationNode {
    let mut node = NavigationNode::with_prev(prev);
    node.lists.push(NavigationList::folders(title, items));
    node
}

/// Nœud vide renvoyé quand la Web API échoue
fn empty_node(prev: &str, what: &str, error: &SpotifyError) -> NavigationNode {
    warn!("Unable to fetch {}: {}", what, error);
    let mut node = NavigationNode::with_prev(prev);
    node.lists.push(NavigationList::folders(None, Vec::new()));
    node
}
