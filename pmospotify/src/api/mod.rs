//! Couche d'accès à la Web API Spotify
//!
//! Interface bas-niveau limitée aux endpoints utilisés par la navigation et
//! l'explosion d'URI. Chaque requête obtient d'abord un access token valide
//! auprès du [`TokenManager`].

pub mod auth;
pub mod catalog;
pub mod user;

use crate::config::WebApiSettings;
use crate::error::{Result, SpotifyError};
use auth::TokenManager;
use reqwest::{Client, Response, StatusCode};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// URL de base par défaut de la Web API
pub const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Taille de page demandée à la Web API
pub const PAGE_LIMIT: usize = 50;

/// Nombre maximum de pages suivies pour une même liste
const MAX_PAGES: usize = 40;

/// Page d'une liste paginée par offset
///
/// Les éléments `null` (pistes supprimées, playlists inaccessibles) sont
/// écartés au décodage.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default, deserialize_with = "skip_nulls")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next: None,
            total: None,
            offset: None,
        }
    }
}

fn skip_nulls<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// Client bas-niveau de la Web API
pub struct SpotifyApi {
    client: Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    /// Marché forcé par la configuration
    configured_country: Option<String>,
    /// Marché de l'utilisateur, mémorisé au premier succès
    country: OnceCell<String>,
}

impl std::fmt::Debug for SpotifyApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyApi")
            .field("base_url", &self.base_url)
            .field("configured_country", &self.configured_country)
            .finish()
    }
}

impl SpotifyApi {
    /// Crée un client vers `base_url`
    pub fn new(
        base_url: impl AsRef<str>,
        tokens: Arc<TokenManager>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            tokens,
            configured_country: None,
            country: OnceCell::new(),
        })
    }

    pub fn from_settings(settings: &WebApiSettings, tokens: Arc<TokenManager>) -> Result<Self> {
        let api = Self::new(
            &settings.base_url,
            tokens,
            Duration::from_secs(settings.request_timeout_secs),
        )?;
        Ok(api.with_country(settings.country()))
    }

    /// Force le marché utilisé pour le filtrage
    pub fn with_country(mut self, country: Option<&str>) -> Self {
        self.configured_country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Marché de l'utilisateur (configuration, sinon profil `/me`)
    ///
    /// `None` si le profil est inaccessible : le filtrage laisse alors tout
    /// passer. Un échec n'est pas mémorisé.
    pub async fn user_country(&self) -> Option<String> {
        if let Some(country) = &self.configured_country {
            return Some(country.clone());
        }

        let result = self
            .country
            .get_or_try_init(|| async {
                let profile = self.me().await?;
                profile
                    .country
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| SpotifyError::Other("profile without country".to_string()))
            })
            .await;

        match result {
            Ok(country) => Some(country.clone()),
            Err(e) => {
                warn!("Unable to determine the user market: {}", e);
                None
            }
        }
    }

    /// Effectue une requête GET authentifiée
    ///
    /// Un 401 invalide le token et la requête est rejouée une fois.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} with {} params", url, params.len());

        let token = self.tokens.ensure_valid_token().await?;
        let response = self.send(&url, params, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Access token rejected for {}, retrying once", endpoint);
            self.tokens.invalidate().await;
            let token = self.tokens.ensure_valid_token().await?;
            let retry = self.send(&url, params, &token).await?;
            return self.handle_response(retry).await;
        }

        self.handle_response(response).await
    }

    async fn send(&self, url: &str, params: &[(&str, &str)], token: &str) -> Result<Response> {
        Ok(self
            .client
            .get(url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await?)
    }

    /// Traite la réponse HTTP
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let status_code = status.as_u16();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Web API error ({}): {}", status_code, error_text);
            return Err(SpotifyError::from_status_code(status_code, error_text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse Web API response: {}", e);
            SpotifyError::Json(e)
        })
    }

    /// Récupère une page à un offset donné
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        offset: usize,
    ) -> Result<Page<T>> {
        self.get_wrapped_page(endpoint, params, offset, |page: Page<T>| page)
            .await
    }

    pub(crate) async fn get_wrapped_page<R, T, F>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        offset: usize,
        extract: F,
    ) -> Result<Page<T>>
    where
        R: DeserializeOwned,
        F: Fn(R) -> Page<T>,
    {
        let limit = PAGE_LIMIT.to_string();
        let offset = offset.to_string();
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("limit", limit.as_str()));
        query.push(("offset", offset.as_str()));

        let response: R = self.get(endpoint, &query).await?;
        Ok(extract(response))
    }

    /// Suit la pagination jusqu'au bout d'une liste
    pub(crate) async fn get_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        self.get_all_wrapped(endpoint, params, |page: Page<T>| page)
            .await
    }

    /// Variante de [`Self::get_all`] pour les pages imbriquées
    /// (ex: `{"playlists": {...page...}}`)
    pub(crate) async fn get_all_wrapped<R, T, F>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        extract: F,
    ) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        F: Fn(R) -> Page<T>,
    {
        let mut items = Vec::new();
        // Les offsets de la Web API comptent aussi les éléments null écartés
        let mut offset = 0;

        for _ in 0..MAX_PAGES {
            let page = self
                .get_wrapped_page(endpoint, params, offset, &extract)
                .await?;
            items.extend(page.items);
            offset += PAGE_LIMIT;

            if page.next.is_none() {
                return Ok(items);
            }
        }

        warn!("Stopped paginating {} after {} items", endpoint, items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> SpotifyApi {
        let tokens =
            Arc::new(TokenManager::new("http://127.0.0.1:9", "rt", Duration::from_secs(1)).unwrap());
        SpotifyApi::new("https://api.example/v1/", tokens, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(api().base_url(), "https://api.example/v1");
    }

    #[tokio::test]
    async fn test_configured_country_wins() {
        let api = api().with_country(Some(" fr "));
        assert_eq!(api.user_country().await.as_deref(), Some("FR"));

        let blank = self::api().with_country(Some(""));
        assert_eq!(blank.configured_country, None);
    }

    #[test]
    fn test_page_skips_null_items() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"items":[1,null,3],"next":null,"total":3}"#).unwrap();
        assert_eq!(page.items, vec![1, 3]);
        assert!(page.next.is_none());

        let empty: Page<u32> = serde_json::from_str(r#"{"items":null}"#).unwrap();
        assert!(empty.items.is_empty());
    }
}
