//! Cycle de vie du token OAuth de la Web API
//!
//! Le refresh token longue durée est échangé auprès d'un service tiers contre
//! un access token court. Tous les appels à la Web API passent par
//! [`TokenManager::ensure_valid_token`] : un token n'est jamais utilisé à ou
//! après son expiration, et les rafraîchissements concurrents sont fusionnés
//! en un seul échange.

use crate::config::OAuthSettings;
use crate::error::{Result, SpotifyError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Chemin de l'échange refresh token -> access token
const ACCESS_TOKEN_PATH: &str = "/spotify/accessToken";

/// Corps de la requête d'échange
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    refresh_token: &'a str,
}

/// Réponse du service d'échange
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in_seconds: i64,
}

/// Access token courant et son échéance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// Échéance en millisecondes depuis l'epoch
    pub expires_at_ms: i64,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        now_ms() >= self.expires_at_ms
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Échéance d'un token valable `expires_in_seconds` à partir de `now_ms`
///
/// Une durée nulle ou négative donne un token déjà expiré.
fn expiry_ms(now_ms: i64, expires_in_seconds: i64) -> i64 {
    if expires_in_seconds <= 0 {
        return now_ms;
    }
    now_ms.saturating_add(expires_in_seconds.saturating_mul(1000))
}

/// Gestionnaire du token OAuth
///
/// Le mutex est conservé pendant tout l'échange : un appelant arrivant pendant
/// un rafraîchissement attend puis observe le nouveau token.
#[derive(Debug)]
pub struct TokenManager {
    client: Client,
    exchange_url: String,
    refresh_token: String,
    session: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    /// Crée le gestionnaire
    ///
    /// # Errors
    ///
    /// * `SpotifyError::NoRefreshToken` - refresh token vide
    pub fn new(
        base_url: impl AsRef<str>,
        refresh_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let refresh_token = refresh_token.into();
        if refresh_token.trim().is_empty() {
            return Err(SpotifyError::NoRefreshToken);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            exchange_url: format!(
                "{}{}",
                base_url.as_ref().trim_end_matches('/'),
                ACCESS_TOKEN_PATH
            ),
            refresh_token: refresh_token.trim().to_string(),
            session: Mutex::new(None),
        })
    }

    pub fn from_settings(settings: &OAuthSettings, timeout: Duration) -> Result<Self> {
        let token = settings.refresh_token().ok_or(SpotifyError::NoRefreshToken)?;
        Self::new(&settings.base_url, token, timeout)
    }

    /// Retourne un access token valide, en le rafraîchissant si nécessaire
    pub async fn ensure_valid_token(&self) -> Result<String> {
        let mut session = self.session.lock().await;

        if let Some(current) = session.as_ref() {
            if !current.is_expired() {
                return Ok(current.token.clone());
            }
            debug!("Access token expired, refreshing");
        }

        let response = self.refresh().await?;
        let token = AccessToken {
            token: response.access_token,
            expires_at_ms: expiry_ms(now_ms(), response.expires_in_seconds),
        };
        let value = token.token.clone();
        *session = Some(token);
        Ok(value)
    }

    /// Échange le refresh token contre un nouvel access token
    ///
    /// N'enregistre rien : passer par [`Self::ensure_valid_token`].
    pub async fn refresh(&self) -> Result<TokenResponse> {
        info!("Refreshing Spotify access token");

        let response = self
            .client
            .post(&self.exchange_url)
            .json(&TokenRequest {
                refresh_token: &self.refresh_token,
            })
            .send()
            .await
            .map_err(|e| {
                warn!("Token exchange request failed: {}", e);
                SpotifyError::TokenRefresh(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Token exchange rejected ({}): {}", status, body);
            return Err(SpotifyError::TokenRefresh(format!("status {}: {}", status, body)));
        }

        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            warn!("Malformed token exchange response: {}", e);
            SpotifyError::TokenRefresh(e.to_string())
        })?;

        if token.access_token.is_empty() {
            warn!("Token exchange returned an empty access token");
            return Err(SpotifyError::TokenRefresh("empty access token".to_string()));
        }

        debug!("New access token valid for {}s", token.expires_in_seconds);
        Ok(token)
    }

    /// Oublie le token courant (ex: après un 401 de la Web API)
    pub async fn invalidate(&self) {
        *self.session.lock().await = None;
    }

    /// Token courant, sans rafraîchissement
    pub async fn current(&self) -> Option<AccessToken> {
        self.session.lock().await.clone()
    }

    #[cfg(test)]
    pub(crate) async fn set_current(&self, token: AccessToken) {
        *self.session.lock().await = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_refresh_token_is_rejected() {
        let err = TokenManager::new("http://localhost", "  ", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, SpotifyError::NoRefreshToken));
    }

    #[test]
    fn test_exchange_url() {
        let manager =
            TokenManager::new("https://oauth.example/", "rt", Duration::from_secs(1)).unwrap();
        assert_eq!(manager.exchange_url, "https://oauth.example/spotify/accessToken");
    }

    #[test]
    fn test_expiry_boundary() {
        let past = AccessToken {
            token: "a".into(),
            expires_at_ms: now_ms() - 1,
        };
        let now = AccessToken {
            token: "b".into(),
            expires_at_ms: now_ms(),
        };
        let future = AccessToken {
            token: "c".into(),
            expires_at_ms: now_ms() + 60_000,
        };
        assert!(past.is_expired());
        assert!(now.is_expired());
        assert!(!future.is_expired());
    }

    #[test]
    fn test_expiry_saturates() {
        assert_eq!(expiry_ms(1_000, 3600), 3_601_000);
        assert_eq!(expiry_ms(1_000, 0), 1_000);
        assert_eq!(expiry_ms(1_000, -5), 1_000);
        assert_eq!(expiry_ms(1_000, i64::MAX), i64::MAX);
    }

    #[tokio::test]
    async fn test_valid_token_is_reused() {
        // Service injoignable : tout rafraîchissement échouerait
        let manager =
            TokenManager::new("http://127.0.0.1:9", "rt", Duration::from_millis(200)).unwrap();
        manager
            .set_current(AccessToken {
                token: "cached".into(),
                expires_at_ms: now_ms() + 60_000,
            })
            .await;

        assert_eq!(manager.ensure_valid_token().await.unwrap(), "cached");

        manager.invalidate().await;
        assert!(manager.current().await.is_none());
        assert!(matches!(
            manager.ensure_valid_token().await,
            Err(SpotifyError::TokenRefresh(_))
        ));
    }
}
