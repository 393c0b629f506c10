//! Cache en mémoire du nœud racine de navigation
//!
//! Seule la racine est mise en cache (clé `"root"`) : elle agrège trois
//! appels à la Web API et s'affiche à chaque ouverture du service.

use crate::models::NavigationNode;
use moka::future::Cache as MokaCache;
use std::time::Duration;

/// Clé unique du cache
pub const ROOT_KEY: &str = "root";

/// TTL par défaut de la racine (1 heure)
pub const DEFAULT_ROOT_TTL: Duration = Duration::from_secs(3600);

/// Cache des nœuds de navigation
#[derive(Clone)]
pub struct BrowseCache {
    nodes: MokaCache<String, NavigationNode>,
}

impl BrowseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            nodes: MokaCache::builder()
                .max_capacity(16)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Racine en cache, si encore valide
    pub async fn get_root(&self) -> Option<NavigationNode> {
        self.nodes.get(ROOT_KEY).await
    }

    pub async fn put_root(&self, node: NavigationNode) {
        self.nodes.insert(ROOT_KEY.to_string(), node).await;
    }

    /// Vide le cache
    pub fn flush(&self) {
        self.nodes.invalidate_all();
    }
}

impl Default for BrowseCache {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_TTL)
    }
}

impl std::fmt::Debug for BrowseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowseCache")
            .field("entries", &self.nodes.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_flush() {
        let cache = BrowseCache::default();
        assert!(cache.get_root().await.is_none());

        cache.put_root(NavigationNode::with_prev("/")).await;
        assert_eq!(
            cache.get_root().await.and_then(|n| n.prev).map(|p| p.uri),
            Some("/".to_string())
        );

        cache.flush();
        assert!(cache.get_root().await.is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = BrowseCache::new(Duration::from_millis(50));
        cache.put_root(NavigationNode::default()).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get_root().await.is_none());
    }
}
