//! Catalog client and lookup cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::config::{
    CatalogCacheSettings, CatalogSettings, DEFAULT_CATALOG_BASE_URL,
    DEFAULT_CATALOG_CACHE_MAX_ENTRIES, DEFAULT_CATALOG_CACHE_TTL_SECS,
    DEFAULT_CATALOG_TIMEOUT_MS, DEFAULT_CATALOG_USER_AGENT,
};

/// Upstream catalog connection settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API, without a trailing `/places`.
    pub base_url: String,
    /// Upper bound for one upstream request.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            timeout_ms: DEFAULT_CATALOG_TIMEOUT_MS,
            user_agent: DEFAULT_CATALOG_USER_AGENT.to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl From<&CatalogSettings> for CatalogConfig {
    fn from(settings: &CatalogSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            timeout_ms: settings.timeout_ms,
            user_agent: settings.user_agent.clone(),
        }
    }
}

/// Lookup cache settings.
#[derive(Debug, Clone)]
pub struct CatalogCacheConfig {
    /// When false every lookup goes straight to the catalog.
    pub enabled: bool,
    /// Entry lifetime. Zero keeps lookups working but stores nothing.
    pub ttl_seconds: u64,
    /// Maximum live entries before LRU eviction.
    pub max_entries: usize,
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_CATALOG_CACHE_TTL_SECS,
            max_entries: DEFAULT_CATALOG_CACHE_MAX_ENTRIES,
        }
    }
}

impl From<&CatalogCacheSettings> for CatalogCacheConfig {
    fn from(settings: &CatalogCacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_seconds: settings.ttl_seconds,
            max_entries: settings.max_entries,
        }
    }
}

impl CatalogCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.base_url, "https://api.artic.edu/api/v1");
        assert_eq!(catalog.timeout(), Duration::from_secs(10));
        assert!(catalog.user_agent.starts_with("tripwise/"));

        let cache = CatalogCacheConfig::default();
        assert!(cache.enabled);
        assert_eq!(cache.ttl(), Duration::from_secs(300));
        assert_eq!(cache.max_entries, 1024);
    }

    #[test]
    fn zero_max_entries_clamps_to_one() {
        let cache = CatalogCacheConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert_eq!(cache.max_entries_non_zero().get(), 1);
    }
}
