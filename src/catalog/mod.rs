//! Place catalog lookups.
//!
//! Resolves external place ids to display records through a read-through cache
//! in front of the upstream catalog API:
//!
//! - [`CatalogClient`]: one request per call, shared lazily built HTTP client
//! - [`PlaceStore`]: TTL expiry plus LRU bound on the number of records
//! - [`CatalogService`]: the read-through combination handed to request handling
//!
//! ## Configuration
//!
//! ```toml
//! [catalog]
//! base_url = "https://api.artic.edu/api/v1"
//! timeout_ms = 10000
//!
//! [catalog_cache]
//! enabled = true
//! ttl_seconds = 300
//! max_entries = 1024
//! ```

mod client;
mod config;
mod error;
mod lock;
mod store;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::entities::ExternalPlaceRecord;

pub use client::CatalogClient;
pub use config::{CatalogCacheConfig, CatalogConfig};
pub use error::CatalogError;
pub use store::PlaceStore;

pub use client::METRIC_CATALOG_REQUEST;
pub use store::{
    METRIC_CACHE_EVICT, METRIC_CACHE_EXPIRED, METRIC_CACHE_HIT, METRIC_CACHE_MISS,
};

/// Anything that can turn an external place id into a record.
#[async_trait]
pub trait PlaceCatalog: Send + Sync {
    async fn resolve(&self, external_id: i64) -> Result<ExternalPlaceRecord, CatalogError>;

    /// Release process-wide resources held by the implementation.
    fn shutdown(&self) {}
}

/// Read-through cache over an upstream [`PlaceCatalog`].
///
/// Concurrent misses for the same id each reach the upstream; results are not
/// coalesced.
pub struct CatalogService {
    upstream: Arc<dyn PlaceCatalog>,
    store: Option<PlaceStore>,
}

impl CatalogService {
    pub fn new(upstream: Arc<dyn PlaceCatalog>, config: &CatalogCacheConfig) -> Self {
        let store = config.enabled.then(|| PlaceStore::new(config));
        Self { upstream, store }
    }

    /// Cached record for `external_id`, fetching from the upstream on a miss.
    pub async fn get_or_fetch(
        &self,
        external_id: i64,
    ) -> Result<ExternalPlaceRecord, CatalogError> {
        let Some(store) = &self.store else {
            return self.upstream.resolve(external_id).await;
        };

        if let Some(record) = store.get(external_id) {
            debug!(target = "catalog::service", external_id, "catalog cache hit");
            return Ok(record);
        }

        let record = self.upstream.resolve(external_id).await?;
        store.insert(record.clone());
        Ok(record)
    }

    pub fn cached_len(&self) -> usize {
        self.store.as_ref().map_or(0, PlaceStore::len)
    }

    pub fn clear(&self) {
        if let Some(store) = &self.store {
            store.clear();
        }
    }
}

#[async_trait]
impl PlaceCatalog for CatalogService {
    async fn resolve(&self, external_id: i64) -> Result<ExternalPlaceRecord, CatalogError> {
        self.get_or_fetch(external_id).await
    }

    /// Close the upstream client and drop every cached record.
    fn shutdown(&self) {
        self.upstream.shutdown();
        self.clear();
        info!(target = "catalog::service", "catalog service shut down");
    }
}
