//! HTTP client for the upstream place catalog.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::entities::ExternalPlaceRecord;

use super::PlaceCatalog;
use super::config::CatalogConfig;
use super::error::CatalogError;
use super::lock::{mutex_lock, rw_read, rw_write};

const SOURCE: &str = "catalog::client";

pub const METRIC_CATALOG_REQUEST: &str = "tripwise_catalog_request_total";

#[derive(Debug, Deserialize)]
struct PlaceEnvelope {
    data: PlaceBody,
}

#[derive(Debug, Deserialize)]
struct PlaceBody {
    id: i64,
    title: Option<String>,
}

/// Resolves external place ids against the catalog API.
///
/// One `reqwest::Client` is shared by every call. It is built on first use and
/// kept until [`CatalogClient::shutdown`].
pub struct CatalogClient {
    config: CatalogConfig,
    places_url: Url,
    shared: RwLock<Option<Client>>,
    init: Mutex<()>,
    initializations: AtomicUsize,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self, url::ParseError> {
        let places_url = Url::parse(&format!(
            "{}/places/",
            config.base_url.trim_end_matches('/')
        ))?;
        Ok(Self {
            config,
            places_url,
            shared: RwLock::new(None),
            init: Mutex::new(()),
            initializations: AtomicUsize::new(0),
        })
    }

    /// Number of times the shared HTTP client has been built.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::Acquire)
    }

    /// Drop the shared HTTP client. The next lookup builds a new one.
    pub fn shutdown(&self) {
        let _guard = mutex_lock(&self.init, SOURCE, "shutdown");
        if rw_write(&self.shared, SOURCE, "shutdown.take").take().is_some() {
            info!(target = "catalog::client", "catalog client closed");
        }
    }

    fn http(&self) -> Result<Client, CatalogError> {
        if let Some(client) = rw_read(&self.shared, SOURCE, "http.fast").as_ref() {
            return Ok(client.clone());
        }

        let _guard = mutex_lock(&self.init, SOURCE, "http.init");
        if let Some(client) = rw_read(&self.shared, SOURCE, "http.recheck").as_ref() {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .timeout(self.config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(self.config.user_agent.as_str())
            .build()
            .map_err(|err| CatalogError::transport(format!("failed to build client: {err}")))?;
        *rw_write(&self.shared, SOURCE, "http.store") = Some(client.clone());
        self.initializations.fetch_add(1, Ordering::AcqRel);
        debug!(target = "catalog::client", "catalog client initialised");
        Ok(client)
    }

    fn place_url(&self, external_id: i64) -> Result<Url, CatalogError> {
        let mut url = self
            .places_url
            .join(&external_id.to_string())
            .map_err(|err| CatalogError::transport(format!("invalid catalog url: {err}")))?;
        url.query_pairs_mut().append_pair("fields", "id,title");
        Ok(url)
    }

    async fn fetch(&self, external_id: i64) -> Result<ExternalPlaceRecord, CatalogError> {
        let client = self.http()?;
        let url = self.place_url(external_id)?;

        let response = client.get(url).send().await.map_err(map_send_error)?;
        classify_status(response.status(), external_id)?;

        let bytes = response.bytes().await.map_err(map_send_error)?;
        let envelope: PlaceEnvelope = serde_json::from_slice(&bytes)
            .map_err(|err| CatalogError::bad_response(format!("malformed place body: {err}")))?;
        if envelope.data.id != external_id {
            return Err(CatalogError::bad_response(format!(
                "asked for place {external_id}, got {}",
                envelope.data.id
            )));
        }

        Ok(ExternalPlaceRecord {
            external_id: envelope.data.id,
            title: envelope.data.title,
        })
    }
}

#[async_trait]
impl PlaceCatalog for CatalogClient {
    async fn resolve(&self, external_id: i64) -> Result<ExternalPlaceRecord, CatalogError> {
        let result = self.fetch(external_id).await;
        match &result {
            Ok(_) => {
                counter!(METRIC_CATALOG_REQUEST, "outcome" => "ok").increment(1);
                debug!(target = "catalog::client", external_id, "catalog place resolved");
            }
            Err(err) => {
                counter!(METRIC_CATALOG_REQUEST, "outcome" => err.outcome()).increment(1);
                warn!(
                    target = "catalog::client",
                    external_id,
                    outcome = err.outcome(),
                    error = %err,
                    "catalog lookup failed"
                );
            }
        }
        result
    }

    fn shutdown(&self) {
        CatalogClient::shutdown(self);
    }
}

fn map_send_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::transport(err.to_string())
    }
}

fn classify_status(status: StatusCode, external_id: i64) -> Result<(), CatalogError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(CatalogError::NotFound { external_id }),
        StatusCode::TOO_MANY_REQUESTS => Err(CatalogError::RateLimited),
        status if status.is_server_error() => Err(CatalogError::transport(format!(
            "catalog answered {status}"
        ))),
        status => Err(CatalogError::bad_response(format!(
            "unexpected status {status}"
        ))),
    }
}
