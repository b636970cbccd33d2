use thiserror::Error;

/// Failure modes of a catalog lookup.
///
/// The cache propagates these unchanged; it never fails in any other way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog has no place `{external_id}`")]
    NotFound { external_id: i64 },
    #[error("catalog rate limited the request")]
    RateLimited,
    #[error("catalog request timed out")]
    Timeout,
    #[error("catalog transport failure: {message}")]
    Transport { message: String },
    #[error("unexpected catalog response: {message}")]
    BadUpstreamResponse { message: String },
}

impl CatalogError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn bad_response(message: impl Into<String>) -> Self {
        Self::BadUpstreamResponse {
            message: message.into(),
        }
    }

    /// Whether a later identical request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::RateLimited | CatalogError::Timeout | CatalogError::Transport { .. }
        )
    }

    /// Stable label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::RateLimited => "rate_limited",
            CatalogError::Timeout => "timeout",
            CatalogError::Transport { .. } => "transport",
            CatalogError::BadUpstreamResponse { .. } => "bad_response",
        }
    }
}
