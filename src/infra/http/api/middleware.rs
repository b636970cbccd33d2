use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use super::error::ApiError;

/// Header carrying the authenticated user id, set by the gateway in front of the API.
pub const OWNER_HEADER: &str = "x-user-id";

/// The user every project operation is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub Uuid);

pub async fn require_owner(mut request: Request<Body>, next: Next) -> Response {
    let owner = match owner_from_headers(request.headers()) {
        Ok(owner) => owner,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(owner);
    next.run(request).await
}

fn owner_from_headers(headers: &HeaderMap) -> Result<Owner, ApiError> {
    let raw = headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(ApiError::unauthorized)?;

    Uuid::parse_str(raw).map(Owner).map_err(|err| {
        ApiError::bad_request("Owner identity is not a valid id", Some(err.to_string()))
    })
}
