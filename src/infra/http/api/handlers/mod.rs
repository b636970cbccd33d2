//! API handlers organized by resource type.
//!
//! Error conversions shared by the resource modules live here.

mod catalog;
mod places;
mod projects;

pub use catalog::*;
pub use places::*;
pub use projects::*;

use axum::http::StatusCode;

use crate::application::projects::ProjectError;
use crate::application::repos::RepoError;
use crate::catalog::CatalogError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found", None),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn project_to_api(err: ProjectError) -> ApiError {
    match err {
        ProjectError::AlreadyExists { external_id } => ApiError::new(
            StatusCode::CONFLICT,
            codes::ALREADY_EXISTS,
            "Place is already part of the project",
            Some(format!("external_id {external_id}")),
        ),
        ProjectError::DuplicateInRequest { external_id } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::DUPLICATE_IN_REQUEST,
            "Place listed more than once",
            Some(format!("external_id {external_id}")),
        ),
        ProjectError::CapacityExceeded { max } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::CAPACITY_EXCEEDED,
            "Project place limit reached",
            Some(format!("a project holds at most {max} places")),
        ),
        ProjectError::HasVisitedPlaces => ApiError::new(
            StatusCode::CONFLICT,
            codes::HAS_VISITED_PLACES,
            "Project has visited places",
            None,
        ),
        ProjectError::EntityNotFound { entity } => {
            ApiError::not_found("Resource not found", Some(format!("{entity} not found")))
        }
        ProjectError::PlaceNotFoundUpstream { external_id } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::PLACE_NOT_FOUND_UPSTREAM,
            "Place does not exist in the catalog",
            Some(format!("external_id {external_id}")),
        ),
        ProjectError::UpstreamUnavailable { source } => upstream_unavailable(&source),
        ProjectError::BadUpstreamData { source } => bad_upstream(&source),
        ProjectError::Validation(DomainError::Validation { field, message }) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION,
            "Invalid input",
            Some(format!("{field}: {message}")),
        ),
        ProjectError::Repo(repo) => repo_to_api(repo),
    }
}

/// The lookup proxy exposes the catalog itself, so a missing place is a plain 404 there.
pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::NotFound { external_id } => ApiError::not_found(
            "Place not found in the catalog",
            Some(format!("external_id {external_id}")),
        ),
        CatalogError::BadUpstreamResponse { .. } => bad_upstream(&err),
        CatalogError::RateLimited | CatalogError::Timeout | CatalogError::Transport { .. } => {
            upstream_unavailable(&err)
        }
    }
}

fn upstream_unavailable(source: &CatalogError) -> ApiError {
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        codes::UPSTREAM_UNAVAILABLE,
        "Catalog temporarily unavailable",
        Some(source.to_string()),
    )
}

fn bad_upstream(source: &CatalogError) -> ApiError {
    ApiError::new(
        StatusCode::BAD_GATEWAY,
        codes::BAD_UPSTREAM_RESPONSE,
        "Catalog returned an unusable response",
        Some(source.to_string()),
    )
}
