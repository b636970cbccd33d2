//! Catalog lookup proxy

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::ExternalPlaceResponse;
use crate::infra::http::api::state::ApiState;

use super::catalog_to_api;

pub async fn get_external_place(
    State(state): State<ApiState>,
    Path(external_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .catalog
        .get_or_fetch(external_id)
        .await
        .map_err(catalog_to_api)?;

    Ok(Json(ExternalPlaceResponse::from(record)))
}
