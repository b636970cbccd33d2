//! Place handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::repos::{PageRequest, PlaceQueryFilter};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::middleware::Owner;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::project_to_api;

pub async fn list_places(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<PlaceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = PlaceQueryFilter {
        visited: query.visited,
    };

    let places = state
        .projects
        .list_places(
            owner,
            project_id,
            &filter,
            PageRequest::new(query.limit, query.offset),
        )
        .await
        .map_err(project_to_api)?;

    let body: Vec<PlaceResponse> = places.into_iter().map(PlaceResponse::from).collect();
    Ok(Json(body))
}

pub async fn add_place(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<PlaceImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let place = state
        .projects
        .add_place(owner, project_id, payload.into())
        .await
        .map_err(project_to_api)?;

    Ok((StatusCode::CREATED, Json(PlaceResponse::from(place))))
}

pub async fn get_place(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path((project_id, place_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let place = state
        .projects
        .get_place(owner, project_id, place_id)
        .await
        .map_err(project_to_api)?;

    Ok(Json(PlaceResponse::from(place)))
}

pub async fn update_place(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path((project_id, place_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PlaceUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let place = state
        .projects
        .update_place(owner, project_id, place_id, payload.into())
        .await
        .map_err(project_to_api)?;

    Ok(Json(PlaceResponse::from(place)))
}
