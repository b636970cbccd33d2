//! Project handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::repos::{PageRequest, ProjectQueryFilter};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::middleware::Owner;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::project_to_api;

pub async fn list_projects(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ProjectQueryFilter {
        is_completed: query.is_completed,
        search: query.q.filter(|q| !q.trim().is_empty()),
    };

    let projects = state
        .projects
        .list_projects(owner, &filter, PageRequest::new(query.limit, query.offset))
        .await
        .map_err(project_to_api)?;

    let body: Vec<ProjectResponse> = projects.into_iter().map(ProjectResponse::from).collect();
    Ok(Json(body))
}

pub async fn create_project(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Json(payload): Json<ProjectCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .projects
        .create_project(owner, payload.into())
        .await
        .map_err(project_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectDetailResponse::from(created)),
    ))
}

pub async fn get_project(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .projects
        .get_project_with_places(owner, id)
        .await
        .map_err(project_to_api)?;

    Ok(Json(ProjectDetailResponse::from(project)))
}

pub async fn update_project(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .projects
        .update_project(owner, id, payload.into())
        .await
        .map_err(project_to_api)?;

    Ok(Json(ProjectResponse::from(project)))
}

pub async fn delete_project(
    State(state): State<ApiState>,
    Extension(Owner(owner)): Extension<Owner>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .projects
        .delete_project(owner, id)
        .await
        .map_err(project_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
