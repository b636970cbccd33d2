use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::application::projects::{
    CreateProjectCommand, PlaceImport, PlacePatch, ProjectPatch,
};
use crate::domain::entities::{
    ExternalPlaceRecord, PlaceRecord, ProjectRecord, ProjectWithPlaces,
};
use crate::domain::patch::Patch;

#[derive(Debug, Deserialize, Serialize)]
pub struct PlaceImportRequest {
    pub external_id: i64,
    pub notes: Option<String>,
}

impl From<PlaceImportRequest> for PlaceImport {
    fn from(request: PlaceImportRequest) -> Self {
        Self {
            external_id: request.external_id,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ProjectCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    #[serde(default)]
    pub places: Vec<PlaceImportRequest>,
}

impl From<ProjectCreateRequest> for CreateProjectCommand {
    fn from(request: ProjectCreateRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            start_date: request.start_date,
            places: request.places.into_iter().map(PlaceImport::from).collect(),
        }
    }
}

/// Partial project update; omitted keys are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectUpdateRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<Option<String>>,
    #[serde(default)]
    pub start_date: Patch<Option<Date>>,
}

impl From<ProjectUpdateRequest> for ProjectPatch {
    fn from(request: ProjectUpdateRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            start_date: request.start_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceUpdateRequest {
    #[serde(default)]
    pub notes: Patch<Option<String>>,
    #[serde(default)]
    pub visited: Patch<bool>,
}

impl From<PlaceUpdateRequest> for PlacePatch {
    fn from(request: PlaceUpdateRequest) -> Self {
        Self {
            notes: request.notes,
            visited: request.visited,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub is_completed: Option<bool>,
    pub q: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceListQuery {
    pub visited: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub is_completed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ProjectRecord> for ProjectResponse {
    fn from(record: ProjectRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            start_date: record.start_date,
            is_completed: record.is_completed,
            completed_at: record.completed_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub external_id: i64,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub visited: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub visited_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PlaceRecord> for PlaceResponse {
    fn from(record: PlaceRecord) -> Self {
        Self {
            id: record.id,
            project_id: record.project_id,
            external_id: record.external_id,
            title: record.title,
            notes: record.notes,
            visited: record.visited,
            visited_at: record.visited_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub places: Vec<PlaceResponse>,
}

impl From<ProjectWithPlaces> for ProjectDetailResponse {
    fn from(value: ProjectWithPlaces) -> Self {
        Self {
            project: value.project.into(),
            places: value.places.into_iter().map(PlaceResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExternalPlaceResponse {
    pub id: i64,
    pub title: Option<String>,
}

impl From<ExternalPlaceRecord> for ExternalPlaceResponse {
    fn from(record: ExternalPlaceRecord) -> Self {
        Self {
            id: record.external_id,
            title: record.title,
        }
    }
}
