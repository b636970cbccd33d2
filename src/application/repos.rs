//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::entities::{PlaceRecord, ProjectRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Offset-based window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 100;
    /// Every row, for internal reads of small bounded collections.
    pub const ALL: PageRequest = PageRequest {
        limit: u32::MAX,
        offset: 0,
    };

    /// Clamp caller-provided values into the supported range.
    pub fn new(limit: Option<u32>, offset: Option<u64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectQueryFilter {
    pub is_completed: Option<bool>,
    /// Case-insensitive substring match on the project name.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceQueryFilter {
    pub visited: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectParams {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct UpdateProjectParams {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct SetCompletionParams {
    pub id: Uuid,
    pub is_completed: bool,
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct CreatePlaceParams {
    pub project_id: Uuid,
    pub external_id: i64,
    pub title: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePlaceParams {
    pub id: Uuid,
    pub notes: Option<String>,
    pub visited: bool,
    pub visited_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait ProjectsRepo: Send + Sync {
    async fn create_project(&self, params: CreateProjectParams)
    -> Result<ProjectRecord, RepoError>;

    async fn find_project(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepoError>;

    async fn find_project_for_owner(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ProjectRecord>, RepoError>;

    /// Newest first.
    async fn list_projects_for_owner(
        &self,
        user_id: Uuid,
        filter: &ProjectQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<ProjectRecord>, RepoError>;

    async fn update_project(&self, params: UpdateProjectParams)
    -> Result<ProjectRecord, RepoError>;

    async fn set_completion(&self, params: SetCompletionParams)
    -> Result<ProjectRecord, RepoError>;

    /// Removes the project together with its places.
    async fn delete_project(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PlacesRepo: Send + Sync {
    /// Fails with [`RepoError::Duplicate`] when the external id is already in the project.
    async fn create_place(&self, params: CreatePlaceParams) -> Result<PlaceRecord, RepoError>;

    async fn find_place_in_project(
        &self,
        project_id: Uuid,
        place_id: Uuid,
    ) -> Result<Option<PlaceRecord>, RepoError>;

    /// Oldest first.
    async fn list_places_for_project(
        &self,
        project_id: Uuid,
        filter: &PlaceQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PlaceRecord>, RepoError>;

    async fn update_place(&self, params: UpdatePlaceParams) -> Result<PlaceRecord, RepoError>;

    async fn count_places(&self, project_id: Uuid) -> Result<u64, RepoError>;

    async fn count_visited_places(&self, project_id: Uuid) -> Result<u64, RepoError>;

    async fn exists_place(&self, project_id: Uuid, external_id: i64) -> Result<bool, RepoError>;
}
