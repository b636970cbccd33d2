//! Projects and the places they own.
//!
//! Every place insert or update is followed by a completion pass that re-reads
//! the persisted counts, so a project's `is_completed` flag tracks its places
//! without a transaction spanning both tables.

use std::sync::Arc;

use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{
    CreatePlaceParams, CreateProjectParams, PageRequest, PlaceQueryFilter, PlacesRepo,
    ProjectQueryFilter, ProjectsRepo, RepoError, SetCompletionParams, UpdatePlaceParams,
    UpdateProjectParams,
};
use crate::catalog::{CatalogError, PlaceCatalog};
use crate::domain::entities::{PlaceRecord, ProjectRecord, ProjectWithPlaces};
use crate::domain::error::DomainError;
use crate::domain::patch::Patch;
use crate::domain::projects::{
    CompletionChange, completion_change, first_duplicate, normalize_optional_text,
    normalize_project_name, visit_transition,
};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("place `{external_id}` is already part of the project")]
    AlreadyExists { external_id: i64 },
    #[error("a project holds at most {max} places")]
    CapacityExceeded { max: usize },
    #[error("place `{external_id}` appears more than once in the request")]
    DuplicateInRequest { external_id: i64 },
    #[error("project has visited places and cannot be deleted")]
    HasVisitedPlaces,
    #[error("{entity} not found")]
    EntityNotFound { entity: &'static str },
    #[error("place `{external_id}` does not exist in the catalog")]
    PlaceNotFoundUpstream { external_id: i64 },
    #[error("catalog is temporarily unavailable")]
    UpstreamUnavailable {
        #[source]
        source: CatalogError,
    },
    #[error("catalog returned unusable data")]
    BadUpstreamData {
        #[source]
        source: CatalogError,
    },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ProjectError {
    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProjectError::UpstreamUnavailable { .. })
    }
}

impl From<CatalogError> for ProjectError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound { external_id } => {
                ProjectError::PlaceNotFoundUpstream { external_id }
            }
            CatalogError::BadUpstreamResponse { .. } => {
                ProjectError::BadUpstreamData { source: error }
            }
            CatalogError::RateLimited | CatalogError::Timeout | CatalogError::Transport { .. } => {
                ProjectError::UpstreamUnavailable { source: error }
            }
        }
    }
}

/// Bounds on the number of places per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceLimits {
    /// Minimum number of places a new project must be created with.
    pub min_places: usize,
    pub max_places: usize,
}

impl Default for PlaceLimits {
    fn default() -> Self {
        Self {
            min_places: 1,
            max_places: 10,
        }
    }
}

impl From<&crate::config::ProjectsSettings> for PlaceLimits {
    fn from(settings: &crate::config::ProjectsSettings) -> Self {
        Self {
            min_places: settings.min_places.get() as usize,
            max_places: settings.max_places.get() as usize,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaceImport {
    pub external_id: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectCommand {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub places: Vec<PlaceImport>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Patch<String>,
    pub description: Patch<Option<String>>,
    pub start_date: Patch<Option<Date>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_absent() && self.description.is_absent() && self.start_date.is_absent()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlacePatch {
    pub notes: Patch<Option<String>>,
    pub visited: Patch<bool>,
}

impl PlacePatch {
    pub fn is_empty(&self) -> bool {
        self.notes.is_absent() && self.visited.is_absent()
    }
}

#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectsRepo>,
    places: Arc<dyn PlacesRepo>,
    catalog: Arc<dyn PlaceCatalog>,
    limits: PlaceLimits,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectsRepo>,
        places: Arc<dyn PlacesRepo>,
        catalog: Arc<dyn PlaceCatalog>,
        limits: PlaceLimits,
    ) -> Self {
        Self {
            projects,
            places,
            catalog,
            limits,
        }
    }

    pub async fn list_projects(
        &self,
        owner: Uuid,
        filter: &ProjectQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<ProjectRecord>, ProjectError> {
        Ok(self
            .projects
            .list_projects_for_owner(owner, filter, page)
            .await?)
    }

    pub async fn get_project(&self, owner: Uuid, id: Uuid) -> Result<ProjectRecord, ProjectError> {
        self.projects
            .find_project_for_owner(owner, id)
            .await?
            .ok_or(ProjectError::EntityNotFound { entity: "project" })
    }

    pub async fn get_project_with_places(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<ProjectWithPlaces, ProjectError> {
        let project = self.get_project(owner, id).await?;
        let places = self
            .places
            .list_places_for_project(id, &PlaceQueryFilter::default(), PageRequest::ALL)
            .await?;
        Ok(ProjectWithPlaces { project, places })
    }

    /// Create a project and import its places in input order.
    ///
    /// The request is validated as a whole before anything is written. If an
    /// import then fails, the freshly created project is removed again and the
    /// failure is returned.
    pub async fn create_project(
        &self,
        owner: Uuid,
        command: CreateProjectCommand,
    ) -> Result<ProjectWithPlaces, ProjectError> {
        let name = normalize_project_name(&command.name)?;

        if let Some(external_id) = first_duplicate(command.places.iter().map(|p| p.external_id)) {
            return Err(ProjectError::DuplicateInRequest { external_id });
        }
        if command.places.len() > self.limits.max_places {
            return Err(ProjectError::CapacityExceeded {
                max: self.limits.max_places,
            });
        }
        if command.places.len() < self.limits.min_places {
            return Err(DomainError::validation(
                "places",
                format!("must contain at least {} place(s)", self.limits.min_places),
            )
            .into());
        }

        let project = self
            .projects
            .create_project(CreateProjectParams {
                user_id: owner,
                name,
                description: normalize_optional_text(command.description),
                start_date: command.start_date,
            })
            .await?;

        let mut places = Vec::with_capacity(command.places.len());
        for import in command.places {
            match self.import_place(project.id, import).await {
                Ok(place) => places.push(place),
                Err(err) => {
                    self.discard_project(project.id).await;
                    return Err(err);
                }
            }
        }

        let project = self.recompute_completion(project.id).await?.unwrap_or(project);

        info!(
            target = "application::projects::create_project",
            project_id = %project.id,
            places = places.len(),
            "project created"
        );

        Ok(ProjectWithPlaces { project, places })
    }

    pub async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<ProjectRecord, ProjectError> {
        let project = self.get_project(owner, id).await?;
        if patch.is_empty() {
            return Ok(project);
        }

        let name = match patch.name {
            Patch::Set(name) => normalize_project_name(&name)?,
            Patch::Absent => project.name,
        };

        let params = UpdateProjectParams {
            id,
            name,
            description: patch.description.map(normalize_optional_text).apply(project.description),
            start_date: patch.start_date.apply(project.start_date),
        };

        Ok(self.projects.update_project(params).await?)
    }

    /// Delete a project unless any of its places has been visited.
    pub async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<(), ProjectError> {
        let project = self.get_project(owner, id).await?;

        if self.places.count_visited_places(project.id).await? > 0 {
            return Err(ProjectError::HasVisitedPlaces);
        }

        self.projects.delete_project(project.id).await?;
        info!(
            target = "application::projects::delete_project",
            project_id = %project.id,
            "project deleted"
        );
        Ok(())
    }

    pub async fn list_places(
        &self,
        owner: Uuid,
        project_id: Uuid,
        filter: &PlaceQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PlaceRecord>, ProjectError> {
        self.get_project(owner, project_id).await?;
        Ok(self
            .places
            .list_places_for_project(project_id, filter, page)
            .await?)
    }

    pub async fn get_place(
        &self,
        owner: Uuid,
        project_id: Uuid,
        place_id: Uuid,
    ) -> Result<PlaceRecord, ProjectError> {
        self.get_project(owner, project_id).await?;
        self.places
            .find_place_in_project(project_id, place_id)
            .await?
            .ok_or(ProjectError::EntityNotFound { entity: "place" })
    }

    pub async fn add_place(
        &self,
        owner: Uuid,
        project_id: Uuid,
        import: PlaceImport,
    ) -> Result<PlaceRecord, ProjectError> {
        let project = self.get_project(owner, project_id).await?;

        let count = self.places.count_places(project.id).await?;
        if count >= self.limits.max_places as u64 {
            return Err(ProjectError::CapacityExceeded {
                max: self.limits.max_places,
            });
        }
        if self
            .places
            .exists_place(project.id, import.external_id)
            .await?
        {
            return Err(ProjectError::AlreadyExists {
                external_id: import.external_id,
            });
        }

        let place = self.import_place(project.id, import).await?;
        self.recompute_completion(project.id).await?;
        Ok(place)
    }

    pub async fn update_place(
        &self,
        owner: Uuid,
        project_id: Uuid,
        place_id: Uuid,
        patch: PlacePatch,
    ) -> Result<PlaceRecord, ProjectError> {
        let place = self.get_place(owner, project_id, place_id).await?;
        if patch.is_empty() {
            return Ok(place);
        }

        let (visited, visited_at) = match patch.visited {
            Patch::Set(requested) => visit_transition(
                place.visited,
                place.visited_at,
                requested,
                OffsetDateTime::now_utc(),
            ),
            Patch::Absent => (place.visited, place.visited_at),
        };

        let updated = self
            .places
            .update_place(UpdatePlaceParams {
                id: place.id,
                notes: patch.notes.map(normalize_optional_text).apply(place.notes),
                visited,
                visited_at,
            })
            .await?;

        self.recompute_completion(project_id).await?;
        Ok(updated)
    }

    async fn import_place(
        &self,
        project_id: Uuid,
        import: PlaceImport,
    ) -> Result<PlaceRecord, ProjectError> {
        let record = self.catalog.resolve(import.external_id).await?;

        self.places
            .create_place(CreatePlaceParams {
                project_id,
                external_id: import.external_id,
                title: record.title,
                notes: normalize_optional_text(import.notes),
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => ProjectError::AlreadyExists {
                    external_id: import.external_id,
                },
                other => ProjectError::Repo(other),
            })
    }

    async fn discard_project(&self, project_id: Uuid) {
        if let Err(err) = self.projects.delete_project(project_id).await {
            warn!(
                target = "application::projects::create_project",
                project_id = %project_id,
                error = %err,
                "failed to discard partially imported project"
            );
        }
    }

    /// Re-derive `is_completed` from persisted counts and store it when it changed.
    ///
    /// Returns the project as it stands afterwards, or `None` if it no longer exists.
    async fn recompute_completion(
        &self,
        project_id: Uuid,
    ) -> Result<Option<ProjectRecord>, ProjectError> {
        let Some(project) = self.projects.find_project(project_id).await? else {
            return Ok(None);
        };

        let total = self.places.count_places(project_id).await?;
        let visited = self.places.count_visited_places(project_id).await?;

        let change = completion_change(
            project.is_completed,
            total,
            visited,
            OffsetDateTime::now_utc(),
        );
        let (is_completed, completed_at) = match change {
            CompletionChange::Unchanged => return Ok(Some(project)),
            CompletionChange::Complete { at } => (true, Some(at)),
            CompletionChange::Reopen => (false, None),
        };

        let updated = self
            .projects
            .set_completion(SetCompletionParams {
                id: project_id,
                is_completed,
                completed_at,
            })
            .await?;

        info!(
            target = "application::projects::recompute_completion",
            project_id = %project_id,
            is_completed,
            places = total,
            visited,
            "project completion changed"
        );

        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_failures_are_relabelled() {
        assert!(matches!(
            ProjectError::from(CatalogError::NotFound { external_id: 3 }),
            ProjectError::PlaceNotFoundUpstream { external_id: 3 }
        ));
        assert!(matches!(
            ProjectError::from(CatalogError::bad_response("x")),
            ProjectError::BadUpstreamData { .. }
        ));
        for err in [
            CatalogError::RateLimited,
            CatalogError::Timeout,
            CatalogError::transport("reset"),
        ] {
            let relabelled = ProjectError::from(err);
            assert!(relabelled.is_retryable());
        }
    }

    #[test]
    fn empty_patches_are_detected() {
        assert!(ProjectPatch::default().is_empty());
        assert!(PlacePatch::default().is_empty());
        assert!(
            !PlacePatch {
                notes: Patch::Set(None),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
