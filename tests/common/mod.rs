#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use tripwise::application::projects::{PlaceLimits, ProjectService};
use tripwise::application::repos::{
    CreatePlaceParams, CreateProjectParams, PageRequest, PlaceQueryFilter, PlacesRepo,
    ProjectQueryFilter, ProjectsRepo, RepoError, SetCompletionParams, UpdatePlaceParams,
    UpdateProjectParams,
};
use tripwise::catalog::{CatalogError, PlaceCatalog};
use tripwise::domain::entities::{ExternalPlaceRecord, PlaceRecord, ProjectRecord};
use tripwise::infra::http::HealthProbe;

#[derive(Default)]
struct Tables {
    projects: Vec<ProjectRecord>,
    places: Vec<PlaceRecord>,
}

/// Both repositories over one in-memory table set, rows kept in insertion order.
#[derive(Default)]
pub struct MemoryRepos {
    tables: Mutex<Tables>,
}

impl MemoryRepos {
    pub async fn project_count(&self) -> usize {
        self.tables.lock().await.projects.len()
    }

    pub async fn place_count(&self) -> usize {
        self.tables.lock().await.places.len()
    }

    pub async fn places_of(&self, project_id: Uuid) -> Vec<PlaceRecord> {
        self.tables
            .lock()
            .await
            .places
            .iter()
            .filter(|place| place.project_id == project_id)
            .cloned()
            .collect()
    }
}

fn window<T: Clone>(rows: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    rows.skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl ProjectsRepo for MemoryRepos {
    async fn create_project(
        &self,
        params: CreateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = ProjectRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            name: params.name,
            description: params.description,
            start_date: params.start_date,
            is_completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.projects.push(record.clone());
        Ok(record)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn find_project_for_owner(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ProjectRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .projects
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn list_projects_for_owner(
        &self,
        user_id: Uuid,
        filter: &ProjectQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<ProjectRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let rows = tables
            .projects
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .filter(|p| filter.is_completed.is_none_or(|c| p.is_completed == c))
            .filter(|p| {
                search
                    .as_ref()
                    .is_none_or(|s| p.name.to_lowercase().contains(s))
            })
            .cloned();
        Ok(window(rows, page))
    }

    async fn update_project(
        &self,
        params: UpdateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        project.name = params.name;
        project.description = params.description;
        project.start_date = params.start_date;
        project.updated_at = OffsetDateTime::now_utc();
        Ok(project.clone())
    }

    async fn set_completion(
        &self,
        params: SetCompletionParams,
    ) -> Result<ProjectRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        project.is_completed = params.is_completed;
        project.completed_at = params.completed_at;
        project.updated_at = OffsetDateTime::now_utc();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        if tables.projects.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.places.retain(|place| place.project_id != id);
        Ok(())
    }
}

#[async_trait]
impl PlacesRepo for MemoryRepos {
    async fn create_place(&self, params: CreatePlaceParams) -> Result<PlaceRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if !tables.projects.iter().any(|p| p.id == params.project_id) {
            return Err(RepoError::InvalidInput {
                message: "project does not exist".to_string(),
            });
        }
        if tables
            .places
            .iter()
            .any(|p| p.project_id == params.project_id && p.external_id == params.external_id)
        {
            return Err(RepoError::Duplicate {
                constraint: "project_places_project_external_key".to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let record = PlaceRecord {
            id: Uuid::new_v4(),
            project_id: params.project_id,
            external_id: params.external_id,
            title: params.title,
            notes: params.notes,
            visited: false,
            visited_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.places.push(record.clone());
        Ok(record)
    }

    async fn find_place_in_project(
        &self,
        project_id: Uuid,
        place_id: Uuid,
    ) -> Result<Option<PlaceRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .places
            .iter()
            .find(|p| p.id == place_id && p.project_id == project_id)
            .cloned())
    }

    async fn list_places_for_project(
        &self,
        project_id: Uuid,
        filter: &PlaceQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PlaceRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let rows = tables
            .places
            .iter()
            .filter(|p| p.project_id == project_id)
            .filter(|p| filter.visited.is_none_or(|v| p.visited == v))
            .cloned();
        Ok(window(rows, page))
    }

    async fn update_place(&self, params: UpdatePlaceParams) -> Result<PlaceRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let place = tables
            .places
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        place.notes = params.notes;
        place.visited = params.visited;
        place.visited_at = params.visited_at;
        place.updated_at = OffsetDateTime::now_utc();
        Ok(place.clone())
    }

    async fn count_places(&self, project_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .places
            .iter()
            .filter(|p| p.project_id == project_id)
            .count() as u64)
    }

    async fn count_visited_places(&self, project_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .places
            .iter()
            .filter(|p| p.project_id == project_id && p.visited)
            .count() as u64)
    }

    async fn exists_place(&self, project_id: Uuid, external_id: i64) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .places
            .iter()
            .any(|p| p.project_id == project_id && p.external_id == external_id))
    }
}

#[async_trait]
impl HealthProbe for MemoryRepos {
    async fn check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Scripted catalog: known ids resolve to titles, scripted failures are returned as-is,
/// everything else is `NotFound`.
#[derive(Default)]
pub struct FakeCatalog {
    titles: std::sync::Mutex<HashMap<i64, String>>,
    failures: std::sync::Mutex<HashMap<i64, CatalogError>>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn with_titles(titles: &[(i64, &str)]) -> Self {
        let catalog = Self::default();
        for (id, title) in titles {
            catalog.add(*id, title);
        }
        catalog
    }

    pub fn add(&self, external_id: i64, title: &str) {
        self.titles
            .lock()
            .expect("titles lock")
            .insert(external_id, title.to_string());
    }

    pub fn fail(&self, external_id: i64, error: CatalogError) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(external_id, error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceCatalog for FakeCatalog {
    async fn resolve(&self, external_id: i64) -> Result<ExternalPlaceRecord, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self
            .failures
            .lock()
            .expect("failures lock")
            .get(&external_id)
        {
            return Err(error.clone());
        }
        match self.titles.lock().expect("titles lock").get(&external_id) {
            Some(title) => Ok(ExternalPlaceRecord {
                external_id,
                title: Some(title.clone()),
            }),
            None => Err(CatalogError::NotFound { external_id }),
        }
    }
}

pub struct Harness {
    pub repos: Arc<MemoryRepos>,
    pub catalog: Arc<FakeCatalog>,
    pub service: ProjectService,
}

pub fn harness(catalog: FakeCatalog) -> Harness {
    harness_with_limits(catalog, PlaceLimits::default())
}

pub fn harness_with_limits(catalog: FakeCatalog, limits: PlaceLimits) -> Harness {
    let repos = Arc::new(MemoryRepos::default());
    let catalog = Arc::new(catalog);
    let service = ProjectService::new(repos.clone(), repos.clone(), catalog.clone(), limits);
    Harness {
        repos,
        catalog,
        service,
    }
}
