use std::sync::Arc;

use async_trait::async_trait;

use crate::application::projects::ProjectService;
use crate::application::repos::RepoError;
use crate::catalog::CatalogService;

/// Liveness check for the backing store.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> Result<(), RepoError>;
}

#[derive(Clone)]
pub struct ApiState {
    pub projects: Arc<ProjectService>,
    pub catalog: Arc<CatalogService>,
    pub health: Arc<dyn HealthProbe>,
}
