pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use middleware::{OWNER_HEADER, Owner};
pub use state::{ApiState, HealthProbe};

use axum::{
    Router, middleware as axum_middleware,
    routing::get,
};

/// Routes under `/api/v1`. Project routes require an owner; the catalog proxy does not.
pub fn build_api_router(state: ApiState) -> Router {
    let owned = Router::new()
        .route(
            "/api/v1/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/v1/projects/{id}",
            get(handlers::get_project)
                .patch(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/api/v1/projects/{id}/places",
            get(handlers::list_places).post(handlers::add_place),
        )
        .route(
            "/api/v1/projects/{id}/places/{place_id}",
            get(handlers::get_place).patch(handlers::update_place),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_owner));

    Router::new()
        .merge(owned)
        .route(
            "/api/v1/external/places/{external_id}",
            get(handlers::get_external_place),
        )
        .with_state(state)
}
