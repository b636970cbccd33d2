mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use tripwise::application::projects::{PlaceLimits, ProjectService};
use tripwise::catalog::{CatalogCacheConfig, CatalogError, CatalogService};
use tripwise::infra::http::{ApiState, OWNER_HEADER, build_router};

use common::{FakeCatalog, MemoryRepos};

fn app(catalog: FakeCatalog) -> Router {
    let repos = Arc::new(MemoryRepos::default());
    let catalog = Arc::new(CatalogService::new(
        Arc::new(catalog),
        &CatalogCacheConfig::default(),
    ));
    let projects = Arc::new(ProjectService::new(
        repos.clone(),
        repos.clone(),
        catalog.clone(),
        PlaceLimits::default(),
    ));
    build_router(ApiState {
        projects,
        catalog,
        health: repos,
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    owner: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner) = owner {
        builder = builder.header(OWNER_HEADER, owner.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn vase_and_urn() -> FakeCatalog {
    FakeCatalog::with_titles(&[(10, "Vase"), (20, "Urn"), (30, "Lamp")])
}

#[tokio::test]
async fn health_reports_no_content() {
    let app = app(FakeCatalog::default());
    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn project_routes_require_owner_header() {
    let app = app(FakeCatalog::default());

    let (status, body) = send(&app, Method::GET, "/api/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let request = Request::builder()
        .uri("/api/v1/projects")
        .header(OWNER_HEADER, "nope")
        .body(Body::empty())
        .expect("request should build");
    let response = app.oneshot(request).await.expect("router should respond");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_then_fetch_project_with_places() {
    let app = app(vase_and_urn());
    let owner = Uuid::new_v4();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/projects",
        Some(owner),
        Some(json!({
            "name": "Chicago weekend",
            "start_date": "2026-11-02",
            "places": [{ "external_id": 10 }, { "external_id": 20, "notes": "east wing" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_completed"], false);
    assert_eq!(created["start_date"], "2026-11-02");
    assert_eq!(created["places"][0]["title"], "Vase");
    assert_eq!(created["places"][1]["title"], "Urn");
    assert_eq!(created["places"][1]["notes"], "east wing");

    let id = created["id"].as_str().expect("id");
    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/v1/projects/{id}"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["places"].as_array().map(Vec::len), Some(2));

    let (status, listed) = send(&app, Method::GET, "/api/v1/projects", Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/projects/{id}"),
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn visiting_every_place_completes_project_over_http() {
    let app = app(vase_and_urn());
    let owner = Uuid::new_v4();
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/projects",
        Some(owner),
        Some(json!({ "name": "Trip", "places": [{ "external_id": 10 }] })),
    )
    .await;
    let id = created["id"].as_str().expect("id");
    let place_id = created["places"][0]["id"].as_str().expect("place id");

    let (status, place) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/projects/{id}/places/{place_id}"),
        Some(owner),
        Some(json!({ "visited": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(place["visited"], true);
    assert!(place["visited_at"].is_string());

    let (_, project) = send(
        &app,
        Method::GET,
        &format!("/api/v1/projects/{id}"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(project["is_completed"], true);
    assert!(project["completed_at"].is_string());

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/projects/{id}"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "project_has_visited_places");
}

#[tokio::test]
async fn place_errors_map_to_statuses() {
    let catalog = vase_and_urn();
    catalog.fail(40, CatalogError::RateLimited);
    catalog.fail(50, CatalogError::bad_response("html"));
    let app = app(catalog);
    let owner = Uuid::new_v4();
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/projects",
        Some(owner),
        Some(json!({ "name": "Trip", "places": [{ "external_id": 10 }] })),
    )
    .await;
    let places_uri = format!(
        "/api/v1/projects/{}/places",
        created["id"].as_str().expect("id")
    );

    let cases = [
        (10, StatusCode::CONFLICT, "place_already_exists"),
        (999, StatusCode::BAD_REQUEST, "place_not_found_in_catalog"),
        (40, StatusCode::SERVICE_UNAVAILABLE, "catalog_unavailable"),
        (50, StatusCode::BAD_GATEWAY, "catalog_bad_response"),
    ];
    for (external_id, expected_status, expected_code) in cases {
        let (status, body) = send(
            &app,
            Method::POST,
            &places_uri,
            Some(owner),
            Some(json!({ "external_id": external_id })),
        )
        .await;
        assert_eq!(status, expected_status, "external id {external_id}");
        assert_eq!(body["error"]["code"], expected_code);
    }

    let (status, added) = send(
        &app,
        Method::POST,
        &places_uri,
        Some(owner),
        Some(json!({ "external_id": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["title"], "Lamp");

    let (_, listed) = send(
        &app,
        Method::GET,
        &format!("{places_uri}?visited=false"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn duplicate_ids_in_create_request_are_rejected() {
    let app = app(vase_and_urn());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/projects",
        Some(Uuid::new_v4()),
        Some(json!({ "name": "Trip", "places": [{ "external_id": 10 }, { "external_id": 10 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "duplicate_place_in_request");
}

#[tokio::test]
async fn patch_project_clears_description_with_null() {
    let app = app(vase_and_urn());
    let owner = Uuid::new_v4();
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/projects",
        Some(owner),
        Some(json!({
            "name": "Trip",
            "description": "museums",
            "places": [{ "external_id": 10 }]
        })),
    )
    .await;
    let uri = format!("/api/v1/projects/{}", created["id"].as_str().expect("id"));

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(owner),
        Some(json!({ "description": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Trip");
    assert!(updated["description"].is_null());
}

#[tokio::test]
async fn external_lookup_proxies_catalog() {
    let catalog = vase_and_urn();
    catalog.fail(40, CatalogError::Timeout);
    let app = app(catalog);

    let (status, body) = send(&app, Method::GET, "/api/v1/external/places/10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 10, "title": "Vase" }));

    let (status, _) = send(&app, Method::GET, "/api/v1/external/places/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/v1/external/places/40", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
