//! Domain entities mirrored from persistent storage.

use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// A place as described by the external catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPlaceRecord {
    pub external_id: i64,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub is_completed: bool,
    pub completed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub external_id: i64,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub visited: bool,
    pub visited_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A project together with the places it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectWithPlaces {
    pub project: ProjectRecord,
    pub places: Vec<PlaceRecord>,
}
