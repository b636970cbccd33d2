use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreatePlaceParams, PageRequest, PlaceQueryFilter, PlacesRepo, RepoError,
        UpdatePlaceParams,
    },
    domain::entities::PlaceRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const PLACE_COLUMNS: &str = "id, project_id, external_id, title, notes, visited, visited_at, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PlaceRow {
    id: Uuid,
    project_id: Uuid,
    external_id: i64,
    title: Option<String>,
    notes: Option<String>,
    visited: bool,
    visited_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PlaceRow> for PlaceRecord {
    fn from(row: PlaceRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            external_id: row.external_id,
            title: row.title,
            notes: row.notes,
            visited: row.visited,
            visited_at: row.visited_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn count_places_where(
        &self,
        project_id: Uuid,
        visited_only: bool,
    ) -> Result<u64, RepoError> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM project_places WHERE project_id = ");
        qb.push_bind(project_id);
        if visited_only {
            qb.push(" AND visited");
        }
        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl PlacesRepo for PostgresRepositories {
    async fn create_place(&self, params: CreatePlaceParams) -> Result<PlaceRecord, RepoError> {
        let sql = format!(
            "INSERT INTO project_places (id, project_id, external_id, title, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PLACE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.project_id)
            .bind(params.external_id)
            .bind(params.title)
            .bind(params.notes)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_place_in_project(
        &self,
        project_id: Uuid,
        place_id: Uuid,
    ) -> Result<Option<PlaceRecord>, RepoError> {
        let sql = format!(
            "SELECT {PLACE_COLUMNS} FROM project_places WHERE project_id = $1 AND id = $2"
        );
        let row = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(project_id)
            .bind(place_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_places_for_project(
        &self,
        project_id: Uuid,
        filter: &PlaceQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PlaceRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PLACE_COLUMNS} FROM project_places WHERE project_id = "
        ));
        qb.push_bind(project_id);

        if let Some(visited) = filter.visited {
            qb.push(" AND visited = ");
            qb.push_bind(visited);
        }

        qb.push(" ORDER BY created_at ASC, id ASC LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<PlaceRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_place(&self, params: UpdatePlaceParams) -> Result<PlaceRecord, RepoError> {
        let sql = format!(
            "UPDATE project_places \
             SET notes = $2, visited = $3, visited_at = $4, updated_at = now() \
             WHERE id = $1 RETURNING {PLACE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(params.id)
            .bind(params.notes)
            .bind(params.visited)
            .bind(params.visited_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn count_places(&self, project_id: Uuid) -> Result<u64, RepoError> {
        self.count_places_where(project_id, false).await
    }

    async fn count_visited_places(&self, project_id: Uuid) -> Result<u64, RepoError> {
        self.count_places_where(project_id, true).await
    }

    async fn exists_place(&self, project_id: Uuid, external_id: i64) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM project_places WHERE project_id = $1 AND external_id = $2)",
        )
        .bind(project_id)
        .bind(external_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
