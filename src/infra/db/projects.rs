use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    application::repos::{
        CreateProjectParams, PageRequest, ProjectQueryFilter, ProjectsRepo, RepoError,
        SetCompletionParams, UpdateProjectParams,
    },
    domain::entities::ProjectRecord,
};

use super::{PostgresRepositories, contains_pattern, map_sqlx_error};

const PROJECT_COLUMNS: &str = "id, user_id, name, description, start_date, is_completed, \
     completed_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    start_date: Option<Date>,
    is_completed: bool,
    completed_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ProjectRow> for ProjectRecord {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProjectsRepo for PostgresRepositories {
    async fn create_project(
        &self,
        params: CreateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let sql = format!(
            "INSERT INTO travel_projects (id, user_id, name, description, start_date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.user_id)
            .bind(params.name)
            .bind(params.description)
            .bind(params.start_date)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepoError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM travel_projects WHERE id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_project_for_owner(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ProjectRecord>, RepoError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM travel_projects WHERE id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_projects_for_owner(
        &self,
        user_id: Uuid,
        filter: &ProjectQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<ProjectRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROJECT_COLUMNS} FROM travel_projects WHERE user_id = "
        ));
        qb.push_bind(user_id);

        if let Some(is_completed) = filter.is_completed {
            qb.push(" AND is_completed = ");
            qb.push_bind(is_completed);
        }

        if let Some(search) = filter.search.as_ref().and_then(|value| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }) {
            qb.push(" AND name ILIKE ");
            qb.push_bind(contains_pattern(&search));
            qb.push(r" ESCAPE '\'");
        }

        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<ProjectRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_project(
        &self,
        params: UpdateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let sql = format!(
            "UPDATE travel_projects \
             SET name = $2, description = $3, start_date = $4, updated_at = now() \
             WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(params.id)
            .bind(params.name)
            .bind(params.description)
            .bind(params.start_date)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn set_completion(
        &self,
        params: SetCompletionParams,
    ) -> Result<ProjectRecord, RepoError> {
        let sql = format!(
            "UPDATE travel_projects \
             SET is_completed = $2, completed_at = $3, updated_at = now() \
             WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(params.id)
            .bind(params.is_completed)
            .bind(params.completed_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM travel_projects WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
