//! Database repository for cooks.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::{Repository, contains_pattern, non_blank},
        models::cooks::{CookCreateDBRequest, CookDBResponse, CookUpdateDBRequest},
    },
    types::{CookId, DishId},
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::instrument;

/// Filter for listing cooks
#[derive(Debug, Clone)]
pub struct CookFilter {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive substring of the username
    pub username: Option<String>,
    /// Case-insensitive substring of the last name
    pub last_name: Option<String>,
    /// Inclusive bounds on years of experience
    pub experience: Option<RangeInclusive<i32>>,
}

impl CookFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            username: None,
            last_name: None,
            experience: None,
        }
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn with_last_name(mut self, last_name: Option<String>) -> Self {
        self.last_name = last_name;
        self
    }

    pub fn with_experience(mut self, experience: Option<RangeInclusive<i32>>) -> Self {
        self.experience = experience;
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(username) = non_blank(&self.username) {
            query.push(" AND username ILIKE ");
            query.push_bind(contains_pattern(username));
        }
        if let Some(last_name) = non_blank(&self.last_name) {
            query.push(" AND last_name ILIKE ");
            query.push_bind(contains_pattern(last_name));
        }
        if let Some(range) = &self.experience {
            query.push(" AND years_of_experience BETWEEN ");
            query.push_bind(*range.start());
            query.push(" AND ");
            query.push_bind(*range.end());
        }
    }
}

pub struct Cooks<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Cooks<'c> {
    type CreateRequest = CookCreateDBRequest;
    type UpdateRequest = CookUpdateDBRequest;
    type Response = CookDBResponse;
    type Id = CookId;
    type Filter = CookFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let cook = sqlx::query_as::<_, CookDBResponse>(
            r#"
            INSERT INTO cooks (
                username, first_name, last_name, email, password_hash,
                years_of_experience, is_staff, is_superuser
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.years_of_experience)
        .bind(request.is_staff)
        .bind(request.is_superuser)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(cook)
    }

    #[instrument(skip(self), fields(cook_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let cook = sqlx::query_as::<_, CookDBResponse>("SELECT * FROM cooks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(cook)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<CookId>) -> Result<HashMap<CookId, CookDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let cooks = sqlx::query_as::<_, CookDBResponse>("SELECT * FROM cooks WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(cooks.into_iter().map(|cook| (cook.id, cook)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM cooks WHERE 1=1");
        filter.push_conditions(&mut query);

        query.push(" ORDER BY LOWER(username), id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        tracing::debug!("Executing SQL: {}", query.sql());

        let cooks = query.build_query_as::<CookDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(cooks)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM cooks WHERE 1=1");
        filter.push_conditions(&mut query);

        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(cook_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cooks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(cook_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let cook = sqlx::query_as::<_, CookDBResponse>(
            r#"
            UPDATE cooks SET
                username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                email = COALESCE($5, email),
                password_hash = COALESCE($6, password_hash),
                years_of_experience = COALESCE($7, years_of_experience),
                is_staff = COALESCE($8, is_staff),
                is_superuser = COALESCE($9, is_superuser),
                is_active = COALESCE($10, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.username)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.years_of_experience)
        .bind(request.is_staff)
        .bind(request.is_superuser)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(cook)
    }
}

impl<'c> Cooks<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<CookDBResponse>> {
        let cook = sqlx::query_as::<_, CookDBResponse>("SELECT * FROM cooks WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(cook)
    }

    /// Whether another cook already uses `username`. `exclude` skips the cook being edited.
    #[instrument(skip(self), err)]
    pub async fn username_taken(&mut self, username: &str, exclude: Option<CookId>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cooks WHERE username = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken)
    }

    /// Every cook in default order, for choice lists.
    #[instrument(skip(self), err)]
    pub async fn list_all(&mut self) -> Result<Vec<CookDBResponse>> {
        let cooks = sqlx::query_as::<_, CookDBResponse>("SELECT * FROM cooks ORDER BY LOWER(username), id")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(cooks)
    }

    /// Cooks assigned to a dish, in default order.
    #[instrument(skip(self), fields(dish_id = dish_id), err)]
    pub async fn list_by_dish(&mut self, dish_id: DishId) -> Result<Vec<CookDBResponse>> {
        let cooks = sqlx::query_as::<_, CookDBResponse>(
            r#"
            SELECT c.* FROM cooks c
            JOIN dishes_cooks dc ON dc.cook_id = c.id
            WHERE dc.dish_id = $1
            ORDER BY LOWER(c.username), c.id
            "#,
        )
        .bind(dish_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(cooks)
    }

    #[instrument(skip(self), fields(cook_id = id), err)]
    pub async fn record_login(&mut self, id: CookId) -> Result<()> {
        sqlx::query("UPDATE cooks SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }
}
