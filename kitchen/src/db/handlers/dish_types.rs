//! Database repository for dish types.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::{Repository, contains_pattern, non_blank},
        models::dish_types::{DishTypeCreateDBRequest, DishTypeDBResponse, DishTypeUpdateDBRequest},
    },
    types::DishTypeId,
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing dish types
#[derive(Debug, Clone)]
pub struct DishTypeFilter {
    pub skip: i64,
    pub limit: i64,
    pub name: Option<String>,
}

impl DishTypeFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, name: None }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(name) = non_blank(&self.name) {
            query.push(" AND name ILIKE ");
            query.push_bind(contains_pattern(name));
        }
    }
}

pub struct DishTypes<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for DishTypes<'c> {
    type CreateRequest = DishTypeCreateDBRequest;
    type UpdateRequest = DishTypeUpdateDBRequest;
    type Response = DishTypeDBResponse;
    type Id = DishTypeId;
    type Filter = DishTypeFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let dish_type = sqlx::query_as::<_, DishTypeDBResponse>("INSERT INTO dish_types (name) VALUES ($1) RETURNING id, name")
            .bind(&request.name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(dish_type)
    }

    #[instrument(skip(self), fields(dish_type_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let dish_type = sqlx::query_as::<_, DishTypeDBResponse>("SELECT id, name FROM dish_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(dish_type)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<DishTypeId>) -> Result<HashMap<DishTypeId, DishTypeDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let dish_types = sqlx::query_as::<_, DishTypeDBResponse>("SELECT id, name FROM dish_types WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(dish_types.into_iter().map(|t| (t.id, t)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT id, name FROM dish_types WHERE 1=1");
        filter.push_conditions(&mut query);

        query.push(" ORDER BY LOWER(name), id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let dish_types = query.build_query_as::<DishTypeDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(dish_types)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM dish_types WHERE 1=1");
        filter.push_conditions(&mut query);

        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// Deleting a dish type deletes every dish of that type.
    #[instrument(skip(self), fields(dish_type_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dish_types WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(dish_type_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let dish_type = sqlx::query_as::<_, DishTypeDBResponse>("UPDATE dish_types SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(&request.name)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(dish_type)
    }
}

impl<'c> DishTypes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Whether another dish type already has `name`. `exclude` skips the dish type being edited.
    #[instrument(skip(self), err)]
    pub async fn name_taken(&mut self, name: &str, exclude: Option<DishTypeId>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM dish_types WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken)
    }

    /// Every dish type in default order, for choice lists.
    #[instrument(skip(self), err)]
    pub async fn list_all(&mut self) -> Result<Vec<DishTypeDBResponse>> {
        let dish_types = sqlx::query_as::<_, DishTypeDBResponse>("SELECT id, name FROM dish_types ORDER BY LOWER(name), id")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(dish_types)
    }
}
