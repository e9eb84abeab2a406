//! Database repository for dishes and the cook assignments on them.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::{Repository, contains_pattern, non_blank},
        models::dishes::{Assignment, DishCreateDBRequest, DishDBResponse, DishUpdateDBRequest},
    },
    types::{CookId, DishId, DishTypeId},
};
use sqlx::{Connection, FromRow, PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

const SELECT_DISH: &str = r#"
    SELECT d.id, d.name, d.description, d.price, d.dish_type_id, t.name AS dish_type_name
    FROM dishes d
    JOIN dish_types t ON t.id = d.dish_type_id
"#;

/// Filter for listing dishes
#[derive(Debug, Clone)]
pub struct DishFilter {
    pub skip: i64,
    pub limit: i64,
    pub name: Option<String>,
    pub dish_type_id: Option<DishTypeId>,
}

impl DishFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            name: None,
            dish_type_id: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_dish_type(mut self, dish_type_id: Option<DishTypeId>) -> Self {
        self.dish_type_id = dish_type_id;
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(name) = non_blank(&self.name) {
            query.push(" AND d.name ILIKE ");
            query.push_bind(contains_pattern(name));
        }
        if let Some(dish_type_id) = self.dish_type_id {
            query.push(" AND d.dish_type_id = ");
            query.push_bind(dish_type_id);
        }
    }
}

#[derive(FromRow)]
struct DishCook {
    dish_id: DishId,
    cook_id: CookId,
}

pub struct Dishes<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Dishes<'c> {
    type CreateRequest = DishCreateDBRequest;
    type UpdateRequest = DishUpdateDBRequest;
    type Response = DishDBResponse;
    type Id = DishId;
    type Filter = DishFilter;

    #[instrument(skip(self, request), fields(name = %request.name, cooks = request.cook_ids.len()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let dish_id: DishId = sqlx::query_scalar(
            r#"
            INSERT INTO dishes (name, description, price, dish_type_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.dish_type_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_assignments(&mut tx, dish_id, &request.cook_ids).await?;

        let dish = sqlx::query_as::<_, DishDBResponse>(&format!("{SELECT_DISH} WHERE d.id = $1"))
            .bind(dish_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(dish)
    }

    #[instrument(skip(self), fields(dish_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let dish = sqlx::query_as::<_, DishDBResponse>(&format!("{SELECT_DISH} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(dish)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<DishId>) -> Result<HashMap<DishId, DishDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let dishes = sqlx::query_as::<_, DishDBResponse>(&format!("{SELECT_DISH} WHERE d.id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(dishes.into_iter().map(|d| (d.id, d)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_DISH);
        query.push(" WHERE 1=1");
        filter.push_conditions(&mut query);

        query.push(" ORDER BY LOWER(d.name), d.id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let dishes = query.build_query_as::<DishDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(dishes)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM dishes d WHERE 1=1");
        filter.push_conditions(&mut query);

        let count = query.build_query_scalar::<i64>().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), fields(dish_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(dish_id = id, cooks = request.cook_ids.len()), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, DishId>(
            r#"
            UPDATE dishes SET
                name = $2,
                description = $3,
                price = $4,
                dish_type_id = $5
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.dish_type_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        sqlx::query("DELETE FROM dishes_cooks WHERE dish_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_assignments(&mut tx, id, &request.cook_ids).await?;

        let dish = sqlx::query_as::<_, DishDBResponse>(&format!("{SELECT_DISH} WHERE d.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(dish)
    }
}

async fn insert_assignments(conn: &mut PgConnection, dish_id: DishId, cook_ids: &[CookId]) -> Result<()> {
    if cook_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO dishes_cooks (dish_id, cook_id)
        SELECT $1, cook_id FROM UNNEST($2::BIGINT[]) AS cook_id
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(dish_id)
    .bind(cook_ids)
    .execute(conn)
    .await?;

    Ok(())
}

impl<'c> Dishes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Whether another dish already has `name`. `exclude` skips the dish being edited.
    #[instrument(skip(self), err)]
    pub async fn name_taken(&mut self, name: &str, exclude: Option<DishId>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM dishes WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken)
    }

    /// Dishes a cook is assigned to, with their dish type, in default order.
    #[instrument(skip(self), fields(cook_id = cook_id), err)]
    pub async fn list_by_cook(&mut self, cook_id: CookId) -> Result<Vec<DishDBResponse>> {
        let dishes = sqlx::query_as::<_, DishDBResponse>(&format!(
            "{SELECT_DISH} JOIN dishes_cooks dc ON dc.dish_id = d.id WHERE dc.cook_id = $1 ORDER BY LOWER(d.name), d.id"
        ))
        .bind(cook_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(dishes)
    }

    /// Ids of the cooks assigned to a dish.
    #[instrument(skip(self), fields(dish_id = dish_id), err)]
    pub async fn cook_ids(&mut self, dish_id: DishId) -> Result<Vec<CookId>> {
        let ids = sqlx::query_scalar::<_, CookId>("SELECT cook_id FROM dishes_cooks WHERE dish_id = $1 ORDER BY cook_id")
            .bind(dish_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(ids)
    }

    /// Ids of the cooks assigned to each dish. Dishes without cooks map to an empty list.
    #[instrument(skip(self, dish_ids), fields(count = dish_ids.len()), err)]
    pub async fn cook_ids_bulk(&mut self, dish_ids: &[DishId]) -> Result<HashMap<DishId, Vec<CookId>>> {
        let mut result: HashMap<DishId, Vec<CookId>> = dish_ids.iter().map(|id| (*id, Vec::new())).collect();
        if dish_ids.is_empty() {
            return Ok(result);
        }

        let rows = sqlx::query_as::<_, DishCook>(
            "SELECT dish_id, cook_id FROM dishes_cooks WHERE dish_id = ANY($1) ORDER BY dish_id, cook_id",
        )
        .bind(dish_ids)
        .fetch_all(&mut *self.db)
        .await?;

        for row in rows {
            result.entry(row.dish_id).or_default().push(row.cook_id);
        }

        Ok(result)
    }

    #[instrument(skip(self), err)]
    pub async fn is_assigned(&mut self, dish_id: DishId, cook_id: CookId) -> Result<bool> {
        let assigned: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dishes_cooks WHERE dish_id = $1 AND cook_id = $2)")
                .bind(dish_id)
                .bind(cook_id)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(assigned)
    }

    /// Remove the cook from the dish if assigned, otherwise assign them.
    ///
    /// The dish row is locked for the duration of the transaction, so concurrent toggles on
    /// the same dish run one after another and each sees the previous one's result.
    #[instrument(skip(self), err)]
    pub async fn toggle_assignment(&mut self, dish_id: DishId, cook_id: CookId) -> Result<Assignment> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, DishId>("SELECT id FROM dishes WHERE id = $1 FOR UPDATE")
            .bind(dish_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let removed = sqlx::query("DELETE FROM dishes_cooks WHERE dish_id = $1 AND cook_id = $2")
            .bind(dish_id)
            .bind(cook_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let outcome = if removed > 0 {
            Assignment::Removed
        } else {
            sqlx::query("INSERT INTO dishes_cooks (dish_id, cook_id) VALUES ($1, $2)")
                .bind(dish_id)
                .bind(cook_id)
                .execute(&mut *tx)
                .await?;
            Assignment::Assigned
        };

        tx.commit().await?;
        tracing::debug!(?outcome, "Toggled cook assignment");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        handlers::{Cooks, DishTypes},
        models::{cooks::CookCreateDBRequest, dish_types::DishTypeCreateDBRequest},
    };
    use rust_decimal::Decimal;
    use sqlx::PgPool;
    use std::str::FromStr;

    async fn create_cooks(pool: &PgPool, count: usize) -> Vec<CookId> {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Cooks::new(&mut conn);
        let mut ids = Vec::new();
        for i in 0..count {
            let cook = repo
                .create(&CookCreateDBRequest {
                    username: format!("cook{i}"),
                    first_name: String::new(),
                    last_name: String::new(),
                    email: String::new(),
                    password_hash: String::new(),
                    years_of_experience: 0,
                    is_staff: false,
                    is_superuser: false,
                })
                .await
                .unwrap();
            ids.push(cook.id);
        }
        ids
    }

    async fn create_dish_type(pool: &PgPool, name: &str) -> DishTypeId {
        let mut conn = pool.acquire().await.unwrap();
        DishTypes::new(&mut conn)
            .create(&DishTypeCreateDBRequest { name: name.to_string() })
            .await
            .unwrap()
            .id
    }

    fn dish(name: &str, price: &str, dish_type_id: DishTypeId, cook_ids: Vec<CookId>) -> DishCreateDBRequest {
        DishCreateDBRequest {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::from_str(price).unwrap(),
            dish_type_id,
            cook_ids,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_dish_keeps_exact_price_and_cooks(pool: PgPool) {
        let cooks = create_cooks(&pool, 3).await;
        let soup = create_dish_type(&pool, "Soup").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Dishes::new(&mut conn);

        let created = repo.create(&dish("Borscht", "88.88", soup, cooks.clone())).await.unwrap();
        assert_eq!(created.price, Decimal::from_str("88.88").unwrap());
        assert_eq!(created.price.to_string(), "88.88");
        assert_eq!(created.dish_type_name, "Soup");

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, created.price);
        assert_eq!(repo.cook_ids(created.id).await.unwrap(), cooks);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_unknown_dish_type_is_fk_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Dishes::new(&mut conn);

        let err = repo.create(&dish("Ghost", "1.00", 12345, vec![])).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(repo.count(&DishFilter::new(0, 5)).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_replaces_fields_and_cooks(pool: PgPool) {
        let cooks = create_cooks(&pool, 3).await;
        let soup = create_dish_type(&pool, "Soup").await;
        let main = create_dish_type(&pool, "Main").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Dishes::new(&mut conn);

        let created = repo.create(&dish("Borscht", "10.00", soup, vec![cooks[0], cooks[1]])).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &DishUpdateDBRequest {
                    name: "Goulash".to_string(),
                    description: "Stew".to_string(),
                    price: Decimal::from_str("12.50").unwrap(),
                    dish_type_id: main,
                    cook_ids: vec![cooks[2]],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Goulash");
        assert_eq!(updated.dish_type_name, "Main");
        assert_eq!(repo.cook_ids(created.id).await.unwrap(), vec![cooks[2]]);

        let missing = repo
            .update(
                created.id + 100,
                &DishUpdateDBRequest {
                    name: "X".to_string(),
                    description: String::new(),
                    price: Decimal::ONE,
                    dish_type_id: main,
                    cook_ids: vec![],
                },
            )
            .await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_dish_type_deletes_its_dishes(pool: PgPool) {
        let cooks = create_cooks(&pool, 1).await;
        let soup = create_dish_type(&pool, "Soup").await;
        let main = create_dish_type(&pool, "Main").await;

        let mut conn = pool.acquire().await.unwrap();
        {
            let mut repo = Dishes::new(&mut conn);
            for name in ["Borscht", "Solyanka", "Ukha"] {
                repo.create(&dish(name, "5.00", soup, cooks.clone())).await.unwrap();
            }
            repo.create(&dish("Steak", "20.00", main, vec![])).await.unwrap();
        }

        assert!(DishTypes::new(&mut conn).delete(soup).await.unwrap());

        let mut repo = Dishes::new(&mut conn);
        let remaining = repo.list(&DishFilter::new(0, 10)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Steak");
        assert!(repo.list_by_cook(cooks[0]).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_cook_only_removes_assignments(pool: PgPool) {
        let cooks = create_cooks(&pool, 2).await;
        let soup = create_dish_type(&pool, "Soup").await;

        let mut conn = pool.acquire().await.unwrap();
        let created = Dishes::new(&mut conn)
            .create(&dish("Borscht", "5.00", soup, cooks.clone()))
            .await
            .unwrap();

        assert!(Cooks::new(&mut conn).delete(cooks[0]).await.unwrap());

        let mut repo = Dishes::new(&mut conn);
        assert!(repo.get_by_id(created.id).await.unwrap().is_some());
        assert_eq!(repo.cook_ids(created.id).await.unwrap(), vec![cooks[1]]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_filter_by_name_and_type(pool: PgPool) {
        let soup = create_dish_type(&pool, "Soup").await;
        let main = create_dish_type(&pool, "Main").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Dishes::new(&mut conn);
        repo.create(&dish("Tomato soup", "4.00", soup, vec![])).await.unwrap();
        repo.create(&dish("onion SOUP", "4.50", soup, vec![])).await.unwrap();
        repo.create(&dish("Soup dumplings", "8.00", main, vec![])).await.unwrap();
        repo.create(&dish("Steak", "20.00", main, vec![])).await.unwrap();

        let filter = DishFilter::new(0, 10).with_name(Some("soup".to_string()));
        let names: Vec<_> = repo.list(&filter).await.unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["onion SOUP", "Soup dumplings", "Tomato soup"]);

        let filter = DishFilter::new(0, 10).with_dish_type(Some(main));
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let filter = DishFilter::new(0, 10)
            .with_name(Some("soup".to_string()))
            .with_dish_type(Some(main));
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_toggle_assignment_flips_membership(pool: PgPool) {
        let cooks = create_cooks(&pool, 1).await;
        let soup = create_dish_type(&pool, "Soup").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Dishes::new(&mut conn);
        let created = repo.create(&dish("Borscht", "5.00", soup, vec![])).await.unwrap();

        assert_eq!(repo.toggle_assignment(created.id, cooks[0]).await.unwrap(), Assignment::Assigned);
        assert!(repo.is_assigned(created.id, cooks[0]).await.unwrap());
        assert_eq!(repo.list_by_cook(cooks[0]).await.unwrap().len(), 1);

        assert_eq!(repo.toggle_assignment(created.id, cooks[0]).await.unwrap(), Assignment::Removed);
        assert!(!repo.is_assigned(created.id, cooks[0]).await.unwrap());

        let missing = repo.toggle_assignment(created.id + 100, cooks[0]).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_toggles_stay_consistent(pool: PgPool) {
        let cooks = create_cooks(&pool, 1).await;
        let soup = create_dish_type(&pool, "Soup").await;
        let dish_id = {
            let mut conn = pool.acquire().await.unwrap();
            Dishes::new(&mut conn).create(&dish("Borscht", "5.00", soup, vec![])).await.unwrap().id
        };

        let toggles = (0..6).map(|_| {
            let pool = pool.clone();
            let cook_id = cooks[0];
            tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                Dishes::new(&mut conn).toggle_assignment(dish_id, cook_id).await.unwrap()
            })
        });
        let outcomes: Vec<Assignment> = futures::future::join_all(toggles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let assigned = outcomes.iter().filter(|o| **o == Assignment::Assigned).count();
        assert_eq!(assigned, 3);

        let mut conn = pool.acquire().await.unwrap();
        assert!(!Dishes::new(&mut conn).is_assigned(dish_id, cooks[0]).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cook_ids_bulk(pool: PgPool) {
        let cooks = create_cooks(&pool, 2).await;
        let soup = create_dish_type(&pool, "Soup").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Dishes::new(&mut conn);
        let a = repo.create(&dish("A", "1.00", soup, cooks.clone())).await.unwrap();
        let b = repo.create(&dish("B", "1.00", soup, vec![])).await.unwrap();

        let bulk = repo.cook_ids_bulk(&[a.id, b.id]).await.unwrap();
        assert_eq!(bulk[&a.id], cooks);
        assert!(bulk[&b.id].is_empty());
        assert!(!repo.name_taken("C", None).await.unwrap());
        assert!(repo.name_taken("A", Some(b.id)).await.unwrap());
        assert!(!repo.name_taken("A", Some(a.id)).await.unwrap());
    }
}
