use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        handlers::{
            acquire,
            admin::{missing, rejected},
            validation::{catalog_name, check_dish},
        },
        models::{
            admin::ListFilter,
            dishes::{DishCreate, DishForm, DishResponse, DishUpdate, ListDishesQuery, NAME_MAX_LENGTH},
            pagination::PaginatedResponse,
        },
    },
    auth::current_user::Superuser,
    db::handlers::{DishTypes, Dishes, Repository, dishes::DishFilter},
    errors::{Error, Result},
    types::{DishId, Resource},
};

/// Clean a body and check its name, dish type and cooks against the database.
async fn clean_body(state: &AppState, body: DishCreate, exclude: Option<DishId>) -> Result<DishForm> {
    let mut form = body.clean().map_err(|errors| Error::Validation { errors })?;
    form.name =
        catalog_name(&state.config, form.name, NAME_MAX_LENGTH).map_err(|errors| Error::Validation { errors })?;

    let mut conn = acquire(state).await?;
    let errors = check_dish(&mut conn, &form, exclude).await?;
    if !errors.is_empty() {
        return Err(rejected(errors));
    }
    Ok(form)
}

#[utoipa::path(
    get,
    path = "/dishes",
    tag = "dishes",
    summary = "List dishes",
    description = "Dishes ordered by name. `q` searches the name, `type` keeps one dish type.",
    params(ListDishesQuery),
    responses(
        (status = 200, description = "Paginated list of dishes", body = PaginatedResponse<DishResponse>),
        (status = 400, description = "Malformed dish type filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 500, description = "Internal server error")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_dishes(
    State(state): State<AppState>,
    Query(query): Query<ListDishesQuery>,
    _: Superuser,
) -> Result<Json<PaginatedResponse<DishResponse>>> {
    let dish_type_id = query.dish_type_id().map_err(|message| Error::BadRequest { message })?;
    let (skip, limit) = query.pagination.params();
    let filter = DishFilter::new(skip, limit)
        .with_name(query.term())
        .with_dish_type(dish_type_id);

    let mut conn = acquire(&state).await?;
    let mut repo = Dishes::new(&mut conn);
    let dishes = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;
    let ids: Vec<DishId> = dishes.iter().map(|d| d.id).collect();
    let mut cooks = repo.cook_ids_bulk(&ids).await?;

    let data = dishes
        .into_iter()
        .map(|dish| {
            let cook_ids = cooks.remove(&dish.id).unwrap_or_default();
            DishResponse::new(dish, cook_ids)
        })
        .collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    get,
    path = "/dishes/filters",
    tag = "dishes",
    summary = "List dish filters",
    description = "One choice per existing dish type.",
    responses(
        (status = 200, description = "Filters accepted by the dish list", body = Vec<ListFilter>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 500, description = "Internal server error")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_dish_filters(State(state): State<AppState>, _: Superuser) -> Result<Json<Vec<ListFilter>>> {
    let mut conn = acquire(&state).await?;
    let dish_types = DishTypes::new(&mut conn).list_all().await?;
    Ok(Json(vec![ListFilter::dish_type(
        dish_types.into_iter().map(|t| (t.id, t.name)),
    )]))
}

#[utoipa::path(
    get,
    path = "/dishes/{dish_id}",
    tag = "dishes",
    summary = "Get dish",
    responses(
        (status = 200, description = "Dish details with assigned cook ids", body = DishResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Dish not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("dish_id" = i64, Path, description = "Dish ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_dish(State(state): State<AppState>, Path(dish_id): Path<DishId>, _: Superuser) -> Result<Json<DishResponse>> {
    let mut conn = acquire(&state).await?;
    let mut repo = Dishes::new(&mut conn);
    let dish = repo
        .get_by_id(dish_id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Dish, dish_id))?;
    let cooks = repo.cook_ids(dish_id).await?;
    Ok(Json(DishResponse::new(dish, cooks)))
}

#[utoipa::path(
    post,
    path = "/dishes",
    tag = "dishes",
    summary = "Create dish",
    request_body = DishCreate,
    responses(
        (status = 201, description = "Dish created", body = DishResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 409, description = "Name already taken"),
        (status = 422, description = "Invalid fields or unknown dish type or cook", body = crate::api::models::forms::FieldErrors),
        (status = 500, description = "Internal server error")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_dish(
    State(state): State<AppState>,
    _: Superuser,
    Json(body): Json<DishCreate>,
) -> Result<(StatusCode, Json<DishResponse>)> {
    let form = clean_body(&state, body, None).await?;

    let mut conn = acquire(&state).await?;
    let mut repo = Dishes::new(&mut conn);
    let dish = repo.create(&form.into()).await?;
    let cooks = repo.cook_ids(dish.id).await?;
    Ok((StatusCode::CREATED, Json(DishResponse::new(dish, cooks))))
}

#[utoipa::path(
    put,
    path = "/dishes/{dish_id}",
    tag = "dishes",
    summary = "Update dish",
    description = "Replaces every field. The cook set is replaced with `cooks`.",
    request_body = DishUpdate,
    responses(
        (status = 200, description = "Dish updated", body = DishResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Dish not found"),
        (status = 409, description = "Name already taken"),
        (status = 422, description = "Invalid fields or unknown dish type or cook", body = crate::api::models::forms::FieldErrors),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("dish_id" = i64, Path, description = "Dish ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_dish(
    State(state): State<AppState>,
    Path(dish_id): Path<DishId>,
    _: Superuser,
    Json(body): Json<DishUpdate>,
) -> Result<Json<DishResponse>> {
    let form = clean_body(&state, body, Some(dish_id)).await?;

    let mut conn = acquire(&state).await?;
    let mut repo = Dishes::new(&mut conn);
    let dish = repo
        .update(dish_id, &form.into())
        .await
        .map_err(missing(Resource::Dish, dish_id))?;
    let cooks = repo.cook_ids(dish_id).await?;
    Ok(Json(DishResponse::new(dish, cooks)))
}

#[utoipa::path(
    delete,
    path = "/dishes/{dish_id}",
    tag = "dishes",
    summary = "Delete dish",
    responses(
        (status = 204, description = "Dish deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Dish not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("dish_id" = i64, Path, description = "Dish ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_dish(State(state): State<AppState>, Path(dish_id): Path<DishId>, _: Superuser) -> Result<StatusCode> {
    let mut conn = acquire(&state).await?;
    if Dishes::new(&mut conn).delete(dish_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(Resource::Dish, dish_id))
    }
}
