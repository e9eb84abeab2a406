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
            validation::{catalog_name, check_dish_type_name},
        },
        models::{
            dish_types::{
                DishTypeCreate, DishTypeForm, DishTypeResponse, DishTypeUpdate, ListDishTypesQuery, NAME_MAX_LENGTH,
            },
            pagination::PaginatedResponse,
        },
    },
    auth::current_user::Superuser,
    db::{
        handlers::{DishTypes, Repository, dish_types::DishTypeFilter},
        models::dish_types::{DishTypeCreateDBRequest, DishTypeUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{DishTypeId, Resource},
};

/// Clean a body and check the resulting name is free.
async fn clean_body(state: &AppState, body: DishTypeCreate, exclude: Option<DishTypeId>) -> Result<DishTypeForm> {
    let mut form = body.clean().map_err(|errors| Error::Validation { errors })?;
    form.name =
        catalog_name(&state.config, form.name, NAME_MAX_LENGTH).map_err(|errors| Error::Validation { errors })?;

    let mut conn = acquire(state).await?;
    let taken = check_dish_type_name(&mut conn, &form.name, exclude).await?;
    if !taken.is_empty() {
        return Err(rejected(taken));
    }
    Ok(form)
}

#[utoipa::path(
    get,
    path = "/dish-types",
    tag = "dish-types",
    summary = "List dish types",
    params(ListDishTypesQuery),
    responses(
        (status = 200, description = "Paginated list of dish types", body = PaginatedResponse<DishTypeResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 500, description = "Internal server error")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_dish_types(
    State(state): State<AppState>,
    Query(query): Query<ListDishTypesQuery>,
    _: Superuser,
) -> Result<Json<PaginatedResponse<DishTypeResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = DishTypeFilter::new(skip, limit);

    let mut conn = acquire(&state).await?;
    let mut repo = DishTypes::new(&mut conn);
    let dish_types = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        dish_types.into_iter().map(DishTypeResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/dish-types/{dish_type_id}",
    tag = "dish-types",
    summary = "Get dish type",
    responses(
        (status = 200, description = "Dish type details", body = DishTypeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Dish type not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("dish_type_id" = i64, Path, description = "Dish type ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_dish_type(
    State(state): State<AppState>,
    Path(dish_type_id): Path<DishTypeId>,
    _: Superuser,
) -> Result<Json<DishTypeResponse>> {
    let mut conn = acquire(&state).await?;
    match DishTypes::new(&mut conn).get_by_id(dish_type_id).await? {
        Some(dish_type) => Ok(Json(DishTypeResponse::from(dish_type))),
        None => Err(Error::not_found(Resource::DishType, dish_type_id)),
    }
}

#[utoipa::path(
    post,
    path = "/dish-types",
    tag = "dish-types",
    summary = "Create dish type",
    request_body = DishTypeCreate,
    responses(
        (status = 201, description = "Dish type created", body = DishTypeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 409, description = "Name already taken"),
        (status = 422, description = "Invalid fields", body = crate::api::models::forms::FieldErrors),
        (status = 500, description = "Internal server error")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_dish_type(
    State(state): State<AppState>,
    _: Superuser,
    Json(body): Json<DishTypeCreate>,
) -> Result<(StatusCode, Json<DishTypeResponse>)> {
    let form = clean_body(&state, body, None).await?;

    let mut conn = acquire(&state).await?;
    let dish_type = DishTypes::new(&mut conn)
        .create(&DishTypeCreateDBRequest::from(form))
        .await?;
    Ok((StatusCode::CREATED, Json(DishTypeResponse::from(dish_type))))
}

#[utoipa::path(
    put,
    path = "/dish-types/{dish_type_id}",
    tag = "dish-types",
    summary = "Update dish type",
    request_body = DishTypeUpdate,
    responses(
        (status = 200, description = "Dish type updated", body = DishTypeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Dish type not found"),
        (status = 409, description = "Name already taken"),
        (status = 422, description = "Invalid fields", body = crate::api::models::forms::FieldErrors),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("dish_type_id" = i64, Path, description = "Dish type ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_dish_type(
    State(state): State<AppState>,
    Path(dish_type_id): Path<DishTypeId>,
    _: Superuser,
    Json(body): Json<DishTypeUpdate>,
) -> Result<Json<DishTypeResponse>> {
    let form = clean_body(&state, body, Some(dish_type_id)).await?;

    let mut conn = acquire(&state).await?;
    let dish_type = DishTypes::new(&mut conn)
        .update(dish_type_id, &DishTypeUpdateDBRequest::from(form))
        .await
        .map_err(missing(Resource::DishType, dish_type_id))?;
    Ok(Json(DishTypeResponse::from(dish_type)))
}

#[utoipa::path(
    delete,
    path = "/dish-types/{dish_type_id}",
    tag = "dish-types",
    summary = "Delete dish type",
    description = "Deletes the dish type together with every dish of that type.",
    responses(
        (status = 204, description = "Dish type deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Dish type not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("dish_type_id" = i64, Path, description = "Dish type ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_dish_type(
    State(state): State<AppState>,
    Path(dish_type_id): Path<DishTypeId>,
    _: Superuser,
) -> Result<StatusCode> {
    let mut conn = acquire(&state).await?;
    if DishTypes::new(&mut conn).delete(dish_type_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(Resource::DishType, dish_type_id))
    }
}
