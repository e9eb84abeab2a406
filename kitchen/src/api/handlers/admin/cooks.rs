use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::{
            acquire,
            admin::{missing, rejected},
            validation::check_username,
        },
        models::{
            admin::{ExperienceBucket, ListFilter},
            cooks::{CookCreate, CookResponse, CookUpdate, ListCooksQuery},
            pagination::PaginatedResponse,
        },
    },
    auth::{current_user::Superuser, password},
    db::{
        handlers::{Cooks, Repository, cooks::CookFilter},
        models::cooks::{CookCreateDBRequest, CookUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{CookId, Resource},
};

#[utoipa::path(
    get,
    path = "/cooks",
    tag = "cooks",
    summary = "List cooks",
    description = "Cooks ordered by username. `q` searches the last name, `year` picks an experience bucket.",
    params(ListCooksQuery),
    responses(
        (status = 200, description = "Paginated list of cooks", body = PaginatedResponse<CookResponse>),
        (status = 400, description = "Unknown experience bucket"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 500, description = "Internal server error")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_cooks(
    State(state): State<AppState>,
    Query(query): Query<ListCooksQuery>,
    _: Superuser,
) -> Result<Json<PaginatedResponse<CookResponse>>> {
    let bucket = ExperienceBucket::from_param(query.year.as_deref()).map_err(|message| Error::BadRequest { message })?;
    let (skip, limit) = query.pagination.params();
    let filter = CookFilter::new(skip, limit)
        .with_last_name(query.term())
        .with_experience(bucket.map(ExperienceBucket::range));

    let mut conn = acquire(&state).await?;
    let mut repo = Cooks::new(&mut conn);
    let cooks = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        cooks.into_iter().map(CookResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/cooks/filters",
    tag = "cooks",
    summary = "List cook filters",
    responses(
        (status = 200, description = "Filters accepted by the cook list", body = Vec<ListFilter>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_cook_filters(_: Superuser) -> Json<Vec<ListFilter>> {
    Json(vec![ListFilter::experience()])
}

#[utoipa::path(
    get,
    path = "/cooks/{cook_id}",
    tag = "cooks",
    summary = "Get cook",
    responses(
        (status = 200, description = "Cook details", body = CookResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Cook not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("cook_id" = i64, Path, description = "Cook ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_cook(State(state): State<AppState>, Path(cook_id): Path<CookId>, _: Superuser) -> Result<Json<CookResponse>> {
    let mut conn = acquire(&state).await?;
    match Cooks::new(&mut conn).get_by_id(cook_id).await? {
        Some(cook) => Ok(Json(CookResponse::from(cook))),
        None => Err(Error::not_found(Resource::Cook, cook_id)),
    }
}

#[utoipa::path(
    post,
    path = "/cooks",
    tag = "cooks",
    summary = "Create cook",
    request_body = CookCreate,
    responses(
        (status = 201, description = "Cook created", body = CookResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Invalid fields", body = crate::api::models::forms::FieldErrors),
        (status = 500, description = "Internal server error")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_cook(
    State(state): State<AppState>,
    Superuser(admin): Superuser,
    Json(body): Json<CookCreate>,
) -> Result<(StatusCode, Json<CookResponse>)> {
    let body = body
        .clean(&state.config.auth.password)
        .map_err(|errors| Error::Validation { errors })?;

    let taken = check_username(&mut *acquire(&state).await?, &body.username, None).await?;
    if !taken.is_empty() {
        return Err(rejected(taken));
    }

    let password_hash = password::hash_password(body.password, &state.config.auth.password).await?;
    let request = CookCreateDBRequest {
        username: body.username,
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        password_hash,
        years_of_experience: body.years_of_experience,
        is_staff: body.is_staff,
        is_superuser: body.is_superuser,
    };

    let mut conn = acquire(&state).await?;
    let cook = Cooks::new(&mut conn).create(&request).await?;
    info!("Superuser {} created cook {}", admin.id, cook.id);
    Ok((StatusCode::CREATED, Json(CookResponse::from(cook))))
}

#[utoipa::path(
    patch,
    path = "/cooks/{cook_id}",
    tag = "cooks",
    summary = "Update cook",
    description = "Partial update. A `password` is hashed before it is stored.",
    request_body = CookUpdate,
    responses(
        (status = 200, description = "Cook updated", body = CookResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Cook not found"),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Invalid fields", body = crate::api::models::forms::FieldErrors),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("cook_id" = i64, Path, description = "Cook ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_cook(
    State(state): State<AppState>,
    Path(cook_id): Path<CookId>,
    _: Superuser,
    Json(body): Json<CookUpdate>,
) -> Result<Json<CookResponse>> {
    let current = {
        let mut conn = acquire(&state).await?;
        Cooks::new(&mut conn)
            .get_by_id(cook_id)
            .await?
            .ok_or_else(|| Error::not_found(Resource::Cook, cook_id))?
    };

    let body = body
        .clean(&current.username, &state.config.auth.password)
        .map_err(|errors| Error::Validation { errors })?;

    if let Some(username) = &body.username {
        let taken = check_username(&mut *acquire(&state).await?, username, Some(cook_id)).await?;
        if !taken.is_empty() {
            return Err(rejected(taken));
        }
    }

    let password_hash = match body.password {
        Some(raw) => Some(password::hash_password(raw, &state.config.auth.password).await?),
        None => None,
    };
    let request = CookUpdateDBRequest {
        username: body.username,
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        password_hash,
        years_of_experience: body.years_of_experience,
        is_staff: body.is_staff,
        is_superuser: body.is_superuser,
        is_active: body.is_active,
    };

    let mut conn = acquire(&state).await?;
    let cook = Cooks::new(&mut conn)
        .update(cook_id, &request)
        .await
        .map_err(missing(Resource::Cook, cook_id))?;
    Ok(Json(CookResponse::from(cook)))
}

#[utoipa::path(
    delete,
    path = "/cooks/{cook_id}",
    tag = "cooks",
    summary = "Delete cook",
    description = "Deletes the cook and their dish assignments. The dishes stay.",
    responses(
        (status = 204, description = "Cook deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser access required"),
        (status = 404, description = "Cook not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("cook_id" = i64, Path, description = "Cook ID")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_cook(State(state): State<AppState>, Path(cook_id): Path<CookId>, _: Superuser) -> Result<StatusCode> {
    let mut conn = acquire(&state).await?;
    if Cooks::new(&mut conn).delete(cook_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(Resource::Cook, cook_id))
    }
}
