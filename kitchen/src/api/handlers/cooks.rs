use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use minijinja::context;
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::{
            acquire, redirect, render_confirm_delete, render_form, search_query,
            validation::{check_username, unique_violation_errors},
        },
        models::{
            cooks::{CookCreateForm, CookExperienceForm, CookSearch, CookSummary, CurrentUser},
            dishes::DishResponse,
            forms::{BoundForm, FormData},
            pagination::{Page, requested_page},
        },
    },
    auth::password,
    db::{
        errors::DbError,
        handlers::{Cooks, Dishes, Repository, cooks::CookFilter},
        models::cooks::{CookCreateDBRequest, CookDBResponse, CookUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{CookId, Resource},
};

const LIST_URL: &str = "/cooks/";

#[tracing::instrument(skip_all)]
pub async fn list_cooks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(search): Query<CookSearch>,
) -> Result<Html<String>> {
    let term = search.term();
    let mut conn = acquire(&state).await?;
    let mut repo = Cooks::new(&mut conn);

    let total = repo.count(&CookFilter::new(0, 0).with_username(term.clone())).await?;
    let page = Page::clamp(requested_page(search.page.as_deref()), total, state.config.catalog.page_size);
    let objects: Vec<CookSummary> = repo
        .list(&CookFilter::new(page.offset(), page.limit()).with_username(term.clone()))
        .await?
        .into_iter()
        .map(CookSummary::from)
        .collect();
    drop(conn);

    state.templates.render(
        "cook_list.html",
        Some(&current_user),
        context! {
            title => "Cooks list",
            objects,
            page,
            search => term.as_deref().unwrap_or_default(),
            search_param => "username",
            query => search_query("username", term.as_deref()),
        },
    )
}

async fn get_cook(state: &AppState, id: CookId) -> Result<CookDBResponse> {
    let mut conn = acquire(state).await?;
    Cooks::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Cook, id))
}

/// Cook page with the dishes they are assigned to.
#[tracing::instrument(skip_all, fields(cook_id = id))]
pub async fn cook_detail(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CookId>,
) -> Result<Html<String>> {
    let mut conn = acquire(&state).await?;
    let cook = Cooks::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Cook, id))?;
    let dishes: Vec<DishResponse> = Dishes::new(&mut conn)
        .list_by_cook(id)
        .await?
        .into_iter()
        .map(|dish| DishResponse::new(dish, Vec::new()))
        .collect();
    drop(conn);

    let cook = CookSummary::from(cook);
    state.templates.render(
        "cook_detail.html",
        Some(&current_user),
        context! { title => &cook.username, cook, dishes },
    )
}

fn create_title() -> String {
    format!("Create {}", Resource::Cook.verbose_name())
}

#[tracing::instrument(skip_all)]
pub async fn create_cook_form(State(state): State<AppState>, current_user: CurrentUser) -> Result<Html<String>> {
    render_form(&state, &current_user, &create_title(), CookCreateForm::form(), LIST_URL)
}

/// Sign up a new cook and show their page.
#[tracing::instrument(skip_all)]
pub async fn create_cook(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Form(data): Form<FormData>,
) -> Result<Response> {
    let rerender = |errors| {
        let form = BoundForm::new(CookCreateForm::fields()).bind(&data).with_errors(&errors);
        render_form(&state, &current_user, &create_title(), form, LIST_URL).map(IntoResponse::into_response)
    };

    let form = match CookCreateForm::clean(&data, &state.config.auth.password) {
        Ok(form) => form,
        Err(errors) => return rerender(errors),
    };

    let mut conn = acquire(&state).await?;
    let errors = check_username(&mut conn, &form.username, None).await?;
    if !errors.is_empty() {
        return rerender(errors);
    }

    let password_hash = password::hash_password(form.password, &state.config.auth.password).await?;
    let request = CookCreateDBRequest {
        username: form.username,
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        password_hash,
        years_of_experience: form.years_of_experience,
        is_staff: false,
        is_superuser: false,
    };

    match Cooks::new(&mut conn).create(&request).await {
        Ok(cook) => {
            info!("Cook {} ({}) signed up", cook.username, cook.id);
            Ok(redirect(format!("/cooks/{}/", cook.id)))
        }
        Err(e) => rerender(unique_violation_errors(e)?),
    }
}

const EXPERIENCE_TITLE: &str = "Update years of experience";

#[tracing::instrument(skip_all, fields(cook_id = id))]
pub async fn update_experience_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CookId>,
) -> Result<Html<String>> {
    let cook = get_cook(&state, id).await?;
    render_form(&state, &current_user, EXPERIENCE_TITLE, CookExperienceForm::initial(&cook), LIST_URL)
}

#[tracing::instrument(skip_all, fields(cook_id = id))]
pub async fn update_experience(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CookId>,
    Form(data): Form<FormData>,
) -> Result<Response> {
    let form = match CookExperienceForm::clean(&data) {
        Ok(form) => form,
        Err(errors) => {
            get_cook(&state, id).await?;
            let form = BoundForm::new(CookExperienceForm::fields()).bind(&data).with_errors(&errors);
            return Ok(render_form(&state, &current_user, EXPERIENCE_TITLE, form, LIST_URL)?.into_response());
        }
    };

    let mut conn = acquire(&state).await?;
    match Cooks::new(&mut conn)
        .update(id, &CookUpdateDBRequest::experience(form.years_of_experience))
        .await
    {
        Ok(_) => Ok(redirect(LIST_URL)),
        Err(DbError::NotFound) => Err(Error::not_found(Resource::Cook, id)),
        Err(e) => Err(e.into()),
    }
}

#[tracing::instrument(skip_all, fields(cook_id = id))]
pub async fn delete_cook_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CookId>,
) -> Result<Html<String>> {
    let cook = get_cook(&state, id).await?;
    let title = format!("Delete {}", Resource::Cook.verbose_name());
    render_confirm_delete(&state, &current_user, &title, &cook.username, LIST_URL)
}

/// Delete a cook. Their dish assignments go with them; the dishes stay.
#[tracing::instrument(skip_all, fields(cook_id = id))]
pub async fn delete_cook(State(state): State<AppState>, _: CurrentUser, Path(id): Path<CookId>) -> Result<Response> {
    let mut conn = acquire(&state).await?;
    if !Cooks::new(&mut conn).delete(id).await? {
        return Err(Error::not_found(Resource::Cook, id));
    }
    Ok(redirect(LIST_URL))
}
