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
            validation::{catalog_name, check_dish, unique_violation_errors},
        },
        models::{
            cooks::{CookSummary, CurrentUser},
            dishes::{DishForm, DishResponse, DishSearch, NAME_MAX_LENGTH},
            forms::{BoundForm, FieldErrors, FormData},
            pagination::{Page, requested_page},
        },
    },
    db::{
        errors::DbError,
        handlers::{Cooks, DishTypes, Dishes, Repository, dishes::DishFilter},
        models::dishes::DishDBResponse,
    },
    errors::{Error, Result},
    types::{DishId, Resource},
};

const LIST_URL: &str = "/dishes/";

#[tracing::instrument(skip_all)]
pub async fn list_dishes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(search): Query<DishSearch>,
) -> Result<Html<String>> {
    let term = search.term();
    let mut conn = acquire(&state).await?;
    let mut repo = Dishes::new(&mut conn);

    let total = repo.count(&DishFilter::new(0, 0).with_name(term.clone())).await?;
    let page = Page::clamp(requested_page(search.page.as_deref()), total, state.config.catalog.page_size);
    let objects: Vec<DishResponse> = repo
        .list(&DishFilter::new(page.offset(), page.limit()).with_name(term.clone()))
        .await?
        .into_iter()
        .map(|dish| DishResponse::new(dish, Vec::new()))
        .collect();
    drop(conn);

    state.templates.render(
        "dish_list.html",
        Some(&current_user),
        context! {
            title => "Dishes list",
            objects,
            page,
            search => term.as_deref().unwrap_or_default(),
            search_param => "name",
            query => search_query("name", term.as_deref()),
        },
    )
}

async fn get_dish(state: &AppState, id: DishId) -> Result<DishDBResponse> {
    let mut conn = acquire(state).await?;
    Dishes::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Dish, id))
}

/// Dish page with its cooks. The assign button reflects whether the viewer is one of them.
#[tracing::instrument(skip_all, fields(dish_id = id))]
pub async fn dish_detail(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishId>,
) -> Result<Html<String>> {
    let mut conn = acquire(&state).await?;
    let dish = Dishes::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::Dish, id))?;
    let cooks: Vec<CookSummary> = Cooks::new(&mut conn)
        .list_by_dish(id)
        .await?
        .into_iter()
        .map(CookSummary::from)
        .collect();
    drop(conn);

    let is_assigned = cooks.iter().any(|cook| cook.id == current_user.id);
    let cook_ids = cooks.iter().map(|cook| cook.id).collect();
    let dish = DishResponse::new(dish, cook_ids);

    state.templates.render(
        "dish_detail.html",
        Some(&current_user),
        context! { title => &dish.name, dish, cooks, is_assigned },
    )
}

/// Render the dish form with every dish type and cook as choices.
async fn render_dish_form(
    state: &AppState,
    user: &CurrentUser,
    title: &str,
    data: &FormData,
    errors: Option<&FieldErrors>,
) -> Result<Html<String>> {
    let mut conn = acquire(state).await?;
    let dish_types = DishTypes::new(&mut conn).list_all().await?;
    let cooks = Cooks::new(&mut conn).list_all().await?;
    drop(conn);

    let mut form: BoundForm = DishForm::form(&dish_types, &cooks, data);
    if let Some(errors) = errors {
        form = form.with_errors(errors);
    }
    render_form(state, user, title, form, LIST_URL)
}

fn create_title() -> String {
    format!("Create {}", Resource::Dish.verbose_name())
}

#[tracing::instrument(skip_all)]
pub async fn create_dish_form(State(state): State<AppState>, current_user: CurrentUser) -> Result<Html<String>> {
    render_dish_form(&state, &current_user, &create_title(), &FormData::default(), None).await
}

#[tracing::instrument(skip_all)]
pub async fn create_dish(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Form(data): Form<FormData>,
) -> Result<Response> {
    match save(&state, None, &data).await? {
        Ok(()) => Ok(redirect(LIST_URL)),
        Err(errors) => Ok(render_dish_form(&state, &current_user, &create_title(), &data, Some(&errors))
            .await?
            .into_response()),
    }
}

#[tracing::instrument(skip_all, fields(dish_id = id))]
pub async fn update_dish_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishId>,
) -> Result<Html<String>> {
    let dish = get_dish(&state, id).await?;
    let cook_ids = {
        let mut conn = acquire(&state).await?;
        Dishes::new(&mut conn).cook_ids(id).await?
    };
    let title = format!("Update {}", dish.name);
    render_dish_form(&state, &current_user, &title, &DishForm::initial(&dish, &cook_ids), None).await
}

#[tracing::instrument(skip_all, fields(dish_id = id))]
pub async fn update_dish(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishId>,
    Form(data): Form<FormData>,
) -> Result<Response> {
    let dish = get_dish(&state, id).await?;
    match save(&state, Some(id), &data).await? {
        Ok(()) => Ok(redirect(LIST_URL)),
        Err(errors) => {
            let title = format!("Update {}", dish.name);
            Ok(render_dish_form(&state, &current_user, &title, &data, Some(&errors))
                .await?
                .into_response())
        }
    }
}

/// Validate and write a submission. The inner `Err` carries the field errors to show.
async fn save(
    state: &AppState,
    id: Option<DishId>,
    data: &FormData,
) -> Result<std::result::Result<(), FieldErrors>> {
    let mut form = match DishForm::clean(data) {
        Ok(form) => form,
        Err(errors) => return Ok(Err(errors)),
    };
    form.name = match catalog_name(&state.config, form.name, NAME_MAX_LENGTH) {
        Ok(name) => name,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut conn = acquire(state).await?;
    let errors = check_dish(&mut conn, &form, id).await?;
    if !errors.is_empty() {
        return Ok(Err(errors));
    }

    let mut repo = Dishes::new(&mut conn);
    let written = match id {
        Some(id) => repo.update(id, &form.into()).await.map(|_| ()),
        None => repo.create(&form.into()).await.map(|_| ()),
    };
    match written {
        Ok(()) => Ok(Ok(())),
        Err(DbError::NotFound) => Err(Error::not_found(Resource::Dish, id.unwrap_or_default())),
        Err(e) => Ok(Err(unique_violation_errors(e)?)),
    }
}

#[tracing::instrument(skip_all, fields(dish_id = id))]
pub async fn delete_dish_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishId>,
) -> Result<Html<String>> {
    let dish = get_dish(&state, id).await?;
    let title = format!("Delete {}", Resource::Dish.verbose_name());
    render_confirm_delete(&state, &current_user, &title, &dish.name, LIST_URL)
}

#[tracing::instrument(skip_all, fields(dish_id = id))]
pub async fn delete_dish(State(state): State<AppState>, _: CurrentUser, Path(id): Path<DishId>) -> Result<Response> {
    let mut conn = acquire(&state).await?;
    if !Dishes::new(&mut conn).delete(id).await? {
        return Err(Error::not_found(Resource::Dish, id));
    }
    Ok(redirect(LIST_URL))
}

/// Assign the current cook to the dish, or remove them if already assigned.
#[tracing::instrument(skip_all, fields(dish_id = id, cook_id = current_user.id))]
pub async fn toggle_assign(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishId>,
) -> Result<Response> {
    let mut conn = acquire(&state).await?;
    let outcome = match Dishes::new(&mut conn).toggle_assignment(id, current_user.id).await {
        Ok(outcome) => outcome,
        Err(DbError::NotFound) => return Err(Error::not_found(Resource::Dish, id)),
        Err(e) => return Err(e.into()),
    };
    info!(?outcome, "Toggled assignment of cook {} to dish {}", current_user.id, id);
    Ok(redirect(format!("/dishes/{id}/")))
}

#[cfg(test)]
mod tests {
    use crate::db::handlers::{Dishes, Repository, dishes::DishFilter};
    use crate::test_utils::{
        create_test_app, create_test_config, create_test_cook, create_test_dish, create_test_dish_type, session_cookie,
    };
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use sqlx::PgPool;
    use std::str::FromStr;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_dish_keeps_exact_price(pool: PgPool) {
        let config = create_test_config();
        let gordon = create_test_cook(&pool, "gordon", false).await;
        let jamie = create_test_cook(&pool, "jamie", false).await;
        let nigella = create_test_cook(&pool, "nigella", false).await;
        let soup = create_test_dish_type(&pool, "Soup").await;
        let server = create_test_app(pool.clone(), config.clone()).await;
        let cookie = session_cookie(&gordon, &config);

        let response = server.get("/dishes/create/").add_header("cookie", cookie.clone()).await;
        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Create dish"));
        assert!(html.contains("nigella"));

        let dish_type = soup.id.to_string();
        let (g, j, n) = (gordon.id.to_string(), jamie.id.to_string(), nigella.id.to_string());
        let response = server
            .post("/dishes/create/")
            .add_header("cookie", cookie)
            .form(&[
                ("name", "Borscht"),
                ("description", "Beetroot soup"),
                ("price", "88.88"),
                ("dish_type", dish_type.as_str()),
                ("cooks", g.as_str()),
                ("cooks", j.as_str()),
                ("cooks", n.as_str()),
            ])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").to_str().unwrap(), "/dishes/");

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Dishes::new(&mut conn);
        let dishes = repo.list(&DishFilter::new(0, 10)).await.unwrap();
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].price, Decimal::from_str("88.88").unwrap());
        assert_eq!(dishes[0].dish_type_id, soup.id);
        let mut cook_ids = repo.cook_ids(dishes[0].id).await.unwrap();
        cook_ids.sort();
        assert_eq!(cook_ids, vec![gordon.id, jamie.id, nigella.id]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_dish_validation_errors(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        let soup = create_test_dish_type(&pool, "Soup").await;
        create_test_dish(&pool, "Borscht", "Soup", &[cook.id]).await;
        let server = create_test_app(pool, config.clone()).await;
        let cookie = session_cookie(&cook, &config);
        let dish_type = soup.id.to_string();
        let cook_id = cook.id.to_string();

        let response = server
            .post("/dishes/create/")
            .add_header("cookie", cookie.clone())
            .form(&[
                ("name", "Solyanka"),
                ("price", "10000"),
                ("dish_type", dish_type.as_str()),
            ])
            .await;
        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Ensure that there are no more than 4 digits before the decimal point."));
        assert!(html.contains("This field is required."));

        let response = server
            .post("/dishes/create/")
            .add_header("cookie", cookie)
            .form(&[
                ("name", "Borscht"),
                ("price", "5.00"),
                ("dish_type", dish_type.as_str()),
                ("cooks", cook_id.as_str()),
            ])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Dish with this Name already exists."));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_search_and_last_page(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        for name in ["Borscht", "Cheesecake", "Dumplings", "Eclair", "Falafel", "Goulash", "Halva"] {
            create_test_dish(&pool, name, "Mains", &[cook.id]).await;
        }
        let server = create_test_app(pool, config.clone()).await;
        let cookie = session_cookie(&cook, &config);

        let html = server
            .get("/dishes/")
            .add_query_param("page", "2")
            .add_header("cookie", cookie.clone())
            .await
            .text();
        assert!(html.contains("Dishes list"));
        assert!(html.contains("Goulash"));
        assert!(html.contains("Halva"));
        assert!(!html.contains("Borscht"));

        let html = server
            .get("/dishes/")
            .add_query_param("name", "AL")
            .add_header("cookie", cookie.clone())
            .await
            .text();
        assert!(html.contains("Falafel"));
        assert!(html.contains("Halva"));
        assert!(!html.contains("Goulash"));

        // a term that can't match any stored name is ignored
        let response = server
            .get("/dishes/")
            .add_query_param("name", "bo\0")
            .add_header("cookie", cookie)
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Borscht"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_toggle_assign_flips_membership(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        let other = create_test_cook(&pool, "jamie", false).await;
        let dish = create_test_dish(&pool, "Borscht", "Soup", &[other.id]).await;
        let server = create_test_app(pool.clone(), config.clone()).await;
        let cookie = session_cookie(&cook, &config);
        let detail = format!("/dishes/{}/", dish.id);
        let toggle = format!("/dishes/{}/toggle-assign/", dish.id);

        let html = server.get(&detail).add_header("cookie", cookie.clone()).await.text();
        assert!(html.contains("Assign me"));

        let response = server.post(&toggle).add_header("cookie", cookie.clone()).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").to_str().unwrap(), detail);

        let html = server.get(&detail).add_header("cookie", cookie.clone()).await.text();
        assert!(html.contains("Remove me"));

        server
            .post(&toggle)
            .add_header("cookie", cookie.clone())
            .await
            .assert_status(StatusCode::FOUND);
        let html = server.get(&detail).add_header("cookie", cookie.clone()).await.text();
        assert!(html.contains("Assign me"));

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(Dishes::new(&mut conn).cook_ids(dish.id).await.unwrap(), vec![other.id]);

        server
            .post("/dishes/9999/toggle-assign/")
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        let dish = create_test_dish(&pool, "Borscht", "Soup", &[cook.id]).await;
        let server = create_test_app(pool.clone(), config.clone()).await;
        let cookie = session_cookie(&cook, &config);
        let cook_id = cook.id.to_string();
        let dish_type = dish.dish_type_id.to_string();

        let response = server
            .get(&format!("/dishes/{}/update/", dish.id))
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Update Borscht"));

        let response = server
            .post(&format!("/dishes/{}/update/", dish.id))
            .add_header("cookie", cookie.clone())
            .form(&[
                ("name", "Green borscht"),
                ("price", "12.50"),
                ("dish_type", dish_type.as_str()),
                ("cooks", cook_id.as_str()),
            ])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").to_str().unwrap(), "/dishes/");

        {
            let mut conn = pool.acquire().await.unwrap();
            let updated = Dishes::new(&mut conn).get_by_id(dish.id).await.unwrap().unwrap();
            assert_eq!(updated.name, "Green borscht");
            assert_eq!(updated.price, Decimal::new(1250, 2));
        }

        let response = server
            .post(&format!("/dishes/{}/delete/", dish.id))
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").to_str().unwrap(), "/dishes/");

        server
            .get(&format!("/dishes/{}/", dish.id))
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
