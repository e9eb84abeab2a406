use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use minijinja::context;

use crate::{
    AppState,
    api::{
        handlers::{
            acquire, redirect, render_confirm_delete, render_form, search_query,
            validation::{catalog_name, check_dish_type_name, unique_violation_errors},
        },
        models::{
            cooks::CurrentUser,
            dish_types::{DishTypeForm, DishTypeResponse, DishTypeSearch, NAME_MAX_LENGTH},
            forms::{BoundForm, FormData},
            pagination::{Page, requested_page},
        },
    },
    db::{
        errors::DbError,
        handlers::{DishTypes, Repository, dish_types::DishTypeFilter},
        models::dish_types::DishTypeDBResponse,
    },
    errors::{Error, Result},
    types::{DishTypeId, Resource},
};

const LIST_URL: &str = "/dish-types/";

#[tracing::instrument(skip_all)]
pub async fn list_dish_types(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(search): Query<DishTypeSearch>,
) -> Result<Html<String>> {
    let term = search.term();
    let mut conn = acquire(&state).await?;
    let mut repo = DishTypes::new(&mut conn);

    let total = repo.count(&DishTypeFilter::new(0, 0).with_name(term.clone())).await?;
    let page = Page::clamp(requested_page(search.page.as_deref()), total, state.config.catalog.page_size);
    let objects: Vec<DishTypeResponse> = repo
        .list(&DishTypeFilter::new(page.offset(), page.limit()).with_name(term.clone()))
        .await?
        .into_iter()
        .map(DishTypeResponse::from)
        .collect();
    drop(conn);

    state.templates.render(
        "dish_type_list.html",
        Some(&current_user),
        context! {
            title => "Dish types list",
            objects,
            page,
            search => term.as_deref().unwrap_or_default(),
            search_param => "name",
            query => search_query("name", term.as_deref()),
        },
    )
}

async fn get_dish_type(state: &AppState, id: DishTypeId) -> Result<DishTypeDBResponse> {
    let mut conn = acquire(state).await?;
    DishTypes::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::DishType, id))
}

fn create_title() -> String {
    format!("Create {}", Resource::DishType.verbose_name())
}

#[tracing::instrument(skip_all)]
pub async fn create_dish_type_form(State(state): State<AppState>, current_user: CurrentUser) -> Result<Html<String>> {
    let form = BoundForm::new(DishTypeForm::fields());
    render_form(&state, &current_user, &create_title(), form, LIST_URL)
}

#[tracing::instrument(skip_all)]
pub async fn create_dish_type(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Form(data): Form<FormData>,
) -> Result<Response> {
    let title = create_title();
    match save(&state, None, &data).await? {
        Ok(()) => Ok(redirect(LIST_URL)),
        Err(form) => Ok(render_form(&state, &current_user, &title, form, LIST_URL)?.into_response()),
    }
}

#[tracing::instrument(skip_all, fields(dish_type_id = id))]
pub async fn update_dish_type_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishTypeId>,
) -> Result<Html<String>> {
    let dish_type = get_dish_type(&state, id).await?;
    let title = format!("Update {}", dish_type.name);
    render_form(&state, &current_user, &title, DishTypeForm::initial(&dish_type), LIST_URL)
}

#[tracing::instrument(skip_all, fields(dish_type_id = id))]
pub async fn update_dish_type(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishTypeId>,
    Form(data): Form<FormData>,
) -> Result<Response> {
    let dish_type = get_dish_type(&state, id).await?;
    let title = format!("Update {}", dish_type.name);
    match save(&state, Some(id), &data).await? {
        Ok(()) => Ok(redirect(LIST_URL)),
        Err(form) => Ok(render_form(&state, &current_user, &title, form, LIST_URL)?.into_response()),
    }
}

/// Validate and write a submission. The inner `Err` is the form to re-render.
async fn save(
    state: &AppState,
    id: Option<DishTypeId>,
    data: &FormData,
) -> Result<std::result::Result<(), BoundForm>> {
    let bound = || BoundForm::new(DishTypeForm::fields()).bind(data);

    let mut form = match DishTypeForm::clean(data) {
        Ok(form) => form,
        Err(errors) => return Ok(Err(bound().with_errors(&errors))),
    };
    form.name = match catalog_name(&state.config, form.name, NAME_MAX_LENGTH) {
        Ok(name) => name,
        Err(errors) => return Ok(Err(bound().with_errors(&errors))),
    };

    let mut conn = acquire(state).await?;
    let errors = check_dish_type_name(&mut conn, &form.name, id).await?;
    if !errors.is_empty() {
        return Ok(Err(bound().with_errors(&errors)));
    }

    let mut repo = DishTypes::new(&mut conn);
    let written = match id {
        Some(id) => repo.update(id, &form.into()).await.map(|_| ()),
        None => repo.create(&form.into()).await.map(|_| ()),
    };
    match written {
        Ok(()) => Ok(Ok(())),
        Err(DbError::NotFound) => Err(Error::not_found(Resource::DishType, id.unwrap_or_default())),
        Err(e) => {
            let errors = unique_violation_errors(e)?;
            Ok(Err(bound().with_errors(&errors)))
        }
    }
}

#[tracing::instrument(skip_all, fields(dish_type_id = id))]
pub async fn delete_dish_type_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DishTypeId>,
) -> Result<Html<String>> {
    let dish_type = get_dish_type(&state, id).await?;
    let title = format!("Delete {}", Resource::DishType.verbose_name());
    render_confirm_delete(&state, &current_user, &title, &dish_type.name, LIST_URL)
}

/// Delete a dish type together with its dishes.
#[tracing::instrument(skip_all, fields(dish_type_id = id))]
pub async fn delete_dish_type(State(state): State<AppState>, _: CurrentUser, Path(id): Path<DishTypeId>) -> Result<Response> {
    let mut conn = acquire(&state).await?;
    if !DishTypes::new(&mut conn).delete(id).await? {
        return Err(Error::not_found(Resource::DishType, id));
    }
    Ok(redirect(LIST_URL))
}

#[cfg(test)]
mod tests {
    use crate::db::handlers::{DishTypes, Dishes, Repository, dishes::DishFilter};
    use crate::test_utils::{
        create_test_app, create_test_config, create_test_cook, create_test_dish, create_test_dish_type, session_cookie,
    };
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_paginates_by_five(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        for name in ["Appetizer", "Bread", "Cake", "Dessert", "Entree", "Fish", "Grill"] {
            create_test_dish_type(&pool, name).await;
        }
        let server = create_test_app(pool, config.clone()).await;
        let cookie = session_cookie(&cook, &config);

        let response = server.get("/dish-types/").add_header("cookie", cookie.clone()).await;
        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Dish types list"));
        assert!(html.contains("Entree"));
        assert!(!html.contains("Fish"));
        assert!(html.contains("1 of 2"));

        // past the end serves the last page
        let response = server
            .get("/dish-types/")
            .add_query_param("page", "9")
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Fish"));
        assert!(html.contains("Grill"));
        assert!(!html.contains("Entree"));

        let response = server
            .get("/dish-types/")
            .add_query_param("page", "abc")
            .add_header("cookie", cookie)
            .await;
        assert!(response.text().contains("Appetizer"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_by_name(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        create_test_dish_type(&pool, "Soup").await;
        create_test_dish_type(&pool, "Dessert").await;
        let server = create_test_app(pool, config.clone()).await;
        let cookie = session_cookie(&cook, &config);

        let html = server
            .get("/dish-types/")
            .add_query_param("name", "OUP")
            .add_header("cookie", cookie.clone())
            .await
            .text();
        assert!(html.contains("Soup"));
        assert!(!html.contains("Dessert"));

        let html = server
            .get("/dish-types/")
            .add_query_param("name", "")
            .add_header("cookie", cookie)
            .await
            .text();
        assert!(html.contains("Soup"));
        assert!(html.contains("Dessert"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_redirects_and_rejects_duplicates(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        let server = create_test_app(pool.clone(), config.clone()).await;
        let cookie = session_cookie(&cook, &config);

        let response = server
            .get("/dish-types/create/")
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Create dish type"));

        let response = server
            .post("/dish-types/create/")
            .add_header("cookie", cookie.clone())
            .form(&[("name", "Soup")])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").to_str().unwrap(), "/dish-types/");

        let response = server
            .post("/dish-types/create/")
            .add_header("cookie", cookie.clone())
            .form(&[("name", "Soup")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Dish type with this Name already exists."));

        let response = server
            .post("/dish-types/create/")
            .add_header("cookie", cookie)
            .form(&[("name", "")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("This field is required."));

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(DishTypes::new(&mut conn).list_all().await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_normalizes_names_when_enabled(pool: PgPool) {
        let mut config = create_test_config();
        config.catalog.normalize_names = true;
        let cook = create_test_cook(&pool, "gordon", false).await;
        let server = create_test_app(pool.clone(), config.clone()).await;

        server
            .post("/dish-types/create/")
            .add_header("cookie", session_cookie(&cook, &config))
            .form(&[("name", "BORSCHT soup")])
            .await
            .assert_status(StatusCode::FOUND);

        let mut conn = pool.acquire().await.unwrap();
        let names: Vec<String> = DishTypes::new(&mut conn)
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Borscht soup".to_string()]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_rerenders_unstorable_names(pool: PgPool) {
        let mut config = create_test_config();
        config.catalog.normalize_names = true;
        let cook = create_test_cook(&pool, "gordon", false).await;
        let server = create_test_app(pool.clone(), config.clone()).await;
        let cookie = session_cookie(&cook, &config);

        let response = server
            .post("/dish-types/create/")
            .add_header("cookie", cookie.clone())
            .form(&[("name", "So\0up")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Null characters are not allowed."));

        let dotted = "\u{130}".repeat(255);
        let response = server
            .post("/dish-types/create/")
            .add_header("cookie", cookie)
            .form(&[("name", dotted.as_str())])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Ensure this value has at most 255 characters (it has 510)."));

        let mut conn = pool.acquire().await.unwrap();
        assert!(DishTypes::new(&mut conn).list_all().await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_keeps_identity(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        let soup = create_test_dish_type(&pool, "Soup").await;
        let server = create_test_app(pool.clone(), config.clone()).await;
        let cookie = session_cookie(&cook, &config);

        let response = server
            .get(&format!("/dish-types/{}/update/", soup.id))
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Update Soup"));

        let response = server
            .post(&format!("/dish-types/{}/update/", soup.id))
            .add_header("cookie", cookie.clone())
            .form(&[("name", "Soups")])
            .await;
        response.assert_status(StatusCode::FOUND);

        let mut conn = pool.acquire().await.unwrap();
        let updated = DishTypes::new(&mut conn).get_by_id(soup.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Soups");

        server
            .get("/dish-types/9999/update/")
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_cascades_to_dishes(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        for name in ["Borscht", "Solyanka", "Ukha"] {
            create_test_dish(&pool, name, "Soup", &[cook.id]).await;
        }
        let other = create_test_dish(&pool, "Napoleon", "Dessert", &[cook.id]).await;
        let server = create_test_app(pool.clone(), config.clone()).await;
        let cookie = session_cookie(&cook, &config);

        let soup_id = {
            let mut conn = pool.acquire().await.unwrap();
            let types = DishTypes::new(&mut conn).list_all().await.unwrap();
            types.into_iter().find(|t| t.name == "Soup").unwrap().id
        };

        let response = server
            .get(&format!("/dish-types/{soup_id}/delete/"))
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Are you sure you want to delete"));

        let response = server
            .post(&format!("/dish-types/{soup_id}/delete/"))
            .add_header("cookie", cookie.clone())
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").to_str().unwrap(), "/dish-types/");

        let mut conn = pool.acquire().await.unwrap();
        let remaining = Dishes::new(&mut conn).list(&DishFilter::new(0, 100)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, other.id);

        server
            .post(&format!("/dish-types/{soup_id}/delete/"))
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
