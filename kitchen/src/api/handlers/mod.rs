//! HTTP request handlers.
//!
//! The back-office pages render HTML and live behind
//! [`crate::auth::middleware::login_required`]; the admin API under [`admin`] speaks JSON and
//! requires a superuser. Each page handler is responsible for:
//! - Reading the query string or form body
//! - Cleaning it with the form types in [`crate::api::models`]
//! - Database checks (uniqueness, referenced rows) via the repositories
//! - Rendering a template, or redirecting after a successful write
//!
//! # Handler Modules
//!
//! - [`admin`]: JSON CRUD for superusers
//! - [`auth`]: Login and logout pages
//! - [`cooks`]: Cook list, detail, sign-up, experience update and delete
//! - [`dish_types`]: Dish type list, create, update and delete
//! - [`dishes`]: Dish list, detail, create, update, delete and toggle-assign
//! - [`index`]: Landing page with record counts
//! - [`static_assets`]: Embedded CSS
//! - [`validation`]: Database-backed form checks shared by the pages and the admin API
//!
//! # Error Handling
//!
//! Invalid form input re-renders the form with field errors and status `200`. Everything else
//! is returned as [`crate::errors::Error`], which maps to a status code.

pub mod admin;
pub mod auth;
pub mod cooks;
pub mod dish_types;
pub mod dishes;
pub mod index;
pub mod static_assets;
pub mod validation;

use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use minijinja::context;
use sqlx::{Postgres, pool::PoolConnection};

use crate::{
    AppState,
    api::models::{cooks::CurrentUser, forms::BoundForm},
    errors::{Error, Result},
};

/// `302 Found` to `location`.
pub(crate) fn redirect(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

pub(crate) async fn acquire(state: &AppState) -> Result<PoolConnection<Postgres>> {
    state.db.acquire().await.map_err(|e| Error::Database(e.into()))
}

/// Query-string prefix that keeps the search term on pagination links, e.g. `name=soup&`.
pub(crate) fn search_query(param: &str, term: Option<&str>) -> String {
    match term {
        Some(term) => url::form_urlencoded::Serializer::new(String::new())
            .append_pair(param, term)
            .finish()
            + "&",
        None => String::new(),
    }
}

/// Render the shared create/update form page.
pub(crate) fn render_form(
    state: &AppState,
    user: &CurrentUser,
    title: &str,
    form: BoundForm,
    cancel_url: &str,
) -> Result<Html<String>> {
    state.templates.render(
        "create_update_form.html",
        Some(user),
        context! { title, form, cancel_url },
    )
}

/// Render the shared delete confirmation page.
pub(crate) fn render_confirm_delete(
    state: &AppState,
    user: &CurrentUser,
    title: &str,
    object: &str,
    cancel_url: &str,
) -> Result<Html<String>> {
    state.templates.render(
        "confirm_delete.html",
        Some(user),
        context! { title, object, cancel_url },
    )
}
