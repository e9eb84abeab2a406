//! # kitchen: restaurant back office
//!
//! `kitchen` is the back office of a restaurant kitchen. Logged-in cooks browse and edit the
//! catalog of dish types and dishes, keep the cook roster, and assign themselves to the dishes
//! they prepare. Superusers get a JSON admin API over the same data.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for all persistence. Pages are server-rendered with
//! [minijinja](https://github.com/mitsuhiko/minijinja) from templates embedded in the binary.
//!
//! ### Request Flow
//!
//! #### Back-office pages (`/`, `/dish-types/`, `/dishes/`, `/cooks/`)
//!
//! Every page sits behind [`auth::middleware::login_required`]. It resolves the session cookie
//! to a live cook, or redirects to `/accounts/login/?next=<requested url>`. The handler then
//! cleans the query string or form body, talks to the repositories in [`db::handlers`] and
//! either renders a template or redirects after a successful write. Invalid input re-renders
//! the form with field errors.
//!
//! #### Admin API (`/admin/api/v1/*`)
//!
//! JSON CRUD over cooks, dish types and dishes for superusers, documented with OpenAPI at
//! `/admin/docs`. Validation failures are `422` with the field errors, name clashes `409`.
//!
//! ### Core Components
//!
//! - [`api`]: page and admin API handlers, and the form, filter and response models
//! - [`auth`]: login, session tokens, password hashing and the login gate
//! - [`db`]: repositories for the `cooks`, `dish_types` and `dishes` tables
//! - [`config`]: YAML and environment configuration
//! - [`templates`]: the embedded template environment
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use kitchen::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = kitchen::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     kitchen::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and run on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! kitchen::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
mod static_assets;
pub mod telemetry;
pub mod templates;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::handlers::{admin, auth as auth_pages, cooks, dish_types, dishes, index, static_assets::serve_static},
    auth::{middleware::login_required, password},
    config::{CorsOrigin, PasswordConfig},
    db::{
        handlers::{Cooks, Repository},
        models::cooks::{CookCreateDBRequest, CookUpdateDBRequest},
    },
    openapi::AdminApiDoc,
    templates::Templates,
};
use axum::{
    Json, Router, http,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{CookId, DishId, DishTypeId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .templates(Arc::new(Templates::load()?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub templates: Arc<Templates>,
}

/// Get the kitchen database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Ensure a superuser named `username` exists with `password`.
///
/// Idempotent: a missing cook is created, an existing one is promoted to staff and superuser,
/// reactivated, and gets the password reset. Returns the cook's id.
#[instrument(skip(password, password_config, db))]
pub async fn create_initial_superuser(
    username: &str,
    email: &str,
    password: &str,
    password_config: &PasswordConfig,
    db: &PgPool,
) -> Result<CookId, sqlx::Error> {
    let password_hash = password::hash_password(password.to_string(), password_config)
        .await
        .map_err(|e| sqlx::Error::Encode(format!("Failed to hash superuser password: {e}").into()))?;

    let mut tx = db.begin().await?;
    let mut repo = Cooks::new(&mut tx);

    let existing = repo
        .get_by_username(username)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to check existing cook: {e}")))?;

    let id = match existing {
        Some(cook) => {
            let promote = CookUpdateDBRequest {
                password_hash: Some(password_hash),
                is_staff: Some(true),
                is_superuser: Some(true),
                is_active: Some(true),
                ..Default::default()
            };
            repo.update(cook.id, &promote)
                .await
                .map_err(|e| sqlx::Error::Protocol(format!("Failed to promote cook: {e}")))?;
            info!("Promoted existing cook {} to superuser", cook.id);
            cook.id
        }
        None => {
            let request = CookCreateDBRequest {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: email.to_string(),
                password_hash,
                years_of_experience: 0,
                is_staff: true,
                is_superuser: true,
            };
            let cook = repo
                .create(&request)
                .await
                .map_err(|e| sqlx::Error::Protocol(format!("Failed to create superuser: {e}")))?;
            info!("Created superuser {}", cook.id);
            cook.id
        }
    };

    tx.commit().await?;
    Ok(id)
}

/// Replace every stored password that is not yet an Argon2 hash with its hash.
///
/// Empty passwords are left alone, they cannot be used to log in either way. Returns the number
/// of cooks updated.
#[instrument(skip_all)]
pub async fn encrypt_passwords(db: &PgPool, password_config: &PasswordConfig) -> anyhow::Result<usize> {
    let mut conn = db.acquire().await?;
    let cooks = Cooks::new(&mut conn).list_all().await?;

    let mut updated = 0;
    for cook in cooks {
        if cook.password_hash.is_empty() || password::is_password_hash(&cook.password_hash) {
            continue;
        }
        let hash = password::hash_password(cook.password_hash, password_config).await?;
        let request = CookUpdateDBRequest {
            password_hash: Some(hash),
            ..Default::default()
        };
        Cooks::new(&mut conn).update(cook.id, &request).await?;
        info!("Encrypted password of {}", cook.username);
        updated += 1;
    }

    Ok(updated)
}

/// Open a pool on the configured database.
pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let settings = config.database.pool_settings();
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
        .connect(config.database.url())
        .await?;
    Ok(pool)
}

/// Run migrations and make sure the configured superuser exists.
async fn setup_database(config: &Config, pool: &PgPool) -> anyhow::Result<()> {
    migrator().run(pool).await?;

    if let Some(admin_password) = config.admin_password.as_deref() {
        create_initial_superuser(
            &config.admin_username,
            &config.admin_email,
            admin_password,
            &config.auth.password,
            pool,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial superuser: {}", e))?;
    }
    Ok(())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// - Back-office pages, behind [`login_required`]
/// - `/accounts/login/` and `/accounts/logout/`
/// - The admin API under `/admin/api/v1`, its OpenAPI document and the Scalar UI
/// - `/healthz` and `/static/*`
///
/// CORS and request tracing are applied to everything.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let pages = Router::new()
        .route("/", get(index::index))
        .route("/dish-types/", get(dish_types::list_dish_types))
        .route(
            "/dish-types/create/",
            get(dish_types::create_dish_type_form).post(dish_types::create_dish_type),
        )
        .route(
            "/dish-types/{id}/update/",
            get(dish_types::update_dish_type_form).post(dish_types::update_dish_type),
        )
        .route(
            "/dish-types/{id}/delete/",
            get(dish_types::delete_dish_type_form).post(dish_types::delete_dish_type),
        )
        .route("/dishes/", get(dishes::list_dishes))
        .route("/dishes/create/", get(dishes::create_dish_form).post(dishes::create_dish))
        .route("/dishes/{id}/", get(dishes::dish_detail))
        .route("/dishes/{id}/update/", get(dishes::update_dish_form).post(dishes::update_dish))
        .route("/dishes/{id}/delete/", get(dishes::delete_dish_form).post(dishes::delete_dish))
        .route("/dishes/{id}/toggle-assign/", post(dishes::toggle_assign))
        .route("/cooks/", get(cooks::list_cooks))
        .route("/cooks/create/", get(cooks::create_cook_form).post(cooks::create_cook))
        .route("/cooks/{id}/", get(cooks::cook_detail))
        .route(
            "/cooks/{id}/update-experience/",
            get(cooks::update_experience_form).post(cooks::update_experience),
        )
        .route("/cooks/{id}/delete/", get(cooks::delete_cook_form).post(cooks::delete_cook))
        .route_layer(from_fn_with_state(state.clone(), login_required));

    let account_routes = Router::new()
        .route("/accounts/login/", get(auth_pages::login_page).post(auth_pages::login))
        .route("/accounts/logout/", post(auth_pages::logout));

    let admin_api = Router::new()
        // Cooks
        .route("/cooks", get(admin::cooks::list_cooks).post(admin::cooks::create_cook))
        .route("/cooks/filters", get(admin::cooks::list_cook_filters))
        .route(
            "/cooks/{cook_id}",
            get(admin::cooks::get_cook)
                .patch(admin::cooks::update_cook)
                .delete(admin::cooks::delete_cook),
        )
        // Dish types
        .route(
            "/dish-types",
            get(admin::dish_types::list_dish_types).post(admin::dish_types::create_dish_type),
        )
        .route(
            "/dish-types/{dish_type_id}",
            get(admin::dish_types::get_dish_type)
                .put(admin::dish_types::update_dish_type)
                .delete(admin::dish_types::delete_dish_type),
        )
        // Dishes
        .route("/dishes", get(admin::dishes::list_dishes).post(admin::dishes::create_dish))
        .route("/dishes/filters", get(admin::dishes::list_dish_filters))
        .route(
            "/dishes/{dish_id}",
            get(admin::dishes::get_dish)
                .put(admin::dishes::update_dish)
                .delete(admin::dishes::delete_dish),
        );

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/static/{*path}", get(serve_static))
        .route("/admin/openapi.json", get(|| async { Json(AdminApiDoc::openapi()) }))
        .merge(pages)
        .merge(account_routes)
        .nest("/admin/api/v1", admin_api)
        .with_state(state.clone())
        .merge(Scalar::with_url("/admin/docs", AdminApiDoc::openapi()));

    let router = router.layer(create_cors_layer(&state.config)?).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled application: router, configuration and database pool.
///
/// 1. **Create**: [`Application::new`] connects, runs migrations and ensures the superuser
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests
/// 3. **Shutdown**: on the shutdown signal, in-flight requests finish, the pool is closed and
///    pending spans are flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the configured database and build the application.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Build the application on an existing pool, or connect when `pool` is `None`.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting kitchen with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => connect(&config).await?,
        };
        setup_database(&config, &pool).await?;

        let templates = Arc::new(Templates::load()?);
        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .templates(templates)
            .build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Kitchen listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test;
