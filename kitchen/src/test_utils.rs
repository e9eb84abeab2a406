//! Test utilities for handler and repository tests.

use crate::{
    AppState,
    api::models::cooks::CurrentUser,
    auth::{password, session},
    config::{Config, PasswordConfig, PoolSettings},
    db::{
        handlers::{Cooks, Dishes, Repository},
        models::{
            cooks::{CookCreateDBRequest, CookDBResponse},
            dish_types::DishTypeDBResponse,
            dishes::{DishCreateDBRequest, DishDBResponse},
        },
    },
    templates::Templates,
    types::CookId,
};
use axum_test::TestServer;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

/// Password of every cook made by [`create_test_cook`].
pub const TEST_PASSWORD: &str = "Sour-Cherry-Pie-77";

pub async fn create_test_app(pool: PgPool, config: Config) -> TestServer {
    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");
    app.into_test_server()
}

pub fn create_test_app_state(pool: PgPool, config: Config) -> AppState {
    AppState::builder()
        .db(pool)
        .config(config)
        .templates(Arc::new(Templates::load().expect("Failed to load templates")))
        .build()
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        // Will get overriden by the test pool
        database: crate::config::DatabaseConfig::External {
            url: "postgres://localhost/kitchen_test".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 1,
                ..Default::default()
            },
        },
        admin_email: "admin@test.com".to_string(),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };
    config.auth.session.cookie_secure = false;
    config.auth.password = test_password_config();
    config
}

/// Cheap Argon2 cost so tests don't spend their time hashing.
fn test_password_config() -> PasswordConfig {
    PasswordConfig {
        argon2_memory_kib: 128,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    }
}

/// Insert an active cook with no experience whose password is [`TEST_PASSWORD`].
pub async fn create_test_cook(pool: &PgPool, username: &str, is_superuser: bool) -> CookDBResponse {
    let password_hash = password::hash_password(TEST_PASSWORD.to_string(), &test_password_config())
        .await
        .expect("Failed to hash test password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Cooks::new(&mut conn)
        .create(&CookCreateDBRequest {
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "Cook".to_string(),
            email: format!("{username}@kitchen.test"),
            password_hash,
            years_of_experience: 0,
            is_staff: is_superuser,
            is_superuser,
        })
        .await
        .expect("Failed to create test cook")
}

/// `Cookie` header value carrying a valid session for `cook`.
pub fn session_cookie(cook: &CookDBResponse, config: &Config) -> String {
    let token = session::create_session_token(&CurrentUser::from(cook.clone()), config)
        .expect("Failed to create session token");
    format!("{}={}", config.auth.session.cookie_name, token)
}

/// Insert a dish type, or return the existing one with that name.
pub async fn create_test_dish_type(pool: &PgPool, name: &str) -> DishTypeDBResponse {
    sqlx::query_as::<_, DishTypeDBResponse>(
        r#"
        INSERT INTO dish_types (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("Failed to create test dish type")
}

/// Insert a dish priced 10.00 of the named dish type (created when missing), assigned to `cooks`.
pub async fn create_test_dish(pool: &PgPool, name: &str, dish_type: &str, cooks: &[CookId]) -> DishDBResponse {
    let dish_type = create_test_dish_type(pool, dish_type).await;

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Dishes::new(&mut conn)
        .create(&DishCreateDBRequest {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(1000, 2),
            dish_type_id: dish_type.id,
            cook_ids: cooks.to_vec(),
        })
        .await
        .expect("Failed to create test dish")
}
