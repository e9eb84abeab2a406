use crate::{
    auth::password,
    build_router, create_initial_superuser,
    db::handlers::{Cooks, Repository},
    encrypt_passwords,
    test_utils::{TEST_PASSWORD, create_test_app, create_test_app_state, create_test_config, create_test_cook},
};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test]
#[test_log::test]
async fn test_create_initial_superuser_new_cook(pool: PgPool) {
    let config = create_test_config();

    let id = create_initial_superuser("head-chef", "chef@kitchen.test", "Initial-Pass-123", &config.auth.password, &pool)
        .await
        .expect("Should create superuser");

    let mut conn = pool.acquire().await.unwrap();
    let cook = Cooks::new(&mut conn).get_by_username("head-chef").await.unwrap().unwrap();
    assert_eq!(cook.id, id);
    assert_eq!(cook.email, "chef@kitchen.test");
    assert!(cook.is_superuser);
    assert!(cook.is_staff);
    assert!(cook.is_active);
    assert!(password::verify_string("Initial-Pass-123", &cook.password_hash).unwrap());
}

#[sqlx::test]
#[test_log::test]
async fn test_create_initial_superuser_promotes_existing_cook(pool: PgPool) {
    let config = create_test_config();
    let existing = create_test_cook(&pool, "head-chef", false).await;

    for _ in 0..2 {
        let id = create_initial_superuser("head-chef", "ignored@kitchen.test", "Rotated-Pass-456", &config.auth.password, &pool)
            .await
            .expect("Should promote cook");
        assert_eq!(id, existing.id);
    }

    let mut conn = pool.acquire().await.unwrap();
    let mut repo = Cooks::new(&mut conn);
    assert_eq!(repo.list_all().await.unwrap().len(), 1);
    let cook = repo.get_by_id(existing.id).await.unwrap().unwrap();
    assert!(cook.is_superuser);
    assert!(cook.is_staff);
    assert_eq!(cook.email, existing.email);
    assert!(password::verify_string("Rotated-Pass-456", &cook.password_hash).unwrap());
    assert!(!password::verify_string(TEST_PASSWORD, &cook.password_hash).unwrap());
}

#[sqlx::test]
#[test_log::test]
async fn test_startup_ensures_configured_superuser(pool: PgPool) {
    let mut config = create_test_config();
    config.admin_username = "boss".to_string();
    config.admin_password = Some("Boss-Pass-789".to_string());
    let server = create_test_app(pool.clone(), config).await;

    let response = server
        .post("/accounts/login/")
        .form(&[("username", "boss"), ("password", "Boss-Pass-789"), ("next", "")])
        .await;
    response.assert_status(StatusCode::FOUND);

    let mut conn = pool.acquire().await.unwrap();
    let boss = Cooks::new(&mut conn).get_by_username("boss").await.unwrap().unwrap();
    assert!(boss.is_superuser);
}

#[sqlx::test]
#[test_log::test]
async fn test_encrypt_passwords_hashes_plaintext_only(pool: PgPool) {
    let config = create_test_config();
    let hashed = create_test_cook(&pool, "gordon", false).await;
    for (username, stored) in [("jamie", "plain-pass-1"), ("nigella", "")] {
        sqlx::query("INSERT INTO cooks (username, password_hash) VALUES ($1, $2)")
            .bind(username)
            .bind(stored)
            .execute(&pool)
            .await
            .unwrap();
    }

    assert_eq!(encrypt_passwords(&pool, &config.auth.password).await.unwrap(), 1);
    assert_eq!(encrypt_passwords(&pool, &config.auth.password).await.unwrap(), 0);

    let mut conn = pool.acquire().await.unwrap();
    let mut repo = Cooks::new(&mut conn);
    let jamie = repo.get_by_username("jamie").await.unwrap().unwrap();
    assert!(password::is_password_hash(&jamie.password_hash));
    assert!(password::verify_string("plain-pass-1", &jamie.password_hash).unwrap());

    let nigella = repo.get_by_username("nigella").await.unwrap().unwrap();
    assert_eq!(nigella.password_hash, "");

    let gordon = repo.get_by_id(hashed.id).await.unwrap().unwrap();
    assert_eq!(gordon.password_hash, hashed.password_hash);
}

#[sqlx::test]
#[test_log::test]
async fn test_public_endpoints(pool: PgPool) {
    let server = create_test_app(pool, create_test_config()).await;

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");

    let response = server.get("/admin/openapi.json").await;
    response.assert_status_ok();
    let content = response.text();
    assert!(content.contains("\"openapi\""));
    assert!(content.contains("Kitchen Admin API"));

    server.get("/admin/docs").await.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_cors_preflight_allows_configured_origin(pool: PgPool) {
    let server = create_test_app(pool, create_test_config()).await;

    let response = server
        .method(Method::OPTIONS, "/admin/api/v1/dishes")
        .add_header("origin", "http://localhost:8000")
        .add_header("access-control-request-method", "POST")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:8000"
    );
    assert_eq!(
        response.headers().get("access-control-allow-credentials").unwrap(),
        "true"
    );
}

#[sqlx::test]
#[test_log::test]
async fn test_router_serves_embedded_static_files(pool: PgPool) {
    let state = create_test_app_state(pool, create_test_config());
    let router = build_router(&state).expect("Failed to build router");

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/static/css/style.css").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/css");

    let response = router
        .oneshot(Request::builder().uri("/static/css/missing.css").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
