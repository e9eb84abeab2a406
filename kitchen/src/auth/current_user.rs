use crate::{
    AppState,
    api::models::cooks::CurrentUser,
    auth::session,
    config::Config,
    db::handlers::{Cooks, Repository},
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Extract the cook from the JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but unreadable
#[instrument(skip(headers, config))]
fn try_jwt_session_auth(headers: &HeaderMap, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=')
            && name == cookie_name
        {
            match session::verify_session_token(value, config) {
                Ok(user) => return Some(Ok(user)),
                // Expired or tampered tokens are expected, keep looking
                Err(_) => continue,
            }
        }
    }
    None
}

/// Resolve the session cookie to a live cook.
///
/// The token only names the cook; flags and names are reloaded from the database so a deleted
/// or deactivated cook loses access immediately.
#[instrument(skip(headers, state), err)]
pub async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<Option<CurrentUser>> {
    let claimed = match try_jwt_session_auth(headers, &state.config) {
        Some(Ok(user)) => user,
        Some(Err(e)) => {
            trace!("JWT session authentication failed: {:?}", e);
            return Ok(None);
        }
        None => {
            trace!("No JWT session authentication attempted");
            return Ok(None);
        }
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let cook = Cooks::new(&mut conn).get_by_id(claimed.id).await?;

    match cook {
        Some(cook) if cook.is_active => {
            debug!("Found JWT session authenticated cook: {}", cook.id);
            Ok(Some(CurrentUser::from(cook)))
        }
        _ => {
            debug!("Session names cook {} which no longer exists or is inactive", claimed.id);
            Ok(None)
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Already resolved by the login_required middleware
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        match authenticate(&parts.headers, state).await? {
            Some(user) => Ok(user),
            None => Err(Error::Unauthenticated { message: None }),
        }
    }
}

/// A logged-in cook with the superuser flag, required by the admin API.
///
/// Rejects with `401` when nobody is logged in and `403` for other cooks.
#[derive(Debug, Clone)]
pub struct Superuser(pub CurrentUser);

impl FromRequestParts<AppState> for Superuser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            return Err(Error::InsufficientPermissions {
                message: "Superuser access required".to_string(),
            });
        }
        Ok(Superuser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app_state, create_test_config, create_test_cook, session_cookie};
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;

    fn parts_with_cookie(cookie: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/dishes/");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_session_cookie_resolves_to_cook(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "gordon", false).await;
        let state = create_test_app_state(pool, config.clone());

        let mut parts = parts_with_cookie(Some(session_cookie(&cook, &config)));
        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, cook.id);
        assert_eq!(user.username, "gordon");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_or_garbage_cookie_is_unauthenticated(pool: PgPool) {
        let config = create_test_config();
        let state = create_test_app_state(pool, config.clone());

        let mut parts = parts_with_cookie(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let mut parts = parts_with_cookie(Some(format!("{}=not-a-jwt", config.auth.session.cookie_name)));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleted_cook_loses_session(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "ghost", false).await;
        let cookie = session_cookie(&cook, &config);

        let mut conn = pool.acquire().await.unwrap();
        Cooks::new(&mut conn).delete(cook.id).await.unwrap();

        let state = create_test_app_state(pool, config);
        let mut parts = parts_with_cookie(Some(cookie));
        assert!(CurrentUser::from_request_parts(&mut parts, &state).await.is_err());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_superuser_extractor(pool: PgPool) {
        let config = create_test_config();
        let cook = create_test_cook(&pool, "line-cook", false).await;
        let admin = create_test_cook(&pool, "head-chef", true).await;
        let state = create_test_app_state(pool, config.clone());

        let mut parts = parts_with_cookie(Some(session_cookie(&cook, &config)));
        let err = Superuser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let mut parts = parts_with_cookie(Some(session_cookie(&admin, &config)));
        let Superuser(user) = Superuser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, admin.id);

        let mut parts = parts_with_cookie(None);
        let err = Superuser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
