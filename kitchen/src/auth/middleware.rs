//! Route protection for the back-office pages.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    auth::{current_user::authenticate, utils::login_redirect_url},
};

/// Let the request through only with a valid session.
///
/// The resolved [`crate::api::models::cooks::CurrentUser`] is stored in the request extensions
/// for the handlers. Anonymous requests get a `302` to the login page with the requested
/// path and query as `next`.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn login_required(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(request.headers(), &state).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => {
            debug!("Anonymous request, redirecting to login");
            (StatusCode::FOUND, [(header::LOCATION, login_redirect_url(request.uri()))]).into_response()
        }
        Err(e) => e.into_response(),
    }
}
