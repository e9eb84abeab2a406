use axum::{
    Form,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use minijinja::context;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::{
        handlers::acquire,
        models::{
            auth::{INVALID_LOGIN, LoginForm},
            cooks::CurrentUser,
            forms::{FieldErrors, FormData, NON_FIELD_ERRORS},
        },
    },
    auth::{
        password, session,
        utils::{LOGIN_REDIRECT_URL, safe_next},
    },
    config::Config,
    db::handlers::Cooks,
    errors::Result,
};

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

fn render_login(state: &AppState, data: &FormData, errors: &FieldErrors, next: &str) -> Result<Html<String>> {
    let form = LoginForm::form(data).with_errors(errors);
    state
        .templates
        .render("login.html", None, context! { title => "Login", form, next })
}

/// The login page. `next` is carried through the form.
#[instrument(skip_all)]
pub async fn login_page(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Result<Html<String>> {
    let next = query.next.unwrap_or_default();
    render_login(&state, &FormData::default(), &FieldErrors::default(), &next)
}

/// Check credentials, set the session cookie and continue to `next` when it is a local path.
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Form(data): Form<FormData>) -> Result<Response> {
    let next = data.value("next").unwrap_or_default().to_string();
    let form = match LoginForm::clean(&data) {
        Ok(form) => form,
        Err(errors) => return Ok(render_login(&state, &data, &errors, &next)?.into_response()),
    };

    let mut conn = acquire(&state).await?;
    let mut repo = Cooks::new(&mut conn);

    let cook = match repo.get_by_username(&form.username).await? {
        Some(cook) if cook.is_active && password::is_password_hash(&cook.password_hash) => {
            let valid = password::verify_password(form.password, cook.password_hash.clone()).await?;
            valid.then_some(cook)
        }
        _ => None,
    };
    let Some(cook) = cook else {
        info!("Failed login for {}", form.username);
        let mut errors = FieldErrors::default();
        errors.add(NON_FIELD_ERRORS, INVALID_LOGIN);
        return Ok(render_login(&state, &data, &errors, &next)?.into_response());
    };

    repo.record_login(cook.id).await?;
    drop(conn);

    let user = CurrentUser::from(cook);
    let token = session::create_session_token(&user, &state.config)?;
    let target = safe_next(form.next.as_deref()).unwrap_or(LOGIN_REDIRECT_URL);
    info!("Cook {} logged in", user.id);

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, target.to_string()),
            (header::SET_COOKIE, session_cookie(&token, &state.config)),
        ],
    )
        .into_response())
}

/// Clear the session cookie and show the logged-out page.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<Response> {
    let page = state
        .templates
        .render("logged_out.html", None, context! { title => "Logged out" })?;
    Ok(([(header::SET_COOKIE, expired_cookie(&state.config))], page).into_response())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.session;
    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session.cookie_name,
        token,
        if session.cookie_secure { "; Secure" } else { "" },
        session.cookie_same_site,
        session.timeout.as_secs()
    )
}

fn expired_cookie(config: &Config) -> String {
    let session = &config.auth.session;
    format!(
        "{}=; Path=/; HttpOnly{}; SameSite={}; Max-Age=0",
        session.cookie_name,
        if session.cookie_secure { "; Secure" } else { "" },
        session.cookie_same_site,
    )
}
