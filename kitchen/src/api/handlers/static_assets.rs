//! HTTP handlers for static asset serving.

use axum::{
    body::Body,
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::static_assets::Assets;

/// Serve a file embedded under `static/`.
#[instrument]
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let Some(content) = Assets::get(&path) else {
        debug!("Static file not found: {path}");
        return StatusCode::NOT_FOUND.into_response();
    };
    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    (
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        Body::from(content.data.into_owned()),
    )
        .into_response()
}
