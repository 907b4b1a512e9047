use axum::{Router, extract::DefaultBodyLimit};
use serde::Deserialize;

use crate::utils::{response::AppError, state::ArcAppState};

pub mod auth;
pub mod comments;
pub mod follow;
pub mod media;
pub mod posts;
pub mod upload;
pub mod users;

/// Cursor-pagination query parameters shared by every listing endpoint.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// Path/cursor IDs arrive as decimal strings.
pub(crate) fn parse_id(s: &str) -> Result<i64, AppError> {
    s.parse().map_err(|_| AppError::Validation("INVALID_ID".to_string()))
}

pub(crate) fn parse_cursor(cursor: Option<&str>) -> Result<Option<i64>, AppError> {
    cursor.map(parse_id).transpose()
}

pub fn create_router() -> Router<ArcAppState> {
    // Media uploads carry up to 25 MB of payload plus multipart framing.
    let media_body_limit = DefaultBodyLimit::max(upload::MAX_MEDIA_BYTES + 64 * 1024);

    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/posts", posts::router().layer(media_body_limit.clone()))
        .nest("/comments", comments::router())
        .nest("/follow", follow::router())
        .nest("/upload", upload::router().layer(media_body_limit))
        .nest("/media", media::router())
}
