use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    database::media::{get_media_full, get_media_info, get_media_range},
    endpoints::parse_id,
    get_conn,
    utils::{response::AppError, state::ArcAppState},
};

/// Parse a `bytes=start-end` header against a blob of `total` bytes.
/// Returns the inclusive byte span, or `None` when the header is malformed
/// or unsatisfiable (callers fall back to the full object).
fn parse_range(header: &str, total: i64) -> Option<(i64, i64)> {
    let spec = header.strip_prefix("bytes=")?;
    let (start_s, end_s) = spec.split_once('-')?;

    let start: i64 = start_s.parse().ok()?;
    let end: i64 = match end_s {
        "" => total - 1,
        s => s.parse::<i64>().ok()?.min(total - 1),
    };

    if start < 0 || start > end || start >= total {
        return None;
    }
    Some((start, end))
}

mod get_full {
    use super::*;

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let media_id = parse_id(&id)?;
        let mut conn = get_conn!(state);

        let (info, data) = get_media_full(media_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("MEDIA_NOT_FOUND"))?;

        Ok((
            [
                (header::CONTENT_TYPE, info.content_type),
                (header::CONTENT_LENGTH, info.length.to_string()),
            ],
            data,
        )
            .into_response())
    }
}

mod stream {
    use super::*;

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let media_id = parse_id(&id)?;
        let mut conn = get_conn!(state);

        let info = get_media_info(media_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("MEDIA_NOT_FOUND"))?;

        let range = headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_range(v, info.length));

        if let Some((start, end)) = range {
            let len = end - start + 1;
            let chunk = get_media_range(media_id, start as i32, len as i32, &mut conn)
                .await?
                .ok_or(AppError::NotFound("MEDIA_NOT_FOUND"))?;

            return Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (
                        header::CONTENT_RANGE,
                        format!("bytes {}-{}/{}", start, end, info.length),
                    ),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_LENGTH, len.to_string()),
                    (header::CONTENT_TYPE, info.content_type),
                ],
                chunk,
            )
                .into_response());
        }

        let (info, data) = get_media_full(media_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("MEDIA_NOT_FOUND"))?;

        Ok((
            [
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (header::CONTENT_LENGTH, info.length.to_string()),
                (header::CONTENT_TYPE, info.content_type),
            ],
            data,
        )
            .into_response())
    }
}

pub fn router() -> Router<ArcAppState> {
    Router::new()
        .route("/{id}", get(get_full::handler))
        .route("/stream/{id}", get(stream::handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_byte_span() {
        // bytes=0-99 on a 1000-byte blob is exactly bytes 0..=99
        assert_eq!(parse_range("bytes=0-99", 1000), Some((0, 99)));
    }

    #[test]
    fn open_ended_range_runs_to_last_byte() {
        assert_eq!(parse_range("bytes=200-", 1000), Some((200, 999)));
    }

    #[test]
    fn end_is_clamped_to_blob_length() {
        assert_eq!(parse_range("bytes=900-5000", 1000), Some((900, 999)));
    }

    #[test]
    fn unsatisfiable_or_malformed_ranges_are_ignored() {
        assert_eq!(parse_range("bytes=1000-1100", 1000), None);
        assert_eq!(parse_range("bytes=50-10", 1000), None);
        assert_eq!(parse_range("bytes=abc-def", 1000), None);
        assert_eq!(parse_range("items=0-99", 1000), None);
    }
}
