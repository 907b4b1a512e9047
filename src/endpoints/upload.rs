use axum::{Router, extract::State, http::StatusCode, routing::post};
use serde::Serialize;

use crate::{
    extractors::auth::AuthSession,
    get_conn,
    utils::{
        response::{ApiResponse, AppError, response},
        state::ArcAppState,
    },
};

pub const MAX_MEDIA_BYTES: usize = 25 * 1024 * 1024;

const ALLOWED_MEDIA_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "video/mp4",
    "video/quicktime",
];

/// Upload policy, enforced before anything reaches the blob store.
pub fn check_media(content_type: &str, len: usize) -> Result<(), AppError> {
    if !ALLOWED_MEDIA_TYPES.contains(&content_type) {
        return Err(AppError::Validation("INVALID_MEDIA_TYPE".to_string()));
    }
    if len == 0 {
        return Err(AppError::Validation("EMPTY_MEDIA_FILE".to_string()));
    }
    if len > MAX_MEDIA_BYTES {
        return Err(AppError::Validation("MEDIA_TOO_LARGE".to_string()));
    }
    Ok(())
}

mod media_upload {
    use axum::extract::Multipart;

    use super::*;
    use crate::{database::media::store_media, utils::thread_state::generate_id};

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Returns {
        pub file_id: String,
        pub filename: String,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        mut multipart: Multipart,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut stored: Option<(String, String, Vec<u8>)> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?
        {
            if field.name() != Some("media") {
                continue;
            }
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .ok_or(AppError::Validation("MEDIA_CONTENT_TYPE_REQUIRED".into()))?
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            stored = Some((filename, content_type, data.to_vec()));
        }

        let (filename, content_type, data) =
            stored.ok_or(AppError::BadRequest("MEDIA_FILE_REQUIRED"))?;
        check_media(&content_type, data.len())?;

        let mut conn = get_conn!(state);
        let media_id = generate_id();
        store_media(
            media_id,
            &content_type,
            &filename,
            &data,
            session.user_id,
            &mut conn,
        )
        .await?;

        Ok(response(
            Returns {
                file_id: media_id.to_string(),
                filename,
            },
            StatusCode::CREATED,
        ))
    }
}

pub fn router() -> Router<ArcAppState> {
    Router::new().route("/media", post(media_upload::handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_images_and_videos() {
        assert!(check_media("image/jpeg", 100).is_ok());
        assert!(check_media("image/png", 100).is_ok());
        assert!(check_media("video/mp4", 100).is_ok());
    }

    #[test]
    fn rejects_other_content_types() {
        assert!(check_media("application/pdf", 100).is_err());
        assert!(check_media("text/html", 100).is_err());
        assert!(check_media("image/svg+xml", 100).is_err());
    }

    #[test]
    fn enforces_size_bounds() {
        assert!(check_media("image/jpeg", 0).is_err());
        assert!(check_media("image/jpeg", MAX_MEDIA_BYTES).is_ok());
        assert!(check_media("image/jpeg", MAX_MEDIA_BYTES + 1).is_err());
    }
}
