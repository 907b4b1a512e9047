use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::{
    database::posts::get_post,
    endpoints::parse_id,
    entities::post::Post,
    extractors::auth::AuthSession,
    get_conn,
    utils::{
        response::{ApiResponse, AppError, response},
        state::ArcAppState,
    },
};

mod create {
    use axum::extract::Multipart;

    use super::*;
    use crate::{
        database::{media::store_media, posts::create_post},
        endpoints::upload::check_media,
        utils::thread_state::generate_id,
    };

    const MAX_TEXT_LEN: usize = 1000;

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub post: Post,
    }

    struct MediaPart {
        filename: String,
        content_type: String,
        data: Vec<u8>,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        mut multipart: Multipart,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut media: Option<MediaPart> = None;
        let mut text = String::new();
        let mut media_type: Option<String> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("media") => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field
                        .content_type()
                        .ok_or(AppError::Validation("MEDIA_CONTENT_TYPE_REQUIRED".into()))?
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?;
                    media = Some(MediaPart {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    });
                }
                Some("text") => {
                    text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?;
                }
                Some("type") => {
                    media_type = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::Validation(e.to_string()))?,
                    );
                }
                _ => {}
            }
        }

        let media = media.ok_or(AppError::BadRequest("MEDIA_FILE_REQUIRED"))?;
        let media_type = media_type.ok_or(AppError::Validation("TYPE_REQUIRED".into()))?;
        if media_type != "photo" && media_type != "video" {
            return Err(AppError::Validation("TYPE_MUST_BE_PHOTO_OR_VIDEO".into()));
        }
        if text.chars().count() > MAX_TEXT_LEN {
            return Err(AppError::Validation("TEXT_TOO_LONG".into()));
        }
        check_media(&media.content_type, media.data.len())?;

        let mut conn = get_conn!(state);

        let media_id = generate_id();
        store_media(
            media_id,
            &media.content_type,
            &media.filename,
            &media.data,
            session.user_id,
            &mut conn,
        )
        .await?;

        let post_id = generate_id();
        create_post(
            post_id,
            session.user_id,
            &media_type,
            &text,
            media_id,
            &mut conn,
        )
        .await?;

        let post = get_post(post_id, &mut conn)
            .await?
            .ok_or(AppError::Internal)?;

        Ok(response(Returns { post }, StatusCode::CREATED))
    }
}

mod feed {
    use super::*;
    use crate::{
        database::posts::get_feed_page,
        endpoints::{PageQuery, parse_cursor},
        utils::pagination::{clamp_limit, trim_page},
    };

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Returns {
        pub posts: Vec<Post>,
        pub next_cursor: Option<String>,
    }

    pub async fn handler(
        _session: AuthSession,
        State(state): State<ArcAppState>,
        Query(query): Query<PageQuery>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        let cursor = parse_cursor(query.cursor.as_deref())?;
        let limit = clamp_limit(query.limit, 10);

        let rows = get_feed_page(None, cursor, limit + 1, &mut conn).await?;
        let page = trim_page(rows, limit, |p| p.post_id.clone());

        Ok(response(
            Returns {
                posts: page.items,
                next_cursor: page.next_cursor,
            },
            StatusCode::OK,
        ))
    }
}

mod get_one {
    use super::*;

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub post: Post,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let post_id = parse_id(&id)?;
        let mut conn = get_conn!(state);
        let post = get_post(post_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("POST_NOT_FOUND"))?;

        Ok(response(Returns { post }, StatusCode::OK))
    }
}

mod patch_post {
    use serde::Deserialize;
    use validator::Validate;

    use super::*;
    use crate::{database::posts::update_post_text, utils::validate::ValidatedJson};

    #[derive(Debug, Deserialize, Validate)]
    pub struct Payload {
        #[validate(length(max = 1000))]
        pub text: String,
    }

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub post: Post,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
        ValidatedJson(payload): ValidatedJson<Payload>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let post_id = parse_id(&id)?;
        let mut conn = get_conn!(state);

        // Missing post and foreign post are one signal to avoid leaking
        // which of the two it was.
        let updated = update_post_text(post_id, session.user_id, &payload.text, &mut conn).await?;
        if !updated {
            return Err(AppError::NotFound("POST_NOT_FOUND_OR_UNAUTHORIZED"));
        }

        let post = get_post(post_id, &mut conn)
            .await?
            .ok_or(AppError::Internal)?;

        Ok(response(Returns { post }, StatusCode::OK))
    }
}

mod delete_post {
    use super::*;
    use crate::database::posts::soft_delete_post;

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
    ) -> Result<StatusCode, AppError> {
        let post_id = parse_id(&id)?;
        let mut conn = get_conn!(state);

        let deleted = soft_delete_post(post_id, session.user_id, &mut conn).await?;
        if !deleted {
            return Err(AppError::NotFound("POST_NOT_FOUND_OR_UNAUTHORIZED"));
        }

        Ok(StatusCode::NO_CONTENT)
    }
}

mod like {
    use super::*;
    use crate::database::posts::toggle_like;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Returns {
        pub liked: bool,
        pub likes_count: i64,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let post_id = parse_id(&id)?;
        let mut conn = get_conn!(state);

        let (liked, likes_count) = toggle_like(post_id, session.user_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("POST_NOT_FOUND"))?;

        Ok(response(Returns { liked, likes_count }, StatusCode::OK))
    }
}

mod likers {
    use axum::extract::Query;
    use serde::Deserialize;

    use super::*;
    use crate::{database::posts::get_likers, entities::user::UserRef, utils::pagination::clamp_limit};

    #[derive(Debug, Deserialize)]
    pub struct Params {
        pub limit: Option<i64>,
    }

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub likes: Vec<UserRef>,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
        Query(params): Query<Params>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let post_id = parse_id(&id)?;
        let mut conn = get_conn!(state);

        get_post(post_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("POST_NOT_FOUND"))?;

        let limit = clamp_limit(params.limit, 20);
        let likes = get_likers(post_id, limit, &mut conn).await?;

        Ok(response(Returns { likes }, StatusCode::OK))
    }
}

mod share {
    use axum::http::HeaderMap;

    use super::*;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Returns {
        pub share_url: String,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let post_id = parse_id(&id)?;
        let mut conn = get_conn!(state);

        let post = get_post(post_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("POST_NOT_FOUND"))?;

        let host = headers
            .get(axum::http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(&state.config.url);
        let share_url = format!("http://{}/#/post/{}", host, post.post_id);

        Ok(response(Returns { share_url }, StatusCode::OK))
    }
}

pub fn router() -> Router<ArcAppState> {
    Router::new()
        .route("/", post(create::handler))
        .route("/feed", get(feed::handler))
        .route(
            "/{id}",
            get(get_one::handler)
                .patch(patch_post::handler)
                .delete(delete_post::handler),
        )
        .route("/{id}/like", post(like::handler))
        .route("/{id}/likes", get(likers::handler))
        .route("/{id}/share", post(share::handler))
}
