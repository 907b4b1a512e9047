use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;

use crate::{
    endpoints::parse_id,
    entities::comment::Comment,
    extractors::auth::AuthSession,
    get_conn,
    utils::{
        response::{ApiResponse, AppError, response},
        state::ArcAppState,
    },
};

mod create {
    use serde::Deserialize;
    use validator::Validate;

    use super::*;
    use crate::{
        database::{
            comments::{create_comment, get_comment},
            posts::get_post,
        },
        utils::{thread_state::generate_id, validate::ValidatedJson},
    };

    #[derive(Debug, Deserialize, Validate)]
    pub struct Payload {
        #[validate(length(min = 1, max = 500))]
        pub text: String,
    }

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub comment: Comment,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        Path(post_id): Path<String>,
        ValidatedJson(payload): ValidatedJson<Payload>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let post_id = parse_id(&post_id)?;
        let mut conn = get_conn!(state);

        // Deleted posts take no new comments.
        get_post(post_id, &mut conn)
            .await?
            .ok_or(AppError::NotFound("POST_NOT_FOUND"))?;

        let comment_id = generate_id();
        create_comment(comment_id, post_id, session.user_id, &payload.text, &mut conn).await?;

        let comment = get_comment(comment_id, &mut conn)
            .await?
            .ok_or(AppError::Internal)?;

        Ok(response(Returns { comment }, StatusCode::CREATED))
    }
}

mod list {
    use super::*;
    use crate::{
        database::comments::get_comment_page,
        endpoints::{PageQuery, parse_cursor},
        utils::pagination::{clamp_limit, trim_page},
    };

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Returns {
        pub comments: Vec<Comment>,
        pub next_cursor: Option<String>,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(post_id): Path<String>,
        Query(query): Query<PageQuery>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let post_id = parse_id(&post_id)?;
        let mut conn = get_conn!(state);

        let cursor = parse_cursor(query.cursor.as_deref())?;
        let limit = clamp_limit(query.limit, 20);

        let rows = get_comment_page(post_id, cursor, limit + 1, &mut conn).await?;
        let page = trim_page(rows, limit, |c| c.comment_id.clone());

        Ok(response(
            Returns {
                comments: page.items,
                next_cursor: page.next_cursor,
            },
            StatusCode::OK,
        ))
    }
}

mod remove {
    use super::*;
    use crate::database::comments::delete_comment;

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        Path(comment_id): Path<String>,
    ) -> Result<StatusCode, AppError> {
        let comment_id = parse_id(&comment_id)?;
        let mut conn = get_conn!(state);

        let deleted = delete_comment(comment_id, session.user_id, &mut conn).await?;
        if !deleted {
            return Err(AppError::NotFound("COMMENT_NOT_FOUND_OR_UNAUTHORIZED"));
        }

        Ok(StatusCode::NO_CONTENT)
    }
}

pub fn router() -> Router<ArcAppState> {
    // The path id is a post for create/list and a comment for delete,
    // mirroring the REST surface.
    Router::new().route(
        "/{id}",
        get(list::handler).post(create::handler).delete(remove::handler),
    )
}
