use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Serialize;

use crate::{
    create_tx, get_conn,
    entities::user::User,
    extractors::auth::AuthSession,
    utils::{
        response::{ApiResponse, AppError, response},
        state::ArcAppState,
    },
};

mod get_profile {
    use super::*;
    use crate::database::users::get_user_by_pseudo;

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub user: User,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(pseudo): Path<String>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);
        let user = get_user_by_pseudo(&pseudo, &mut conn)
            .await?
            .ok_or(AppError::NotFound("USER_NOT_FOUND"))?;

        Ok(response(Returns { user }, StatusCode::OK))
    }
}

mod patch_me {
    use serde::Deserialize;
    use validator::Validate;

    use super::*;
    use crate::{
        database::{
            conn::unique_violation,
            users::{UserProfileUpdate, get_user, update_user_profile},
        },
        utils::{security::store_password_async, validate::ValidatedJson},
    };

    #[derive(Debug, Deserialize, Validate)]
    pub struct Payload {
        #[validate(length(min = 3, max = 20))]
        pub pseudo: Option<String>,
        #[validate(length(max = 500))]
        pub bio: Option<String>,
        #[validate(length(min = 6))]
        pub password: Option<String>,
    }

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub user: User,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        ValidatedJson(payload): ValidatedJson<Payload>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        let password_hash = match payload.password {
            Some(p) => Some(store_password_async(p).await),
            None => None,
        };

        {
            let mut tx = create_tx!(conn);
            let dirty = update_user_profile(
                session.user_id,
                UserProfileUpdate {
                    pseudo: payload.pseudo,
                    bio: payload.bio,
                    password_hash,
                },
                &mut tx,
            )
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::Conflict("PSEUDO_TAKEN"),
                None => e.into(),
            })?;

            if dirty {
                tx.commit().await?;
            }
        }

        let user = get_user(session.user_id, true, &mut conn)
            .await?
            .ok_or(AppError::NotFound("USER_NOT_FOUND"))?;

        Ok(response(Returns { user }, StatusCode::OK))
    }
}

mod user_posts {
    use super::*;
    use crate::{
        database::{posts::get_feed_page, users::resolve_pseudo},
        endpoints::{PageQuery, parse_cursor},
        entities::post::Post,
        utils::pagination::{clamp_limit, trim_page},
    };

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Returns {
        pub posts: Vec<Post>,
        pub next_cursor: Option<String>,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(pseudo): Path<String>,
        Query(query): Query<PageQuery>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        let author_id = resolve_pseudo(&pseudo, &mut conn)
            .await?
            .ok_or(AppError::NotFound("USER_NOT_FOUND"))?;

        let cursor = parse_cursor(query.cursor.as_deref())?;
        let limit = clamp_limit(query.limit, 10);

        let rows = get_feed_page(Some(author_id), cursor, limit + 1, &mut conn).await?;
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

pub fn router() -> Router<ArcAppState> {
    Router::new()
        .route("/me", patch(patch_me::handler))
        .route("/{pseudo}", get(get_profile::handler))
        .route("/{pseudo}/posts", get(user_posts::handler))
}
