use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    database::users::resolve_pseudo,
    entities::user::UserRef,
    extractors::auth::AuthSession,
    get_conn,
    utils::{
        pagination::clamp_limit,
        response::{ApiResponse, AppError, response},
        state::ArcAppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct Params {
    pub limit: Option<i64>,
}

/// A user can never follow themselves, whatever the current edge state.
fn ensure_not_self(follower_id: i64, target_id: i64) -> Result<(), AppError> {
    if follower_id == target_id {
        return Err(AppError::BadRequest("CANNOT_FOLLOW_SELF"));
    }
    Ok(())
}

mod toggle {
    use super::*;
    use crate::database::follows::toggle_follow;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Returns {
        pub is_following: bool,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
        Path(pseudo): Path<String>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        let target_id = resolve_pseudo(&pseudo, &mut conn)
            .await?
            .ok_or(AppError::NotFound("USER_NOT_FOUND"))?;

        ensure_not_self(session.user_id, target_id)?;

        let is_following = toggle_follow(session.user_id, target_id, &mut conn).await?;

        Ok(response(Returns { is_following }, StatusCode::OK))
    }
}

mod followers {
    use super::*;
    use crate::database::follows::list_followers;

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub followers: Vec<UserRef>,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(pseudo): Path<String>,
        Query(params): Query<Params>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        let user_id = resolve_pseudo(&pseudo, &mut conn)
            .await?
            .ok_or(AppError::NotFound("USER_NOT_FOUND"))?;

        let limit = clamp_limit(params.limit, 50);
        let followers = list_followers(user_id, limit, &mut conn).await?;

        Ok(response(Returns { followers }, StatusCode::OK))
    }
}

mod following {
    use super::*;
    use crate::database::follows::list_following;

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub following: Vec<UserRef>,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        Path(pseudo): Path<String>,
        Query(params): Query<Params>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        let user_id = resolve_pseudo(&pseudo, &mut conn)
            .await?
            .ok_or(AppError::NotFound("USER_NOT_FOUND"))?;

        let limit = clamp_limit(params.limit, 50);
        let following = list_following(user_id, limit, &mut conn).await?;

        Ok(response(Returns { following }, StatusCode::OK))
    }
}

pub fn router() -> Router<ArcAppState> {
    Router::new()
        .route("/{pseudo}", post(toggle::handler))
        .route("/{pseudo}/followers", get(followers::handler))
        .route("/{pseudo}/following", get(following::handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_follow_is_rejected() {
        assert!(matches!(
            ensure_not_self(7, 7),
            Err(AppError::BadRequest("CANNOT_FOLLOW_SELF"))
        ));
    }

    #[test]
    fn distinct_users_may_follow() {
        assert!(ensure_not_self(7, 8).is_ok());
        assert!(ensure_not_self(8, 7).is_ok());
    }
}
