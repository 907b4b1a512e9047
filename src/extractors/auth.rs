use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    database::users::user_exists,
    get_conn,
    utils::{response::AppError, security::decode_token, state::ArcAppState},
};

/// Verified caller identity. Handlers taking this extractor never re-check
/// the token; missing/invalid/expired tokens are rejected here with a 401.
#[derive(Debug)]
pub struct AuthSession {
    pub user_id: i64,
}

impl FromRequestParts<ArcAppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ArcAppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized("MISSING_TOKEN"))?;

        let decoded =
            decode_token(token, &state.config.signature_key).map_err(AppError::Unauthorized)?;
        if decoded.is_expired {
            return Err(AppError::Unauthorized("TOKEN_EXPIRED"));
        }

        // The signature proves the ID was issued by us; the account still
        // has to exist.
        let mut conn = get_conn!(state);
        if !user_exists(decoded.user_id, &mut conn).await? {
            return Err(AppError::Unauthorized("INVALID_TOKEN"));
        }

        Ok(AuthSession {
            user_id: decoded.user_id,
        })
    }
}
