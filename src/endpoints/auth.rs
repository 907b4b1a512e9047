use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::{
    database::conn::unique_violation,
    entities::user::User,
    extractors::auth::AuthSession,
    get_conn,
    utils::{
        response::{ApiResponse, AppError, response},
        state::ArcAppState,
    },
};

mod register {
    use serde::Deserialize;
    use validator::Validate;

    use super::*;
    use crate::{
        database::users::{create_user, get_user},
        utils::{security::store_password_async, thread_state::generate_id, validate::ValidatedJson},
    };

    #[derive(Debug, Deserialize, Validate)]
    pub struct Payload {
        #[validate(length(min = 3, max = 20))]
        pub pseudo: String,
        #[validate(email)]
        pub email: String,
        #[validate(length(min = 6))]
        pub password: String,
    }

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub user: User,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        ValidatedJson(payload): ValidatedJson<Payload>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        let user_id = generate_id();
        let email = payload.email.to_lowercase();
        let password_hash = store_password_async(payload.password).await;

        create_user(user_id, &payload.pseudo, &email, &password_hash, &mut conn)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(c) if c.contains("pseudo") => AppError::Conflict("PSEUDO_TAKEN"),
                Some(_) => AppError::Conflict("EMAIL_TAKEN"),
                None => e.into(),
            })?;

        let user = get_user(user_id, true, &mut conn)
            .await?
            .ok_or(AppError::Internal)?;

        Ok(response(Returns { user }, StatusCode::CREATED))
    }
}

mod login {
    use serde::Deserialize;
    use validator::Validate;

    use super::*;
    use crate::{
        database::users::{get_auth_user_by_email, get_user},
        utils::{
            security::{check_password_async, generate_token},
            validate::ValidatedJson,
        },
    };

    #[derive(Debug, Deserialize, Validate)]
    pub struct Payload {
        #[validate(email)]
        pub email: String,
        #[validate(length(min = 1))]
        pub password: String,
    }

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub token: String,
        pub user: User,
    }

    pub async fn handler(
        State(state): State<ArcAppState>,
        ValidatedJson(payload): ValidatedJson<Payload>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);

        // Unknown email and wrong password produce the identical error so
        // accounts cannot be enumerated.
        let account = get_auth_user_by_email(&payload.email.to_lowercase(), &mut conn)
            .await?
            .ok_or(AppError::Unauthorized("INVALID_CREDENTIALS"))?;

        let valid = check_password_async(account.password_hash.clone(), payload.password).await;
        if !valid {
            return Err(AppError::Unauthorized("INVALID_CREDENTIALS"));
        }

        let token = generate_token(account.user_id, &state.config.signature_key);
        let user = get_user(account.user_id, true, &mut conn)
            .await?
            .ok_or(AppError::Internal)?;

        Ok(response(Returns { token, user }, StatusCode::OK))
    }
}

mod me {
    use super::*;
    use crate::database::users::get_user;

    #[derive(Debug, Serialize)]
    pub struct Returns {
        pub user: User,
    }

    pub async fn handler(
        session: AuthSession,
        State(state): State<ArcAppState>,
    ) -> Result<ApiResponse<Returns>, AppError> {
        let mut conn = get_conn!(state);
        let user = get_user(session.user_id, true, &mut conn)
            .await?
            .ok_or(AppError::NotFound("USER_NOT_FOUND"))?;

        Ok(response(Returns { user }, StatusCode::OK))
    }
}

pub fn router() -> Router<ArcAppState> {
    Router::new()
        .route("/register", post(register::handler))
        .route("/login", post(login::handler))
        .route("/me", get(me::handler))
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::register;

    fn payload(pseudo: &str, email: &str, password: &str) -> register::Payload {
        register::Payload {
            pseudo: pseudo.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(payload("alice", "alice@example.com", "secret1").validate().is_ok());
    }

    #[test]
    fn pseudo_length_is_bounded() {
        assert!(payload("ab", "a@b.com", "secret1").validate().is_err());
        assert!(
            payload(&"x".repeat(21), "a@b.com", "secret1")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn email_must_be_well_formed() {
        assert!(payload("alice", "not-an-email", "secret1").validate().is_err());
    }

    #[test]
    fn password_needs_six_chars() {
        assert!(payload("alice", "a@b.com", "12345").validate().is_err());
        assert!(payload("alice", "a@b.com", "123456").validate().is_ok());
    }
}
