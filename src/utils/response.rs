use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    status: StatusCode,
}

pub fn response<T>(data: T, status: StatusCode) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data: Some(data),
        error: None,
        status,
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = self.status;
        (status, axum::Json(self)).into_response()
    }
}

/// Error taxonomy for the whole API surface. Every handler returns
/// `Result<_, AppError>`, the `IntoResponse` impl maps it to a status code
/// and the standard `{success, error}` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range input, includes field-level detail.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    /// Also covers ownership failures: "not found" and "not yours" are
    /// deliberately indistinguishable so existence never leaks.
    #[error("{0}")]
    NotFound(&'static str),

    /// Duplicate unique key, carries the offending field code.
    #[error("{0}")]
    Conflict(&'static str),

    /// Detail is logged server-side, never sent to the client.
    #[error("INTERNAL_SERVER_ERROR")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
            status: self.status(),
        };
        body.into_response()
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        error!("Pool error: {:?}", err);
        AppError::Internal
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(err: tokio_postgres::Error) -> Self {
        error!("Postgres error: {:?}", err);
        AppError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("NO_TOKEN").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("POST_NOT_FOUND").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("PSEUDO_TAKEN").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        assert_eq!(AppError::Internal.to_string(), "INTERNAL_SERVER_ERROR");
    }
}
