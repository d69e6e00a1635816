use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storysplice_core::credentials::AuthErrorCode;
use storysplice_core::error::CoreError;
use storysplice_pipeline::{FailureKind, PipelineError};

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{"error": message, "code": CODE}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An editor or project operation failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Sign-in or sign-up rejected with a known reason.
    #[error("Authentication failed: {0}")]
    Auth(AuthErrorCode),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<AuthErrorCode> for AppError {
    fn from(code: AuthErrorCode) -> Self {
        AppError::Auth(code)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Pipeline(err) => classify_pipeline_error(err),
            AppError::Auth(code) => (
                auth_status(*code),
                code.code(),
                code.user_message().to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Map a pipeline failure to a status and code by its [`FailureKind`].
///
/// The body carries `user_message()`; service details stay in the logs.
fn classify_pipeline_error(err: &PipelineError) -> (StatusCode, &'static str, String) {
    let (status, code) = match err.kind() {
        FailureKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        FailureKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        FailureKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        FailureKind::Transport => {
            tracing::warn!(error = %err, "Media service failure");
            (StatusCode::BAD_GATEWAY, "MEDIA_SERVICE_ERROR")
        }
        FailureKind::Contract => {
            tracing::warn!(error = %err, "Media service contract violation");
            (StatusCode::BAD_GATEWAY, "MEDIA_CONTRACT_ERROR")
        }
        FailureKind::Store => {
            tracing::warn!(error = %err, "Store failure");
            (StatusCode::BAD_GATEWAY, "STORE_ERROR")
        }
        FailureKind::Internal => {
            tracing::error!(error = %err, "Internal pipeline error");
            return internal();
        }
    };
    (status, code, err.user_message())
}

fn auth_status(code: AuthErrorCode) -> StatusCode {
    match code {
        AuthErrorCode::UserNotFound
        | AuthErrorCode::WrongPassword
        | AuthErrorCode::InvalidCredential => StatusCode::UNAUTHORIZED,
        AuthErrorCode::InvalidEmail
        | AuthErrorCode::WeakPassword
        | AuthErrorCode::PasswordMismatch => StatusCode::BAD_REQUEST,
        AuthErrorCode::EmailAlreadyInUse => StatusCode::CONFLICT,
        AuthErrorCode::AccountDisabled => StatusCode::FORBIDDEN,
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            if let Some(constraint) = unique_violation(err) {
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

/// The `uq_` constraint a PostgreSQL unique violation (23505) tripped, if any.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    db_err.constraint().filter(|c| c.starts_with("uq_"))
}
