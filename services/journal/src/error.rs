//! Custom error types for the journal service
//!
//! Every handler failure maps to a status code plus a plain message.
//! Unexpected failures are logged with full detail server-side and only a
//! generic message reaches the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the journal service
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or ill-formed required field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Username or email collision on signup
    #[error("{0} is already taken")]
    Duplicate(&'static str),

    /// Signin with a username that does not exist
    #[error("User not found")]
    UnknownUser,

    /// Signin with a password that does not match the stored hash
    #[error("Invalid password")]
    InvalidCredentials,

    /// Protected route reached without a valid session
    #[error("Signin required")]
    SigninRequired,

    /// Mutation attempted by someone other than the resource owner
    #[error("Forbidden")]
    Forbidden,

    /// Unknown resource id
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Upload rejected by type or size
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Too many signin attempts
    #[error("Too many attempts, try again later")]
    RateLimited,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unexpected internal error
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // No valid session is not a hard error for a browser client; send
        // the caller to the signin entry point instead.
        if matches!(self, AppError::SigninRequired) {
            return Redirect::to("/signin").into_response();
        }

        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Duplicate(field) => {
                (StatusCode::BAD_REQUEST, format!("{} is already taken", field))
            }
            AppError::UnknownUser => (StatusCode::BAD_REQUEST, "User not found".to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "Invalid password".to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, format!("{} not found", resource))
            }
            AppError::UnsupportedMedia(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts, try again later".to_string(),
            ),
            AppError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::SigninRequired => unreachable!("handled above"),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for journal results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_the_taxonomy() {
        let cases = [
            (
                AppError::Validation("startDate is required".into()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Duplicate("username"), StatusCode::BAD_REQUEST),
            (AppError::UnknownUser, StatusCode::BAD_REQUEST),
            (AppError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound("trip"), StatusCode::NOT_FOUND),
            (
                AppError::UnsupportedMedia("application/pdf".into()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_missing_session_redirects_to_signin() {
        let response = AppError::SigninRequired.into_response();
        assert!(response.status().is_redirection());
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/signin")
        );
    }
}
