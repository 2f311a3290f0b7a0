//! Session middleware for protected routes
//!
//! Validates the session cookie, loads the caller's identity into the
//! request, and sends anonymous callers to the signin page.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::token::SESSION_COOKIE;

/// The authenticated caller, available to every protected handler
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

/// Require a valid session on the request.
///
/// On success the [`CurrentUser`] is inserted into the request
/// extensions; without a valid session the caller is redirected to
/// `/signin` rather than hard-failed.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::SigninRequired)?;

    let claims = state
        .sessions
        .verify(&token)
        .map_err(|_| AppError::SigninRequired)?;

    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(req).await)
}
