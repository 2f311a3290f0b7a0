//! Application state shared across handlers

use sqlx::PgPool;

use crate::media::MediaStore;
use crate::rate_limiter::RateLimiter;
use crate::repositories::{TripRepository, UserRepository};
use crate::token::SessionService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub sessions: SessionService,
    pub media: MediaStore,
    pub users: UserRepository,
    pub trips: TripRepository,
    pub signin_limiter: RateLimiter,
}
