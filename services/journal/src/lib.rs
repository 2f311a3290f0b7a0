//! Wanderlog journal service
//!
//! Authenticated users record trips (destination, date range, narrative,
//! photos, video), attach rated reviews to trips, and search other users'
//! trips by destination while keeping a bounded recent-search history.

pub mod error;
pub mod media;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod token;
pub mod validation;

/// Embedded schema migrations, applied at startup
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
