//! Journal service models

pub mod review;
pub mod trip;
pub mod user;

// Re-export for convenience
pub use review::{NewReview, Review};
pub use trip::{NewTrip, Trip, TripDetail, TripSummary, TripWithReviews};
pub use user::{NewUser, User};
