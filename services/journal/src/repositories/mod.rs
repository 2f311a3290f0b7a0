//! Repositories for database operations

pub mod trip;
pub mod user;

pub use trip::TripRepository;
pub use user::UserRepository;
