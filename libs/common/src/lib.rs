//! Common library for the Wanderlog travel journal
//!
//! This crate provides the shared infrastructure used by the journal
//! service: PostgreSQL connection pooling, configuration, health checks,
//! and typed database errors.

pub mod database;
pub mod error;
