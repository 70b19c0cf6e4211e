//! Zimmet API service
//!
//! Stateless request handlers performing parameterized queries against
//! the PostgreSQL store; identifiers are assigned at insert time.

pub mod error;
pub mod repositories;
pub mod routes;
pub mod state;
