//! Common library for the Zimmet application
//!
//! This crate provides shared functionality used across the API service
//! and the client crate: database connectivity, error handling, the
//! domain models, and the `Field` presence marker for partial updates.

pub mod database;
pub mod error;
pub mod field;
pub mod models;
