//! Client library for the Zimmet application
//!
//! This crate provides everything the view layer needs: the typed HTTP
//! binding to the API service, the file-backed legacy cache and session
//! store, the versioned in-memory snapshot, and the reconciliation
//! engine that runs once per session bootstrap.

pub mod api;
pub mod cache;
pub mod error;
pub mod reconcile;
pub mod store;

pub use api::{ApiClient, Directory};
pub use cache::{FileLegacyCache, LegacyCache, MemoryLegacyCache, SessionStore};
pub use error::{ClientError, ClientResult};
pub use reconcile::reconcile;
pub use store::{SnapshotCell, Store};
