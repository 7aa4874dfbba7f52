//! Shared storage error vocabulary and the in-memory repository suite.
//!
//! Persistence is expressed as per-module repository traits; this module
//! carries the error enumeration they share and `Mutex<HashMap>`-backed
//! implementations used by the API service, the CLI demo, and the tests.

pub mod memory;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
