//! Service-layer error taxonomy.
//!
//! Errors are classified by how a transport adapter should surface them:
//! - Validation: caller sent something unacceptable (400-equivalent)
//! - NotFound: a referenced id is absent (404-equivalent)
//! - Data: backend fault (500-equivalent, logged, not silently retried)
//! - Sync: flag/record consistency write failed (500-equivalent; callers
//!   retry the whole logical operation)
//!
//! Generation faults never appear here: the AI paths return discriminated
//! `success: false` outcomes instead of crossing the boundary as errors.

use thiserror::Error;

use crate::db::DbError;
use crate::sync::SyncFailure;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Data access failed: {0}")]
    Data(#[from] DbError),

    #[error(transparent)]
    Sync(#[from] SyncFailure),
}

impl ServiceError {
    /// HTTP-equivalent status for transport adapters.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Data(_) | ServiceError::Sync(_) => 500,
        }
    }
}
