//! Errors for the storage layer and the ward service.

use thiserror::Error;

use nir_core::ValidationError;
use nir_state::BedError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be read back, or a value could not be written.
    #[error("malformed document `{key}`: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Another writer committed since this snapshot was loaded.
    #[error("store revision moved: loaded {loaded}, found {found}")]
    Conflict { loaded: u64, found: u64 },

    #[error("invalid storage key {0:?}: must match [a-z0-9_-]+")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Bed(#[from] BedError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A reference-table id (payer, CID, doctor, procedure, sector) is unknown.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A record with the same unique key already exists.
    #[error("{kind} {value:?} already exists")]
    Duplicate { kind: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
