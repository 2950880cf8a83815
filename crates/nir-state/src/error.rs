//! Errors raised by the lifecycle engine and the bed registry.

use thiserror::Error;

use nir_core::{BedId, SectorId, ValidationError};

use crate::bed::BedStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BedError {
    #[error("bed {0} not found")]
    BedNotFound(BedId),

    #[error("sector {0} not found")]
    SectorNotFound(SectorId),

    /// The requested move is not allowed from the bed's current status.
    #[error("invalid bed transition: {from} -> {to} ({reason})")]
    InvalidTransition {
        from: BedStatus,
        to: BedStatus,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller edited a stale view of the bed.
    #[error("bed {bed} changed concurrently: expected version {expected}, found {found}")]
    VersionConflict { bed: BedId, expected: u64, found: u64 },

    #[error("bed {number} cannot be removed while {status}")]
    BedInUse { number: String, status: BedStatus },

    #[error("bed number {number} already exists in sector {sector}")]
    DuplicateNumber { number: String, sector: SectorId },

    #[error("sector {0} still has beds")]
    SectorInUse(SectorId),

    #[error("bed {0} cannot be transferred onto itself")]
    SameBed(BedId),
}
