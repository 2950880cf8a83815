//! # nir-core: Foundational Types for the NIR Bed Board
//!
//! Every other crate in the workspace depends on `nir-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `BedId`, `SectorId`, `PayerId`,
//!    `CidId`, ... are distinct types. A payer id cannot be passed where a
//!    CID id is expected.
//!
//! 2. **UTC-only timestamps.** [`Timestamp`] is always UTC, truncated to
//!    seconds, and renders as `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! 3. **Reference tables are flat.** Sectors, payers, CIDs, doctors and
//!    procedures have no lifecycle beyond create/delete.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `nir-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod reference;
pub mod temporal;

pub use error::{NirError, ValidationError};
pub use identity::{AuditId, BedId, CidId, DoctorId, HistoryId, PayerId, ProcedureId, SectorId};
pub use reference::{default_procedures, Cid, Doctor, Payer, Procedure, Sector};
pub use temporal::Timestamp;

/// Actor recorded when a request does not name one.
pub const SYSTEM_ACTOR: &str = "SYSTEM";
