//! # nir-state: Bed Lifecycle for the NIR Board
//!
//! - **Bed model** ([`bed`]): `Bed` with a typed [`BedState`]; patient data
//!   exists only inside the `Occupied` and `Reserved` variants.
//! - **Lifecycle engine** ([`lifecycle`]): admit, reserve, status transitions
//!   and the two-bed transfer/swap, each validated before mutation.
//! - **Registry** ([`registry`]): bed lookup, create/remove guards and the
//!   per-bed optimistic version check.
//! - **Events** ([`event`]): one [`BedEvent`] per accepted operation, for
//!   the history and audit writers.
//!
//! The engine takes `now` as an argument and never reads the clock.

pub mod bed;
pub mod error;
pub mod event;
pub mod forms;
pub mod lifecycle;
pub mod registry;

pub use bed::{age_between, Admission, AdmissionType, Bed, BedState, BedStatus, Reservation};
pub use error::BedError;
pub use event::{BedEvent, BedRef};
pub use forms::{AdmissionForm, ReservationForm};
pub use lifecycle::transfer_or_swap;
pub use registry::BedRegistry;
