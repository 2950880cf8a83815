//! # nir-ledger: History and Audit for the NIR Board
//!
//! Two writers downstream of the lifecycle engine:
//!
//! - [`HistoryLedger`] keeps one [`HistoryEntry`] per internment, opened on
//!   admission, re-pointed on transfers and closed on discharge.
//! - [`AuditLog`] keeps the most recent administrative actions in a bounded
//!   ring, evicting the oldest first.
//!
//! Both implement [`EventSink`], so the caller feeds every [`BedEvent`] to
//! each without knowing which ones it cares about.

pub mod audit;
pub mod history;

use nir_state::BedEvent;

pub use audit::{AuditAction, AuditEntry, AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use history::{HistoryEntry, HistoryLedger, TransferRecord};

/// A consumer of bed events.
pub trait EventSink {
    /// Record `event`, performed by `actor`.
    fn record(&mut self, event: &BedEvent, actor: &str);
}
