//! # Audit Log
//!
//! Immutable records of administrative actions on beds. The log is a
//! bounded ring: once `capacity` is reached, each append evicts the oldest
//! entry. Reads are newest first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use nir_core::{AuditId, Timestamp};
use nir_state::BedEvent;

use crate::EventSink;

/// Entries kept when no capacity is configured.
pub const DEFAULT_AUDIT_CAPACITY: usize = 300;

// ─── AuditAction ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Admission,
    Discharge,
    CleanComplete,
    Blocked,
    Unblocked,
    Reservation,
    ReservationCancelled,
    Transfer,
    Swap,
    StatusChange,
    BedCreated,
    BedRemoved,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admission => "ADMISSION",
            Self::Discharge => "DISCHARGE",
            Self::CleanComplete => "CLEAN_COMPLETE",
            Self::Blocked => "BLOCKED",
            Self::Unblocked => "UNBLOCKED",
            Self::Reservation => "RESERVATION",
            Self::ReservationCancelled => "RESERVATION_CANCELLED",
            Self::Transfer => "TRANSFER",
            Self::Swap => "SWAP",
            Self::StatusChange => "STATUS_CHANGE",
            Self::BedCreated => "BED_CREATED",
            Self::BedRemoved => "BED_REMOVED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── AuditEntry ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub timestamp: Timestamp,
    pub action: AuditAction,
    pub bed_number: String,
    pub actor: String,
    pub details: String,
}

impl AuditEntry {
    /// Describe `event` as an audit record attributed to `actor`.
    pub fn from_event(event: &BedEvent, actor: &str) -> Self {
        let (action, details) = describe(event);
        Self {
            id: AuditId::new(),
            timestamp: event.at(),
            action,
            bed_number: event.bed().number.clone(),
            actor: actor.to_string(),
            details,
        }
    }
}

fn describe(event: &BedEvent) -> (AuditAction, String) {
    match event {
        BedEvent::BedCreated { category, .. } => {
            (AuditAction::BedCreated, format!("bed created, category {category}"))
        }
        BedEvent::BedRemoved { .. } => (AuditAction::BedRemoved, "bed removed".to_string()),
        BedEvent::AdmissionRecorded {
            bed_category,
            admission,
            category_mismatch,
            from_reservation,
            ..
        } => {
            let mut details = format!(
                "patient {} admitted ({})",
                admission.patient_name, admission.admission_type
            );
            if *from_reservation {
                details.push_str(" from reservation");
            }
            if *category_mismatch {
                details.push_str(&format!(
                    "; entitled category {} differs from bed category {bed_category}",
                    admission.entitled_category
                ));
            }
            (AuditAction::Admission, details)
        }
        BedEvent::DischargeRecorded { patient_name, .. } => (
            AuditAction::Discharge,
            format!("patient {patient_name} discharged"),
        ),
        BedEvent::ReservationPlaced { patient_name, .. } => (
            AuditAction::Reservation,
            format!("bed reserved for {patient_name}"),
        ),
        BedEvent::ReservationCancelled { patient_name, .. } => (
            AuditAction::ReservationCancelled,
            format!("reservation for {patient_name} cancelled"),
        ),
        BedEvent::CleaningCompleted { .. } => {
            (AuditAction::CleanComplete, "cleaning completed".to_string())
        }
        BedEvent::BedBlocked {
            from,
            cancelled_reservation,
            ..
        } => {
            let mut details = format!("bed blocked (was {from})");
            if let Some(patient_name) = cancelled_reservation {
                details.push_str(&format!("; reservation for {patient_name} cancelled"));
            }
            (AuditAction::Blocked, details)
        }
        BedEvent::BedUnblocked { .. } => (AuditAction::Unblocked, "bed unblocked".to_string()),
        BedEvent::StatusChanged { from, to, .. } => (
            AuditAction::StatusChange,
            format!("status changed {from} -> {to}"),
        ),
        BedEvent::PatientTransferred {
            from,
            to,
            patient_name,
            ..
        } => (
            AuditAction::Transfer,
            format!(
                "patient {patient_name} moved from bed {} to bed {}",
                from.number, to.number
            ),
        ),
        BedEvent::BedsSwapped {
            a,
            b,
            patient_a,
            patient_b,
            ..
        } => (
            AuditAction::Swap,
            format!(
                "beds {} and {} swapped: {patient_a} now in {}, {patient_b} now in {}",
                a.number, b.number, b.number, a.number
            ),
        ),
    }
}

// ─── AuditLog ────────────────────────────────────────────────────────

/// A bounded audit log with FIFO eviction.
#[derive(Clone, PartialEq)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
}

impl AuditLog {
    /// An empty log holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild from persisted entries, oldest first, keeping the newest
    /// `capacity` of them.
    pub fn from_entries(entries: Vec<AuditEntry>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for entry in entries {
            log.append(entry);
        }
        log
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_newest_first(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().rev()
    }

    /// Oldest first, the persisted order.
    pub fn to_vec(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl EventSink for AuditLog {
    fn record(&mut self, event: &BedEvent, actor: &str) {
        self.append(AuditEntry::from_event(event, actor));
    }
}
