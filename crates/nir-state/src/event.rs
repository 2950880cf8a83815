//! # Domain Events
//!
//! Every successful lifecycle or registry operation yields exactly one
//! [`BedEvent`]. The engine never writes history or audit records itself;
//! ledger writers downstream consume these events.

use nir_core::{BedId, SectorId, Timestamp};

use crate::bed::{Admission, Bed, BedStatus};

/// Identity of the bed an event happened to, captured at event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRef {
    pub id: BedId,
    pub number: String,
    pub sector_id: SectorId,
}

impl From<&Bed> for BedRef {
    fn from(bed: &Bed) -> Self {
        Self {
            id: bed.id,
            number: bed.number.clone(),
            sector_id: bed.sector_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BedEvent {
    BedCreated {
        bed: BedRef,
        category: String,
        at: Timestamp,
    },
    BedRemoved {
        bed: BedRef,
        at: Timestamp,
    },
    /// Opens a history episode.
    AdmissionRecorded {
        bed: BedRef,
        bed_category: String,
        admission: Admission,
        category_mismatch: bool,
        from_reservation: bool,
        at: Timestamp,
    },
    /// Closes the bed's open history episode.
    DischargeRecorded {
        bed: BedRef,
        patient_name: String,
        at: Timestamp,
    },
    ReservationPlaced {
        bed: BedRef,
        patient_name: String,
        at: Timestamp,
    },
    ReservationCancelled {
        bed: BedRef,
        patient_name: String,
        at: Timestamp,
    },
    CleaningCompleted {
        bed: BedRef,
        at: Timestamp,
    },
    /// `cancelled_reservation` names the patient whose reservation was
    /// dropped when a reserved bed is blocked.
    BedBlocked {
        bed: BedRef,
        from: BedStatus,
        cancelled_reservation: Option<String>,
        at: Timestamp,
    },
    BedUnblocked {
        bed: BedRef,
        at: Timestamp,
    },
    StatusChanged {
        bed: BedRef,
        from: BedStatus,
        to: BedStatus,
        at: Timestamp,
    },
    /// Occupancy moved into a free bed; the source is left cleaning.
    PatientTransferred {
        from: BedRef,
        to: BedRef,
        patient_name: String,
        status: BedStatus,
        at: Timestamp,
    },
    /// Occupancies of two beds exchanged. `patient_a` was in `a` before the swap.
    BedsSwapped {
        a: BedRef,
        b: BedRef,
        patient_a: String,
        patient_b: String,
        at: Timestamp,
    },
}

impl BedEvent {
    pub fn at(&self) -> Timestamp {
        match self {
            Self::BedCreated { at, .. }
            | Self::BedRemoved { at, .. }
            | Self::AdmissionRecorded { at, .. }
            | Self::DischargeRecorded { at, .. }
            | Self::ReservationPlaced { at, .. }
            | Self::ReservationCancelled { at, .. }
            | Self::CleaningCompleted { at, .. }
            | Self::BedBlocked { at, .. }
            | Self::BedUnblocked { at, .. }
            | Self::StatusChanged { at, .. }
            | Self::PatientTransferred { at, .. }
            | Self::BedsSwapped { at, .. } => *at,
        }
    }

    /// The bed the event is primarily about (the source bed for moves).
    pub fn bed(&self) -> &BedRef {
        match self {
            Self::BedCreated { bed, .. }
            | Self::BedRemoved { bed, .. }
            | Self::AdmissionRecorded { bed, .. }
            | Self::DischargeRecorded { bed, .. }
            | Self::ReservationPlaced { bed, .. }
            | Self::ReservationCancelled { bed, .. }
            | Self::CleaningCompleted { bed, .. }
            | Self::BedBlocked { bed, .. }
            | Self::BedUnblocked { bed, .. }
            | Self::StatusChanged { bed, .. } => bed,
            Self::PatientTransferred { from, .. } => from,
            Self::BedsSwapped { a, .. } => a,
        }
    }

    /// Short machine name, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BedCreated { .. } => "bed_created",
            Self::BedRemoved { .. } => "bed_removed",
            Self::AdmissionRecorded { .. } => "admission_recorded",
            Self::DischargeRecorded { .. } => "discharge_recorded",
            Self::ReservationPlaced { .. } => "reservation_placed",
            Self::ReservationCancelled { .. } => "reservation_cancelled",
            Self::CleaningCompleted { .. } => "cleaning_completed",
            Self::BedBlocked { .. } => "bed_blocked",
            Self::BedUnblocked { .. } => "bed_unblocked",
            Self::StatusChanged { .. } => "status_changed",
            Self::PatientTransferred { .. } => "patient_transferred",
            Self::BedsSwapped { .. } => "beds_swapped",
        }
    }
}
