//! # Internment History
//!
//! One [`HistoryEntry`] per stay. The admission fields are fixed when the
//! entry opens; afterwards only two things change:
//!
//! - `transfers` grows when the patient moves to another bed, so the entry
//!   keeps following the patient;
//! - `release_date` is set once, on discharge.
//!
//! An entry without `release_date` is an ongoing stay.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use nir_core::{BedId, CidId, HistoryId, PayerId, SectorId, Timestamp};
use nir_state::{Admission, AdmissionType, BedEvent, BedRef};

use crate::EventSink;

/// Stays shorter than this count as this many days.
pub const MIN_STAY_DAYS: f64 = 0.5;

/// A bed move during a stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from_bed_id: BedId,
    pub to_bed_id: BedId,
    pub to_bed_number: String,
    pub to_sector_id: SectorId,
    pub at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    /// Bed the patient was admitted into.
    pub bed_id: BedId,
    pub bed_number: String,
    pub sector_id: SectorId,
    pub patient_name: String,
    pub doctor_name: String,
    pub admission_type: AdmissionType,
    pub admission_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<PayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid_id: Option<CidId>,
    pub entitled_category: String,
    #[serde(default)]
    pub release_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<TransferRecord>,
}

impl HistoryEntry {
    pub fn open(bed: &BedRef, admission: &Admission) -> Self {
        Self {
            id: HistoryId::new(),
            bed_id: bed.id,
            bed_number: bed.number.clone(),
            sector_id: bed.sector_id,
            patient_name: admission.patient_name.clone(),
            doctor_name: admission.doctor_name.clone(),
            admission_type: admission.admission_type,
            admission_date: admission.admission_date,
            payer_id: Some(admission.payer_id),
            cid_id: Some(admission.cid_id),
            entitled_category: admission.entitled_category.clone(),
            release_date: None,
            transfers: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.release_date.is_none()
    }

    /// Where the patient is now: the last transfer destination, or the
    /// admission bed.
    pub fn current_bed_id(&self) -> BedId {
        self.transfers
            .last()
            .map(|t| t.to_bed_id)
            .unwrap_or(self.bed_id)
    }

    /// Length of stay in days, floored at [`MIN_STAY_DAYS`]. `None` while open.
    pub fn stay_days(&self) -> Option<f64> {
        self.release_date
            .map(|release| release.days_since(self.admission_date).max(MIN_STAY_DAYS))
    }
}

/// All internment episodes, in the order they were opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with a release date.
    pub fn discharged(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(|e| !e.is_open())
    }

    /// The most recently opened ongoing stay currently at `bed`.
    pub fn open_entry_for(&self, bed: &BedId) -> Option<&HistoryEntry> {
        self.open_index_for(bed).map(|i| &self.entries[i])
    }

    pub fn open(&mut self, bed: &BedRef, admission: &Admission) -> HistoryId {
        let entry = HistoryEntry::open(bed, admission);
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Close the latest ongoing stay at `bed`.
    ///
    /// A missing entry is logged and ignored; the discharge itself stands.
    pub fn close(&mut self, bed: &BedId, at: Timestamp) -> Option<HistoryId> {
        let Some(index) = self.open_index_for(bed) else {
            tracing::warn!(bed_id = %bed, "discharge without an open history entry");
            return None;
        };
        let entry = &mut self.entries[index];
        entry.release_date = Some(at);
        Some(entry.id)
    }

    /// Follow a patient from `from` into the free bed `to`.
    pub fn record_transfer(&mut self, from: &BedRef, to: &BedRef, at: Timestamp) {
        if let Some(index) = self.open_index_for(&from.id) {
            self.entries[index].transfers.push(transfer_record(from, to, at));
        }
    }

    /// Exchange the beds of the ongoing stays at `a` and `b`.
    ///
    /// Both entries are located before either is re-pointed.
    pub fn record_swap(&mut self, a: &BedRef, b: &BedRef, at: Timestamp) {
        let at_a = self.open_index_for(&a.id);
        let at_b = self.open_index_for(&b.id);
        if let Some(index) = at_a {
            self.entries[index].transfers.push(transfer_record(a, b, at));
        }
        if let Some(index) = at_b {
            self.entries[index].transfers.push(transfer_record(b, a, at));
        }
    }

    fn open_index_for(&self, bed: &BedId) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|e| e.is_open() && e.current_bed_id() == *bed)
    }
}

fn transfer_record(from: &BedRef, to: &BedRef, at: Timestamp) -> TransferRecord {
    TransferRecord {
        from_bed_id: from.id,
        to_bed_id: to.id,
        to_bed_number: to.number.clone(),
        to_sector_id: to.sector_id,
        at,
    }
}

impl EventSink for HistoryLedger {
    fn record(&mut self, event: &BedEvent, _actor: &str) {
        match event {
            BedEvent::AdmissionRecorded { bed, admission, .. } => {
                self.open(bed, admission);
            }
            BedEvent::DischargeRecorded { bed, at, .. } => {
                self.close(&bed.id, *at);
            }
            BedEvent::PatientTransferred { from, to, at, .. } => {
                self.record_transfer(from, to, *at);
            }
            BedEvent::BedsSwapped { a, b, at, .. } => {
                self.record_swap(a, b, *at);
            }
            _ => {}
        }
    }
}
