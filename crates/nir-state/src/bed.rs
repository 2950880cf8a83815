//! # Bed Model
//!
//! A bed carries its identity (id, number, category, sector), a per-bed
//! version counter, and a lifecycle [`BedState`]. Patient data lives
//! *inside* the `Occupied` and `Reserved` variants, so a free, blocked or
//! cleaning bed cannot hold an active patient record by construction.
//! Freeing a bed is "replace the state with `Free`".
//!
//! ## Wire shape
//!
//! The state is flattened into the bed with `status` as the tag:
//!
//! ```text
//! {"id": "...", "number": "101", "category": "UTI", "sector_id": "...",
//!  "version": 3, "status": "OCCUPIED", "patient_name": "...", ...}
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use nir_core::error::require_text;
use nir_core::{BedId, CidId, PayerId, ProcedureId, SectorId, Timestamp, ValidationError};

// ─── Status ──────────────────────────────────────────────────────────

/// The five lifecycle statuses of a bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BedStatus {
    /// Available for admission or reservation.
    Free,
    /// A patient is admitted.
    Occupied,
    /// Discharged, awaiting housekeeping.
    Cleaning,
    /// Out of service (maintenance, isolation).
    Blocked,
    /// Held for an expected patient.
    Reserved,
}

impl BedStatus {
    /// All statuses in board order.
    pub const ALL: [BedStatus; 5] = [
        Self::Free,
        Self::Occupied,
        Self::Cleaning,
        Self::Blocked,
        Self::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Occupied => "OCCUPIED",
            Self::Cleaning => "CLEANING",
            Self::Blocked => "BLOCKED",
            Self::Reserved => "RESERVED",
        }
    }

    /// Whether a bed in this status carries active patient data.
    pub fn has_patient(&self) -> bool {
        matches!(self, Self::Occupied | Self::Reserved)
    }
}

impl std::fmt::Display for BedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BedStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| ValidationError::invalid("status", format!("unknown status {s:?}")))
    }
}

/// Clinical or surgical admission profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionType {
    Clinical,
    Surgical,
}

impl AdmissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clinical => "CLINICAL",
            Self::Surgical => "SURGICAL",
        }
    }
}

impl std::fmt::Display for AdmissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Occupancy payloads ──────────────────────────────────────────────

/// Full admission record attached to an occupied bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub patient_name: String,
    pub birth_date: NaiveDate,
    pub doctor_name: String,
    pub payer_id: PayerId,
    pub cid_id: CidId,
    pub admission_type: AdmissionType,
    pub admission_date: NaiveDate,
    /// Wall-clock time as typed at the desk (`HH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_time: Option<String>,
    /// Accommodation tier the payer authorizes.
    pub entitled_category: String,
    /// Only kept for surgical admissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_id: Option<ProcedureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Stamped by the lifecycle engine at admission.
    pub occupied_at: Timestamp,
}

impl Admission {
    /// Age in whole years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_between(self.birth_date, today)
    }
}

/// Provisional patient data attached to a reserved bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub patient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_admission_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_time: Option<String>,
    /// Last day the bed is held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_until: Option<NaiveDate>,
    pub reserved_at: Timestamp,
}

/// Whole years between `birth` and `today`; zero if `today` precedes `birth`.
pub fn age_between(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

// ─── State ───────────────────────────────────────────────────────────

/// Lifecycle state of a bed, tagged by `status` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BedState {
    Free,
    Occupied(Admission),
    /// After a discharge the last admission stays visible to housekeeping.
    /// It is history, not an active patient record.
    Cleaning {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous: Option<Box<Admission>>,
    },
    Blocked,
    Reserved(Reservation),
}

impl BedState {
    pub fn status(&self) -> BedStatus {
        match self {
            Self::Free => BedStatus::Free,
            Self::Occupied(_) => BedStatus::Occupied,
            Self::Cleaning { .. } => BedStatus::Cleaning,
            Self::Blocked => BedStatus::Blocked,
            Self::Reserved(_) => BedStatus::Reserved,
        }
    }
}

// ─── Bed ─────────────────────────────────────────────────────────────

/// A physical bed on the board.
///
/// `state` is only written by the lifecycle engine in this crate; every
/// write bumps `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: BedId,
    pub number: String,
    /// Physical accommodation tier (e.g. "Enfermaria", "UTI").
    pub category: String,
    pub sector_id: SectorId,
    #[serde(default)]
    pub version: u64,
    #[serde(flatten)]
    pub(crate) state: BedState,
}

impl Bed {
    /// A new bed starts `FREE` at version 0.
    pub fn new(sector_id: SectorId, number: &str, category: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: BedId::new(),
            number: require_text("number", number)?,
            category: require_text("category", category)?,
            sector_id,
            version: 0,
            state: BedState::Free,
        })
    }

    pub fn state(&self) -> &BedState {
        &self.state
    }

    pub fn status(&self) -> BedStatus {
        self.state.status()
    }

    /// Active admission, present only while `OCCUPIED`.
    pub fn admission(&self) -> Option<&Admission> {
        match &self.state {
            BedState::Occupied(admission) => Some(admission),
            _ => None,
        }
    }

    /// Active reservation, present only while `RESERVED`.
    pub fn reservation(&self) -> Option<&Reservation> {
        match &self.state {
            BedState::Reserved(reservation) => Some(reservation),
            _ => None,
        }
    }

    /// Patient currently attached to the bed (occupied or reserved).
    pub fn patient_name(&self) -> Option<&str> {
        match &self.state {
            BedState::Occupied(admission) => Some(&admission.patient_name),
            BedState::Reserved(reservation) => Some(&reservation.patient_name),
            _ => None,
        }
    }

    /// The discharged admission still shown while the bed is being cleaned.
    pub fn previous_occupant(&self) -> Option<&Admission> {
        match &self.state {
            BedState::Cleaning { previous } => previous.as_deref(),
            _ => None,
        }
    }

    /// Occupied with an entitled category different from the bed's category.
    pub fn has_category_mismatch(&self) -> bool {
        self.admission()
            .is_some_and(|a| !a.entitled_category.is_empty() && a.entitled_category != self.category)
    }

    pub(crate) fn set_state(&mut self, state: BedState) {
        self.state = state;
        self.version += 1;
    }
}
