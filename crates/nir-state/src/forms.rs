//! # Admission and Reservation Forms
//!
//! Raw desk input. Every field is optional on the wire so that a missing
//! value surfaces as a [`ValidationError`] naming the field instead of a
//! generic deserialization failure. `validate` turns a form into the typed
//! payload stored inside the bed state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use nir_core::error::require_some_text;
use nir_core::{CidId, PayerId, ProcedureId, Timestamp, ValidationError};

use crate::bed::{Admission, AdmissionType, Reservation};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionForm {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub payer_id: Option<PayerId>,
    #[serde(default)]
    pub cid_id: Option<CidId>,
    #[serde(default)]
    pub admission_type: Option<AdmissionType>,
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    #[serde(default)]
    pub admission_time: Option<String>,
    #[serde(default)]
    pub entitled_category: Option<String>,
    #[serde(default)]
    pub procedure_id: Option<ProcedureId>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub medical_record: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AdmissionForm {
    /// Check required fields and build the admission stamped at `occupied_at`.
    ///
    /// A surgical admission requires a procedure; a clinical one drops it.
    pub fn validate(self, occupied_at: Timestamp) -> Result<Admission, ValidationError> {
        let patient_name = require_some_text("patient_name", self.patient_name.as_deref())?;
        let birth_date = self
            .birth_date
            .ok_or(ValidationError::MissingField("birth_date"))?;
        let doctor_name = require_some_text("doctor_name", self.doctor_name.as_deref())?;
        let payer_id = self.payer_id.ok_or(ValidationError::MissingField("payer_id"))?;
        let cid_id = self.cid_id.ok_or(ValidationError::MissingField("cid_id"))?;
        let admission_type = self
            .admission_type
            .ok_or(ValidationError::MissingField("admission_type"))?;
        let admission_date = self
            .admission_date
            .ok_or(ValidationError::MissingField("admission_date"))?;
        let entitled_category =
            require_some_text("entitled_category", self.entitled_category.as_deref())?;

        if birth_date > admission_date {
            return Err(ValidationError::invalid(
                "birth_date",
                "must not be after the admission date",
            ));
        }

        let procedure_id = match admission_type {
            AdmissionType::Surgical => Some(
                self.procedure_id
                    .ok_or(ValidationError::MissingField("procedure_id"))?,
            ),
            AdmissionType::Clinical => None,
        };

        Ok(Admission {
            patient_name,
            birth_date,
            doctor_name,
            payer_id,
            cid_id,
            admission_type,
            admission_date,
            admission_time: optional_text(self.admission_time),
            entitled_category,
            procedure_id,
            diagnosis: optional_text(self.diagnosis),
            medical_record: optional_text(self.medical_record),
            notes: optional_text(self.notes),
            occupied_at,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationForm {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, alias = "admission_date")]
    pub expected_admission_date: Option<NaiveDate>,
    #[serde(default, alias = "admission_time")]
    pub reservation_time: Option<String>,
    #[serde(default)]
    pub reserved_until: Option<NaiveDate>,
}

impl ReservationForm {
    /// Only the patient name is mandatory for a reservation. A hold end,
    /// when given, cannot precede the expected admission date.
    pub fn validate(self, reserved_at: Timestamp) -> Result<Reservation, ValidationError> {
        let patient_name = require_some_text("patient_name", self.patient_name.as_deref())?;
        if let (Some(until), Some(expected)) =
            (self.reserved_until, self.expected_admission_date)
        {
            if until < expected {
                return Err(ValidationError::invalid(
                    "reserved_until",
                    format!("{until} is before the expected admission date {expected}"),
                ));
            }
        }
        Ok(Reservation {
            patient_name,
            birth_date: self.birth_date,
            expected_admission_date: self.expected_admission_date,
            reservation_time: optional_text(self.reservation_time),
            reserved_until: self.reserved_until,
            reserved_at,
        })
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
pub(crate) fn complete_admission_form() -> AdmissionForm {
    AdmissionForm {
        patient_name: Some("João Pereira".to_string()),
        birth_date: NaiveDate::from_ymd_opt(1980, 3, 10),
        doctor_name: Some("Dra. Ana Souza".to_string()),
        payer_id: Some(PayerId::new()),
        cid_id: Some(CidId::new()),
        admission_type: Some(AdmissionType::Clinical),
        admission_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        admission_time: Some("10:15".to_string()),
        entitled_category: Some("Enfermaria".to_string()),
        ..AdmissionForm::default()
    }
}
