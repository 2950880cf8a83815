//! # Lifecycle Engine
//!
//! Transitions of a single bed, plus the two-bed transfer/swap.
//!
//! ```text
//!              admit                 discharge
//!   FREE ───────────────▶ OCCUPIED ────────────▶ CLEANING
//!    │ ▲  reserve   admit    ▲                      │ │
//!    │ └──── RESERVED ───────┘                      │ │
//!    │         │ cancel ▲                           │ │
//!    │         ▼        │           clean complete  │ │
//!    │        FREE ◀────┴───────────────────────────┘ │
//!    ▼                                                 ▼
//!  BLOCKED ◀───────────────────────────────────────── (block)
//! ```
//!
//! Every operation validates first and mutates last, so a rejected call
//! leaves the bed untouched. Every accepted call bumps the bed version and
//! returns the [`BedEvent`] describing what happened.

use nir_core::Timestamp;

use crate::bed::{Bed, BedState, BedStatus};
use crate::error::BedError;
use crate::event::{BedEvent, BedRef};
use crate::forms::{AdmissionForm, ReservationForm};

impl Bed {
    /// Admit a patient into a free or reserved bed.
    ///
    /// An entitled category different from the bed category is accepted
    /// and flagged on the event.
    pub fn admit(&mut self, form: AdmissionForm, now: Timestamp) -> Result<BedEvent, BedError> {
        self.require_status(
            &[BedStatus::Free, BedStatus::Reserved],
            BedStatus::Occupied,
            "admission requires a free or reserved bed",
        )?;
        let admission = form.validate(now)?;
        let from_reservation = self.status() == BedStatus::Reserved;
        let category_mismatch = admission.entitled_category != self.category;

        self.set_state(BedState::Occupied(admission.clone()));
        Ok(BedEvent::AdmissionRecorded {
            bed: BedRef::from(&*self),
            bed_category: self.category.clone(),
            admission,
            category_mismatch,
            from_reservation,
            at: now,
        })
    }

    /// Hold a free bed for an expected patient.
    pub fn reserve(
        &mut self,
        form: ReservationForm,
        now: Timestamp,
    ) -> Result<BedEvent, BedError> {
        self.require_status(
            &[BedStatus::Free],
            BedStatus::Reserved,
            "only a free bed can be reserved",
        )?;
        let reservation = form.validate(now)?;
        let patient_name = reservation.patient_name.clone();

        self.set_state(BedState::Reserved(reservation));
        Ok(BedEvent::ReservationPlaced {
            bed: BedRef::from(&*self),
            patient_name,
            at: now,
        })
    }

    /// Move the bed to `next` along the status table.
    ///
    /// Admission and reservation have their own operations. An occupied bed
    /// only leaves through a discharge to `CLEANING`, so it can be neither
    /// freed nor blocked directly. Blocking a reserved bed cancels the
    /// reservation; a reserved bed cannot be sent to `CLEANING`.
    pub fn transition(&mut self, next: BedStatus, now: Timestamp) -> Result<BedEvent, BedError> {
        let (state, event) = self.plan_transition(next, now)?;
        self.set_state(state);
        Ok(event)
    }

    fn plan_transition(
        &self,
        next: BedStatus,
        now: Timestamp,
    ) -> Result<(BedState, BedEvent), BedError> {
        let from = self.status();
        let bed = BedRef::from(self);
        let reject = |reason: &str| BedError::InvalidTransition {
            from,
            to: next,
            reason: reason.to_string(),
        };

        if from == next {
            return Err(reject("bed is already in that status"));
        }

        match (&self.state, next) {
            (BedState::Occupied(admission), BedStatus::Cleaning) => Ok((
                BedState::Cleaning {
                    previous: Some(Box::new(admission.clone())),
                },
                BedEvent::DischargeRecorded {
                    bed,
                    patient_name: admission.patient_name.clone(),
                    at: now,
                },
            )),
            (BedState::Cleaning { .. }, BedStatus::Free) => {
                Ok((BedState::Free, BedEvent::CleaningCompleted { bed, at: now }))
            }
            (BedState::Blocked, BedStatus::Free) => {
                Ok((BedState::Free, BedEvent::BedUnblocked { bed, at: now }))
            }
            (BedState::Reserved(reservation), BedStatus::Free) => Ok((
                BedState::Free,
                BedEvent::ReservationCancelled {
                    bed,
                    patient_name: reservation.patient_name.clone(),
                    at: now,
                },
            )),
            (BedState::Free | BedState::Cleaning { .. }, BedStatus::Blocked) => Ok((
                BedState::Blocked,
                BedEvent::BedBlocked {
                    bed,
                    from,
                    cancelled_reservation: None,
                    at: now,
                },
            )),
            (BedState::Reserved(reservation), BedStatus::Blocked) => Ok((
                BedState::Blocked,
                BedEvent::BedBlocked {
                    bed,
                    from,
                    cancelled_reservation: Some(reservation.patient_name.clone()),
                    at: now,
                },
            )),
            (BedState::Free | BedState::Blocked, BedStatus::Cleaning) => Ok((
                BedState::Cleaning { previous: None },
                BedEvent::StatusChanged {
                    bed,
                    from,
                    to: next,
                    at: now,
                },
            )),
            (BedState::Occupied(_), BedStatus::Free) => Err(reject(
                "an occupied bed must be discharged to CLEANING first",
            )),
            (_, BedStatus::Occupied) => Err(reject("use the admission operation")),
            (_, BedStatus::Reserved) => Err(reject("use the reservation operation")),
            _ => Err(reject("transition not allowed")),
        }
    }

    /// Reject unless the current status is one of `allowed`.
    fn require_status(
        &self,
        allowed: &[BedStatus],
        target: BedStatus,
        reason: &str,
    ) -> Result<(), BedError> {
        let current = self.status();
        if !allowed.contains(&current) {
            return Err(BedError::InvalidTransition {
                from: current,
                to: target,
                reason: reason.to_string(),
            });
        }
        Ok(())
    }
}

/// Move the occupancy of `source` into `target`.
///
/// A free target receives the whole record and the source is left cleaning
/// with no patient data. An occupied or reserved target swaps records with
/// the source. Both beds are checked before either is touched.
pub fn transfer_or_swap(
    source: &mut Bed,
    target: &mut Bed,
    now: Timestamp,
) -> Result<BedEvent, BedError> {
    if source.id == target.id {
        return Err(BedError::SameBed(source.id));
    }
    let source_status = source.status();
    let target_status = target.status();
    if !source_status.has_patient() {
        return Err(BedError::InvalidTransition {
            from: source_status,
            to: target_status,
            reason: "source bed has no patient to move".to_string(),
        });
    }
    let patient_a = source.patient_name().unwrap_or_default().to_string();

    match target_status {
        BedStatus::Free => {
            let moved = std::mem::replace(&mut source.state, BedState::Cleaning { previous: None });
            source.version += 1;
            target.set_state(moved);
            Ok(BedEvent::PatientTransferred {
                from: BedRef::from(&*source),
                to: BedRef::from(&*target),
                patient_name: patient_a,
                status: source_status,
                at: now,
            })
        }
        BedStatus::Occupied | BedStatus::Reserved => {
            let patient_b = target.patient_name().unwrap_or_default().to_string();
            std::mem::swap(&mut source.state, &mut target.state);
            source.version += 1;
            target.version += 1;
            Ok(BedEvent::BedsSwapped {
                a: BedRef::from(&*source),
                b: BedRef::from(&*target),
                patient_a,
                patient_b,
                at: now,
            })
        }
        BedStatus::Cleaning | BedStatus::Blocked => Err(BedError::InvalidTransition {
            from: source_status,
            to: target_status,
            reason: format!("destination bed {} is {target_status}", target.number),
        }),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
