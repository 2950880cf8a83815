//! # Bed Registry
//!
//! The authoritative list of beds. All mutation goes through the lifecycle
//! engine; the registry adds lookup, the per-bed version check, and the
//! create/remove guards.

use serde::{Deserialize, Serialize};

use nir_core::{BedId, Sector, SectorId, Timestamp};

use crate::bed::{Bed, BedStatus};
use crate::error::BedError;
use crate::event::{BedEvent, BedRef};
use crate::forms::{AdmissionForm, ReservationForm};
use crate::lifecycle::transfer_or_swap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BedRegistry {
    beds: Vec<Bed>,
}

impl BedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_beds(beds: Vec<Bed>) -> Self {
        Self { beds }
    }

    pub fn beds(&self) -> &[Bed] {
        &self.beds
    }

    pub fn into_beds(self) -> Vec<Bed> {
        self.beds
    }

    pub fn len(&self) -> usize {
        self.beds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beds.is_empty()
    }

    pub fn get(&self, id: &BedId) -> Result<&Bed, BedError> {
        self.beds
            .iter()
            .find(|b| b.id == *id)
            .ok_or(BedError::BedNotFound(*id))
    }

    pub fn in_sector<'a>(&'a self, sector: &'a SectorId) -> impl Iterator<Item = &'a Bed> + 'a {
        self.beds.iter().filter(move |b| b.sector_id == *sector)
    }

    /// Register a new `FREE` bed in an existing sector.
    ///
    /// Bed numbers are unique within a sector.
    pub fn add_bed(
        &mut self,
        sectors: &[Sector],
        sector_id: SectorId,
        number: &str,
        category: &str,
        now: Timestamp,
    ) -> Result<(BedId, BedEvent), BedError> {
        if !sectors.iter().any(|s| s.id == sector_id) {
            return Err(BedError::SectorNotFound(sector_id));
        }
        let bed = Bed::new(sector_id, number, category)?;
        if self.in_sector(&sector_id).any(|b| b.number == bed.number) {
            return Err(BedError::DuplicateNumber {
                number: bed.number,
                sector: sector_id,
            });
        }
        let event = BedEvent::BedCreated {
            bed: BedRef::from(&bed),
            category: bed.category.clone(),
            at: now,
        };
        let id = bed.id;
        self.beds.push(bed);
        Ok((id, event))
    }

    /// Remove a bed that holds no patient.
    pub fn remove_bed(&mut self, id: &BedId, now: Timestamp) -> Result<BedEvent, BedError> {
        let index = self.index_of(id)?;
        let status = self.beds[index].status();
        if status.has_patient() {
            return Err(BedError::BedInUse {
                number: self.beds[index].number.clone(),
                status,
            });
        }
        let bed = self.beds.remove(index);
        Ok(BedEvent::BedRemoved {
            bed: BedRef::from(&bed),
            at: now,
        })
    }

    /// Fail while any bed still belongs to `sector`.
    pub fn ensure_sector_empty(&self, sector: &SectorId) -> Result<(), BedError> {
        if self.in_sector(sector).next().is_some() {
            return Err(BedError::SectorInUse(*sector));
        }
        Ok(())
    }

    pub fn admit(
        &mut self,
        id: &BedId,
        form: AdmissionForm,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<BedEvent, BedError> {
        self.bed_mut(id, expected_version)?.admit(form, now)
    }

    pub fn reserve(
        &mut self,
        id: &BedId,
        form: ReservationForm,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<BedEvent, BedError> {
        self.bed_mut(id, expected_version)?.reserve(form, now)
    }

    pub fn set_status(
        &mut self,
        id: &BedId,
        next: BedStatus,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<BedEvent, BedError> {
        self.bed_mut(id, expected_version)?.transition(next, now)
    }

    /// Take a bed out of service. Allowed from `FREE`, `CLEANING` and
    /// `RESERVED`; a reservation is cancelled.
    pub fn block_bed(
        &mut self,
        id: &BedId,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<BedEvent, BedError> {
        self.set_status(id, BedStatus::Blocked, expected_version, now)
    }

    /// Return a blocked bed to service.
    pub fn unblock_bed(
        &mut self,
        id: &BedId,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<BedEvent, BedError> {
        let bed = self.get(id)?;
        if bed.status() != BedStatus::Blocked {
            return Err(BedError::InvalidTransition {
                from: bed.status(),
                to: BedStatus::Free,
                reason: "bed is not blocked".to_string(),
            });
        }
        self.set_status(id, BedStatus::Free, expected_version, now)
    }

    /// Transfer or swap the occupancy of `source` with `target`.
    pub fn transfer_or_swap(
        &mut self,
        source: &BedId,
        target: &BedId,
        expected_version: Option<u64>,
        now: Timestamp,
    ) -> Result<BedEvent, BedError> {
        if source == target {
            return Err(BedError::SameBed(*source));
        }
        let i = self.index_of(source)?;
        let j = self.index_of(target)?;
        check_version(&self.beds[i], expected_version)?;
        let (a, b) = pair_mut(&mut self.beds, i, j);
        transfer_or_swap(a, b, now)
    }

    fn index_of(&self, id: &BedId) -> Result<usize, BedError> {
        self.beds
            .iter()
            .position(|b| b.id == *id)
            .ok_or(BedError::BedNotFound(*id))
    }

    fn bed_mut(&mut self, id: &BedId, expected_version: Option<u64>) -> Result<&mut Bed, BedError> {
        let index = self.index_of(id)?;
        let bed = &mut self.beds[index];
        check_version(bed, expected_version)?;
        Ok(bed)
    }
}

fn check_version(bed: &Bed, expected: Option<u64>) -> Result<(), BedError> {
    match expected {
        Some(expected) if expected != bed.version => Err(BedError::VersionConflict {
            bed: bed.id,
            expected,
            found: bed.version,
        }),
        _ => Ok(()),
    }
}

/// Two distinct mutable elements of a slice, in argument order.
fn pair_mut(beds: &mut [Bed], i: usize, j: usize) -> (&mut Bed, &mut Bed) {
    if i < j {
        let (left, right) = beds.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = beds.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}
