//! # nir-kpi: Board Indicators
//!
//! Pure functions over a snapshot of beds and history; nothing here reads
//! the clock or touches storage.
//!
//! | Indicator        | Definition |
//! |------------------|------------|
//! | occupancy rate   | occupied / total beds × 100 |
//! | bed turnover     | discharged episodes / total beds |
//! | average stay     | mean of per-episode stay, each floored at half a day |
//! | mismatch count   | occupied beds whose entitled category differs from the bed's |
//!
//! Every ratio is 0 when its denominator is 0.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use nir_core::SectorId;
use nir_ledger::HistoryEntry;
use nir_state::{AdmissionType, Bed, BedStatus};

/// Bed counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub free: usize,
    pub occupied: usize,
    pub cleaning: usize,
    pub blocked: usize,
    pub reserved: usize,
}

impl StatusCounts {
    pub fn tally(beds: &[Bed]) -> Self {
        let mut counts = Self::default();
        for bed in beds {
            match bed.status() {
                BedStatus::Free => counts.free += 1,
                BedStatus::Occupied => counts.occupied += 1,
                BedStatus::Cleaning => counts.cleaning += 1,
                BedStatus::Blocked => counts.blocked += 1,
                BedStatus::Reserved => counts.reserved += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorOccupancy {
    pub sector_id: SectorId,
    pub total: usize,
    pub occupied: usize,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub total_beds: usize,
    pub status_counts: StatusCounts,
    /// Percentage, 0..=100.
    pub occupancy_rate: f64,
    /// Discharged episodes per bed.
    pub bed_turnover: f64,
    pub avg_stay_days: f64,
    pub mismatch_count: usize,
    pub clinical_count: usize,
    pub surgical_count: usize,
    /// In order of each sector's first bed.
    pub sectors: Vec<SectorOccupancy>,
}

impl KpiSnapshot {
    pub fn compute(beds: &[Bed], history: &[HistoryEntry]) -> Self {
        let total_beds = beds.len();
        let status_counts = StatusCounts::tally(beds);

        let occupied = || beds.iter().filter_map(|b| b.admission());
        let clinical_count = occupied()
            .filter(|a| a.admission_type == AdmissionType::Clinical)
            .count();
        let surgical_count = occupied()
            .filter(|a| a.admission_type == AdmissionType::Surgical)
            .count();

        let stays: Vec<f64> = history.iter().filter_map(HistoryEntry::stay_days).collect();
        let avg_stay_days = if stays.is_empty() {
            0.0
        } else {
            stays.iter().sum::<f64>() / stays.len() as f64
        };

        Self {
            total_beds,
            status_counts,
            occupancy_rate: percentage(status_counts.occupied, total_beds),
            bed_turnover: ratio(stays.len(), total_beds),
            avg_stay_days,
            mismatch_count: beds.iter().filter(|b| b.has_category_mismatch()).count(),
            clinical_count,
            surgical_count,
            sectors: sector_occupancy(beds),
        }
    }
}

/// Admissions dated in `year`/`month` per bed, whether discharged or not.
///
/// This is the all-entries proxy; [`KpiSnapshot::bed_turnover`] is the
/// discharge-based figure.
pub fn monthly_turnover(history: &[HistoryEntry], total_beds: usize, year: i32, month: u32) -> f64 {
    let admissions = history
        .iter()
        .filter(|e| e.admission_date.year() == year && e.admission_date.month() == month)
        .count();
    ratio(admissions, total_beds)
}

pub fn sector_occupancy(beds: &[Bed]) -> Vec<SectorOccupancy> {
    let mut sectors: Vec<SectorOccupancy> = Vec::new();
    for bed in beds {
        let index = match sectors.iter().position(|s| s.sector_id == bed.sector_id) {
            Some(index) => index,
            None => {
                sectors.push(SectorOccupancy {
                    sector_id: bed.sector_id,
                    total: 0,
                    occupied: 0,
                    occupancy_rate: 0.0,
                });
                sectors.len() - 1
            }
        };
        let sector = &mut sectors[index];
        sector.total += 1;
        if bed.status() == BedStatus::Occupied {
            sector.occupied += 1;
        }
    }
    for sector in &mut sectors {
        sector.occupancy_rate = percentage(sector.occupied, sector.total);
    }
    sectors
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    ratio(part, total) * 100.0
}
