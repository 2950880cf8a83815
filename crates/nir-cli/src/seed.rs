//! # Seed Subcommand
//!
//! Loads a YAML description of the ward into a data directory:
//!
//! ```yaml
//! sectors:
//!   - name: UTI Adulto
//!     code: UTI-A
//!     order: 1
//!     beds:
//!       - { number: "01", category: UTI }
//! payers: [SUS, Unimed]
//! cids:
//!   - { code: J18.9, description: Pneumonia }
//! doctors:
//!   - { name: Dr. Lima, specialty: Clínica Médica }
//! procedures: [Apendicectomia]
//! ```
//!
//! Records that already exist (same sector code, bed number within the
//! sector, payer or procedure name, CID code, doctor name) are skipped, so
//! a seed file can be applied more than once.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use nir_core::Sector;
use nir_store::WardService;

/// Arguments for `nir seed`.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// YAML seed file.
    pub file: PathBuf,

    /// Actor recorded for created beds.
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub sectors: Vec<SeedSector>,
    #[serde(default)]
    pub payers: Vec<String>,
    #[serde(default)]
    pub cids: Vec<SeedCid>,
    #[serde(default)]
    pub doctors: Vec<SeedDoctor>,
    #[serde(default)]
    pub procedures: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSector {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub beds: Vec<SeedBed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedBed {
    pub number: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCid {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDoctor {
    pub name: String,
    pub specialty: Option<String>,
}

/// What a seed run created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub sectors: usize,
    pub beds: usize,
    pub payers: usize,
    pub cids: usize,
    pub doctors: usize,
    pub procedures: usize,
}

pub fn run_seed(args: &SeedArgs, service: &WardService) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let seed: SeedFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    let summary = apply_seed(service, &seed, args.actor.as_deref())?;
    println!(
        "seeded {} sectors, {} beds, {} payers, {} CIDs, {} doctors, {} procedures",
        summary.sectors,
        summary.beds,
        summary.payers,
        summary.cids,
        summary.doctors,
        summary.procedures
    );
    Ok(0)
}

/// Create whatever the board lacks. Each item is checked against the
/// board as it stands after the previous one, so repeats inside one file
/// are skipped too.
pub fn apply_seed(
    service: &WardService,
    seed: &SeedFile,
    actor: Option<&str>,
) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for entry in &seed.sectors {
        let code = entry.code.trim();
        let existing = service
            .sectors()?
            .into_iter()
            .find(|s| s.code.eq_ignore_ascii_case(code));
        let sector: Sector = match existing {
            Some(sector) => sector,
            None => {
                summary.sectors += 1;
                service
                    .create_sector(&entry.name, code, entry.order, actor)
                    .with_context(|| format!("sector {code}"))?
            }
        };
        for bed in &entry.beds {
            let number = bed.number.trim();
            let present = service
                .beds()?
                .iter()
                .any(|b| b.sector_id == sector.id && b.number == number);
            if present {
                continue;
            }
            service
                .add_bed(sector.id, number, &bed.category, actor)
                .with_context(|| format!("bed {code}/{number}"))?;
            summary.beds += 1;
        }
    }

    for name in &seed.payers {
        if !service.payers()?.iter().any(|p| p.name == name.trim()) {
            service.add_payer(name)?;
            summary.payers += 1;
        }
    }
    for cid in &seed.cids {
        if !service.cids()?.iter().any(|c| c.code == cid.code.trim()) {
            service.add_cid(&cid.code, &cid.description)?;
            summary.cids += 1;
        }
    }
    for doctor in &seed.doctors {
        if !service.doctors()?.iter().any(|d| d.name == doctor.name.trim()) {
            service.add_doctor(&doctor.name, doctor.specialty.as_deref())?;
            summary.doctors += 1;
        }
    }
    for name in &seed.procedures {
        if !service.procedures()?.iter().any(|p| p.name == name.trim()) {
            service.add_procedure(name)?;
            summary.procedures += 1;
        }
    }

    tracing::info!(?summary, "seed applied");
    Ok(summary)
}
