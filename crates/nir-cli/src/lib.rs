//! # nir-cli: Command-Line Tool for the NIR Bed Board
//!
//! Operates directly on a board data directory, the same JSON documents
//! the API server reads and writes.
//!
//! ## Subcommands
//!
//! - `nir seed`: load sectors, beds and reference tables from YAML.
//! - `nir beds`: print the board.
//! - `nir kpi`, `nir history`, `nir audit`: read-only reports.
//! - `nir status`, `nir block`, `nir unblock`, `nir admit`, `nir reserve`,
//!   `nir transfer`: bed actions.
//!
//! ```bash
//! nir --data-dir ./data seed ward.yaml
//! nir --data-dir ./data admit UTI-A/03 --form maria.yaml --actor enf.ana
//! nir --data-dir ./data status UTI-A/03 cleaning
//! ```

pub mod bed;
pub mod report;
pub mod seed;

use std::path::Path;

use anyhow::{bail, Result};

use nir_core::BedId;
use nir_state::Bed;
use nir_store::{Repository, WardService};

/// Open the board stored under `data_dir`.
pub fn open_service(data_dir: &Path) -> Result<WardService> {
    std::fs::create_dir_all(data_dir)?;
    tracing::debug!(data_dir = %data_dir.display(), "opening board");
    Ok(WardService::new(Repository::open_dir(data_dir)))
}

/// Find a bed by id, by `SECTOR/NUMBER`, or by a number unique on the board.
pub fn resolve_bed(service: &WardService, selector: &str) -> Result<BedId> {
    if let Ok(id) = selector.parse::<BedId>() {
        return Ok(id);
    }
    let snapshot = service.snapshot()?;
    let beds = snapshot.beds.beds();

    let matches: Vec<&Bed> = match selector.split_once('/') {
        Some((code, number)) => {
            let Some(sector) = snapshot
                .sectors
                .iter()
                .find(|s| s.code.eq_ignore_ascii_case(code))
            else {
                bail!("no sector with code {code:?}");
            };
            beds.iter()
                .filter(|b| b.sector_id == sector.id && b.number == number)
                .collect()
        }
        None => beds.iter().filter(|b| b.number == selector).collect(),
    };

    match matches.as_slice() {
        [bed] => Ok(bed.id),
        [] => bail!("no bed matches {selector:?}"),
        _ => bail!("bed number {selector:?} exists in several sectors; use SECTOR/NUMBER"),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::seeded_board;

    #[test]
    fn resolves_sector_and_number() {
        let (_dir, service) = seeded_board();
        let id = resolve_bed(&service, "uti/101").unwrap();
        assert_eq!(service.bed(&id).unwrap().category, "UTI");
    }

    #[test]
    fn resolves_unique_number() {
        let (_dir, service) = seeded_board();
        let id = resolve_bed(&service, "102").unwrap();
        assert_eq!(service.bed(&id).unwrap().number, "102");
    }

    #[test]
    fn ambiguous_number_is_rejected() {
        let (_dir, service) = seeded_board();
        let err = resolve_bed(&service, "101").unwrap_err();
        assert!(err.to_string().contains("SECTOR/NUMBER"));
    }

    #[test]
    fn resolves_id_forms() {
        let (_dir, service) = seeded_board();
        let bed = service.beds().unwrap().remove(0);
        assert_eq!(resolve_bed(&service, &bed.id.to_string()).unwrap(), bed.id);
        assert_eq!(
            resolve_bed(&service, &bed.id.as_uuid().to_string()).unwrap(),
            bed.id
        );
    }

    #[test]
    fn unknown_sector_code_is_reported() {
        let (_dir, service) = seeded_board();
        assert!(resolve_bed(&service, "PED/1").is_err());
    }
}
