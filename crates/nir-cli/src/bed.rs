//! # Bed Action Subcommands
//!
//! - `status`: discharge, finish cleaning, block, unblock, cancel a reservation.
//! - `block` / `unblock`: take a bed out of service and back.
//! - `admit`: occupy a bed from a YAML admission form.
//! - `reserve`: hold a free bed for an incoming patient.
//! - `transfer`: move a patient, or swap two.
//!
//! Beds are selected by id, `SECTOR/NUMBER`, or a number unique on the board.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Deserialize;

use nir_state::{AdmissionForm, Bed, BedStatus, ReservationForm};
use nir_store::WardService;

use crate::resolve_bed;

/// Arguments for `nir status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    pub bed: String,

    /// FREE, CLEANING or BLOCKED (case-insensitive).
    pub status: BedStatus,

    #[arg(long)]
    pub actor: Option<String>,

    /// Refuse the change unless the bed is at this version.
    #[arg(long)]
    pub expected_version: Option<u64>,
}

/// Arguments for `nir block` and `nir unblock`.
#[derive(Args, Debug)]
pub struct BlockArgs {
    pub bed: String,

    #[arg(long)]
    pub actor: Option<String>,

    #[arg(long)]
    pub expected_version: Option<u64>,
}

/// Arguments for `nir admit`.
#[derive(Args, Debug)]
pub struct AdmitArgs {
    pub bed: String,

    /// YAML admission form.
    #[arg(long)]
    pub form: PathBuf,

    #[arg(long)]
    pub actor: Option<String>,

    #[arg(long)]
    pub expected_version: Option<u64>,
}

/// Arguments for `nir reserve`.
#[derive(Args, Debug)]
pub struct ReserveArgs {
    pub bed: String,

    #[arg(long)]
    pub patient: String,

    #[arg(long)]
    pub birth_date: Option<NaiveDate>,

    /// Expected admission date.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Expected admission time, e.g. "14:30".
    #[arg(long)]
    pub time: Option<String>,

    /// Last day the bed is held.
    #[arg(long)]
    pub until: Option<NaiveDate>,

    #[arg(long)]
    pub actor: Option<String>,
}

/// Arguments for `nir transfer`.
#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Bed the patient leaves.
    pub from: String,

    /// Free bed to move into, or an occupied/reserved bed to swap with.
    pub to: String,

    #[arg(long)]
    pub actor: Option<String>,
}

/// An admission form as written by hand: reference records may be named
/// (`payer: SUS`, `cid: J18.9`, `procedure: Apendicectomia`) instead of
/// given by id.
#[derive(Debug, Default, Deserialize)]
pub struct AdmitFile {
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub procedure: Option<String>,
    #[serde(flatten)]
    pub form: AdmissionForm,
}

pub fn run_status(args: &StatusArgs, service: &WardService) -> Result<u8> {
    let id = resolve_bed(service, &args.bed)?;
    let bed = service.set_status(&id, args.status, args.actor.as_deref(), args.expected_version)?;
    print_bed(&bed);
    Ok(0)
}

pub fn run_block(args: &BlockArgs, service: &WardService) -> Result<u8> {
    let id = resolve_bed(service, &args.bed)?;
    let bed = service.block_bed(&id, args.actor.as_deref(), args.expected_version)?;
    print_bed(&bed);
    Ok(0)
}

pub fn run_unblock(args: &BlockArgs, service: &WardService) -> Result<u8> {
    let id = resolve_bed(service, &args.bed)?;
    let bed = service.unblock_bed(&id, args.actor.as_deref(), args.expected_version)?;
    print_bed(&bed);
    Ok(0)
}

pub fn run_admit(args: &AdmitArgs, service: &WardService) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.form)
        .with_context(|| format!("failed to read {}", args.form.display()))?;
    let file: AdmitFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.form.display()))?;
    let form = resolve_references(service, file)?;

    let id = resolve_bed(service, &args.bed)?;
    let bed = service.occupy(&id, form, args.actor.as_deref(), args.expected_version)?;
    print_bed(&bed);
    Ok(0)
}

pub fn run_reserve(args: &ReserveArgs, service: &WardService) -> Result<u8> {
    let id = resolve_bed(service, &args.bed)?;
    let form = ReservationForm {
        patient_name: Some(args.patient.clone()),
        birth_date: args.birth_date,
        expected_admission_date: args.date,
        reservation_time: args.time.clone(),
        reserved_until: args.until,
    };
    let bed = service.reserve(&id, form, args.actor.as_deref(), None)?;
    print_bed(&bed);
    Ok(0)
}

pub fn run_transfer(args: &TransferArgs, service: &WardService) -> Result<u8> {
    let source = resolve_bed(service, &args.from)?;
    let target = resolve_bed(service, &args.to)?;
    let (source, target) = service.transfer(&source, &target, args.actor.as_deref(), None)?;
    print_bed(&source);
    print_bed(&target);
    Ok(0)
}

/// Fill ids from named references. An id already present in the form wins.
pub fn resolve_references(service: &WardService, file: AdmitFile) -> Result<AdmissionForm> {
    let mut form = file.form;

    if let (None, Some(name)) = (form.payer_id, &file.payer) {
        let payers = service.payers()?;
        let Some(payer) = payers.iter().find(|p| p.name.eq_ignore_ascii_case(name)) else {
            bail!("no payer named {name:?}");
        };
        form.payer_id = Some(payer.id);
    }
    if let (None, Some(code)) = (form.cid_id, &file.cid) {
        let cids = service.cids()?;
        let Some(cid) = cids.iter().find(|c| c.code.eq_ignore_ascii_case(code)) else {
            bail!("no CID with code {code:?}");
        };
        form.cid_id = Some(cid.id);
    }
    if let (None, Some(name)) = (form.procedure_id, &file.procedure) {
        let procedures = service.procedures()?;
        let Some(procedure) = procedures.iter().find(|p| p.name.eq_ignore_ascii_case(name)) else {
            bail!("no procedure named {name:?}");
        };
        form.procedure_id = Some(procedure.id);
    }

    Ok(form)
}

fn print_bed(bed: &Bed) {
    match bed.patient_name() {
        Some(patient) => println!("{} {} v{} {}", bed.number, bed.status(), bed.version, patient),
        None => println!("{} {} v{}", bed.number, bed.status(), bed.version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::seeded_board;

    const FORM: &str = r#"
patient_name: Maria Souza
birth_date: 1950-06-15
doctor_name: Dr. Lima
payer: sus
cid: j18.9
admission_type: SURGICAL
procedure: Apendicectomia
admission_date: 2024-01-01
entitled_category: Enfermaria
"#;

    fn board_with_references() -> (tempfile::TempDir, WardService) {
        let (dir, service) = seeded_board();
        service.add_payer("SUS").unwrap();
        service.add_cid("J18.9", "Pneumonia").unwrap();
        service.add_procedure("Apendicectomia").unwrap();
        (dir, service)
    }

    #[test]
    fn named_references_resolve_to_ids() {
        let (_dir, service) = board_with_references();
        let file: AdmitFile = serde_yaml::from_str(FORM).unwrap();
        let form = resolve_references(&service, file).unwrap();
        assert_eq!(form.payer_id, Some(service.payers().unwrap()[0].id));
        assert!(form.cid_id.is_some());
        assert!(form.procedure_id.is_some());
        assert_eq!(form.patient_name.as_deref(), Some("Maria Souza"));
    }

    #[test]
    fn unknown_payer_name_is_reported() {
        let (_dir, service) = board_with_references();
        let file = AdmitFile {
            payer: Some("Amil".to_string()),
            ..AdmitFile::default()
        };
        let err = resolve_references(&service, file).unwrap_err();
        assert!(err.to_string().contains("Amil"));
    }

    #[test]
    fn admit_discharge_and_clean_from_the_command_line() {
        let (dir, service) = board_with_references();
        let form = dir.path().join("maria.yaml");
        std::fs::write(&form, FORM).unwrap();

        let admit = AdmitArgs {
            bed: "CM/101".to_string(),
            form,
            actor: Some("enf.ana".to_string()),
            expected_version: Some(0),
        };
        assert_eq!(run_admit(&admit, &service).unwrap(), 0);

        let id = resolve_bed(&service, "CM/101").unwrap();
        assert_eq!(service.bed(&id).unwrap().status(), BedStatus::Occupied);

        let discharge = StatusArgs {
            bed: "CM/101".to_string(),
            status: BedStatus::Cleaning,
            actor: None,
            expected_version: None,
        };
        run_status(&discharge, &service).unwrap();
        let clean = StatusArgs {
            status: BedStatus::Free,
            ..discharge
        };
        run_status(&clean, &service).unwrap();

        assert_eq!(service.bed(&id).unwrap().status(), BedStatus::Free);
        assert_eq!(service.history().unwrap().len(), 1);
    }

    #[test]
    fn reserve_then_swap_with_occupied_bed() {
        let (dir, service) = board_with_references();
        let form = dir.path().join("maria.yaml");
        std::fs::write(&form, FORM).unwrap();
        run_admit(
            &AdmitArgs {
                bed: "CM/101".to_string(),
                form,
                actor: None,
                expected_version: None,
            },
            &service,
        )
        .unwrap();

        run_reserve(
            &ReserveArgs {
                bed: "102".to_string(),
                patient: "João".to_string(),
                birth_date: None,
                date: NaiveDate::from_ymd_opt(2024, 1, 2),
                time: None,
                until: NaiveDate::from_ymd_opt(2024, 1, 3),
                actor: None,
            },
            &service,
        )
        .unwrap();

        run_transfer(
            &TransferArgs {
                from: "CM/101".to_string(),
                to: "102".to_string(),
                actor: None,
            },
            &service,
        )
        .unwrap();

        let source = service.bed(&resolve_bed(&service, "CM/101").unwrap()).unwrap();
        let target = service.bed(&resolve_bed(&service, "102").unwrap()).unwrap();
        assert_eq!(source.status(), BedStatus::Reserved);
        assert_eq!(source.patient_name(), Some("João"));
        assert_eq!(
            source.reservation().and_then(|r| r.reserved_until),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
        assert_eq!(target.status(), BedStatus::Occupied);
        assert_eq!(target.patient_name(), Some("Maria Souza"));
    }

    #[test]
    fn block_and_unblock_from_the_command_line() {
        let (_dir, service) = seeded_board();
        let args = BlockArgs {
            bed: "CM/102".to_string(),
            actor: Some("manutencao".to_string()),
            expected_version: Some(0),
        };
        assert!(run_unblock(&args, &service).is_err());
        run_block(&args, &service).unwrap();

        let id = resolve_bed(&service, "CM/102").unwrap();
        assert_eq!(service.bed(&id).unwrap().status(), BedStatus::Blocked);

        let unblock = BlockArgs {
            expected_version: Some(1),
            ..args
        };
        run_unblock(&unblock, &service).unwrap();
        assert_eq!(service.bed(&id).unwrap().status(), BedStatus::Free);
        assert_eq!(service.audit().unwrap()[0].actor, "manutencao");
    }

    #[test]
    fn occupied_bed_cannot_go_straight_to_free() {
        let (dir, service) = board_with_references();
        let form = dir.path().join("maria.yaml");
        std::fs::write(&form, FORM).unwrap();
        run_admit(
            &AdmitArgs {
                bed: "CM/101".to_string(),
                form,
                actor: None,
                expected_version: None,
            },
            &service,
        )
        .unwrap();

        let err = run_status(
            &StatusArgs {
                bed: "CM/101".to_string(),
                status: BedStatus::Free,
                actor: None,
                expected_version: None,
            },
            &service,
        )
        .unwrap_err();
        assert!(err.to_string().contains("OCCUPIED -> FREE"));
    }
}
