//! # Ward Service
//!
//! Request-level operations of the board. Each write loads a snapshot,
//! applies one registry or reference-table operation, feeds the resulting
//! event to history and audit, and commits. Reads load and project.
//!
//! The service holds no state beyond its repository; in-process callers
//! serialise access with a mutex around it.

use nir_core::{
    BedId, Cid, CidId, Doctor, DoctorId, Payer, PayerId, Procedure, ProcedureId, Sector,
    SectorId, Timestamp, SYSTEM_ACTOR,
};
use nir_kpi::{monthly_turnover, KpiSnapshot};
use nir_ledger::{AuditEntry, HistoryEntry};
use nir_state::{AdmissionForm, AdmissionType, Bed, BedStatus, ReservationForm};

use crate::error::ServiceError;
use crate::repository::{Repository, Snapshot};

/// The actor to record: `actor` when non-blank, otherwise `SYSTEM`.
pub fn actor_or_system(actor: Option<&str>) -> &str {
    match actor.map(str::trim) {
        Some(a) if !a.is_empty() => a,
        _ => SYSTEM_ACTOR,
    }
}

#[derive(Debug)]
pub struct WardService {
    repo: Repository,
    clock: fn() -> Timestamp,
}

impl WardService {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            clock: Timestamp::now,
        }
    }

    /// Use `clock` instead of the system time for every stamped instant.
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<Snapshot, ServiceError> {
        Ok(self.repo.load()?)
    }

    /// Sectors in display order.
    pub fn sectors(&self) -> Result<Vec<Sector>, ServiceError> {
        let mut sectors = self.repo.load()?.sectors;
        sectors.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(sectors)
    }

    pub fn beds(&self) -> Result<Vec<Bed>, ServiceError> {
        Ok(self.repo.load()?.beds.into_beds())
    }

    pub fn bed(&self, id: &BedId) -> Result<Bed, ServiceError> {
        Ok(self.repo.load()?.beds.get(id)?.clone())
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>, ServiceError> {
        Ok(self.repo.load()?.history.into_entries())
    }

    /// Audit entries, newest first.
    pub fn audit(&self) -> Result<Vec<AuditEntry>, ServiceError> {
        let snapshot = self.repo.load()?;
        Ok(snapshot.audit.entries_newest_first().cloned().collect())
    }

    pub fn kpi(&self) -> Result<KpiSnapshot, ServiceError> {
        let snapshot = self.repo.load()?;
        Ok(KpiSnapshot::compute(
            snapshot.beds.beds(),
            snapshot.history.entries(),
        ))
    }

    /// Admissions dated in the given month per bed.
    pub fn monthly_turnover(&self, year: i32, month: u32) -> Result<f64, ServiceError> {
        let snapshot = self.repo.load()?;
        Ok(monthly_turnover(
            snapshot.history.entries(),
            snapshot.beds.len(),
            year,
            month,
        ))
    }

    pub fn doctors(&self) -> Result<Vec<Doctor>, ServiceError> {
        Ok(self.repo.load()?.doctors)
    }

    pub fn payers(&self) -> Result<Vec<Payer>, ServiceError> {
        Ok(self.repo.load()?.payers)
    }

    pub fn cids(&self) -> Result<Vec<Cid>, ServiceError> {
        Ok(self.repo.load()?.cids)
    }

    pub fn procedures(&self) -> Result<Vec<Procedure>, ServiceError> {
        Ok(self.repo.load()?.procedures)
    }

    // ── Sectors ─────────────────────────────────────────────────────

    pub fn create_sector(
        &self,
        name: &str,
        code: &str,
        order: i32,
        actor: Option<&str>,
    ) -> Result<Sector, ServiceError> {
        let sector = Sector::new(name, code, order)?;
        self.mutate(|snapshot, _| {
            if snapshot
                .sectors
                .iter()
                .any(|s| s.code.eq_ignore_ascii_case(&sector.code))
            {
                return Err(ServiceError::Duplicate {
                    kind: "sector code",
                    value: sector.code.clone(),
                });
            }
            snapshot.sectors.push(sector.clone());
            Ok(())
        })?;
        tracing::info!(sector = %sector.code, actor = actor_or_system(actor), "sector created");
        Ok(sector)
    }

    /// Delete a sector that no longer has beds.
    pub fn delete_sector(&self, id: &SectorId) -> Result<Sector, ServiceError> {
        self.mutate(|snapshot, _| {
            let index = snapshot
                .sectors
                .iter()
                .position(|s| s.id == *id)
                .ok_or_else(|| ServiceError::not_found("sector", id))?;
            snapshot.beds.ensure_sector_empty(id)?;
            Ok(snapshot.sectors.remove(index))
        })
    }

    // ── Beds ────────────────────────────────────────────────────────

    pub fn add_bed(
        &self,
        sector_id: SectorId,
        number: &str,
        category: &str,
        actor: Option<&str>,
    ) -> Result<Bed, ServiceError> {
        self.mutate(|snapshot, now| {
            let (id, event) =
                snapshot
                    .beds
                    .add_bed(&snapshot.sectors, sector_id, number, category, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok(snapshot.beds.get(&id)?.clone())
        })
    }

    pub fn remove_bed(&self, id: &BedId, actor: Option<&str>) -> Result<(), ServiceError> {
        self.mutate(|snapshot, now| {
            let event = snapshot.beds.remove_bed(id, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok(())
        })
    }

    pub fn set_status(
        &self,
        id: &BedId,
        status: BedStatus,
        actor: Option<&str>,
        expected_version: Option<u64>,
    ) -> Result<Bed, ServiceError> {
        if status == BedStatus::Blocked {
            return self.block_bed(id, actor, expected_version);
        }
        self.mutate(|snapshot, now| {
            let event = snapshot.beds.set_status(id, status, expected_version, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok(snapshot.beds.get(id)?.clone())
        })
    }

    pub fn block_bed(
        &self,
        id: &BedId,
        actor: Option<&str>,
        expected_version: Option<u64>,
    ) -> Result<Bed, ServiceError> {
        self.mutate(|snapshot, now| {
            let event = snapshot.beds.block_bed(id, expected_version, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok(snapshot.beds.get(id)?.clone())
        })
    }

    /// Return a blocked bed to `FREE`; any other status is rejected.
    pub fn unblock_bed(
        &self,
        id: &BedId,
        actor: Option<&str>,
        expected_version: Option<u64>,
    ) -> Result<Bed, ServiceError> {
        self.mutate(|snapshot, now| {
            let event = snapshot.beds.unblock_bed(id, expected_version, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok(snapshot.beds.get(id)?.clone())
        })
    }

    /// Admit a patient. Payer, CID and (for surgical admissions) procedure
    /// ids must exist.
    pub fn occupy(
        &self,
        id: &BedId,
        form: AdmissionForm,
        actor: Option<&str>,
        expected_version: Option<u64>,
    ) -> Result<Bed, ServiceError> {
        self.mutate(|snapshot, now| {
            check_references(snapshot, &form)?;
            let event = snapshot.beds.admit(id, form, expected_version, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok(snapshot.beds.get(id)?.clone())
        })
    }

    pub fn reserve(
        &self,
        id: &BedId,
        form: ReservationForm,
        actor: Option<&str>,
        expected_version: Option<u64>,
    ) -> Result<Bed, ServiceError> {
        self.mutate(|snapshot, now| {
            let event = snapshot.beds.reserve(id, form, expected_version, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok(snapshot.beds.get(id)?.clone())
        })
    }

    /// Transfer or swap; returns the source and target beds after the move.
    pub fn transfer(
        &self,
        source: &BedId,
        target: &BedId,
        actor: Option<&str>,
        expected_version: Option<u64>,
    ) -> Result<(Bed, Bed), ServiceError> {
        self.mutate(|snapshot, now| {
            let event = snapshot
                .beds
                .transfer_or_swap(source, target, expected_version, now)?;
            snapshot.record(&event, actor_or_system(actor));
            Ok((
                snapshot.beds.get(source)?.clone(),
                snapshot.beds.get(target)?.clone(),
            ))
        })
    }

    // ── Reference tables ────────────────────────────────────────────

    pub fn add_doctor(&self, name: &str, specialty: Option<&str>) -> Result<Doctor, ServiceError> {
        let doctor = Doctor::new(name, specialty)?;
        self.mutate(|snapshot, _| {
            snapshot.doctors.push(doctor.clone());
            Ok(())
        })?;
        Ok(doctor)
    }

    pub fn delete_doctor(&self, id: &DoctorId) -> Result<(), ServiceError> {
        self.mutate(|snapshot, _| remove_by(&mut snapshot.doctors, |d| d.id == *id, "doctor", id))
    }

    pub fn add_payer(&self, name: &str) -> Result<Payer, ServiceError> {
        let payer = Payer::new(name)?;
        self.mutate(|snapshot, _| {
            snapshot.payers.push(payer.clone());
            Ok(())
        })?;
        Ok(payer)
    }

    pub fn delete_payer(&self, id: &PayerId) -> Result<(), ServiceError> {
        self.mutate(|snapshot, _| remove_by(&mut snapshot.payers, |p| p.id == *id, "payer", id))
    }

    pub fn add_cid(&self, code: &str, description: &str) -> Result<Cid, ServiceError> {
        let cid = Cid::new(code, description)?;
        self.mutate(|snapshot, _| {
            snapshot.cids.push(cid.clone());
            Ok(())
        })?;
        Ok(cid)
    }

    pub fn delete_cid(&self, id: &CidId) -> Result<(), ServiceError> {
        self.mutate(|snapshot, _| remove_by(&mut snapshot.cids, |c| c.id == *id, "cid", id))
    }

    pub fn add_procedure(&self, name: &str) -> Result<Procedure, ServiceError> {
        let procedure = Procedure::new(name)?;
        self.mutate(|snapshot, _| {
            snapshot.procedures.push(procedure.clone());
            Ok(())
        })?;
        Ok(procedure)
    }

    pub fn delete_procedure(&self, id: &ProcedureId) -> Result<(), ServiceError> {
        self.mutate(|snapshot, _| {
            remove_by(&mut snapshot.procedures, |p| p.id == *id, "procedure", id)
        })
    }

    /// Load, apply `f`, commit. Nothing is committed if `f` fails.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Snapshot, Timestamp) -> Result<R, ServiceError>,
    ) -> Result<R, ServiceError> {
        let mut snapshot = self.repo.load()?;
        let result = f(&mut snapshot, (self.clock)())?;
        self.repo.commit(&mut snapshot)?;
        Ok(result)
    }
}

fn check_references(snapshot: &Snapshot, form: &AdmissionForm) -> Result<(), ServiceError> {
    if let Some(payer) = form.payer_id {
        if !snapshot.payers.iter().any(|p| p.id == payer) {
            return Err(ServiceError::not_found("payer", payer));
        }
    }
    if let Some(cid) = form.cid_id {
        if !snapshot.cids.iter().any(|c| c.id == cid) {
            return Err(ServiceError::not_found("cid", cid));
        }
    }
    if form.admission_type == Some(AdmissionType::Surgical) {
        if let Some(procedure) = form.procedure_id {
            if !snapshot.procedures.iter().any(|p| p.id == procedure) {
                return Err(ServiceError::not_found("procedure", procedure));
            }
        }
    }
    Ok(())
}

fn remove_by<T>(
    items: &mut Vec<T>,
    matches: impl Fn(&T) -> bool,
    kind: &'static str,
    id: impl ToString,
) -> Result<(), ServiceError> {
    let before = items.len();
    items.retain(|item| !matches(item));
    if items.len() == before {
        return Err(ServiceError::not_found(kind, id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nir_ledger::AuditAction;
    use nir_state::BedError;

    use crate::error::StoreError;

    fn fixed_clock() -> Timestamp {
        Timestamp::start_of(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
    }

    struct Ward {
        service: WardService,
        sector: Sector,
        payer: Payer,
        cid: Cid,
    }

    fn ward() -> Ward {
        ward_on(Repository::in_memory())
    }

    fn ward_on(repo: Repository) -> Ward {
        let service = WardService::new(repo).with_clock(fixed_clock);
        let sector = service.create_sector("Clínica Médica", "CM", 1, None).unwrap();
        let payer = service.add_payer("SUS").unwrap();
        let cid = service.add_cid("J18.9", "Pneumonia").unwrap();
        Ward {
            service,
            sector,
            payer,
            cid,
        }
    }

    fn form(ward: &Ward, name: &str) -> AdmissionForm {
        AdmissionForm {
            patient_name: Some(name.to_string()),
            birth_date: NaiveDate::from_ymd_opt(1950, 6, 15),
            doctor_name: Some("Dr. Lima".to_string()),
            payer_id: Some(ward.payer.id),
            cid_id: Some(ward.cid.id),
            admission_type: Some(AdmissionType::Clinical),
            admission_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            entitled_category: Some("Enfermaria".to_string()),
            ..AdmissionForm::default()
        }
    }

    #[test]
    fn blank_actor_becomes_system() {
        assert_eq!(actor_or_system(None), "SYSTEM");
        assert_eq!(actor_or_system(Some("  ")), "SYSTEM");
        assert_eq!(actor_or_system(Some("enf.maria")), "enf.maria");
    }

    #[test]
    fn full_stay_updates_history_audit_and_kpi() {
        let ward = ward();
        let bed = ward
            .service
            .add_bed(ward.sector.id, "101", "Enfermaria", Some("admin"))
            .unwrap();

        let occupied = ward
            .service
            .occupy(&bed.id, form(&ward, "Maria"), None, Some(0))
            .unwrap();
        assert_eq!(occupied.status(), BedStatus::Occupied);
        assert_eq!(ward.service.kpi().unwrap().occupancy_rate, 100.0);

        ward.service
            .set_status(&bed.id, BedStatus::Cleaning, Some("enf.ana"), None)
            .unwrap();
        ward.service
            .set_status(&bed.id, BedStatus::Free, None, None)
            .unwrap();

        let history = ward.service.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].release_date, Some(fixed_clock()));

        let actions: Vec<_> = ward
            .service
            .audit()
            .unwrap()
            .into_iter()
            .map(|e| (e.action, e.actor))
            .collect();
        assert_eq!(
            actions,
            vec![
                (AuditAction::CleanComplete, "SYSTEM".to_string()),
                (AuditAction::Discharge, "enf.ana".to_string()),
                (AuditAction::Admission, "SYSTEM".to_string()),
                (AuditAction::BedCreated, "admin".to_string()),
            ]
        );

        let kpi = ward.service.kpi().unwrap();
        assert_eq!(kpi.bed_turnover, 1.0);
        assert_eq!(kpi.avg_stay_days, 2.0);
    }

    #[test]
    fn unknown_payer_is_not_found() {
        let ward = ward();
        let bed = ward
            .service
            .add_bed(ward.sector.id, "101", "Enfermaria", None)
            .unwrap();
        let bad = AdmissionForm {
            payer_id: Some(PayerId::new()),
            ..form(&ward, "Maria")
        };
        assert!(matches!(
            ward.service.occupy(&bed.id, bad, None, None),
            Err(ServiceError::NotFound { kind: "payer", .. })
        ));
        assert_eq!(ward.service.bed(&bed.id).unwrap().status(), BedStatus::Free);
    }

    #[test]
    fn failed_operation_commits_nothing() {
        let ward = ward();
        let bed = ward
            .service
            .add_bed(ward.sector.id, "101", "Enfermaria", None)
            .unwrap();
        let revision = ward.service.snapshot().unwrap().revision();
        assert!(ward
            .service
            .set_status(&bed.id, BedStatus::Free, None, None)
            .is_err());
        assert_eq!(ward.service.snapshot().unwrap().revision(), revision);
    }

    #[test]
    fn admission_that_fails_to_persist_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let ward = ward_on(Repository::open_dir(dir.path()));
        let bed = ward
            .service
            .add_bed(ward.sector.id, "101", "Enfermaria", None)
            .unwrap();
        // Blocks the staging file for the history document.
        std::fs::create_dir(dir.path().join(".history.json.tmp")).unwrap();

        assert!(matches!(
            ward.service.occupy(&bed.id, form(&ward, "Maria"), None, None),
            Err(ServiceError::Store(StoreError::Io(_)))
        ));
        let stored = ward.service.bed(&bed.id).unwrap();
        assert_eq!(stored.status(), BedStatus::Free);
        assert_eq!(stored.version, 0);
        assert!(ward.service.history().unwrap().is_empty());
    }

    #[test]
    fn transfer_then_discharge_from_destination_closes_stay() {
        let ward = ward();
        let a = ward
            .service
            .add_bed(ward.sector.id, "101", "Enfermaria", None)
            .unwrap();
        let b = ward
            .service
            .add_bed(ward.sector.id, "102", "Enfermaria", None)
            .unwrap();
        ward.service
            .occupy(&a.id, form(&ward, "Maria"), None, None)
            .unwrap();

        let (source, target) = ward.service.transfer(&a.id, &b.id, None, None).unwrap();
        assert_eq!(source.status(), BedStatus::Cleaning);
        assert_eq!(target.patient_name(), Some("Maria"));

        ward.service
            .set_status(&b.id, BedStatus::Cleaning, None, None)
            .unwrap();
        let history = ward.service.history().unwrap();
        assert!(history[0].release_date.is_some());
        assert_eq!(history[0].current_bed_id(), b.id);
    }

    #[test]
    fn sector_with_beds_cannot_be_deleted() {
        let ward = ward();
        let bed = ward
            .service
            .add_bed(ward.sector.id, "101", "Enfermaria", None)
            .unwrap();
        assert!(matches!(
            ward.service.delete_sector(&ward.sector.id),
            Err(ServiceError::Bed(BedError::SectorInUse(_)))
        ));
        ward.service.remove_bed(&bed.id, None).unwrap();
        assert!(ward.service.delete_sector(&ward.sector.id).is_ok());
        assert!(ward.service.sectors().unwrap().is_empty());
    }

    #[test]
    fn reference_tables_create_and_delete() {
        let ward = ward();
        let doctor = ward.service.add_doctor("Dra. Souza", Some("Cardiologia")).unwrap();
        assert_eq!(ward.service.doctors().unwrap(), vec![doctor.clone()]);
        ward.service.delete_doctor(&doctor.id).unwrap();
        assert!(matches!(
            ward.service.delete_doctor(&doctor.id),
            Err(ServiceError::NotFound { kind: "doctor", .. })
        ));
        assert_eq!(ward.service.procedures().unwrap().len(), 4);
        assert!(ward.service.add_payer(" ").is_err());
    }

    #[test]
    fn sector_codes_are_unique() {
        let ward = ward();
        assert!(matches!(
            ward.service.create_sector("Clínica Cirúrgica", "cm", 2, None),
            Err(ServiceError::Duplicate { kind: "sector code", .. })
        ));
        assert_eq!(ward.service.sectors().unwrap().len(), 1);
    }

    #[test]
    fn sectors_sorted_by_order() {
        let ward = ward();
        ward.service.create_sector("UTI", "UTI", 0, None).unwrap();
        let codes: Vec<_> = ward
            .service
            .sectors()
            .unwrap()
            .into_iter()
            .map(|s| s.code)
            .collect();
        assert_eq!(codes, vec!["UTI", "CM"]);
    }

    #[test]
    fn concurrent_writer_causes_conflict() {
        let ward = ward();
        let mut stale = ward.service.snapshot().unwrap();
        ward.service.add_payer("Unimed").unwrap();
        assert!(matches!(
            ward.service.repository().commit(&mut stale),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn monthly_turnover_counts_open_stays() {
        let ward = ward();
        let bed = ward
            .service
            .add_bed(ward.sector.id, "101", "Enfermaria", None)
            .unwrap();
        ward.service
            .occupy(&bed.id, form(&ward, "Maria"), None, None)
            .unwrap();
        assert_eq!(ward.service.monthly_turnover(2024, 1).unwrap(), 1.0);
        assert_eq!(ward.service.monthly_turnover(2024, 2).unwrap(), 0.0);
    }
}
