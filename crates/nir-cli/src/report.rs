//! # Report Subcommands
//!
//! Read-only views of the board: `beds`, `kpi`, `history`, `audit`.
//! Each prints a plain-text table, or JSON with `--json`.

use std::fmt::Write as _;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use nir_core::{Sector, Timestamp};
use nir_kpi::KpiSnapshot;
use nir_ledger::{AuditEntry, HistoryEntry};
use nir_state::{Bed, BedStatus};
use nir_store::WardService;

/// Arguments for `nir beds`.
#[derive(Args, Debug)]
pub struct BedsArgs {
    /// Only show beds in this sector (by code).
    #[arg(long)]
    pub sector: Option<String>,

    /// Only show beds in this status.
    #[arg(long)]
    pub status: Option<BedStatus>,

    #[arg(long)]
    pub json: bool,
}

/// Arguments for `nir kpi`.
#[derive(Args, Debug)]
pub struct KpiArgs {
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `nir history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only show discharged stays.
    #[arg(long)]
    pub discharged: bool,

    #[arg(long)]
    pub json: bool,
}

/// Arguments for `nir audit`.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Show at most this many entries, newest first.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[arg(long)]
    pub json: bool,
}

pub fn run_beds(args: &BedsArgs, service: &WardService) -> Result<u8> {
    let sectors = service.sectors()?;
    let mut beds = service.beds()?;
    if let Some(code) = &args.sector {
        let Some(sector) = sectors.iter().find(|s| s.code.eq_ignore_ascii_case(code)) else {
            anyhow::bail!("no sector with code {code:?}");
        };
        beds.retain(|b| b.sector_id == sector.id);
    }
    if let Some(status) = args.status {
        beds.retain(|b| b.status() == status);
    }

    if args.json {
        return print_json(&beds);
    }
    print!("{}", bed_table(&sectors, &beds, Timestamp::now()));
    Ok(0)
}

pub fn run_kpi(args: &KpiArgs, service: &WardService) -> Result<u8> {
    let kpi = service.kpi()?;
    if args.json {
        return print_json(&kpi);
    }
    print!("{}", kpi_summary(&kpi));
    Ok(0)
}

pub fn run_history(args: &HistoryArgs, service: &WardService) -> Result<u8> {
    let mut entries = service.history()?;
    if args.discharged {
        entries.retain(|e| !e.is_open());
    }
    if args.json {
        return print_json(&entries);
    }
    for entry in &entries {
        println!("{}", history_line(entry));
    }
    Ok(0)
}

pub fn run_audit(args: &AuditArgs, service: &WardService) -> Result<u8> {
    let mut entries = service.audit()?;
    entries.truncate(args.limit);
    if args.json {
        return print_json(&entries);
    }
    for entry in &entries {
        println!("{}", audit_line(entry));
    }
    Ok(0)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<u8> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(0)
}

/// Board grouped by sector in display order.
pub fn bed_table(sectors: &[Sector], beds: &[Bed], now: Timestamp) -> String {
    let today = now.date();
    let mut out = String::new();
    for sector in sectors {
        let mut in_sector: Vec<&Bed> = beds.iter().filter(|b| b.sector_id == sector.id).collect();
        if in_sector.is_empty() {
            continue;
        }
        in_sector.sort_by(|a, b| a.number.cmp(&b.number));
        let _ = writeln!(out, "{} ({})", sector.name, sector.code);
        for bed in in_sector {
            let mut line = format!("  {:<6} {:<10} {:<12}", bed.number, bed.status().as_str(), bed.category);
            if let Some(admission) = bed.admission() {
                let _ = write!(
                    line,
                    " {} ({}y, {})",
                    admission.patient_name,
                    admission.age_on(today),
                    admission.admission_type.as_str()
                );
                if bed.has_category_mismatch() {
                    let _ = write!(line, " [entitled: {}]", admission.entitled_category);
                }
            } else if let Some(name) = bed.patient_name() {
                let _ = write!(line, " {name}");
            }
            let _ = writeln!(out, "{}", line.trim_end());
        }
    }
    out
}

pub fn kpi_summary(kpi: &KpiSnapshot) -> String {
    let counts = &kpi.status_counts;
    format!(
        "beds:            {}\n\
         occupancy:       {:.1}%\n\
         turnover:        {:.2}\n\
         average stay:    {:.1} days\n\
         mismatches:      {}\n\
         clinical/surg.:  {}/{}\n\
         free {} | occupied {} | cleaning {} | blocked {} | reserved {}\n",
        kpi.total_beds,
        kpi.occupancy_rate,
        kpi.bed_turnover,
        kpi.avg_stay_days,
        kpi.mismatch_count,
        kpi.clinical_count,
        kpi.surgical_count,
        counts.free,
        counts.occupied,
        counts.cleaning,
        counts.blocked,
        counts.reserved,
    )
}

fn history_line(entry: &HistoryEntry) -> String {
    let release = entry
        .release_date
        .map(|r| r.date().to_string())
        .unwrap_or_else(|| "open".to_string());
    format!(
        "{} {:<6} {:<30} {} -> {}",
        entry.admission_date, entry.bed_number, entry.patient_name, entry.admission_type.as_str(), release
    )
}

fn audit_line(entry: &AuditEntry) -> String {
    format!(
        "{} {:<21} {:<6} {:<12} {}",
        entry.timestamp,
        entry.action.as_str(),
        entry.bed_number,
        entry.actor,
        entry.details
    )
}
