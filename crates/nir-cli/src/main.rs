//! # nir CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nir_cli::bed::{run_admit, run_block, run_reserve, run_status, run_transfer, run_unblock};
use nir_cli::bed::{AdmitArgs, BlockArgs, ReserveArgs, StatusArgs, TransferArgs};
use nir_cli::report::{run_audit, run_beds, run_history, run_kpi};
use nir_cli::report::{AuditArgs, BedsArgs, HistoryArgs, KpiArgs};
use nir_cli::seed::{run_seed, SeedArgs};

/// NIR bed board
///
/// Works on the same data directory the API server uses.
#[derive(Parser, Debug)]
#[command(name = "nir", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Board data directory.
    #[arg(long, env = "NIR_DATA_DIR", default_value = "nir-data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load sectors, beds and reference tables from a YAML file.
    Seed(SeedArgs),

    /// Print the board.
    Beds(BedsArgs),

    /// Print occupancy, turnover, stay and mismatch indicators.
    Kpi(KpiArgs),

    /// Print admission history.
    History(HistoryArgs),

    /// Print recent audit entries, newest first.
    Audit(AuditArgs),

    /// Change a bed's status (discharge, clean, block, unblock, cancel).
    Status(StatusArgs),

    /// Take a bed out of service.
    Block(BlockArgs),

    /// Return a blocked bed to service.
    Unblock(BlockArgs),

    /// Admit a patient from a YAML admission form.
    Admit(AdmitArgs),

    /// Reserve a free bed.
    Reserve(ReserveArgs),

    /// Transfer a patient to another bed, or swap two patients.
    Transfer(TransferArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let service = match nir_cli::open_service(&cli.data_dir) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match &cli.command {
        Commands::Seed(args) => run_seed(args, &service),
        Commands::Beds(args) => run_beds(args, &service),
        Commands::Kpi(args) => run_kpi(args, &service),
        Commands::History(args) => run_history(args, &service),
        Commands::Audit(args) => run_audit(args, &service),
        Commands::Status(args) => run_status(args, &service),
        Commands::Block(args) => run_block(args, &service),
        Commands::Unblock(args) => run_unblock(args, &service),
        Commands::Admit(args) => run_admit(args, &service),
        Commands::Reserve(args) => run_reserve(args, &service),
        Commands::Transfer(args) => run_transfer(args, &service),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_seed() {
        let cli = Cli::try_parse_from(["nir", "--data-dir", "/tmp/board", "seed", "ward.yaml"]).unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/board"));
        match cli.command {
            Commands::Seed(args) => assert_eq!(args.file, PathBuf::from("ward.yaml")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_status_is_case_insensitive() {
        let cli = Cli::try_parse_from(["nir", "status", "UTI/01", "cleaning", "--actor", "enf.ana"]).unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.bed, "UTI/01");
                assert_eq!(args.status, nir_state::BedStatus::Cleaning);
                assert_eq!(args.actor.as_deref(), Some("enf.ana"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["nir", "status", "101", "broken"]).is_err());
    }

    #[test]
    fn cli_parse_reserve_dates() {
        let cli = Cli::try_parse_from([
            "nir", "reserve", "102", "--patient", "João", "--date", "2024-01-02",
        ])
        .unwrap();
        match cli.command {
            Commands::Reserve(args) => {
                assert_eq!(args.date.map(|d| d.to_string()).as_deref(), Some("2024-01-02"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_unblock() {
        let cli = Cli::try_parse_from(["nir", "unblock", "UTI/01", "--expected-version", "3"]).unwrap();
        match cli.command {
            Commands::Unblock(args) => {
                assert_eq!(args.bed, "UTI/01");
                assert_eq!(args.expected_version, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_audit_default_limit() {
        let cli = Cli::try_parse_from(["nir", "audit"]).unwrap();
        match cli.command {
            Commands::Audit(args) => assert_eq!(args.limit, 20),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
