//! Command-line front end for the attendance store.
//!
//! # Responsibility
//! - Compose config, logging and the configured backend.
//! - Print collection summaries and read-only reports.

use attendance_core::{
    check_integrity, core_version, init_logging, open_adapter, report, EntityStore,
    PersistenceAdapter, StoreConfig,
};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "attendance_cli")]
#[command(about = "Inspect the attendance store and its reports")]
struct Cli {
    /// JSON config file; `ATTENDANCE_*` variables still override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Collection sizes (default).
    Summary,
    /// Teacher projection.
    Teachers,
    /// Participation history of one user.
    History { user_id: String },
    /// Per-teacher totals for an academic year.
    Year { year_id: String },
    /// Records of one activity.
    Activity { activity_id: String },
    /// Attendance sheet of one group for one activity.
    Group { group_id: String, activity_id: String },
    /// List referential violations.
    Integrity,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = StoreConfig::load(cli.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let adapter = open_adapter(&config).map_err(|err| err.to_string())?;
    let store = if config.seed_demo_data {
        EntityStore::initialize(adapter)
    } else {
        EntityStore::load(adapter)
    }
    .map_err(|err| err.to_string())?;

    match cli.command.unwrap_or(Command::Summary) {
        Command::Summary => print_summary(&store),
        Command::Teachers => {
            for teacher in store.teachers() {
                println!(
                    "{}\t{}\t{}",
                    teacher.id,
                    teacher.name,
                    teacher.group_id.as_deref().unwrap_or("-")
                );
            }
        }
        Command::History { user_id } => {
            let entries = report::teacher_history(store.snapshot(), &user_id)
                .map_err(|err| err.to_string())?;
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.activity_date.as_deref().unwrap_or("-"),
                    entry.activity_name.as_deref().unwrap_or("-"),
                    entry.academic_year_name.as_deref().unwrap_or("-"),
                    entry.status.label()
                );
            }
        }
        Command::Year { year_id } => {
            let rows =
                report::year_summary(store.snapshot(), &year_id).map_err(|err| err.to_string())?;
            println!("group\tteacher\torganizer\tparticipated\tlate\tleft_early\tabsent");
            for row in rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    row.group_name.as_deref().unwrap_or("-"),
                    row.teacher_name,
                    row.counts.organizer,
                    row.counts.participated,
                    row.counts.late,
                    row.counts.left_early,
                    row.counts.absent
                );
            }
        }
        Command::Activity { activity_id } => {
            let rows = report::activity_report(store.snapshot(), &activity_id)
                .map_err(|err| err.to_string())?;
            for row in rows {
                println!(
                    "{}\t{}\t{}",
                    row.group_name.as_deref().unwrap_or("-"),
                    row.teacher_name.as_deref().unwrap_or("-"),
                    row.status.label()
                );
            }
        }
        Command::Group {
            group_id,
            activity_id,
        } => {
            let rows = report::group_attendance(store.snapshot(), &group_id, &activity_id)
                .map_err(|err| err.to_string())?;
            for row in rows {
                let marker = if row.recorded { "" } else { " (no record)" };
                println!("{}\t{}{}", row.teacher_name, row.status.label(), marker);
            }
        }
        Command::Integrity => {
            let violations = check_integrity(store.snapshot());
            if violations.is_empty() {
                println!("no violations");
            }
            for violation in violations {
                println!("{}\t{}", violation.code(), violation);
            }
        }
    }
    Ok(())
}

fn print_summary<P: PersistenceAdapter>(store: &EntityStore<P>) {
    println!("attendance_core version={}", core_version());
    println!("backend={}", store.adapter().backend_name());
    println!("users={}", store.users().len());
    println!("teachers={}", store.teachers().len());
    println!("groups={}", store.groups().len());
    println!("academic_years={}", store.academic_years().len());
    println!("activities={}", store.activities().len());
    println!("participation_records={}", store.participation_records().len());
}
