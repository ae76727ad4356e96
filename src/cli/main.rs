//! CLI binary entry point for mgt

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use metadata_governance::cli::commands::dictionary::{DictionaryArgs, handle_dictionary};
#[cfg(feature = "cli")]
use metadata_governance::cli::commands::init::{InitArgs, handle_init};
#[cfg(feature = "cli")]
use metadata_governance::cli::commands::jobs::{JobsArgs, handle_jobs};
#[cfg(feature = "cli")]
use metadata_governance::cli::commands::ops::{handle_check_disk, handle_cleanup_logs};
#[cfg(feature = "cli")]
use metadata_governance::cli::commands::scan::{ScanArgs, handle_scan};
#[cfg(feature = "cli")]
use metadata_governance::config::Settings;
#[cfg(feature = "cli")]
use metadata_governance::logging::init_logging;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "mgt")]
#[command(about = "Scan relational sources into a job-tracked data dictionary")]
#[command(version)]
struct Cli {
    /// Project directory holding .mgt.toml
    #[arg(short, long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Write a sample config if absent and create the metadata tables
    Init,

    /// Run one scan job and print its id
    Scan {
        /// Source connection string (duckdb://... or postgres://...)
        #[arg(short, long)]
        source: Option<String>,
        /// System name recorded on dictionary rows
        #[arg(long)]
        system_name: Option<String>,
        /// Create the demo tables in the DuckDB source first
        #[arg(long)]
        bootstrap_demo: bool,
    },

    /// List recent scan jobs
    Jobs {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        /// Output format (table, json, csv)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List data dictionary rows
    Dictionary {
        /// Maximum number of rows to show
        #[arg(short, long, default_value_t = 200)]
        limit: usize,
        /// Output format (table, json, csv)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Delete log files past their retention period
    CleanupLogs,

    /// Report disk usage where logs are written and warn past the alert threshold
    CheckDisk,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let settings = match Settings::load(&cli.dir) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Held until exit so buffered file logs are flushed
    let _log_guard = match init_logging(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        }
    };

    let result = match cli.command {
        Commands::Init => {
            let args = InitArgs { dir: cli.dir };
            handle_init(&args, &settings)
        }
        Commands::Scan {
            source,
            system_name,
            bootstrap_demo,
        } => {
            let args = ScanArgs {
                source,
                system_name,
                bootstrap_demo,
            };
            handle_scan(&args, &settings)
        }
        Commands::Jobs { limit, format } => {
            let args = JobsArgs { limit, format };
            handle_jobs(&args, &settings)
        }
        Commands::Dictionary { limit, format } => {
            let args = DictionaryArgs { limit, format };
            handle_dictionary(&args, &settings)
        }
        Commands::CleanupLogs => handle_cleanup_logs(&settings),
        Commands::CheckDisk => handle_check_disk(&settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
