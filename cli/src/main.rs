//! gtfs2db - load a static GTFS bundle into a SQLite database.
//!
//! Usage:
//!   gtfs2db convert feed.zip feed.db
//!   gtfs2db convert feed.zip feed.db --config load.yaml --report report.json
//!   gtfs2db validate feed.zip
//!   gtfs2db catalog stop_times.txt

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use gtfs2db_bundle::{Bundle, LoadConfig};
use gtfs2db_core::{FieldSpec, FileSpec, catalog, find_file_spec};
use gtfs2db_sqlite::{Converter, FileReport, FileStatus};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gtfs2db")]
#[command(version)]
#[command(about = "Convert a GTFS bundle into a SQLite database")]
struct Cli {
    /// Log more detail to stderr (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every catalog file of a bundle into a new database
    Convert(ConvertArgs),

    /// Check that a bundle carries every required file
    Validate(ValidateArgs),

    /// Show the files and fields gtfs2db loads
    Catalog(CatalogArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// GTFS bundle (ZIP archive)
    bundle: PathBuf,

    /// Database file to create
    database: PathBuf,

    /// YAML load configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows per transaction (overrides the config file)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Skip creating secondary indexes
    #[arg(long)]
    no_indexes: bool,

    /// Replace the database file if it already exists
    #[arg(long)]
    force: bool,

    /// Write a JSON conversion report to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// GTFS bundle (ZIP archive)
    bundle: PathBuf,
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Show only this file (e.g. stops.txt)
    file: Option<String>,

    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Validate(args) => run_validate(args),
        Command::Catalog(args) => run_catalog(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), String> {
    let config = load_config(&args)?;
    let mut bundle = open_bundle(&args.bundle)?;

    println!("Bundle contents:");
    for name in bundle.member_names() {
        println!("  {name}");
    }

    let validation = bundle.validate();
    if !validation.is_valid() {
        for violation in validation.violations() {
            eprintln!("  {violation}");
        }
        return Err(format!(
            "'{}' is not a valid GTFS bundle",
            args.bundle.display()
        ));
    }

    if args.database.exists() {
        if !args.force {
            return Err(format!(
                "database '{}' already exists (use --force to replace it)",
                args.database.display()
            ));
        }
        fs::remove_file(&args.database).map_err(|e| {
            format!(
                "Failed to remove database '{}': {e}",
                args.database.display()
            )
        })?;
    }

    let conn = Connection::open(&args.database).map_err(|e| {
        format!(
            "Failed to open database '{}': {e}",
            args.database.display()
        )
    })?;
    let mut converter =
        Converter::new(conn, config).map_err(|e| format!("Failed to configure database: {e}"))?;

    let mut report = converter
        .convert_with(&mut bundle, |file| {
            if let Some(line) = processing_line(file) {
                println!("{line}");
            }
        })
        .map_err(|e| format!("Conversion failed: {e}"))?;
    report.database = Some(args.database.clone());
    println!("GTFS bundle loaded.");

    if let Some(path) = &args.report {
        let json = report
            .to_json()
            .map_err(|e| format!("Failed to serialize report: {e}"))?;
        fs::write(path, json)
            .map_err(|e| format!("Failed to write report '{}': {e}", path.display()))?;
    }

    if !report.is_success() {
        let failed: Vec<&str> = report
            .files
            .iter()
            .filter(|file| file.status == FileStatus::Failed)
            .map(|file| file.filename)
            .collect();
        return Err(format!("failed to load {}", failed.join(", ")));
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let bundle = open_bundle(&args.bundle)?;
    let validation = bundle.validate();

    for spec in catalog() {
        println!("  {:<20} {}", spec.filename, member_state(&bundle, spec));
    }

    if validation.is_valid() {
        println!("Bundle is valid.");
        Ok(())
    } else {
        Err(format!(
            "bundle is missing required files: {}",
            validation.missing_files().join(", ")
        ))
    }
}

fn run_catalog(args: CatalogArgs) -> Result<(), String> {
    let specs: Vec<&FileSpec> = match &args.file {
        Some(name) => vec![
            find_file_spec(name).ok_or_else(|| format!("'{name}' is not a catalog file"))?,
        ],
        None => catalog().iter().collect(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&specs)
            .map_err(|e| format!("Failed to serialize catalog: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    for spec in specs {
        let required = if spec.required { "required" } else { "optional" };
        println!("{} ({required}, {})", spec.filename, spec.name.plural);
        for field in spec.fields {
            println!("  {}", field_line(field));
        }
    }
    Ok(())
}

// ---- Helpers ----

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        _ => EnvFilter::new(log_level(verbose)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn load_config(args: &ConvertArgs) -> Result<LoadConfig, String> {
    let mut config = match &args.config {
        Some(path) => LoadConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => LoadConfig::default(),
    };
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.no_indexes {
        config.create_indexes = false;
    }
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;
    Ok(config)
}

fn open_bundle(path: &Path) -> Result<Bundle, String> {
    Bundle::open(path).map_err(|e| format!("Failed to open bundle '{}': {e}", path.display()))
}

fn member_state(bundle: &Bundle, spec: &FileSpec) -> &'static str {
    match (bundle.contains(spec.filename), spec.required) {
        (true, _) => "present",
        (false, true) => "MISSING",
        (false, false) => "absent (optional)",
    }
}

/// Skipped files have nothing to report.
fn processing_line(file: &FileReport) -> Option<String> {
    match file.status {
        FileStatus::Skipped => None,
        _ => Some(format!(
            "Processing \"{}\": {}",
            file.filename,
            file.progress_line()
        )),
    }
}

fn field_line(field: &FieldSpec) -> String {
    let ty = match field.max_length() {
        Some(len) => format!("{}({len})", field.field_type.as_str()),
        None => field.field_type.as_str().to_string(),
    };
    let required = if field.required { "required" } else { "" };
    format!("{:<22} {ty:<14} {required}", field.name)
        .trim_end()
        .to_string()
}
