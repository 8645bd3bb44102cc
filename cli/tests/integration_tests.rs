use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

use rusqlite::Connection;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("gtfs2db_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const AGENCY: &str = "\
agency_id,agency_name,agency_url,agency_timezone
STM,Metro,http://metro.example,America/Montreal
";

const CALENDAR: &str = "\
service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date
WKDY,1,1,1,1,1,0,0,20120101,20121231
";

const ROUTES: &str = "\
route_id,agency_id,route_short_name,route_long_name,route_type
R1,STM,1,Green Line,1
";

const STOPS: &str = "\
stop_id,stop_code,stop_name,stop_lat,stop_lon
S1,1001,Atwater,45.489,-73.586
S2,1002,Guy-Concordia,45.495,-73.579
S3,1003,Peel,45.500,-73.575
";

const TRIPS: &str = "\
route_id,service_id,trip_id
R1,WKDY,T1
";

const STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
T1,7:05:09,7:05:30,S1,1
T1,7:07:00,7:07:20,S2,2
";

fn feed() -> Vec<(&'static str, &'static str)> {
    vec![
        ("agency.txt", AGENCY),
        ("calendar.txt", CALENDAR),
        ("routes.txt", ROUTES),
        ("stops.txt", STOPS),
        ("trips.txt", TRIPS),
        ("stop_times.txt", STOP_TIMES),
    ]
}

fn write_bundle(dir: &TempDir, members: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("feed.zip");
    let mut zip = ZipWriter::new(File::create(&path).expect("failed to create bundle"));
    let options: FileOptions<'_, ()> = FileOptions::default();
    for (name, content) in members {
        zip.start_file(*name, options).expect("failed to start member");
        zip.write_all(content.as_bytes()).expect("failed to write member");
    }
    zip.finish().expect("failed to finish bundle");
    path
}

fn gtfs2db(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gtfs2db"))
        .args(args)
        .output()
        .expect("failed to run gtfs2db")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn count(db: &PathBuf, table: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

fn index_exists(db: &PathBuf, name: &str) -> bool {
    let conn = Connection::open(db).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        > 0
}

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

#[test]
fn convert_loads_bundle_and_prints_progress() {
    let dir = TempDir::new("convert_progress");
    let bundle = write_bundle(&dir, &feed());
    let db = dir.join("feed.db");

    let output = gtfs2db(&["convert", bundle.to_str().unwrap(), db.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.starts_with("Bundle contents:\n"));
    assert!(out.contains("  stop_times.txt\n"));
    assert!(out.contains("Processing \"agency.txt\": 1 agency added in"));
    assert!(out.contains("Processing \"stops.txt\": 3 stops added in"));
    assert!(!out.contains("calendar_dates.txt"));
    assert!(out.trim_end().ends_with("GTFS bundle loaded."));

    let agency = out.find("Processing \"agency.txt\"").unwrap();
    let stop_times = out.find("Processing \"stop_times.txt\"").unwrap();
    assert!(agency < stop_times);

    assert_eq!(count(&db, "stops"), 3);
    assert_eq!(count(&db, "stop_times"), 2);
    assert!(index_exists(&db, "stops_code_id_index"));
}

#[test]
fn convert_missing_required_file_creates_no_database() {
    let dir = TempDir::new("convert_missing");
    let members: Vec<_> = feed()
        .into_iter()
        .filter(|(name, _)| *name != "trips.txt")
        .collect();
    let bundle = write_bundle(&dir, &members);
    let db = dir.join("feed.db");

    let output = gtfs2db(&["convert", bundle.to_str().unwrap(), db.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("bundle is missing required file \"trips.txt\""));
    assert!(!stdout(&output).contains("Processing"));
    assert!(!db.exists());
}

#[test]
fn convert_refuses_existing_database_without_force() {
    let dir = TempDir::new("convert_existing");
    let bundle = write_bundle(&dir, &feed());
    let db = dir.join("feed.db");
    fs::write(&db, b"not a database").unwrap();

    let output = gtfs2db(&["convert", bundle.to_str().unwrap(), db.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
    assert_eq!(fs::read(&db).unwrap(), b"not a database");

    let output = gtfs2db(&[
        "convert",
        bundle.to_str().unwrap(),
        db.to_str().unwrap(),
        "--force",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(count(&db, "agencies"), 1);
}

#[test]
fn convert_applies_config_file_and_flags() {
    let dir = TempDir::new("convert_config");
    let bundle = write_bundle(&dir, &feed());
    let db = dir.join("feed.db");
    let config = dir.join("load.yaml");
    fs::write(&config, "batch_size: 1\njournal_mode: memory\nforeign_keys: true\n").unwrap();

    let output = gtfs2db(&[
        "convert",
        bundle.to_str().unwrap(),
        db.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--no-indexes",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(count(&db, "stop_times"), 2);
    assert!(!index_exists(&db, "stops_code_id_index"));
    assert!(!index_exists(&db, "stop_times_stop_id_index"));
}

#[test]
fn convert_rejects_invalid_config() {
    let dir = TempDir::new("convert_bad_config");
    let bundle = write_bundle(&dir, &feed());
    let db = dir.join("feed.db");

    let output = gtfs2db(&[
        "convert",
        bundle.to_str().unwrap(),
        db.to_str().unwrap(),
        "--batch-size",
        "0",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid configuration"));
    assert!(!db.exists());
}

#[test]
fn convert_writes_json_report() {
    let dir = TempDir::new("convert_report");
    let bundle = write_bundle(&dir, &feed());
    let db = dir.join("feed.db");
    let report_path = dir.join("report.json");

    let output = gtfs2db(&[
        "convert",
        bundle.to_str().unwrap(),
        db.to_str().unwrap(),
        "--report",
        report_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["database"], db.to_str().unwrap());
    assert_eq!(report["bundle_sha256"].as_str().unwrap().len(), 64);

    let files = report["files"].as_array().unwrap();
    assert_eq!(files.len(), 7);
    assert_eq!(files[0]["filename"], "agency.txt");
    assert_eq!(files[2]["filename"], "calendar_dates.txt");
    assert_eq!(files[2]["status"], "skipped");
    assert_eq!(files[4]["objects_loaded"], 3);
}

#[test]
fn convert_failed_file_sets_exit_code_but_continues() {
    let dir = TempDir::new("convert_failed_file");
    let mut members = feed();
    let bad_stops = "\
stop_id,stop_code,stop_name,stop_lat,stop_lon
S1,1001,Atwater,45.489,-73.586
S2,1002,Guy-Concordia,north,-73.579
";
    members[3] = ("stops.txt", bad_stops);
    let bundle = write_bundle(&dir, &members);
    let db = dir.join("feed.db");

    let output = gtfs2db(&["convert", bundle.to_str().unwrap(), db.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load stops.txt"));

    let out = stdout(&output);
    assert!(out.contains("Processing \"stops.txt\": failed after"));
    assert!(out.contains("Processing \"stop_times.txt\": 2 stop times added in"));
    assert_eq!(count(&db, "stops"), 1);
    assert_eq!(count(&db, "stop_times"), 2);
}

#[test]
fn convert_unreadable_bundle_fails() {
    let dir = TempDir::new("convert_not_zip");
    let bundle = dir.join("feed.zip");
    fs::write(&bundle, "agency_id,agency_name\n").unwrap();

    let output = gtfs2db(&[
        "convert",
        bundle.to_str().unwrap(),
        dir.join("feed.db").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to open bundle"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_complete_bundle() {
    let dir = TempDir::new("validate_ok");
    let bundle = write_bundle(&dir, &feed());

    let output = gtfs2db(&["validate", bundle.to_str().unwrap()]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("calendar_dates.txt"));
    assert!(out.contains("absent (optional)"));
    assert!(out.contains("Bundle is valid."));
}

#[test]
fn validate_lists_missing_files() {
    let dir = TempDir::new("validate_missing");
    let members: Vec<_> = feed()
        .into_iter()
        .filter(|(name, _)| *name != "stops.txt" && *name != "stop_times.txt")
        .collect();
    let bundle = write_bundle(&dir, &members);

    let output = gtfs2db(&["validate", bundle.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("MISSING"));
    assert!(stderr(&output).contains("missing required files: stops.txt, stop_times.txt"));
}

// ---------------------------------------------------------------------------
// catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_lists_every_file() {
    let output = gtfs2db(&["catalog"]);
    assert!(output.status.success());

    let out = stdout(&output);
    for file in [
        "agency.txt",
        "calendar.txt",
        "calendar_dates.txt",
        "routes.txt",
        "stops.txt",
        "trips.txt",
        "stop_times.txt",
    ] {
        assert!(out.contains(file), "missing {file}");
    }
    assert!(out.contains("calendar_dates.txt (optional"));
}

#[test]
fn catalog_single_file_as_json() {
    let output = gtfs2db(&["catalog", "stop_times.txt", "--json"]);
    assert!(output.status.success());

    let specs: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let spec = &specs[0];
    assert_eq!(spec["filename"], "stop_times.txt");
    assert_eq!(spec["required"], true);
    assert_eq!(spec["fields"][1]["name"], "arrival_time");
    assert_eq!(spec["fields"][1]["field_type"], "time");
    assert!(spec.get("insert").is_none());
}

#[test]
fn catalog_unknown_file_fails() {
    let output = gtfs2db(&["catalog", "shapes.txt"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("'shapes.txt' is not a catalog file"));
}
