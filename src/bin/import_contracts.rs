// Import tenancy contracts from a CSV file into the occupancy database.
//
// Usage:
//   cargo run --bin import_contracts -- <db_path> <csv_path>
//
// Prints the import report as JSON; rows with ERROR-level violations are skipped.

use anyhow::Context;
use apartment_occupancy::db::open_and_init;
use apartment_occupancy::domain::DqLevel;
use apartment_occupancy::importer::ContractImporter;
use apartment_occupancy::logging;
use apartment_occupancy::repository::TenancyRepository;
use std::path::Path;
use std::sync::{Arc, Mutex};

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let usage = "usage: import_contracts <db_path> <csv_path>";
    let db_path = args.next().context(usage)?;
    let csv_path = args.next().context(usage)?;

    let conn = open_and_init(&db_path).with_context(|| format!("open database {}", db_path))?;
    let conn = Arc::new(Mutex::new(conn));
    let importer = ContractImporter::new(TenancyRepository::new(conn.clone()));

    let report = importer
        .import_file(Path::new(&csv_path))
        .with_context(|| format!("import {}", csv_path))?;

    let stored = TenancyRepository::new(conn).list_all()?.len();
    tracing::info!(
        errors = report.count_level(DqLevel::Error),
        infos = report.count_level(DqLevel::Info),
        stored_contracts = stored,
        "import finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
