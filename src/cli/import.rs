use std::path::Path;

use colored::Colorize;

use crate::canonical::{ColumnMapping, RawRow};
use crate::error::{LedgerError, Result};
use crate::ledger::{import_rows, ImportOptions};
use crate::models::AccountKind;

pub struct ImportArgs<'a> {
    pub file: &'a str,
    pub mapping: Option<&'a str>,
    pub account: Option<&'a str>,
    pub kind: &'a str,
    pub no_auto_create: bool,
    pub restore_deleted: bool,
    pub atomic: bool,
    pub no_dedup: bool,
    pub no_categorize: bool,
}

pub fn run(args: &ImportArgs) -> Result<()> {
    let conn = super::open_db()?;

    let mapping = match args.mapping {
        Some(path) => load_mapping(Path::new(path))?,
        None => ColumnMapping::generic(),
    };
    let options = ImportOptions {
        auto_create_accounts: !args.no_auto_create,
        restore_deleted_duplicates: args.restore_deleted,
        atomic: args.atomic,
        dedup: !args.no_dedup,
        categorize: !args.no_categorize,
        kind: AccountKind::parse(args.kind)?,
        fallback_institution: args.account.map(str::to_string),
    };

    let rows = read_csv_rows(Path::new(args.file))?;
    let report = import_rows(&conn, &rows, &mapping, &options)?;

    println!(
        "{} imported, {} duplicates skipped",
        report.inserted.to_string().green(),
        report.duplicates_skipped,
    );
    if report.deleted_skipped > 0 {
        println!(
            "{} previously deleted (re-run with --restore-deleted to restore)",
            report.deleted_skipped.to_string().yellow(),
        );
    }
    if report.restored > 0 {
        println!("{} restored", report.restored.to_string().green());
    }
    if !report.errors.is_empty() {
        println!("{} rows failed:", report.errors.len().to_string().red());
        for (index, error) in &report.errors {
            println!("  row {}: [{}] {error}", index + 1, error.kind());
        }
    }
    Ok(())
}

fn load_mapping(path: &Path) -> Result<ColumnMapping> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| LedgerError::Parse(format!("mapping profile {}: {e}", path.display())))
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let Ok(record) = result else { continue };
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.trim().to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
