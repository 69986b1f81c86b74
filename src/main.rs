//! Lotto Ledger CLI
//!
//! Loads a day's bets from a CSV file and prints or exports the reports.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- summary bets.csv
//! cargo run -- export-all bets.csv
//! cargo run -- export-critical bets.csv
//! ```
//!
//! The input has the header `number,type,base,mul`. Rejected rows are logged
//! and skipped.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `LOTTO_OUTPUT_DIR`: Directory export files are written to (default `.`)
//! - `LOTTO_CSV_BOM`: Set to `0` to omit the byte-order mark from export files

use lotto_ledger::config::{self, CRITICAL_EXPORT_FILENAME, FULL_EXPORT_FILENAME};
use lotto_ledger::{
    critical_export_rows, export_to_file, full_export_rows, summary_table_rows, write_export,
    DaySheet, ExportOptions, Ledger, LedgerError, MemoryStore, Result,
};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use std::sync::{Arc, Mutex};

const USAGE: &str =
    "Usage: lotto-ledger <summary|export-all|export-critical> <bets.csv>";

enum Command {
    Summary,
    ExportAll,
    ExportCritical,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(LedgerError::Usage(format!("Missing arguments. {}", USAGE)));
    }

    let command = match args[1].as_str() {
        "summary" => Command::Summary,
        "export-all" => Command::ExportAll,
        "export-critical" => Command::ExportCritical,
        other => {
            return Err(LedgerError::Usage(format!(
                "Unknown command '{}'. {}",
                other, USAGE
            )))
        }
    };

    let file = File::open(&args[2])?;
    let sheet = load_sheet(BufReader::new(file))?;

    match command {
        Command::Summary => {
            if !sheet.summary.is_empty() {
                let stdout = io::stdout();
                let handle = stdout.lock();
                write_export(
                    &summary_table_rows(&sheet.summary),
                    handle,
                    ExportOptions::plain(),
                )?;
                println!();
            }
            eprintln!("Total sales: {}", sheet.total_sales);
        }
        Command::ExportAll => {
            let path = export_to_file(
                &full_export_rows(&sheet.records),
                &config::output_dir(),
                FULL_EXPORT_FILENAME,
                ExportOptions::from_env(),
            )?;
            println!("{}", path.display());
        }
        Command::ExportCritical => {
            let path = export_to_file(
                &critical_export_rows(&sheet.summary),
                &config::output_dir(),
                CRITICAL_EXPORT_FILENAME,
                ExportOptions::from_env(),
            )?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Imports the bets into a fresh store and returns today's sheet as delivered
/// by a subscription.
fn load_sheet<R: io::Read>(reader: R) -> Result<DaySheet> {
    let ledger = Ledger::new(MemoryStore::new());
    ledger.import_csv(reader)?;

    let latest: Arc<Mutex<Option<DaySheet>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&latest);
    let subscription = ledger.watch_today(move |sheet| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(sheet);
        }
    })?;
    ledger.unwatch(subscription)?;

    let sheet = latest
        .lock()
        .map_err(|_| LedgerError::Store("snapshot lock poisoned".to_string()))?
        .take();
    Ok(sheet.unwrap_or_default())
}
