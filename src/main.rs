//! `cashbox-ledger` command.
//!
//! Reads cash box openings and postings from a CSV file, then prints one
//! summary row per box, including whether its cached balance reconciles with
//! its history. Rejected rows are reported through the logger.
//!
//! ```bash
//! RUST_LOG=warn cashbox-ledger postings.csv > boxes.csv
//! ```
//!
//! Set `CASHBOX_ALLOW_INACTIVE_POSTINGS=true` to accept postings to inactive
//! boxes and `CASHBOX_CODE_PREFIX` to change the generated box codes.

use cashbox_ledger::{CashBoxLedger, LedgerConfig, LedgerError};
use log::info;
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Recorded as `created_by` on everything the import creates.
const IMPORT_USER: &str = "import";

fn main() -> ExitCode {
    env_logger::init();

    let outcome = input_path().and_then(|path| import_and_summarize(&path));
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn input_path() -> Result<PathBuf, LedgerError> {
    env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or(LedgerError::MissingArgument)
}

fn import_and_summarize(path: &Path) -> Result<(), LedgerError> {
    let ledger = CashBoxLedger::new(LedgerConfig::from_env());

    let summary = ledger.import_csv(BufReader::new(File::open(path)?), IMPORT_USER)?;
    info!(
        "{}: opened {} boxes, posted {} entries, rejected {} rows",
        path.display(),
        summary.opened,
        summary.posted,
        summary.rejected
    );

    ledger.write_summary(io::stdout().lock())
}
