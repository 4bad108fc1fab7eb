//! Scanner guard: refuses to run unless every enabled scanner's current
//! version has a `pass` record in the durable attestation ledger.
//!
//! The ledger itself is append-only and maintained by an external
//! attestation tool; this process only ever reads it.

use std::path::Path;

use crate::error::{Result, ShuttleError};
use crate::model::Ledger;
use crate::scanner::ScannerAdapter;

pub fn load_ledger(path: &Path) -> Result<Ledger> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| ShuttleError::Preflight(format!("malformed ledger {}: {e}", path.display())))
}

/// Query every enabled scanner for its version and check it against the
/// ledger. Fails closed: an unreadable ledger or an unattested version is a
/// preflight error.
pub fn guard(ledger_path: &Path, scanners: &[Box<dyn ScannerAdapter>]) -> Result<()> {
    if scanners.is_empty() {
        return Ok(());
    }
    let ledger = load_ledger(ledger_path)?;
    for scanner in scanners {
        let version = scanner
            .version()
            .map_err(|e| ShuttleError::Preflight(format!("{} version check failed: {e}", scanner.name())))?;
        if !ledger.is_attested(scanner.name(), &version) {
            return Err(ShuttleError::Preflight(format!(
                "{} version {} has no passing attestation in the ledger",
                scanner.name(),
                version
            )));
        }
    }
    Ok(())
}
