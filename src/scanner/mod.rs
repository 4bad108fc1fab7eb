//! Uniform verdict interface over external antivirus binaries.

mod clamav;
mod defender;
mod parser;

pub use clamav::ClamAvAdapter;
pub use defender::DefenderAdapter;
use parser::RawVerdict;

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

/// What a single scanner invocation decided about one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterVerdict {
    Clean,
    Suspect,
    NotFound,
    Failed,
}

/// A scanner binary, treated as a black box: build an argv, run it under a
/// wall-clock timeout, and interpret its stdout via the shared literal
/// parser. Both recognized variants share this parser so the
/// suspect-before-clean ordering can't drift between them.
pub trait ScannerAdapter: Send + Sync {
    /// Stable identifier used as the ledger key, e.g. `"defender"`.
    fn name(&self) -> &str;

    /// Whether this scanner is configured as the one responsible for
    /// removing/quarantining suspect files itself (policy, not inference).
    fn handles_suspects(&self) -> bool;

    /// Query the installed binary's version string for the ledger guard.
    fn version(&self) -> std::io::Result<String>;

    fn build_command(&self, target: &Path) -> Command;

    /// Run one scan attempt with a wall-clock timeout. `timeout` of `None`
    /// means unbounded. Returns `Ok(None)` on timeout.
    fn scan_once(
        &self,
        target: &Path,
        timeout: Option<Duration>,
    ) -> std::io::Result<Option<AdapterVerdict>> {
        let mut cmd = self.build_command(target);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child: Child = cmd.spawn()?;

        let status = match timeout {
            Some(t) => match child.wait_timeout(t)? {
                Some(status) => status,
                None => {
                    // Still running past the deadline: kill it so the worker
                    // thread running this scan is freed.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(None);
                }
            },
            None => child.wait()?,
        };

        let mut stdout_buf = Vec::new();
        if let Some(mut out) = child.stdout.take() {
            use std::io::Read;
            let _ = out.read_to_end(&mut stdout_buf);
        }
        let stdout = String::from_utf8_lossy(&stdout_buf);

        // Status success/failure is secondary to the textual verdict: both
        // AV binaries here exit non-zero on "threats found" by design.
        let _ = status;

        Ok(Some(match parser::parse_output(&stdout) {
            RawVerdict::Clean => AdapterVerdict::Clean,
            RawVerdict::Suspect => AdapterVerdict::Suspect,
            RawVerdict::NotFound => AdapterVerdict::NotFound,
            RawVerdict::Unparseable => AdapterVerdict::Failed,
        }))
    }
}

/// Compose two adapters' verdicts for a single file per the logical-AND
/// clean rule: clean only if both agree; any suspect wins; any failed wins
/// over not-found; not-found from a handler-managed scanner is a suspect.
pub fn combine(results: &[(bool, AdapterVerdict)]) -> AdapterVerdict {
    if results.iter().any(|(_, v)| *v == AdapterVerdict::Suspect) {
        return AdapterVerdict::Suspect;
    }
    if results
        .iter()
        .any(|(handler_managed, v)| *handler_managed && *v == AdapterVerdict::NotFound)
    {
        return AdapterVerdict::Suspect;
    }
    if results.iter().any(|(_, v)| *v == AdapterVerdict::Failed) {
        return AdapterVerdict::Failed;
    }
    if results.iter().any(|(_, v)| *v == AdapterVerdict::NotFound) {
        return AdapterVerdict::NotFound;
    }
    if results.iter().all(|(_, v)| *v == AdapterVerdict::Clean) {
        return AdapterVerdict::Clean;
    }
    AdapterVerdict::Failed
}
