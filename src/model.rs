//! Shared data model: the objects that flow between the stager, orchestrator,
//! dispatcher, and tracker.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An admitted file, immutable from the moment the stager creates it.
///
/// `content_hash` and `size_bytes` are fixed at admission; nothing downstream
/// recomputes them except the dispatcher's post-move integrity check and the
/// suspect-path source-vs-quarantine comparison.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub source_path: PathBuf,
    pub quarantine_path: PathBuf,
    pub destination_path: PathBuf,
    pub content_hash: String,
    pub size_bytes: u64,
    pub relative_subpath: PathBuf,
}

/// The outcome of running a [`FileTask`] through the scanner adapter(s).
#[derive(Debug, Clone)]
pub enum ScanVerdict {
    Clean(FileTask),
    Suspect { task: FileTask, handler_managed: bool },
    NotFound(FileTask),
    Timeout(FileTask),
    Failed { task: FileTask, reason: String },
}

impl ScanVerdict {
    pub fn task(&self) -> &FileTask {
        match self {
            ScanVerdict::Clean(t) => t,
            ScanVerdict::Suspect { task, .. } => task,
            ScanVerdict::NotFound(t) => t,
            ScanVerdict::Timeout(t) => t,
            ScanVerdict::Failed { task, .. } => task,
        }
    }
}

/// Terminal classification recorded against a [`FileRecord`] in the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Success,
    Failure,
    Suspect,
}

/// One row of the daily processing tracker, keyed by content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub source_path: PathBuf,
    pub size_bytes: u64,
    pub admitted_at: String,
    pub outcome: Outcome,
    pub completed_at: Option<String>,
}

/// One row of the scanner attestation ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEntry {
    pub scanner: String,
    pub version: String,
    pub tested_at: String,
    pub result: LedgerResult,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerResult {
    Pass,
    Fail,
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    #[serde(default, rename = "entries")]
    pub entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// A scanner version is attested iff it appears with `result = pass`.
    pub fn is_attested(&self, scanner: &str, version: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.scanner == scanner && e.version == version && e.result == LedgerResult::Pass)
    }
}

/// Per-axis ceilings consulted by the throttler; zero means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrottleBudget {
    pub min_free_mb: u64,
    pub max_files_per_run: u64,
    pub max_bytes_per_run: u64,
    pub max_files_per_day: u64,
    pub max_bytes_per_day: u64,
}
