//! Quarantine stager: stability check, then hash-and-copy into the
//! quarantine tree, then tracker admission.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::hash::copy_and_hash;
use crate::model::FileTask;
use crate::tracker::Tracker;

pub struct Stager {
    quarantine_root: PathBuf,
    destination_root: PathBuf,
    stability_check_interval: Duration,
}

impl Stager {
    pub fn new(quarantine_root: PathBuf, destination_root: PathBuf, stability_check_interval: Duration) -> Self {
        Self {
            quarantine_root,
            destination_root,
            stability_check_interval,
        }
    }

    /// Stage one candidate source file. Returns `None` if the file was
    /// skipped (unstable, held open, or errored) without admitting it;
    /// nothing is deleted on a skip.
    pub fn stage(&self, source_path: &Path, relative_subpath: &Path, tracker: &Tracker) -> Result<Option<FileTask>> {
        if !self.is_stable(source_path)? {
            debug!(path = %source_path.display(), "skipping unstable file this run");
            return Ok(None);
        }
        if self.is_held_open(source_path) {
            debug!(path = %source_path.display(), "skipping file held open by another process");
            return Ok(None);
        }

        let quarantine_path = self.quarantine_root.join(relative_subpath);
        if let Some(parent) = quarantine_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let (content_hash, size_bytes) = copy_and_hash(source_path, &quarantine_path)?;
        fs::File::open(&quarantine_path)?.sync_all()?;

        tracker.admit(&content_hash, source_path, size_bytes)?;

        Ok(Some(FileTask {
            source_path: source_path.to_path_buf(),
            quarantine_path,
            destination_path: self.destination_root.join(relative_subpath),
            content_hash,
            size_bytes,
            relative_subpath: relative_subpath.to_path_buf(),
        }))
    }

    fn is_stable(&self, path: &Path) -> Result<bool> {
        let before = fs::metadata(path)?;
        thread::sleep(self.stability_check_interval);
        let after = fs::metadata(path)?;
        Ok(before.len() == after.len() && before.modified().ok() == after.modified().ok())
    }

    /// Best-effort check via `lsof`; an absent binary or empty/non-zero
    /// output is treated as "not held" rather than a hard error.
    fn is_held_open(&self, path: &Path) -> bool {
        match Command::new("lsof").arg("-t").arg(path).output() {
            Ok(output) => output.status.success() && !output.stdout.is_empty(),
            Err(e) => {
                warn!(error = %e, "lsof unavailable, skipping held-open check");
                false
            }
        }
    }
}
