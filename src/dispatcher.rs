//! Post-scan dispatcher: routes each terminal verdict to the destination or
//! the hazard archive, with the integrity re-verify as the sole authoritative
//! check against silent corruption.

use std::fs;

use tracing::{info, warn};

use crate::crypto::HazardEncryptor;
use crate::error::Result;
use crate::hash::hash_file;
use crate::model::{FileTask, Outcome, ScanVerdict};
use crate::tracker::Tracker;

pub struct Dispatcher {
    delete_source_after_copy: bool,
}

impl Dispatcher {
    pub fn new(delete_source_after_copy: bool) -> Self {
        Self {
            delete_source_after_copy,
        }
    }

    pub fn dispatch(&self, verdict: ScanVerdict, encryptor: &HazardEncryptor, tracker: &Tracker) -> Result<()> {
        match verdict {
            ScanVerdict::Clean(task) => self.dispatch_clean(task, tracker),
            ScanVerdict::Suspect { task, handler_managed } => self.dispatch_suspect(task, handler_managed, encryptor, tracker),
            ScanVerdict::Timeout(task) | ScanVerdict::Failed { task, .. } => self.dispatch_failed(task, tracker),
            ScanVerdict::NotFound(task) => self.dispatch_failed(task, tracker),
        }
    }

    fn dispatch_clean(&self, task: FileTask, tracker: &Tracker) -> Result<()> {
        if let Some(parent) = task.destination_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&task.quarantine_path, &task.destination_path)?;

        let actual = hash_file(&task.destination_path)?;
        if actual != task.content_hash {
            warn!(path = %task.destination_path.display(), "integrity mismatch, rejecting delivery");
            let _ = fs::remove_file(&task.destination_path);
            let _ = fs::remove_file(&task.quarantine_path);
            tracker.complete(&task.content_hash, Outcome::Failure)?;
            return Ok(());
        }

        let _ = fs::remove_file(&task.quarantine_path);
        if self.delete_source_after_copy {
            let _ = fs::remove_file(&task.source_path);
        }
        info!(path = %task.destination_path.display(), "delivered clean file");
        tracker.complete(&task.content_hash, Outcome::Success)
    }

    fn dispatch_suspect(
        &self,
        task: FileTask,
        handler_managed: bool,
        encryptor: &HazardEncryptor,
        tracker: &Tracker,
    ) -> Result<()> {
        if handler_managed {
            // The scanner is responsible for removing the file itself; we
            // only verify it's gone from quarantine.
            if task.quarantine_path.exists() {
                warn!(path = %task.quarantine_path.display(), "handler-managed suspect still present in quarantine");
            }
            return tracker.complete(&task.content_hash, Outcome::Suspect);
        }

        match encryptor.encrypt(&task.quarantine_path, &task.relative_subpath) {
            Ok(archive_path) => {
                info!(path = %archive_path.display(), "archived suspect file");
                match hash_file(&task.source_path) {
                    Ok(source_hash) if source_hash == task.content_hash || task.size_bytes == 0 => {
                        let _ = fs::remove_file(&task.source_path);
                    }
                    _ => {
                        warn!(path = %task.source_path.display(), "source mutated during run, leaving in place");
                    }
                }
                let _ = fs::remove_file(&task.quarantine_path);
                tracker.complete(&task.content_hash, Outcome::Suspect)
            }
            Err(e) => {
                warn!(error = %e, "hazard encryption failed");
                // Source and quarantined copy are both left untouched to aid
                // forensic recovery.
                tracker.complete(&task.content_hash, Outcome::Failure)
            }
        }
    }

    fn dispatch_failed(&self, task: FileTask, tracker: &Tracker) -> Result<()> {
        let _ = fs::remove_file(&task.quarantine_path);
        tracker.complete(&task.content_hash, Outcome::Failure)
    }
}
