//! Daily processing tracker: the crash-safe, day-keyed source of truth for
//! per-file outcomes and daily totals.
//!
//! Persisted as one JSON document per local calendar day, rewritten
//! atomically (write-to-temp-then-rename) on every mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{FileRecord, Outcome};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub pending_count: u64,
    pub pending_bytes: u64,
    pub success_count: u64,
    pub success_bytes: u64,
    pub failure_count: u64,
    pub failure_bytes: u64,
    pub suspect_count: u64,
    pub suspect_bytes: u64,
}

impl TrackerSnapshot {
    pub fn total_count(&self) -> u64 {
        self.pending_count + self.success_count + self.failure_count + self.suspect_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.pending_bytes + self.success_bytes + self.failure_bytes + self.suspect_bytes
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackerDay {
    records: HashMap<String, FileRecord>,
    aggregates: TrackerSnapshot,
}

pub struct Tracker {
    log_dir: PathBuf,
    day_key: String,
    state: Mutex<TrackerDay>,
}

impl Tracker {
    /// Load (or create) today's tracker file under `log_dir`.
    pub fn load(log_dir: PathBuf) -> Result<Self> {
        let day_key = Local::now().format("%Y-%m-%d").to_string();
        let path = day_path(&log_dir, &day_key);
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw).unwrap_or_default()
        } else {
            TrackerDay::default()
        };
        Ok(Self {
            log_dir,
            day_key,
            state: Mutex::new(state),
        })
    }

    fn path(&self) -> PathBuf {
        day_path(&self.log_dir, &self.day_key)
    }

    /// Record a new admission. If `hash` is already present for today
    /// (duplicate content within the same day), the existing record is left
    /// untouched and aggregates are not double-counted.
    pub fn admit(&self, hash: &str, source_path: &Path, size: u64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.records.contains_key(hash) {
            return Ok(false);
        }
        state.records.insert(
            hash.to_string(),
            FileRecord {
                source_path: source_path.to_path_buf(),
                size_bytes: size,
                admitted_at: Utc::now().to_rfc3339(),
                outcome: Outcome::Pending,
                completed_at: None,
            },
        );
        state.aggregates.pending_count += 1;
        state.aggregates.pending_bytes += size;
        self.flush_locked(&state)?;
        Ok(true)
    }

    /// Transition a pending record to a terminal outcome.
    pub fn complete(&self, hash: &str, outcome: Outcome) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let size = match state.records.get(hash) {
            Some(r) if r.outcome == Outcome::Pending => r.size_bytes,
            _ => return Ok(()),
        };
        state.aggregates.pending_count -= 1;
        state.aggregates.pending_bytes -= size;
        match outcome {
            Outcome::Success => {
                state.aggregates.success_count += 1;
                state.aggregates.success_bytes += size;
            }
            Outcome::Failure => {
                state.aggregates.failure_count += 1;
                state.aggregates.failure_bytes += size;
            }
            Outcome::Suspect => {
                state.aggregates.suspect_count += 1;
                state.aggregates.suspect_bytes += size;
            }
            Outcome::Pending => {}
        }
        if let Some(record) = state.records.get_mut(hash) {
            record.outcome = outcome;
            record.completed_at = Some(Utc::now().to_rfc3339());
        }
        self.flush_locked(&state)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.state.lock().unwrap().aggregates.clone()
    }

    pub fn flush(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        self.flush_locked(&state)
    }

    /// Flush any still-pending records as `Failure`; used when the run tears
    /// down without every in-flight scan reaching a terminal verdict.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let pending_hashes: Vec<String> = state
            .records
            .iter()
            .filter(|(_, r)| r.outcome == Outcome::Pending)
            .map(|(h, _)| h.clone())
            .collect();
        for hash in pending_hashes {
            let size = state.records[&hash].size_bytes;
            state.aggregates.pending_count -= 1;
            state.aggregates.pending_bytes -= size;
            state.aggregates.failure_count += 1;
            state.aggregates.failure_bytes += size;
            let record = state.records.get_mut(&hash).unwrap();
            record.outcome = Outcome::Failure;
            record.completed_at = Some(Utc::now().to_rfc3339());
        }
        self.flush_locked(&state)
    }

    fn flush_locked(&self, state: &TrackerDay) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir)?;
        let serialized = serde_json::to_vec_pretty(state).expect("tracker state is always serializable");
        let tmp = self.path().with_extension("json.tmp");
        std::fs::write(&tmp, &serialized)?;
        std::fs::rename(&tmp, self.path())?;
        Ok(())
    }
}

fn day_path(log_dir: &Path, day_key: &str) -> PathBuf {
    log_dir.join(format!("tracker-{day_key}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_then_complete_updates_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::load(dir.path().to_path_buf()).unwrap();
        assert!(tracker.admit("abc", Path::new("/src/a.txt"), 10).unwrap());
        let snap = tracker.snapshot();
        assert_eq!(snap.pending_count, 1);
        assert_eq!(snap.pending_bytes, 10);

        tracker.complete("abc", Outcome::Success).unwrap();
        let snap = tracker.snapshot();
        assert_eq!(snap.pending_count, 0);
        assert_eq!(snap.success_count, 1);
        assert_eq!(snap.success_bytes, 10);
        assert_eq!(snap.total_count(), 1);
    }

    #[test]
    fn duplicate_admission_within_a_day_is_not_double_counted() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::load(dir.path().to_path_buf()).unwrap();
        assert!(tracker.admit("abc", Path::new("/src/a.txt"), 10).unwrap());
        assert!(!tracker.admit("abc", Path::new("/src/b.txt"), 10).unwrap());
        assert_eq!(tracker.snapshot().pending_count, 1);
    }

    #[test]
    fn shutdown_fails_pending_records() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::load(dir.path().to_path_buf()).unwrap();
        tracker.admit("abc", Path::new("/src/a.txt"), 10).unwrap();
        tracker.shutdown().unwrap();
        let snap = tracker.snapshot();
        assert_eq!(snap.pending_count, 0);
        assert_eq!(snap.failure_count, 1);
    }

    #[test]
    fn persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let tracker = Tracker::load(dir.path().to_path_buf()).unwrap();
            tracker.admit("abc", Path::new("/src/a.txt"), 10).unwrap();
        }
        let reloaded = Tracker::load(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.snapshot().pending_count, 1);
    }
}
