//! Space and volume gates consulted before quarantine admission.

use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShuttleError};
use crate::model::ThrottleBudget;
use crate::tracker::TrackerSnapshot;

pub struct Throttler {
    budget: ThrottleBudget,
    /// Directories that will receive the admitted file (quarantine,
    /// destination, hazard archive), checked independently.
    target_dirs: Vec<PathBuf>,
    enabled: bool,
}

impl Throttler {
    pub fn new(budget: ThrottleBudget, target_dirs: Vec<PathBuf>, enabled: bool) -> Self {
        Self {
            budget,
            target_dirs,
            enabled,
        }
    }

    /// Check whether `size` more bytes can be admitted right now, given the
    /// tracker's day-to-date aggregates and this run's running totals.
    pub fn admit(&self, size: u64, run_count: u64, run_bytes: u64, today: &TrackerSnapshot) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.check_space(size)?;
        self.check_volume(size, run_count, run_bytes, today)
    }

    fn check_space(&self, size: u64) -> Result<()> {
        if self.budget.min_free_mb == 0 {
            return Ok(());
        }
        let min_free_bytes = self.budget.min_free_mb * 1024 * 1024;
        for dir in &self.target_dirs {
            let mount = resolve_mount_point(dir)?;
            let free = fs2::free_space(&mount)?;
            if free < size + min_free_bytes {
                return Err(ShuttleError::Throttled(format!(
                    "insufficient free space on mount of {}: {} bytes free, need {} for this file plus {} MB reserve",
                    dir.display(),
                    free,
                    size,
                    self.budget.min_free_mb
                )));
            }
        }
        Ok(())
    }

    fn check_volume(&self, size: u64, run_count: u64, run_bytes: u64, today: &TrackerSnapshot) -> Result<()> {
        let b = &self.budget;
        if b.max_files_per_run != 0 && run_count + 1 > b.max_files_per_run {
            return Err(ShuttleError::Throttled("per-run file count ceiling reached".into()));
        }
        if b.max_bytes_per_run != 0 && run_bytes + size > b.max_bytes_per_run {
            return Err(ShuttleError::Throttled("per-run byte ceiling reached".into()));
        }
        if b.max_files_per_day != 0 && today.total_count() + 1 > b.max_files_per_day {
            return Err(ShuttleError::Throttled("per-day file count ceiling reached".into()));
        }
        if b.max_bytes_per_day != 0 && today.total_bytes() + size > b.max_bytes_per_day {
            return Err(ShuttleError::Throttled("per-day byte ceiling reached".into()));
        }
        Ok(())
    }
}

/// Walk ancestors of `path` until the device id changes, returning the
/// filesystem mount point. There's no ecosystem crate for this in the
/// corpus; stdlib's device-id comparison is the idiomatic way to do it.
pub fn resolve_mount_point(path: &Path) -> Result<PathBuf> {
    let start = if path.exists() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf())
    };
    let start_dev = std::fs::metadata(&start)?.dev();

    let mut current = start.clone();
    loop {
        let parent = match current.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => return Ok(current),
        };
        let parent_dev = std::fs::metadata(&parent)?.dev();
        if parent_dev != start_dev {
            return Ok(current);
        }
        current = parent;
    }
}
