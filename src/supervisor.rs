//! Run supervisor: single-instance lock, lifecycle state machine, and the
//! top-level drive loop tying stager, orchestrator, dispatcher, and tracker
//! together.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use fs2::FileExt;
use tracing::{info, info_span, warn};
use walkdir::WalkDir;

use crate::config::RunContext;
use crate::crypto::HazardEncryptor;
use crate::dispatcher::Dispatcher;
use crate::error::{Result, ShuttleError};
use crate::ledger;
use crate::notify::Notifier;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::scanner::{ClamAvAdapter, ScannerAdapter};
use crate::stager::Stager;
use crate::throttle::Throttler;
use crate::tracker::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Starting,
    Scanning,
    Draining,
    Reporting,
    Done,
}

/// RAII guard over the single-instance lock file; dropping it (including
/// during an unwind) releases the lock.
struct RunLock {
    file: File,
}

impl RunLock {
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).write(true).open(path)?;
        file.try_lock_exclusive()
            .map_err(|_| ShuttleError::Preflight(format!("another instance holds the lock at {}", path.display())))?;
        Ok(Self { file })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

pub struct Supervisor {
    context: Arc<RunContext>,
    notifier: Box<dyn Notifier>,
}

impl Supervisor {
    pub fn new(context: RunContext, notifier: Box<dyn Notifier>) -> Self {
        Self {
            context: Arc::new(context),
            notifier,
        }
    }

    pub fn run(&self) -> Result<RunState> {
        // Process-wide state: single-instance lock plus the one permissions
        // knob applied at startup.
        install_umask();
        let lock = RunLock::acquire(&self.context.config.paths.lock_path)?;

        let run_id = Utc::now().format("%Y%m%dT%H%M%S").to_string();
        let _span = info_span!("run", run_id = %run_id).entered();
        info!("run starting");

        let scanners = build_scanners(&self.context)?;
        ledger::guard(&self.context.config.paths.ledger, &scanners)?;

        let tracker = Tracker::load(self.context.config.paths.log.clone())?;
        fs::create_dir_all(&self.context.config.paths.quarantine)?;
        fs::create_dir_all(&self.context.config.paths.hazard_archive)?;

        let target_dirs = vec![
            self.context.config.paths.quarantine.clone(),
            self.context.config.paths.destination.clone(),
            self.context.config.paths.hazard_archive.clone(),
        ];
        let throttler = Throttler::new(throttle_budget(&self.context), target_dirs, self.context.config.settings.throttle);
        let stager = Stager::new(
            self.context.config.paths.quarantine.clone(),
            self.context.config.paths.destination.clone(),
            self.context.stability_check_interval(),
        );

        let mut state = RunState::Scanning;
        let mut tasks = Vec::new();
        let mut run_count: u64 = 0;
        let mut run_bytes: u64 = 0;

        'walk: for entry in WalkDir::new(&self.context.config.paths.source)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let source_path = entry.path();
            let relative = match source_path.strip_prefix(&self.context.config.paths.source) {
                Ok(r) => r.to_path_buf(),
                Err(_) => continue,
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            let snapshot = tracker.snapshot();
            if let Err(e) = throttler.admit(size, run_count, run_bytes, &snapshot) {
                warn!(error = %e, "throttle gate tripped, draining");
                state = RunState::Draining;
                break 'walk;
            }

            match stager.stage(source_path, &relative, &tracker) {
                Ok(Some(task)) => {
                    run_count += 1;
                    run_bytes += task.size_bytes;
                    tasks.push(task);
                }
                Ok(None) => {}
                Err(e) => warn!(path = %source_path.display(), error = %e, "failed to stage file"),
            }
        }

        let orchestrator = Orchestrator::new(
            scanners,
            OrchestratorConfig {
                worker_count: self.context.config.settings.max_scan_threads,
                scan_timeout: self.context.scan_timeout(),
                retry_count: self.context.config.scanning.malware_scan_retry_count,
                retry_wait: self.context.retry_wait(),
            },
        );
        let (verdicts, breaker_tripped) = orchestrator.run(tasks);
        if breaker_tripped && state == RunState::Scanning {
            state = RunState::Draining;
        }

        let encryptor = HazardEncryptor::new(
            self.context.config.paths.hazard_archive.clone(),
            self.context.config.paths.hazard_encryption_key.clone(),
        );
        let dispatcher = Dispatcher::new(self.context.config.settings.delete_source_files_after_copying);
        for verdict in verdicts {
            if let Err(e) = dispatcher.dispatch(verdict, &encryptor, &tracker) {
                warn!(error = %e, "dispatch failed for a file");
            }
        }

        tracker.shutdown()?;
        let _ = fs::remove_dir_all(&self.context.config.paths.quarantine);
        fs::create_dir_all(&self.context.config.paths.quarantine)?;

        let snapshot = tracker.snapshot();
        let summary = format!(
            "success={} failure={} suspect={}",
            snapshot.success_count, snapshot.failure_count, snapshot.suspect_count
        );
        if breaker_tripped {
            self.notifier.notify_error("circuit breaker tripped", &summary);
        } else {
            self.notifier.notify_summary("run complete", &summary);
        }
        if snapshot.suspect_count > 0 {
            self.notifier
                .notify_hazard("suspect files archived", &format!("{} file(s)", snapshot.suspect_count));
        }

        info!(%summary, "run complete");
        drop(lock);

        if breaker_tripped {
            return Err(ShuttleError::CircuitBreakerTripped(
                self.context.config.scanning.malware_scan_retry_count as usize,
            ));
        }
        if state == RunState::Draining {
            return Err(ShuttleError::Throttled("run drained due to throttle exhaustion".into()));
        }
        Ok(RunState::Done)
    }
}

fn build_scanners(context: &RunContext) -> Result<Vec<Box<dyn ScannerAdapter>>> {
    let mut scanners: Vec<Box<dyn ScannerAdapter>> = Vec::new();
    if context.config.settings.on_demand_defender {
        scanners.push(Box::new(crate::scanner::DefenderAdapter::new(
            PathBuf::from("mdatp"),
            context.config.settings.defender_handles_suspect_files,
        )));
    }
    if context.config.settings.on_demand_clam_av {
        scanners.push(Box::new(ClamAvAdapter::new(PathBuf::from("clamdscan"), false)));
    }
    Ok(scanners)
}

fn throttle_budget(context: &RunContext) -> crate::model::ThrottleBudget {
    let s = &context.config.settings;
    crate::model::ThrottleBudget {
        min_free_mb: s.throttle_free_space_mb,
        max_files_per_run: s.throttle_max_file_count_per_run,
        max_bytes_per_run: s.throttle_max_file_volume_mb_per_run * 1024 * 1024,
        max_files_per_day: s.throttle_max_file_count_per_day,
        max_bytes_per_day: s.throttle_max_file_volume_mb_per_day * 1024 * 1024,
    }
}

#[cfg(unix)]
fn install_umask() {
    unsafe {
        libc::umask(0o007);
    }
}

#[cfg(not(unix))]
fn install_umask() {}
