//! Black-box exercises of the stage -> dispatch path against a real
//! temporary filesystem tree, without depending on an installed AV binary.

use std::fs;
use std::path::Path;
use std::time::Duration;

use shuttle::dispatcher::Dispatcher;
use shuttle::model::{FileTask, ScanVerdict};
use shuttle::stager::Stager;
use shuttle::tracker::Tracker;
use shuttle::crypto::HazardEncryptor;

fn layout() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf, std::path::PathBuf, std::path::PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let source = root.path().join("source");
    let quarantine = root.path().join("quarantine");
    let destination = root.path().join("destination");
    let log = root.path().join("log");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&quarantine).unwrap();
    fs::create_dir_all(&destination).unwrap();
    fs::create_dir_all(&log).unwrap();
    (root, source, quarantine, destination, log)
}

#[test]
fn clean_file_is_delivered_with_matching_hash() {
    let (_root, source, quarantine, destination, log) = layout();
    fs::write(source.join("a.txt"), b"hello\n").unwrap();

    let tracker = Tracker::load(log).unwrap();
    let stager = Stager::new(quarantine, destination.clone(), Duration::from_millis(1));
    let task = stager
        .stage(&source.join("a.txt"), Path::new("a.txt"), &tracker)
        .unwrap()
        .expect("stable file should be admitted");

    assert_eq!(tracker.snapshot().pending_count, 1);

    let encryptor = HazardEncryptor::new(destination.clone(), destination.clone());
    let dispatcher = Dispatcher::new(true);
    dispatcher
        .dispatch(ScanVerdict::Clean(task.clone()), &encryptor, &tracker)
        .unwrap();

    let delivered = destination.join("a.txt");
    assert!(delivered.exists());
    assert_eq!(fs::read(&delivered).unwrap(), b"hello\n");
    assert_eq!(tracker.snapshot().success_count, 1);
    assert!(!task.source_path.exists(), "source removed after successful delivery");
}

#[test]
fn zero_length_file_is_valid() {
    let (_root, source, quarantine, destination, log) = layout();
    fs::write(source.join("empty.bin"), b"").unwrap();

    let tracker = Tracker::load(log).unwrap();
    let stager = Stager::new(quarantine, destination.clone(), Duration::from_millis(1));
    let task = stager
        .stage(&source.join("empty.bin"), Path::new("empty.bin"), &tracker)
        .unwrap()
        .expect("zero-length file should be admitted");
    assert_eq!(task.size_bytes, 0);

    let encryptor = HazardEncryptor::new(destination.clone(), destination.clone());
    let dispatcher = Dispatcher::new(false);
    dispatcher
        .dispatch(ScanVerdict::Clean(task), &encryptor, &tracker)
        .unwrap();

    assert_eq!(fs::metadata(destination.join("empty.bin")).unwrap().len(), 0);
    assert_eq!(tracker.snapshot().success_count, 1);
}

#[test]
fn corrupt_destination_is_rejected_as_failure() {
    let (_root, source, quarantine, destination, log) = layout();
    fs::write(source.join("a.txt"), b"hello\n").unwrap();

    let tracker = Tracker::load(log).unwrap();
    let stager = Stager::new(quarantine, destination.clone(), Duration::from_millis(1));
    let mut task = stager
        .stage(&source.join("a.txt"), Path::new("a.txt"), &tracker)
        .unwrap()
        .unwrap();
    // Simulate corruption in transit by recording a hash that won't match
    // the quarantined bytes.
    task.content_hash = "0".repeat(64);

    let encryptor = HazardEncryptor::new(destination.clone(), destination.clone());
    let dispatcher = Dispatcher::new(false);
    dispatcher
        .dispatch(ScanVerdict::Clean(task), &encryptor, &tracker)
        .unwrap();

    assert!(!destination.join("a.txt").exists());
    assert_eq!(tracker.snapshot().failure_count, 1);
}

#[test]
fn timeout_and_failed_verdicts_leave_source_untouched() {
    let (_root, source, quarantine, destination, log) = layout();
    fs::write(source.join("a.txt"), b"hello\n").unwrap();

    let tracker = Tracker::load(log).unwrap();
    let stager = Stager::new(quarantine, destination.clone(), Duration::from_millis(1));
    let task = stager
        .stage(&source.join("a.txt"), Path::new("a.txt"), &tracker)
        .unwrap()
        .unwrap();

    let encryptor = HazardEncryptor::new(destination.clone(), destination.clone());
    let dispatcher = Dispatcher::new(true);
    dispatcher
        .dispatch(ScanVerdict::Timeout(task.clone()), &encryptor, &tracker)
        .unwrap();

    assert!(task.source_path.exists(), "source must survive a timed-out scan");
    assert_eq!(tracker.snapshot().failure_count, 1);
    assert_eq!(tracker.snapshot().pending_count, 0);
}

#[test]
fn handler_managed_suspect_is_recorded_without_archiving() {
    let (_root, _source, quarantine, destination, log) = layout();
    let tracker = Tracker::load(log).unwrap();

    let task = FileTask {
        source_path: quarantine.join("already-gone.exe"),
        quarantine_path: quarantine.join("already-gone.exe"),
        destination_path: destination.join("already-gone.exe"),
        content_hash: "deadbeef".repeat(8),
        size_bytes: 68,
        relative_subpath: Path::new("already-gone.exe").to_path_buf(),
    };
    tracker.admit(&task.content_hash, &task.source_path, task.size_bytes).unwrap();

    let encryptor = HazardEncryptor::new(destination.clone(), destination.clone());
    let dispatcher = Dispatcher::new(false);
    dispatcher
        .dispatch(
            ScanVerdict::Suspect {
                task,
                handler_managed: true,
            },
            &encryptor,
            &tracker,
        )
        .unwrap();

    assert_eq!(tracker.snapshot().suspect_count, 1);
    assert!(fs::read_dir(&destination).unwrap().next().is_none(), "no hazard artifact for handler-managed suspects");
}

#[test]
fn duplicate_content_within_a_run_is_not_double_counted() {
    let (_root, source, quarantine, _destination, log) = layout();
    fs::write(source.join("a.txt"), b"same\n").unwrap();
    fs::write(source.join("b.txt"), b"same\n").unwrap();

    let tracker = Tracker::load(log).unwrap();
    let stager = Stager::new(quarantine, source.clone(), Duration::from_millis(1));

    stager.stage(&source.join("a.txt"), Path::new("a.txt"), &tracker).unwrap();
    stager.stage(&source.join("b.txt"), Path::new("b.txt"), &tracker).unwrap();

    assert_eq!(tracker.snapshot().total_count(), 1, "identical content hashes once");
}
