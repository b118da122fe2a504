use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::marker::ChangeProbe;
use super::{ChangeWatcher, EVENT_BUFFER, WatchError, WatchState};
use crate::actor::messages::{SyncMsg, WatchEvent};
use crate::stroke::{Decoded, Geometry};

const POINT: &str = r#"{"color":"Blue","x":30,"y":50,"z":50}"#;

/// Write through a sibling staging file so the target appears with its
/// final contents and mtime in one rename.
fn write_at(path: &Path, contents: &str, mtime: SystemTime) {
    let staging = path.with_extension("staging");
    std::fs::write(&staging, contents).unwrap();
    File::options()
        .write(true)
        .open(&staging)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
    std::fs::rename(&staging, path).unwrap();
}

fn strokes_file(dir: &TempDir) -> PathBuf {
    dir.path().join("strokes.json")
}

fn modify_event(path: &Path) -> WatchEvent {
    WatchEvent::Fs(notify::Event {
        kind: notify::EventKind::Modify(notify::event::ModifyKind::Data(
            notify::event::DataChange::Any,
        )),
        paths: vec![path.to_path_buf()],
        attrs: Default::default(),
    })
}

async fn next_batch(rx: &mut mpsc::Receiver<SyncMsg>) -> Decoded {
    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(SyncMsg::Batch(decoded))) => decoded,
        other => panic!("expected a batch, got {other:?}"),
    }
}

async fn assert_quiet(rx: &mut mpsc::Receiver<SyncMsg>) {
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err(), "unexpected extra message");
}

// =============================================================================
// ChangeProbe
// =============================================================================

#[test]
fn test_probe_same_marker_decodes_once() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);
    let t0 = SystemTime::now();
    write_at(&file, POINT, t0);

    let mut probe = ChangeProbe::new(file.clone());
    assert_eq!(probe.check().unwrap().records.len(), 1);
    assert!(probe.check().is_none());

    write_at(&file, &format!("[{POINT},{POINT}]"), t0 + Duration::from_secs(1));
    assert_eq!(probe.check().unwrap().records.len(), 2);
}

#[test]
fn test_probe_missing_file_is_no_change() {
    let dir = TempDir::new().unwrap();
    let mut probe = ChangeProbe::new(strokes_file(&dir));
    assert!(probe.check().is_none());
}

#[test]
fn test_probe_unrecognized_payload_is_no_change() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);
    write_at(&file, "\"just a string\"", SystemTime::now());

    let mut probe = ChangeProbe::new(file);
    assert!(probe.check().is_none());
}

#[test]
fn test_probe_reports_malformed_entries() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);
    write_at(&file, r#"{"points":[]}"#, SystemTime::now());

    let decoded = ChangeProbe::new(file).check().unwrap();
    assert!(decoded.records.is_empty());
    assert_eq!(decoded.malformed.len(), 1);
}

// =============================================================================
// Event filtering
// =============================================================================

#[test]
fn test_event_concerns_only_target_file() {
    let target = Path::new("/data/strokes.json");
    assert!(modify_event(target).concerns(target));
    assert!(!modify_event(Path::new("/data/other.json")).concerns(target));
    assert!(WatchEvent::Check.concerns(target));

    let metadata = WatchEvent::Fs(notify::Event {
        kind: notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
            notify::event::MetadataKind::Any,
        )),
        paths: vec![target.to_path_buf()],
        attrs: Default::default(),
    });
    assert!(!metadata.concerns(target));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_stop_before_start_and_twice() {
    let (tx, _rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(PathBuf::from("strokes.json"), tx);

    watcher.stop();
    watcher.stop();
    assert_eq!(watcher.state(), WatchState::Stopped);
}

#[tokio::test]
async fn test_start_after_stop_fails() {
    let dir = TempDir::new().unwrap();
    let (tx, _rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(strokes_file(&dir), tx);

    watcher.start().unwrap();
    watcher.stop();
    assert!(matches!(watcher.start(), Err(WatchError::Stopped)));
    assert!(!watcher.inject(WatchEvent::Check));
}

#[tokio::test]
async fn test_start_on_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let (tx, _rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(dir.path().join("gone").join("strokes.json"), tx);

    assert!(matches!(watcher.start(), Err(WatchError::Notify { .. })));
    assert_eq!(watcher.state(), WatchState::Idle);
}

#[tokio::test]
async fn test_start_dispatches_existing_content() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);
    write_at(&file, POINT, SystemTime::now());

    let (tx, mut rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(file, tx);
    watcher.start().unwrap();

    let decoded = next_batch(&mut rx).await;
    assert_eq!(decoded.records.len(), 1);
    assert!(matches!(decoded.records[0].geometry, Geometry::Point(_)));

    watcher.stop();
}

#[tokio::test]
async fn test_duplicate_notifications_dispatch_once() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);
    write_at(&file, POINT, SystemTime::now());

    let (tx, mut rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(file.clone(), tx);
    watcher.start().unwrap();
    next_batch(&mut rx).await;

    // Same marker: coalesced OS notifications.
    assert!(watcher.inject(modify_event(&file)));
    assert!(watcher.inject(modify_event(&file)));
    assert_quiet(&mut rx).await;

    watcher.stop();
}

#[tokio::test]
async fn test_newer_marker_dispatches_again() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);
    let t0 = SystemTime::now();
    write_at(&file, POINT, t0);

    let (tx, mut rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(file.clone(), tx);
    watcher.start().unwrap();
    next_batch(&mut rx).await;

    write_at(&file, &format!("[{POINT},{POINT},{POINT}]"), t0 + Duration::from_secs(2));
    watcher.inject(modify_event(&file));

    // The OS may also report the write; the marker collapses both.
    assert_eq!(next_batch(&mut rx).await.records.len(), 3);
    assert_quiet(&mut rx).await;

    watcher.stop();
}

#[tokio::test]
async fn test_no_dispatch_after_stop() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);

    let (tx, mut rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(file.clone(), tx);
    watcher.start().unwrap();
    watcher.stop();

    write_at(&file, POINT, SystemTime::now());
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_missing_file_dispatches_once_created() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);

    let (tx, mut rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(file.clone(), tx);
    watcher.start().unwrap();
    assert_quiet(&mut rx).await;
    assert_eq!(watcher.state(), WatchState::Watching);

    write_at(&file, POINT, SystemTime::now());
    assert!(watcher.inject(modify_event(&file)));
    assert_eq!(next_batch(&mut rx).await.records.len(), 1);

    watcher.stop();
}

#[tokio::test]
async fn test_unrelated_events_never_crowd_out_target() {
    let dir = TempDir::new().unwrap();
    let file = strokes_file(&dir);
    let t0 = SystemTime::now();
    write_at(&file, POINT, t0);

    let (tx, mut rx) = mpsc::channel(8);
    let watcher = ChangeWatcher::new(file.clone(), tx);
    watcher.start().unwrap();
    next_batch(&mut rx).await;

    let noise = dir.path().join("other.log");
    for _ in 0..EVENT_BUFFER * 2 {
        assert!(watcher.inject(modify_event(&noise)));
    }

    write_at(&file, &format!("[{POINT},{POINT}]"), t0 + Duration::from_secs(5));
    assert!(watcher.inject(modify_event(&file)));
    assert_eq!(next_batch(&mut rx).await.records.len(), 2);

    watcher.stop();
}
