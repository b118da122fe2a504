//! Change Watcher
//!
//! Observes one stroke file and hands decoded batches to the coordinator.
//!
//! Architecture:
//! ```text
//! notify callback ──try_send──> WatchEvent queue ──> watch_loop ──Batch──> SyncCoordinator
//!                                  ^                 (marker → read → decode)
//!                       start() ───┘ Check
//! ```
//!
//! States: `Idle → Watching ⇄ Checking`, and `Stopped` from anywhere.
//! `Stopped` is terminal; a fresh watcher is needed to observe again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use super::messages::{SyncMsg, WatchEvent};

// Change marker and the per-cycle read/decode.
mod marker;

#[cfg(test)]
mod tests;

use marker::ChangeProbe;

/// Bounded queue between the OS callback and the loop.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watcher was stopped")]
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching,
    Checking,
    Stopped,
}

/// Live resources of a started watcher. Dropping them ends observation.
struct Running {
    _watcher: RecommendedWatcher,
    event_tx: mpsc::Sender<WatchEvent>,
    stop_tx: watch::Sender<bool>,
}

pub struct ChangeWatcher {
    file: PathBuf,
    sync_tx: mpsc::Sender<SyncMsg>,
    state: Arc<Mutex<WatchState>>,
    running: Mutex<Option<Running>>,
}

impl ChangeWatcher {
    pub fn new(file: PathBuf, sync_tx: mpsc::Sender<SyncMsg>) -> Self {
        Self {
            file,
            sync_tx,
            state: Arc::new(Mutex::new(WatchState::Idle)),
            running: Mutex::new(None),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn state(&self) -> WatchState {
        *self.state.lock()
    }

    /// Begin observing and run one immediate check for pre-existing content.
    ///
    /// Must be called inside a tokio runtime. Starting twice is a no-op.
    pub fn start(&self) -> Result<(), WatchError> {
        let mut running = self.running.lock();
        match self.state() {
            WatchState::Stopped => return Err(WatchError::Stopped),
            WatchState::Watching | WatchState::Checking => return Ok(()),
            WatchState::Idle => {}
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (stop_tx, stop_rx) = watch::channel(false);

        let callback_tx = event_tx.clone();
        let target = self.file.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    enqueue(&callback_tx, &target, WatchEvent::Fs(event));
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        })
        .map_err(|source| self.notify_error(source))?;

        watcher
            .watch(watch_root(&self.file), RecursiveMode::NonRecursive)
            .map_err(|source| self.notify_error(source))?;

        // Pre-existing content.
        let _ = event_tx.try_send(WatchEvent::Check);

        *self.state.lock() = WatchState::Watching;
        tokio::spawn(watch_loop(
            ChangeProbe::new(self.file.clone()),
            event_rx,
            stop_rx,
            self.sync_tx.clone(),
            Arc::clone(&self.state),
        ));

        *running = Some(Running {
            _watcher: watcher,
            event_tx,
            stop_tx,
        });
        crate::debug!("watch"; "watching {}", self.file.display());
        Ok(())
    }

    /// Stop observing. Idempotent and valid before `start`.
    ///
    /// In-flight sends are owned by the coordinator and are not cancelled.
    pub fn stop(&self) {
        let mut running = self.running.lock();
        let previous = std::mem::replace(&mut *self.state.lock(), WatchState::Stopped);
        if let Some(run) = running.take() {
            let _ = run.stop_tx.send(true);
            crate::debug!("watch"; "stopped ({:?})", previous);
        }
    }

    /// Feed a synthetic event into the loop, filtered like OS events.
    ///
    /// Returns false when not running or when a relevant event found the
    /// queue full. Unrelated events are discarded and count as accepted.
    pub fn inject(&self, event: WatchEvent) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|run| enqueue(&run.event_tx, &self.file, event))
    }

    fn notify_error(&self, source: notify::Error) -> WatchError {
        WatchError::Notify {
            path: self.file.clone(),
            source,
        }
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Directory to register with the OS: the file's parent, or `.` for bare names.
fn watch_root(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Queue `event` if it concerns `file`. Only relevant events take a slot,
/// so a full queue always holds a pending check of the target.
fn enqueue(tx: &mpsc::Sender<WatchEvent>, file: &Path, event: WatchEvent) -> bool {
    if !event.concerns(file) {
        return true;
    }
    match tx.try_send(event) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            crate::debug!("watch"; "event queue full, check already pending");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Detection loop. Reads are synchronous and local; sends happen elsewhere,
/// so a slow network never delays the next check.
async fn watch_loop(
    mut probe: ChangeProbe,
    mut event_rx: mpsc::Receiver<WatchEvent>,
    mut stop_rx: watch::Receiver<bool>,
    sync_tx: mpsc::Sender<SyncMsg>,
    state: Arc<Mutex<WatchState>>,
) {
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            event = event_rx.recv() => {
                if event.is_none() {
                    break;
                }
            }
        }

        if !transition(&state, WatchState::Watching, WatchState::Checking) {
            break;
        }
        let decoded = probe.check();
        if !transition(&state, WatchState::Checking, WatchState::Watching) {
            break;
        }

        if let Some(decoded) = decoded
            && !decoded.is_empty()
            && sync_tx.send(SyncMsg::Batch(decoded)).await.is_err()
        {
            crate::debug!("watch"; "coordinator gone, leaving loop");
            break;
        }
    }
}

/// Compare-and-set on the shared state. Fails once stopped.
fn transition(state: &Mutex<WatchState>, from: WatchState, to: WatchState) -> bool {
    let mut state = state.lock();
    if *state != from {
        return false;
    }
    *state = to;
    true
}
