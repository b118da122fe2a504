//! Sync Coordinator - gates dispatch on the surface binding
//!
//! The coordinator:
//! - Holds the surface binding
//! - Turns decoded batches into one send task per stroke
//! - Reaps finished sends and logs each failure on its own
//!
//! Sends are unordered and independent. Shutdown stops accepting batches
//! and then waits for every in-flight send.

mod binding;
mod runtime;

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use super::messages::SyncMsg;
use crate::remote::{Result as RemoteResult, StrokeDispatcher};
use crate::stroke::{Decoded, StrokeRecord};

pub use binding::SurfaceBinding;
pub use runtime::{SurfaceTarget, SyncSession, run_sync};

/// Counters printed when a session ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub decoded: usize,
    pub malformed: usize,
    /// Records that arrived while no surface was bound.
    pub dropped: usize,
    pub sent: usize,
    pub failed: usize,
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sent, {} failed, {} dropped, {} malformed",
            self.sent, self.failed, self.dropped, self.malformed
        )
    }
}

/// Result of one send task: the stroke description and its outcome.
type SendOutcome = (String, RemoteResult<()>);

pub struct SyncCoordinator {
    binding: Arc<SurfaceBinding>,
    dispatcher: StrokeDispatcher,
    attribution: Option<Arc<str>>,
    sends: JoinSet<SendOutcome>,
    stats: SyncStats,
}

impl SyncCoordinator {
    pub fn new(dispatcher: StrokeDispatcher, binding: Arc<SurfaceBinding>) -> Self {
        Self {
            binding,
            dispatcher,
            attribution: None,
            sends: JoinSet::new(),
            stats: SyncStats::default(),
        }
    }

    /// Attribution name for every stroke, instead of the client display name.
    pub fn with_attribution(mut self, name: &str) -> Self {
        self.attribution = Some(Arc::from(name));
        self
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Bind the target surface. Rebinding starts a new surface.
    pub fn bind(&self, uid: &str) {
        if let Some(previous) = self.binding.bind(uid) {
            crate::log!("surface"; "rebound {} -> {}", previous, uid);
        } else {
            crate::debug!("surface"; "bound {}", uid);
        }
    }

    /// Queue one send per record. Returns how many were queued.
    ///
    /// Without a binding every record is dropped with a diagnostic; dropped
    /// records are never replayed.
    pub fn on_decoded_batch(&mut self, records: Vec<StrokeRecord>) -> usize {
        self.reap();

        let Some(surface) = self.binding.current() else {
            for record in &records {
                crate::log!("sync"; "no surface bound, dropping {}", record.describe());
            }
            self.stats.dropped += records.len();
            return 0;
        };

        let queued = records.len();
        for record in records {
            let dispatcher = self.dispatcher.clone();
            let surface = Arc::clone(&surface);
            let attribution = self.attribution.clone();
            self.sends.spawn(async move {
                let result = dispatcher
                    .send(&surface, &record, attribution.as_deref())
                    .await;
                (record.describe(), result)
            });
        }
        crate::debug!("sync"; "queued {} send(s), {} in flight", queued, self.sends.len());
        queued
    }

    /// Count a decoded batch, then queue its sends.
    pub fn on_batch(&mut self, decoded: Decoded) {
        self.stats.decoded += decoded.records.len();
        self.stats.malformed += decoded.malformed.len();
        self.on_decoded_batch(decoded.records);
    }

    /// Collect finished sends without waiting.
    pub fn reap(&mut self) {
        while let Some(joined) = self.sends.try_join_next() {
            self.record(joined);
        }
    }

    /// Wait for every in-flight send.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.sends.join_next().await {
            self.record(joined);
        }
    }

    fn record(&mut self, joined: Result<SendOutcome, JoinError>) {
        match joined {
            Ok((stroke, Ok(()))) => {
                self.stats.sent += 1;
                crate::log!("sync"; "sent {}", stroke);
            }
            Ok((stroke, Err(e))) => {
                self.stats.failed += 1;
                crate::log!("error"; "{} not sent ({:?}): {}", stroke, e.kind(), e);
            }
            Err(e) => {
                self.stats.failed += 1;
                crate::log!("error"; "send task aborted: {}", e);
            }
        }
    }

    /// Actor loop. Returns the final counters after draining.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SyncMsg>) -> SyncStats {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(SyncMsg::Batch(decoded)) => self.on_batch(decoded),
                    Some(SyncMsg::Bind(uid)) => self.bind(&uid),
                    Some(SyncMsg::Shutdown) | None => break,
                },
                Some(joined) = self.sends.join_next(), if !self.sends.is_empty() => {
                    self.record(joined);
                }
            }
        }

        if !self.sends.is_empty() {
            crate::debug!("sync"; "waiting for {} in-flight send(s)", self.sends.len());
        }
        self.drain().await;
        self.stats
    }
}
