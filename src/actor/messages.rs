//! Actor Message Definitions
//!
//! ```text
//! ChangeWatcher --Batch--> SyncCoordinator --send--> StrokeDispatcher
//!                              ^
//!                runtime ------+ Bind / Shutdown
//! ```

use crate::stroke::Decoded;

/// Messages to the SyncCoordinator.
#[derive(Debug)]
pub enum SyncMsg {
    /// Records decoded from one detected change, plus skipped entries.
    Batch(Decoded),
    /// Bind (or rebind) the surface strokes are sent to.
    Bind(String),
    /// Stop accepting batches and wait for in-flight sends.
    Shutdown,
}

/// Events consumed by the ChangeWatcher loop.
#[derive(Debug)]
pub enum WatchEvent {
    /// Raw OS notification.
    Fs(notify::Event),
    /// Unconditional check, used at start and for synthetic triggers.
    Check,
}

impl WatchEvent {
    /// Whether this event may concern `file`.
    ///
    /// Metadata-only changes are ignored, they follow every read on some
    /// platforms and would cause spurious checks.
    pub fn concerns(&self, file: &std::path::Path) -> bool {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match self {
            Self::Check => true,
            Self::Fs(event) => {
                let kind_ok = match event.kind {
                    EventKind::Create(_) | EventKind::Any => true,
                    EventKind::Modify(ModifyKind::Metadata(_)) => false,
                    EventKind::Modify(_) => true,
                    _ => false,
                };
                kind_ok && event.paths.iter().any(|p| p.file_name() == file.file_name())
            }
        }
    }
}
