//! Actor System for Stroke Sync
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! ChangeWatcher --> SyncCoordinator --> StrokeDispatcher (task per stroke)
//!  (notify+decode)    (binding gate)      (HTTP)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `watcher` - File watcher with change-marker debouncing
//! - `coordinator` - Surface binding, send fan-out, runtime wiring

pub mod coordinator;
pub mod messages;
pub mod watcher;

pub use coordinator::{
    SurfaceBinding, SurfaceTarget, SyncCoordinator, SyncSession, SyncStats, run_sync,
};
