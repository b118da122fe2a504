//! Shutdown state.
//!
//! Ctrl+C sets `SHUTDOWN` and notifies whoever took a receiver. With no
//! receiver taken (one-shot commands) the process exits at once. A second
//! Ctrl+C during a graceful shutdown also exits at once.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// A long-running session is listening for shutdown
static LISTENING: AtomicBool = AtomicBool::new(false);

static SHUTDOWN_CHANNEL: LazyLock<(Sender<()>, Receiver<()>)> =
    LazyLock::new(|| channel::bounded(1));

/// Setup the global Ctrl+C handler. Call once at program start
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(on_interrupt)
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

fn on_interrupt() {
    let repeated = SHUTDOWN.swap(true, Ordering::SeqCst);

    if repeated || !LISTENING.load(Ordering::SeqCst) {
        std::process::exit(130);
    }

    crate::log!("sync"; "shutting down...");
    let _ = SHUTDOWN_CHANNEL.0.try_send(());
}

/// Receiver signalled on Ctrl+C. Taking one opts into graceful shutdown.
pub fn shutdown_receiver() -> Receiver<()> {
    LISTENING.store(true, Ordering::SeqCst);
    SHUTDOWN_CHANNEL.1.clone()
}
