//! Rendering engine capability.
//!
//! The engine that draws strokes runs out of process. Watch mode shows it
//! while syncing and unloads it on exit. Without a configured command the
//! no-op engine is used, so the sync path never depends on a renderer.
//!
//! Messages are written to the engine's stdin as JSON lines:
//!
//! ```text
//! {"object":"Graffiti","method":"ClearAll","message":""}
//! ```

use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::EngineConfig;

/// Scene object that owns the drawn strokes.
pub const GRAFFITI_OBJECT: &str = "Graffiti";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine is not running")]
    NotRunning,

    #[error("failed to message engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode engine message: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait RenderEngine: Send {
    fn name(&self) -> &'static str;

    /// Load if needed, then bring to front. Idempotent.
    fn show(&mut self) -> Result<(), EngineError>;

    /// Release the engine. Safe when not running.
    fn unload(&mut self);

    /// Deliver `message` to `method` on scene object `object`.
    fn send(&mut self, object: &str, method: &str, message: &str) -> Result<(), EngineError>;

    fn is_running(&self) -> bool;

    fn undo(&mut self) -> Result<(), EngineError> {
        self.send(GRAFFITI_OBJECT, "Undo", "")
    }

    fn clear_all(&mut self) -> Result<(), EngineError> {
        self.send(GRAFFITI_OBJECT, "ClearAll", "")
    }
}

/// Choose the engine from configuration.
pub fn select(config: &EngineConfig) -> Box<dyn RenderEngine> {
    match config.command.split_first() {
        Some((program, rest)) => {
            let args = rest.iter().chain(&config.args).cloned().collect();
            Box::new(ProcessEngine::new(program, args))
        }
        None => Box::new(NoopEngine),
    }
}

// =============================================================================
// NoopEngine
// =============================================================================

/// Stand-in when no renderer is available. Accepts and discards everything.
#[derive(Debug, Default)]
pub struct NoopEngine;

impl RenderEngine for NoopEngine {
    fn name(&self) -> &'static str {
        "none"
    }

    fn show(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn unload(&mut self) {}

    fn send(&mut self, _object: &str, _method: &str, _message: &str) -> Result<(), EngineError> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        false
    }
}

// =============================================================================
// ProcessEngine
// =============================================================================

#[derive(Serialize)]
struct EngineMessage<'a> {
    object: &'a str,
    method: &'a str,
    message: &'a str,
}

/// Engine hosted in a child process.
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    child: Option<(Child, ChildStdin)>,
}

impl ProcessEngine {
    /// Grace period for the child to exit after its stdin closes.
    const EXIT_GRACE: Duration = Duration::from_millis(1000);

    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
            child: None,
        }
    }

    fn wait_or_kill(child: &mut Child) {
        let step = Duration::from_millis(50);
        let mut waited = Duration::ZERO;
        while waited < Self::EXIT_GRACE {
            if let Ok(Some(_)) = child.try_wait() {
                return;
            }
            std::thread::sleep(step);
            waited += step;
        }
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl RenderEngine for ProcessEngine {
    fn name(&self) -> &'static str {
        "process"
    }

    fn show(&mut self) -> Result<(), EngineError> {
        if self.is_running() {
            return Ok(());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Launch {
                command: self.program.clone(),
                source,
            })?;
        let stdin = child.stdin.take().ok_or(EngineError::NotRunning)?;

        crate::debug!("engine"; "launched {} (pid {})", self.program, child.id());
        self.child = Some((child, stdin));
        Ok(())
    }

    fn unload(&mut self) {
        let Some((mut child, stdin)) = self.child.take() else {
            return;
        };
        drop(stdin);
        Self::wait_or_kill(&mut child);
        crate::debug!("engine"; "unloaded {}", self.program);
    }

    fn send(&mut self, object: &str, method: &str, message: &str) -> Result<(), EngineError> {
        let (_, stdin) = self.child.as_mut().ok_or(EngineError::NotRunning)?;
        let mut line = serde_json::to_vec(&EngineMessage {
            object,
            method,
            message,
        })?;
        line.push(b'\n');
        stdin.write_all(&line)?;
        stdin.flush()?;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        self.unload();
    }
}
