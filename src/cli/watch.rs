//! `watch` command: sync the stroke file until Ctrl+C.

use std::sync::Arc;

use anyhow::Result;

use crate::actor::{SurfaceTarget, SyncSession, run_sync};
use crate::config::SyncConfig;
use crate::logger::{status_success, status_warning};
use crate::remote::RemoteClient;

pub async fn run(
    client: Arc<RemoteClient>,
    surface: Option<&str>,
    attribution: Option<&str>,
    config: &SyncConfig,
) -> Result<()> {
    let surface = match surface {
        Some(uid) => SurfaceTarget::Existing(uid.to_string()),
        None => SurfaceTarget::Create(config.surface.descriptor(None)),
    };

    let session = SyncSession {
        client,
        file: config.watch.file_path(),
        surface,
        engine: crate::engine::select(&config.engine),
        attribution: attribution.map(str::to_string),
    };

    let stats = run_sync(session, crate::core::shutdown_receiver()).await?;
    if stats.failed > 0 || stats.dropped > 0 {
        status_warning(&stats.to_string());
    } else {
        status_success(&stats.to_string());
    }
    Ok(())
}
