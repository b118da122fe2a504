//! `surface create` and `surface list`.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::SurfaceCommand;
use crate::config::SyncConfig;
use crate::logger::status_success;
use crate::remote::{RemoteClient, SurfaceRegistrar};
use crate::stroke::wire::SurfaceStored;

pub async fn run(
    client: &Arc<RemoteClient>,
    action: &SurfaceCommand,
    config: &SyncConfig,
) -> Result<()> {
    let registrar = SurfaceRegistrar::new(Arc::clone(client));

    match action {
        SurfaceCommand::Create { local_id } => {
            let descriptor = config.surface.descriptor(local_id.as_deref());
            let uid = registrar
                .create_surface(&descriptor)
                .await
                .with_context(|| format!("failed to register surface {}", descriptor.local_id))?;
            println!("{uid}");
            status_success(&format!("surface {} -> {}", descriptor.local_id, uid));
        }
        SurfaceCommand::List => {
            let surfaces = registrar.list_surfaces().await?;
            for surface in &surfaces {
                println!("{}", format_row(surface));
            }
            status_success(&format!("{} surface(s)", surfaces.len()));
        }
    }
    Ok(())
}

/// `uid  local_id  center  users`, with `-` for anything the store omitted.
fn format_row(surface: &SurfaceStored) -> String {
    let center = surface
        .center
        .map_or_else(|| "-".to_string(), |c| format!("({}, {}, {})", c.x, c.y, c.z));
    let users = surface.users.as_ref().map_or(0, Vec::len);
    format!(
        "{}  {}  {}  {} user(s)",
        surface.uid.as_deref().unwrap_or("-"),
        surface.surface_local_id.as_deref().unwrap_or("-"),
        center,
        users
    )
}
