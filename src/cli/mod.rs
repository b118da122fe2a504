//! Command-line interface module.

mod args;
pub mod auth;
pub mod stroke;
pub mod surface;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;

use crate::config::SyncConfig;
use crate::remote::RemoteClient;

pub use args::{AuthArgs, Cli, Commands, StrokeCommand, StrokeInput, SurfaceCommand};

/// Run the selected command against one shared client.
pub async fn dispatch(cli: &Cli, config: &SyncConfig) -> Result<()> {
    let client = Arc::new(RemoteClient::from_config(config)?);

    match &cli.command {
        Commands::Register { name } => auth::register(&client, name, config).await,
        Commands::SignIn => auth::sign_in(&client, &cli.auth, config).await,
        Commands::Surface { action } => {
            auth::authenticate(&client, &cli.auth, config).await?;
            surface::run(&client, action, config).await
        }
        Commands::Stroke { action } => {
            auth::authenticate(&client, &cli.auth, config).await?;
            stroke::run(&client, action).await
        }
        Commands::Watch { surface, name, .. } => {
            auth::authenticate(&client, &cli.auth, config).await?;
            watch::run(client, surface.as_deref(), name.as_deref(), config).await
        }
    }
}
