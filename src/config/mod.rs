//! Configuration management for `strokesync.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── engine     # [engine]
//! │   ├── remote     # [remote] [auth] [client]
//! │   ├── surface    # [surface]
//! │   └── watch      # [watch]
//! ├── error          # ConfigError, ConfigDiagnostics
//! ├── util           # config file search, path expansion
//! └── mod.rs         # SyncConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                         |
//! |-------------|-------------------------------------------------|
//! | `[remote]`  | Store base URL and request timeout              |
//! | `[auth]`    | Identity provider key, stored email/password    |
//! | `[client]`  | Attribution name for sent strokes               |
//! | `[watch]`   | Directory and name of the watched stroke file   |
//! | `[surface]` | Geometry of surfaces registered by this client  |
//! | `[engine]`  | Rendering engine process                        |
//!
//! A missing config file is not an error: every key has a default.

mod error;
mod section;
mod util;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{
    AuthConfig, ClientConfig, EngineConfig, RemoteConfig, SurfaceConfig, WatchConfig,
};

use util::{find_config_file, resolve_dir};

use crate::cli::{Cli, Commands, StrokeCommand};
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing strokesync.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Absolute path to the config file; empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths in the file resolve against
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub surface: SurfaceConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file. The file's directory
    /// becomes the root; without a file, cwd is the root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default()
            }
        };

        config.root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());
        config.watch.dir = resolve_dir(&config.watch.dir, &config.root);
        config.apply_cli(cli, &cwd);

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// CLI values win over the file. Paths given on the command line are
    /// relative to cwd, not to the config root.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        if cli.auth.email.is_some() {
            self.auth.email.clone_from(&cli.auth.email);
        }
        if cli.auth.password.is_some() {
            self.auth.password.clone_from(&cli.auth.password);
        }

        match &cli.command {
            Commands::Watch {
                dir, file, name, ..
            } => {
                if let Some(dir) = dir {
                    self.watch.dir = resolve_dir(dir, cwd);
                }
                Self::update_option(&mut self.watch.file, file.as_ref());
                Self::update_option(&mut self.client.display_name, name.as_ref());
            }
            Commands::Stroke {
                action: StrokeCommand::Send { name, .. },
            } => {
                Self::update_option(&mut self.client.display_name, name.as_ref());
            }
            _ => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collect every problem, then fail once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.remote.validate(&mut diag);
        self.auth.validate(&mut diag);
        self.watch.validate(&mut diag);
        self.surface.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> SyncConfig {
    let (parsed, ignored) = SyncConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
