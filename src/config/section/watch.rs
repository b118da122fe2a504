//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! dir = "~/Documents"      # Directory the producer writes into
//! file = "strokes.json"    # File name inside `dir`
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub dir: PathBuf,
    pub file: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file: "strokes.json".to_string(),
        }
    }
}

impl WatchConfig {
    /// Full path of the watched file.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let bare = Path::new(&self.file)
            .file_name()
            .is_some_and(|name| name == self.file.as_str());
        if !bare {
            diag.error_with_hint(
                "watch.file",
                format!("`{}` is not a bare file name", self.file),
                "put the directory in `watch.dir`",
            );
        }
    }
}
