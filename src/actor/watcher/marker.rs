use std::path::PathBuf;
use std::time::SystemTime;

use crate::stroke::{Decoded, decode};

/// Last-seen modification time of the watched file.
///
/// A notification whose marker is not strictly newer is a duplicate.
#[derive(Debug, Default)]
pub(super) struct ChangeMarker {
    last: Option<SystemTime>,
}

impl ChangeMarker {
    pub(super) fn is_newer(&self, current: SystemTime) -> bool {
        self.last.is_none_or(|last| current > last)
    }

    pub(super) fn record(&mut self, current: SystemTime) {
        self.last = Some(current);
    }

}

/// One check cycle: marker, read, decode.
pub(super) struct ChangeProbe {
    path: PathBuf,
    marker: ChangeMarker,
}

impl ChangeProbe {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            marker: ChangeMarker::default(),
        }
    }

    /// Decode the file if its marker advanced.
    ///
    /// `None` means nothing to hand over this cycle: unchanged, unreadable,
    /// or not a stroke payload. None of these stop the watcher.
    pub(super) fn check(&mut self) -> Option<Decoded> {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                crate::debug!("watch"; "{} not present", self.path.display());
                return None;
            }
            Err(e) => {
                crate::log!("watch"; "cannot stat {}: {}", self.path.display(), e);
                return None;
            }
        };

        if !self.marker.is_newer(modified) {
            crate::debug!("watch"; "unchanged marker, skipping");
            return None;
        }

        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                crate::log!("watch"; "cannot read {}: {}", self.path.display(), e);
                return None;
            }
        };
        self.marker.record(modified);

        match decode(&bytes) {
            Ok(decoded) => {
                for entry in &decoded.malformed {
                    crate::log!("watch"; "skipped entry {}: {}", entry.index, entry.reason);
                }
                crate::debug!("watch"; "decoded {} stroke(s)", decoded.records.len());
                Some(decoded)
            }
            Err(e) => {
                crate::log!("watch"; "ignoring {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
