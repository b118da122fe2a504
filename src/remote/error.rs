//! Sync error types.

use thiserror::Error;

use crate::stroke::decode::FormatError;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised by the remote client and the sync pipeline.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No credential bound, or the credential lacks a user id.
    #[error("not signed in: {0}")]
    Auth(String),

    /// Server answered outside the 2xx band.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unrecognized stroke payload: {0}")]
    Format(#[from] FormatError),

    /// Stroke rejected before any request was made.
    #[error("invalid stroke: {0}")]
    InvalidStroke(String),

    /// Surface accepted by the server but its uid could not be found.
    #[error("surface created but uid not found for local id `{local_id}`")]
    Resolution { local_id: String },
}

/// Coarse classification used for logging and caller retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal for the attempted operation.
    Auth,
    /// Retryable by the caller; never retried automatically.
    Transport,
    /// Bad input shape; skipped and logged.
    Format,
    /// Terminal for one surface-creation attempt.
    Resolution,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Http { .. } | Self::Network(_) | Self::Json(_) | Self::Url(_) => {
                ErrorKind::Transport
            }
            Self::Format(_) | Self::InvalidStroke(_) => ErrorKind::Format,
            Self::Resolution { .. } => ErrorKind::Resolution,
        }
    }

    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
