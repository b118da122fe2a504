//! Stroke delivery and read-back.

use std::sync::Arc;

use super::{Auth, RemoteClient, Result, SyncError};
use crate::stroke::wire::{StrokeData, StrokePost, StrokesResponse};
use crate::stroke::{StrokeRecord, now_ms};

/// Sends normalized strokes to a bound surface.
///
/// Every call is independent: no ordering between strokes, no retry. The
/// caller decides whether to fan sends out concurrently.
#[derive(Clone)]
pub struct StrokeDispatcher {
    client: Arc<RemoteClient>,
}

impl StrokeDispatcher {
    pub fn new(client: Arc<RemoteClient>) -> Self {
        Self { client }
    }

    /// `POST /surface/strokes/user`.
    ///
    /// `attribution` overrides the client display name.
    pub async fn send(
        &self,
        surface_uid: &str,
        record: &StrokeRecord,
        attribution: Option<&str>,
    ) -> Result<()> {
        if record.geometry.is_empty() {
            return Err(SyncError::InvalidStroke("missing coordinates".into()));
        }
        if surface_uid.is_empty() {
            return Err(SyncError::InvalidStroke("no surface bound".into()));
        }
        let credentials = self.client.credentials()?;

        let ts = record.timestamp.unwrap_or_else(now_ms);
        let name = match attribution {
            Some(name) => name.to_string(),
            None => self.client.display_name(),
        };
        let body = StrokePost {
            surface_id: surface_uid,
            user_id: &credentials.user_id,
            name: &name,
            stroke: StrokeData::outgoing(record, ts),
        };

        self.client
            .post_json("surface/strokes/user", &body, Auth::Bearer)
            .await?;
        crate::debug!("sync"; "sent {} to {}", record.describe(), surface_uid);
        Ok(())
    }

    /// `GET /surface/{surface}/user/{user}/strokes`, defaulting to the signed-in user.
    ///
    /// Both ids are sent as single encoded path segments.
    pub async fn user_strokes(
        &self,
        surface_uid: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<StrokeRecord>> {
        let user_id = match user_id {
            Some(uid) => uid.to_string(),
            None => self.client.credentials()?.user_id.clone(),
        };
        let url = self
            .client
            .endpoint_segments(&["surface", surface_uid, "user", user_id.as_str(), "strokes"])?;
        let resp: StrokesResponse = self.client.get_json_at(url).await?;
        Ok(resp
            .strokes
            .into_iter()
            .filter_map(StrokeData::into_record)
            .collect())
    }
}
