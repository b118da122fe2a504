//! Surface registration.
//!
//! ```text
//! POST /surface ──uid in body?──yes──> uid
//!                      │
//!                      no
//!                      ▼
//! GET /surface/all ──match surface_local_id──> uid | ResolutionError
//! ```
//!
//! The store does not always echo the created uid, so the registrar pays one
//! extra round trip to recover it by the client-generated local id.

use std::sync::Arc;

use super::{Auth, RemoteClient, Result, SyncError};
use crate::stroke::SurfaceDescriptor;
use crate::stroke::wire::{
    SurfaceCreateResponse, SurfacePayload, SurfaceStored, SurfacesAllResponse,
};

pub struct SurfaceRegistrar {
    client: Arc<RemoteClient>,
}

impl SurfaceRegistrar {
    pub fn new(client: Arc<RemoteClient>) -> Self {
        Self { client }
    }

    /// Create a surface and resolve its durable uid.
    pub async fn create_surface(&self, descriptor: &SurfaceDescriptor) -> Result<String> {
        // Fail before any request when unauthenticated.
        self.client.credentials()?;

        let body = self
            .client
            .post_json("surface", &SurfacePayload::from(descriptor), Auth::Bearer)
            .await?;

        if let Some(uid) = uid_from_create_response(&body) {
            crate::debug!("surface"; "created {} -> {}", descriptor.local_id, uid);
            return Ok(uid);
        }

        crate::debug!("surface"; "create response without uid, looking up {}", descriptor.local_id);
        self.find_surface_uid(&descriptor.local_id)
            .await?
            .ok_or_else(|| SyncError::Resolution {
                local_id: descriptor.local_id.clone(),
            })
    }

    /// Look up a surface uid by its client-generated local id.
    pub async fn find_surface_uid(&self, local_id: &str) -> Result<Option<String>> {
        let surfaces = self.list_surfaces().await?;
        Ok(surfaces
            .into_iter()
            .find(|s| s.surface_local_id.as_deref() == Some(local_id))
            .and_then(|s| s.uid)
            .filter(|uid| !uid.is_empty()))
    }

    /// `GET /surface/all`.
    pub async fn list_surfaces(&self) -> Result<Vec<SurfaceStored>> {
        let resp: SurfacesAllResponse = self.client.get_json("surface/all").await?;
        Ok(resp.surfaces)
    }
}

/// Non-empty `surface.uid` from a create response, tolerating any body shape.
fn uid_from_create_response(body: &str) -> Option<String> {
    serde_json::from_str::<SurfaceCreateResponse>(body)
        .ok()?
        .surface
        .uid
        .filter(|uid| !uid.is_empty())
}
