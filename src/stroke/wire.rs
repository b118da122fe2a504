//! JSON shapes of the remote surface store.
//!
//! Field names follow the server (`surface_local_id`, `ts`, ...), so these
//! types stay separate from the canonical model in the parent module.

use serde::{Deserialize, Serialize};

use super::{Geometry, StrokeRecord, SurfaceDescriptor, Vec2, Vec3};

/// Stroke as the server stores it.
///
/// Point strokes use `x/y/z`, polylines use `points`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Vec3>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl StrokeData {
    /// Outgoing payload. Never carries a client-side `uid`.
    pub fn outgoing(record: &StrokeRecord, ts: i64) -> Self {
        let mut data = Self {
            uid: None,
            color: Some(record.color_or_default().to_string()),
            size: record.size,
            ts: Some(ts),
            ..Self::default()
        };
        match &record.geometry {
            Geometry::Point(p) => {
                data.x = Some(p.x);
                data.y = Some(p.y);
                data.z = Some(p.z);
            }
            Geometry::Polyline(points) => data.points = Some(points.clone()),
        }
        data
    }

    /// Canonical record, or `None` when the stored stroke has no usable geometry.
    pub fn into_record(self) -> Option<StrokeRecord> {
        let geometry = match (self.points, self.x, self.y, self.z) {
            (Some(points), ..) if !points.is_empty() => Geometry::Polyline(points),
            (_, Some(x), Some(y), Some(z)) => Geometry::Point(Vec3::new(x, y, z)),
            _ => return None,
        };
        Some(StrokeRecord {
            color: self.color,
            geometry,
            size: self.size,
            timestamp: self.ts,
            server_uid: self.uid,
        })
    }
}

/// Per-user annotations attached to a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserOnSurface {
    pub uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<StrokeData>>,
}

/// Body of `POST /surface`.
#[derive(Debug, Clone, Serialize)]
pub struct SurfacePayload<'a> {
    pub surface_local_id: &'a str,
    pub center: Vec3,
    pub extent: Vec2,
    pub normal: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<&'a [UserOnSurface]>,
}

impl<'a> From<&'a SurfaceDescriptor> for SurfacePayload<'a> {
    fn from(d: &'a SurfaceDescriptor) -> Self {
        Self {
            surface_local_id: &d.local_id,
            center: d.center,
            extent: d.extent,
            normal: d.normal,
            users: d.users.as_deref(),
        }
    }
}

/// Surface as returned by the server. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurfaceStored {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub surface_local_id: Option<String>,
    #[serde(default)]
    pub center: Option<Vec3>,
    #[serde(default)]
    pub users: Option<Vec<UserOnSurface>>,
}

#[derive(Debug, Deserialize)]
pub struct SurfaceCreateResponse {
    pub surface: SurfaceStored,
}

#[derive(Debug, Deserialize)]
pub struct SurfacesAllResponse {
    pub surfaces: Vec<SurfaceStored>,
}

#[derive(Debug, Deserialize)]
pub struct StrokesResponse {
    pub strokes: Vec<StrokeData>,
}

/// Body of `POST /surface/strokes/user`.
#[derive(Debug, Serialize)]
pub struct StrokePost<'a> {
    pub surface_id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub stroke: StrokeData,
}
