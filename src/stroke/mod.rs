//! Stroke and surface model.
//!
//! # Module Structure
//!
//! - `mod.rs` - canonical in-memory types (this file)
//! - `wire` - JSON shapes exchanged with the remote surface store
//! - `decode` - raw local payload → `StrokeRecord` normalization
//!
//! ```text
//! strokes.json ──decode──> StrokeRecord ──wire──> POST /surface/strokes/user
//! ```

pub mod decode;
pub mod wire;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use decode::{Decoded, decode};

/// Default color for single-point strokes.
pub const DEFAULT_POINT_COLOR: &str = "Blue";
/// Default color for polyline strokes.
pub const DEFAULT_POLYLINE_COLOR: &str = "#FFFFFF";

// =============================================================================
// Vectors
// =============================================================================

/// 3-D vector, serialized as `{x, y, z}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// 2-D vector, serialized as `{x, y}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// StrokeRecord
// =============================================================================

/// Stroke shape. Exactly one variant is populated by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Vec3),
    Polyline(Vec<Vec3>),
}

impl Geometry {
    /// Number of points carried by this geometry.
    pub fn len(&self) -> usize {
        match self {
            Self::Point(_) => 1,
            Self::Polyline(points) => points.len(),
        }
    }

    /// True for a polyline without points ("missing coordinates").
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Polyline(points) if points.is_empty())
    }
}

/// Canonical stroke, independent of input or wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeRecord {
    /// Named color token or `#RRGGBB`; defaulted at send time.
    pub color: Option<String>,
    pub geometry: Geometry,
    /// Stroke width/scale; `None` leaves the server default.
    pub size: Option<f64>,
    /// Milliseconds since epoch; assigned at send time when absent.
    pub timestamp: Option<i64>,
    /// Only ever filled from server responses.
    pub server_uid: Option<String>,
}

impl StrokeRecord {
    pub fn point(color: Option<String>, at: Vec3) -> Self {
        Self {
            color,
            geometry: Geometry::Point(at),
            size: None,
            timestamp: None,
            server_uid: None,
        }
    }

    pub fn polyline(color: Option<String>, points: Vec<Vec3>, size: Option<f64>) -> Self {
        Self {
            color,
            geometry: Geometry::Polyline(points),
            size,
            timestamp: None,
            server_uid: None,
        }
    }

    /// Color to send, falling back to the per-shape default.
    pub fn color_or_default(&self) -> &str {
        match (&self.color, &self.geometry) {
            (Some(color), _) => color,
            (None, Geometry::Point(_)) => DEFAULT_POINT_COLOR,
            (None, Geometry::Polyline(_)) => DEFAULT_POLYLINE_COLOR,
        }
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match &self.geometry {
            Geometry::Point(p) => format!("1-point stroke ({},{},{})", p.x, p.y, p.z),
            Geometry::Polyline(points) => format!("polyline stroke ({} pts)", points.len()),
        }
    }
}

// =============================================================================
// SurfaceDescriptor
// =============================================================================

/// Client-side description of a surface, alive only until the server
/// assigns a durable uid.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDescriptor {
    pub local_id: String,
    pub center: Vec3,
    pub extent: Vec2,
    pub normal: Vec3,
    pub users: Option<Vec<wire::UserOnSurface>>,
}

impl SurfaceDescriptor {
    pub fn new(local_id: impl Into<String>, center: Vec3, extent: Vec2, normal: Vec3) -> Self {
        Self {
            local_id: local_id.into(),
            center,
            extent,
            normal,
            users: None,
        }
    }

    /// Descriptor whose local id is `prefix` plus a random 4-digit suffix.
    pub fn generate(prefix: &str, center: Vec3, extent: Vec2, normal: Vec3) -> Self {
        Self::new(generate_local_id(prefix), center, extent, normal)
    }
}

/// `prefix` followed by a random number in `1000..=9999`.
pub fn generate_local_id(prefix: &str) -> String {
    use rand::Rng;
    let suffix: u16 = rand::rng().random_range(1000..=9999);
    format!("{prefix}{suffix}")
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_defaults_per_shape() {
        let point = StrokeRecord::point(None, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(point.color_or_default(), "Blue");

        let line = StrokeRecord::polyline(None, vec![Vec3::new(0.0, 0.0, 0.0)], None);
        assert_eq!(line.color_or_default(), "#FFFFFF");

        let colored = StrokeRecord::point(Some("#FF3355".into()), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(colored.color_or_default(), "#FF3355");
    }

    #[test]
    fn test_empty_polyline_is_empty() {
        assert!(Geometry::Polyline(Vec::new()).is_empty());
        assert!(!Geometry::Point(Vec3::new(0.0, 0.0, 0.0)).is_empty());
        assert_eq!(Geometry::Polyline(vec![Vec3::new(0.0, 0.0, 0.0); 3]).len(), 3);
    }

    #[test]
    fn test_generated_local_id() {
        let id = generate_local_id("arkit-plane-");
        let suffix = id.strip_prefix("arkit-plane-").unwrap();
        let n: u16 = suffix.parse().unwrap();
        assert!((1000..=9999).contains(&n));
    }

    #[test]
    fn test_now_ms_is_positive() {
        assert!(now_ms() > 1_600_000_000_000);
    }
}
