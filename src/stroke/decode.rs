//! Raw stroke payload decoding.
//!
//! The local producer writes either one stroke object or an array of them:
//!
//! ```text
//! { "color":"Blue", "x":30, "y":50, "z":50, "size":0.015, "ts":1712345678901 }
//! { "color":"#FF3355", "points":[{"x":..,"y":..,"z":..}, ...], "size":0.015 }
//! ```
//!
//! Entries are normalized one at a time, so a bad entry never discards its
//! siblings. Only a payload that is neither an object nor an array fails.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{Geometry, StrokeRecord, Vec3};

/// Payload is not a stroke object or a list of stroke objects.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a stroke object or an array of strokes, found {0}")]
    Shape(&'static str),
}

/// A single skipped entry in an otherwise accepted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEntry {
    /// Position in the payload (0 for a single-object payload).
    pub index: usize,
    pub reason: String,
}

/// Decode outcome: accepted records plus per-entry diagnostics.
#[derive(Debug, Default)]
pub struct Decoded {
    pub records: Vec<StrokeRecord>,
    pub malformed: Vec<MalformedEntry>,
}

impl Decoded {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.malformed.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStroke {
    color: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    size: Option<f64>,
    ts: Option<i64>,
    points: Option<Vec<RawPoint>>,
}

/// Decode raw bytes into zero or more strokes.
pub fn decode(bytes: &[u8]) -> Result<Decoded, FormatError> {
    let value: Value = serde_json::from_slice(bytes)?;

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        Value::Null => return Err(FormatError::Shape("null")),
        Value::Bool(_) => return Err(FormatError::Shape("a boolean")),
        Value::Number(_) => return Err(FormatError::Shape("a number")),
        Value::String(_) => return Err(FormatError::Shape("a string")),
    };

    let mut decoded = Decoded::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match normalize(entry) {
            Ok(record) => decoded.records.push(record),
            Err(reason) => decoded.malformed.push(MalformedEntry { index, reason }),
        }
    }
    Ok(decoded)
}

/// Normalize one raw entry.
///
/// Polyline wins over point when both are present; points missing a
/// coordinate are dropped, and a polyline left without points is rejected.
fn normalize(entry: Value) -> Result<StrokeRecord, String> {
    let raw = RawStroke::deserialize(entry).map_err(|e| e.to_string())?;

    let geometry = match (raw.points, raw.x, raw.y, raw.z) {
        (Some(points), ..) if !points.is_empty() => {
            let total = points.len();
            let points: Vec<Vec3> = points
                .into_iter()
                .filter_map(|p| Some(Vec3::new(p.x?, p.y?, p.z?)))
                .collect();
            if points.is_empty() {
                return Err(format!("all {total} polyline points missing coordinates"));
            }
            Geometry::Polyline(points)
        }
        (_, Some(x), Some(y), Some(z)) => Geometry::Point(Vec3::new(x, y, z)),
        _ => return Err("stroke missing coordinates".to_string()),
    };

    Ok(StrokeRecord {
        color: raw.color,
        geometry,
        size: raw.size,
        timestamp: raw.ts,
        server_uid: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_point() {
        let decoded = decode(br#"{"color":"Blue","x":30,"y":50,"z":50}"#).unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert!(decoded.malformed.is_empty());

        let record = &decoded.records[0];
        assert_eq!(record.color.as_deref(), Some("Blue"));
        assert_eq!(record.geometry, Geometry::Point(Vec3::new(30.0, 50.0, 50.0)));
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_polyline_point_count() {
        let decoded = decode(
            br##"{"color":"#FF3355","size":0.015,"points":[
                {"x":0,"y":1,"z":-1},{"x":0.02,"y":1,"z":-1},{"x":0.04,"y":1,"z":-1}]}"##,
        )
        .unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].geometry.len(), 3);
        assert_eq!(decoded.records[0].size, Some(0.015));
    }

    #[test]
    fn test_polyline_filters_bad_points() {
        let decoded =
            decode(br#"{"points":[{"x":0,"y":1,"z":2},{"x":5,"y":6},{"x":1,"y":1,"z":1}]}"#)
                .unwrap();
        assert_eq!(decoded.records[0].geometry.len(), 2);
    }

    #[test]
    fn test_points_take_precedence_over_xyz() {
        let decoded = decode(br#"{"x":1,"y":2,"z":3,"points":[{"x":0,"y":0,"z":0}]}"#).unwrap();
        assert!(matches!(decoded.records[0].geometry, Geometry::Polyline(_)));
    }

    #[test]
    fn test_empty_points_is_malformed() {
        let decoded = decode(br#"{"points":[]}"#).unwrap();
        assert!(decoded.records.is_empty());
        assert_eq!(decoded.malformed.len(), 1);
        assert_eq!(decoded.malformed[0].index, 0);
    }

    #[test]
    fn test_empty_points_falls_back_to_xyz() {
        let decoded = decode(br#"{"points":[],"x":1,"y":2,"z":3}"#).unwrap();
        assert_eq!(decoded.records[0].geometry, Geometry::Point(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_missing_coordinates_dropped() {
        let decoded = decode(br#"{"color":"Blue","x":1,"y":2}"#).unwrap();
        assert!(decoded.records.is_empty());
        assert_eq!(decoded.malformed.len(), 1);
    }

    #[test]
    fn test_batch_keeps_siblings() {
        let decoded = decode(
            br#"[
                {"x":1,"y":2,"z":3},
                {"color":"Red"},
                {"x":"not a number","y":2,"z":3},
                {"points":[{"x":0,"y":0,"z":0}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(decoded.records.len(), 2);
        let indices: Vec<_> = decoded.malformed.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_empty_array() {
        let decoded = decode(b"[]").unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_unrecognized_payload() {
        assert!(matches!(decode(b"\"hello\""), Err(FormatError::Shape(_))));
        assert!(matches!(decode(b"42"), Err(FormatError::Shape(_))));
        assert!(matches!(decode(b"{not json"), Err(FormatError::Json(_))));
    }

    #[test]
    fn test_source_timestamp_kept() {
        let decoded = decode(br#"{"x":1,"y":2,"z":3,"ts":1712345678901}"#).unwrap();
        assert_eq!(decoded.records[0].timestamp, Some(1_712_345_678_901));
    }
}
