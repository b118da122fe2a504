//! `[surface]` section configuration.
//!
//! Geometry used when a new surface is registered.
//!
//! # Example
//!
//! ```toml
//! [surface]
//! local_id_prefix = "arkit-plane-"
//! center = [30.0, 50.0, 60.0]
//! extent = [50.0, 20.0]
//! normal = [10.0, 20.0, 40.0]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::stroke::SurfaceDescriptor;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub local_id_prefix: String,
    pub center: [f64; 3],
    pub extent: [f64; 2],
    pub normal: [f64; 3],
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            local_id_prefix: "arkit-plane-".to_string(),
            center: [30.0, 50.0, 60.0],
            extent: [50.0, 20.0],
            normal: [10.0, 20.0, 40.0],
        }
    }
}

impl SurfaceConfig {
    /// Descriptor with `local_id`, or a fresh random one.
    pub fn descriptor(&self, local_id: Option<&str>) -> SurfaceDescriptor {
        let (center, extent, normal) = (self.center.into(), self.extent.into(), self.normal.into());
        match local_id {
            Some(id) => SurfaceDescriptor::new(id, center, extent, normal),
            None => SurfaceDescriptor::generate(&self.local_id_prefix, center, extent, normal),
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.local_id_prefix.trim().is_empty() {
            diag.error("surface.local_id_prefix", "must not be empty");
        }
    }
}
