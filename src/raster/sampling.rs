//! World-coordinate sampling of a raster.
//!
//! All sampling functions are total: coordinates outside the raster clamp to
//! the nearest edge pixel (heights) or read as unpainted (layers).

use super::RasterContainer;
use crate::remap::{self, LayerKind};

impl RasterContainer {
    /// True iff `(x, z)` lies inside the coverage rectangle.
    #[inline]
    pub fn contains_world(&self, x: i32, z: i32) -> bool {
        self.coverage().contains(x, z)
    }

    /// Shift the origin. Only the first call has an effect; later calls are
    /// ignored with a warning because sampling may already have happened.
    pub fn apply_offset(&mut self, dx: i32, dz: i32) -> bool {
        if self.offset_applied {
            log::warn!("Raster offset already applied, ignoring ({}, {})", dx, dz);
            return false;
        }
        self.origin_x += dx;
        self.origin_z += dz;
        self.offset_applied = true;
        log::info!(
            "Raster origin moved by ({}, {}) to ({}, {})",
            dx,
            dz,
            self.origin_x,
            self.origin_z
        );
        true
    }

    /// Offset that centers the raster inside a host world of the given size.
    ///
    /// Per axis: `clamp((host - raster) / 2, 0, max(0, host - raster)) - origin`.
    pub fn centering_offset(&self, host_size_x: i32, host_size_z: i32) -> (i32, i32) {
        (
            centered_axis(host_size_x, self.width) - self.origin_x,
            centered_axis(host_size_z, self.height) - self.origin_z,
        )
    }

    /// Authoritative world height at a column.
    ///
    /// Out-of-range columns read the nearest edge pixel. The stored value is
    /// clamped to `[1, world_height - 2]`.
    pub fn sample_height(&self, x: i32, z: i32, world_height: i32) -> i32 {
        let px = (x - self.origin_x).clamp(0, self.width - 1);
        let pz = (z - self.origin_z).clamp(0, self.height - 1);
        let raw = self.height_at_pixel(px, pz) as i32;
        raw.clamp(1, (world_height - 2).max(1))
    }

    /// Raw layer byte at a world column; 0 when the layer is absent or the
    /// column is outside coverage.
    pub fn sample_layer_raw(&self, layer_name: &str, x: i32, z: i32) -> u8 {
        if !self.contains_world(x, z) {
            return 0;
        }
        match self.layer(layer_name) {
            Some(layer) => layer.get(x - self.origin_x, z - self.origin_z),
            None => 0,
        }
    }

    /// Layer byte rescaled to the full byte range.
    pub fn sample_layer(&self, kind: LayerKind, x: i32, z: i32) -> u8 {
        remap::remap(kind.name(), self.sample_layer_raw(kind.name(), x, z))
    }
}

fn centered_axis(host: i32, raster: i32) -> i32 {
    let free = host - raster;
    (free / 2).clamp(0, free.max(0))
}
