//! Authored raster: one dense 16-bit height grid plus named 8-bit control layers.
//!
//! The container is decoded once at startup. Its origin may be shifted once by
//! a centering offset before any sampling happens; after that it is shared
//! read-only by every generation handler.

pub mod codec;
pub mod sampling;
pub mod tile;

use std::collections::BTreeMap;

pub use codec::{decode, encode, load, save, HEADER_SIZE, LAYER_GROUP_TAG, MAGIC, VERSION};
pub use tile::{RegionTile, TilePixel};

/// One named 8-bit control layer, same dimensions as its container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    /// Name as stored in the file (lookups ignore case)
    pub name: String,
    /// Reserved flags byte, preserved on save
    pub flags: u8,
    pub width: i32,
    pub height: i32,
    /// Row-major (z, x) values
    pub data: Vec<u8>,
}

impl Layer {
    pub fn new(name: impl Into<String>, width: i32, height: i32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width.max(0) * height.max(0)) as usize);
        Self {
            name: name.into(),
            flags: 0,
            width,
            height,
            data,
        }
    }

    /// Layer filled with a single value.
    pub fn filled(name: impl Into<String>, width: i32, height: i32, value: u8) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        Self::new(name, width, height, vec![value; len])
    }

    #[inline]
    pub fn get(&self, x: i32, z: i32) -> u8 {
        self.data[(z * self.width + x) as usize]
    }

    pub fn set(&mut self, x: i32, z: i32, value: u8) {
        let idx = (z * self.width + x) as usize;
        self.data[idx] = value;
    }
}

/// World-aligned area an authored raster applies to.
///
/// Half-open: `[min_x, min_x + width) × [min_z, min_z + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverageRect {
    pub min_x: i32,
    pub min_z: i32,
    pub width: i32,
    pub height: i32,
}

impl CoverageRect {
    pub fn new(min_x: i32, min_z: i32, width: i32, height: i32) -> Self {
        Self {
            min_x,
            min_z,
            width,
            height,
        }
    }

    /// Exclusive upper x bound
    pub fn max_x(&self) -> i32 {
        self.min_x + self.width
    }

    /// Exclusive upper z bound
    pub fn max_z(&self) -> i32 {
        self.min_z + self.height
    }

    #[inline]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x < self.max_x() && z >= self.min_z && z < self.max_z()
    }

    /// Overlap test against an inclusive block rectangle `[x0, x1] × [z0, z1]`.
    pub fn intersects_inclusive(&self, x0: i32, z0: i32, x1: i32, z1: i32) -> bool {
        let last_x = self.max_x() - 1;
        let last_z = self.max_z() - 1;
        x0 <= last_x && x1 >= self.min_x && z0 <= last_z && z1 >= self.min_z
    }

    /// Grow outward by `margin` blocks on every side.
    pub fn expanded(&self, margin: i32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_z: self.min_z - margin,
            width: self.width + 2 * margin,
            height: self.height + 2 * margin,
        }
    }

    /// Smallest chunk-aligned rectangle containing this one, in chunk units:
    /// `(min_cx, min_cz, max_cx_exclusive, max_cz_exclusive)`.
    pub fn chunk_bounds(&self, chunk_size: i32) -> (i32, i32, i32, i32) {
        (
            self.min_x.div_euclid(chunk_size),
            self.min_z.div_euclid(chunk_size),
            (self.max_x() + chunk_size - 1).div_euclid(chunk_size),
            (self.max_z() + chunk_size - 1).div_euclid(chunk_size),
        )
    }
}

/// Decoded raster file contents.
#[derive(Clone, Debug)]
pub struct RasterContainer {
    pub version: u8,
    pub width: i32,
    pub height: i32,
    pub origin_x: i32,
    pub origin_z: i32,
    /// Observed height range, metadata only
    pub sample_min: u16,
    pub sample_max: u16,
    heights: Vec<u16>,
    /// Keyed by lowercased layer name
    layers: BTreeMap<String, Layer>,
    offset_applied: bool,
}

impl RasterContainer {
    /// Build a container from a height grid. Panics in debug builds if the
    /// grid does not match the dimensions.
    pub fn new(width: i32, height: i32, origin_x: i32, origin_z: i32, heights: Vec<u16>) -> Self {
        debug_assert_eq!(heights.len(), (width.max(0) * height.max(0)) as usize);
        let sample_min = heights.iter().copied().min().unwrap_or(0);
        let sample_max = heights.iter().copied().max().unwrap_or(0);
        Self {
            version: VERSION,
            width,
            height,
            origin_x,
            origin_z,
            sample_min,
            sample_max,
            heights,
            layers: BTreeMap::new(),
            offset_applied: false,
        }
    }

    /// Container with every cell at the same height.
    pub fn uniform(width: i32, height: i32, origin_x: i32, origin_z: i32, value: u16) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        Self::new(width, height, origin_x, origin_z, vec![value; len])
    }

    pub fn heights(&self) -> &[u16] {
        &self.heights
    }

    /// Raw stored height at pixel coordinates, no clamping.
    #[inline]
    pub fn height_at_pixel(&self, px: i32, pz: i32) -> u16 {
        self.heights[(pz * self.width + px) as usize]
    }

    pub fn set_height_at_pixel(&mut self, px: i32, pz: i32, value: u16) {
        let idx = (pz * self.width + px) as usize;
        self.heights[idx] = value;
        self.sample_min = self.sample_min.min(value);
        self.sample_max = self.sample_max.max(value);
    }

    /// Add or replace a layer. Returns `false` and leaves the container
    /// unchanged when the layer dimensions do not match.
    pub fn insert_layer(&mut self, layer: Layer) -> bool {
        if layer.width != self.width || layer.height != self.height {
            return false;
        }
        self.layers.insert(layer.name.to_ascii_lowercase(), layer);
        true
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(&name.to_ascii_lowercase())
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layer(name).is_some()
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn coverage(&self) -> CoverageRect {
        CoverageRect::new(self.origin_x, self.origin_z, self.width, self.height)
    }

    pub fn offset_applied(&self) -> bool {
        self.offset_applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_is_half_open() {
        let rect = CoverageRect::new(-10, 20, 100, 50);
        assert!(rect.contains(-10, 20));
        assert!(rect.contains(89, 69));
        assert!(!rect.contains(90, 30));
        assert!(!rect.contains(-11, 30));
        assert!(!rect.contains(0, 19));
        assert!(!rect.contains(0, 70));
    }

    #[test]
    fn test_intersects_inclusive() {
        let rect = CoverageRect::new(0, 0, 256, 256);
        assert!(rect.intersects_inclusive(224, 224, 255, 255));
        assert!(rect.intersects_inclusive(255, 0, 300, 31));
        assert!(!rect.intersects_inclusive(256, 0, 287, 31));
        assert!(!rect.intersects_inclusive(-32, -32, -1, -1));
        assert!(rect.intersects_inclusive(-32, -32, 0, 0));
    }

    #[test]
    fn test_chunk_bounds_round_outward() {
        let rect = CoverageRect::new(-5, 10, 70, 22);
        assert_eq!(rect.chunk_bounds(32), (-1, 0, 3, 1));
    }

    #[test]
    fn test_layer_dimension_mismatch_rejected() {
        let mut raster = RasterContainer::uniform(4, 4, 0, 0, 10);
        assert!(!raster.insert_layer(Layer::filled("water_ocean", 3, 4, 1)));
        assert!(raster.insert_layer(Layer::filled("Water_Ocean", 4, 4, 1)));
        assert!(raster.has_layer("WATER_OCEAN"));
        assert_eq!(raster.layer("water_ocean").map(|l| l.name.as_str()), Some("Water_Ocean"));
    }

    #[test]
    fn test_sample_bounds_tracked() {
        let mut raster = RasterContainer::new(2, 1, 0, 0, vec![50, 70]);
        assert_eq!((raster.sample_min, raster.sample_max), (50, 70));
        raster.set_height_at_pixel(1, 0, 200);
        assert_eq!(raster.sample_max, 200);
    }
}
