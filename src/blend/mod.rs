//! Hotspot blending of sparse authored layers into host region maps.
//!
//! A painted pixel is authoritative at its own position. Around it, the host's
//! generated value is pulled toward the painted value with a smoothstep falloff
//! over a physical influence radius. Far from any paint the host value stays.
//! Once a tile is almost fully painted the falloff is skipped and the authored
//! values overwrite the map directly.

pub mod channel;
pub mod distance;

pub use channel::{pack_climate, unpack_climate, CellChannel, ClimateChannel, Scalar};
pub use distance::{DistanceField, SeedField};

use crate::raster::{RasterContainer, RegionTile};
use crate::remap::{self, is_painted};

/// Parameters of one blend call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendParams {
    /// Distance in blocks at which a seed stops influencing the map
    pub influence_radius: f32,
    /// Painted fraction of the inner tile at or above which blending is skipped
    pub coverage_threshold: f32,
}

impl BlendParams {
    pub fn new(influence_radius: f32, coverage_threshold: f32) -> Self {
        Self {
            influence_radius,
            coverage_threshold,
        }
    }
}

/// What a blend call did to the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlendOutcome {
    /// Layer absent from the raster; map untouched
    NoLayer,
    /// Layer present but nothing painted on this tile; map untouched
    NoSeeds,
    /// Coverage above threshold; in-coverage pixels overwritten
    Overwritten { coverage: f32 },
    /// Falloff blend from `seeds` painted pixels
    Blended { coverage: f32, seeds: usize },
}

/// Falloff weight for a physical distance: 1 at the seed, 0 at the radius.
#[inline]
pub fn falloff_weight(physical_distance: f32, radius: f32) -> f32 {
    let t = if radius > 0.0 {
        (physical_distance / radius).clamp(0.0, 1.0)
    } else {
        1.0
    };
    1.0 - (3.0 * t * t - 2.0 * t * t * t)
}

/// Move `baseline` toward `seed` by `weight`, rounded into a byte.
#[inline]
pub fn blend_value(baseline: u8, seed: u8, weight: f32) -> u8 {
    let b = baseline as f32;
    (b + (seed as f32 - b) * weight).round().clamp(0.0, 255.0) as u8
}

/// Fraction of inner pixels painted, using the raw byte test.
pub fn coverage_ratio(tile: &RegionTile, raster: &RasterContainer, layer_name: &str) -> f32 {
    let total = tile.inner_pixel_count();
    if total == 0 {
        return 0.0;
    }
    let painted = tile
        .inner_pixels()
        .filter(|p| is_painted(raster.sample_layer_raw(layer_name, p.world_x, p.world_z)))
        .count();
    painted as f32 / total as f32
}

/// Write the remapped authored value into every in-coverage pixel.
pub fn overwrite_into<C: CellChannel>(
    cells: &mut [i32],
    tile: &RegionTile,
    raster: &RasterContainer,
    layer_name: &str,
    channel: &C,
) {
    for p in tile.pixels() {
        if !raster.contains_world(p.world_x, p.world_z) {
            continue;
        }
        let raw = raster.sample_layer_raw(layer_name, p.world_x, p.world_z);
        let value = remap::remap(layer_name, raw);
        cells[p.index] = channel.write(cells[p.index], value);
    }
}

/// Blend one authored layer into one channel of a padded region map.
///
/// `cells` is the row-major padded map described by `tile`.
pub fn blend_into<C: CellChannel>(
    cells: &mut [i32],
    tile: &RegionTile,
    raster: &RasterContainer,
    layer_name: &str,
    channel: &C,
    params: &BlendParams,
) -> BlendOutcome {
    debug_assert_eq!(cells.len(), tile.pixel_count());
    if !raster.has_layer(layer_name) {
        return BlendOutcome::NoLayer;
    }

    let coverage = coverage_ratio(tile, raster, layer_name);
    if coverage >= params.coverage_threshold {
        overwrite_into(cells, tile, raster, layer_name, channel);
        return BlendOutcome::Overwritten { coverage };
    }

    let mut seeds = SeedField::new(tile.size);
    for p in tile.pixels() {
        if !raster.contains_world(p.world_x, p.world_z) {
            continue;
        }
        let raw = raster.sample_layer_raw(layer_name, p.world_x, p.world_z);
        if is_painted(raw) {
            seeds.seed(p.index, remap::remap(layer_name, raw));
        }
    }

    let seed_count = seeds.seed_count();
    if seed_count == 0 {
        return BlendOutcome::NoSeeds;
    }

    let field = DistanceField::compute(&seeds);
    let blocks_per_pixel = tile.blocks_per_pixel();

    for idx in 0..cells.len() {
        if seeds.is_seeded(idx) {
            cells[idx] = channel.write(cells[idx], seeds.values[idx]);
            continue;
        }
        let distance = field.distance[idx];
        if !distance.is_finite() {
            continue;
        }
        let baseline = channel.read(cells[idx]);
        let weight = falloff_weight(distance * blocks_per_pixel, params.influence_radius);
        let value = blend_value(baseline, field.nearest[idx], weight);
        cells[idx] = channel.write(cells[idx], value);
    }

    BlendOutcome::Blended {
        coverage,
        seeds: seed_count,
    }
}
