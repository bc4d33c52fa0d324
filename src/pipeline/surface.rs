//! Vegetation-pass handlers: height reconciliation, erasure outside coverage
//! and beach placement.

use crate::host::{ChunkColumn, AIR, NO_FLUID};
use crate::remap::LayerKind;

use super::{columns, OverlayState};

/// Beach control values above this byte enable beach placement.
pub const BEACH_MIDPOINT: u8 = 127;

/// Raise both height maps to what the host stages actually built.
///
/// One downward scan per column finds the first occupied cell (rain surface)
/// and the first non-permeable solid cell (ground). Stored heights are only
/// ever raised.
pub fn reconcile_heights(_state: &OverlayState, chunk: &mut dyn ChunkColumn) {
    let top = chunk.world_height() - 1;
    let mut y_max = chunk.y_max();
    for (lx, lz, _, _) in columns(chunk) {
        let mut surface = None;
        let mut ground = None;
        for y in (0..=top).rev() {
            let block = chunk.block(lx, y, lz);
            if block == AIR {
                continue;
            }
            surface.get_or_insert(y);
            if !chunk.is_permeable(block) {
                ground = Some(y);
                break;
            }
        }

        if let Some(y) = surface {
            let rain = chunk.rain_height(lx, lz).max(y as u16);
            chunk.set_rain_height(lx, lz, rain);
            y_max = y_max.max(rain);
        }
        if let Some(y) = ground {
            let height = chunk.terrain_height(lx, lz).max(y as u16);
            chunk.set_terrain_height(lx, lz, height);
            y_max = y_max.max(height);
        }
    }
    chunk.set_y_max(y_max);
}

/// Clear every column outside coverage down to the world floor.
pub fn erase_outside(state: &OverlayState, chunk: &mut dyn ChunkColumn) {
    if state.chunk_fully_covered(chunk) {
        return;
    }
    let height = chunk.world_height();
    let mut erased = 0usize;
    for (lx, lz, wx, wz) in columns(chunk) {
        if state.raster.contains_world(wx, wz) {
            continue;
        }
        for y in 1..height {
            if chunk.block(lx, y, lz) != AIR {
                chunk.set_block(lx, y, lz, AIR);
            }
            if chunk.fluid(lx, y, lz) != NO_FLUID {
                chunk.set_fluid(lx, y, lz, NO_FLUID);
            }
        }
        chunk.set_terrain_height(lx, lz, 0);
        chunk.set_rain_height(lx, lz, 0);
        erased += 1;
    }
    if erased == 0 {
        return;
    }

    let y_max = columns(chunk)
        .map(|(lx, lz, _, _)| chunk.terrain_height(lx, lz).max(chunk.rain_height(lx, lz)))
        .max()
        .unwrap_or(0);
    chunk.set_y_max(y_max);
    chunk.mark_modified();
    log::debug!(
        "Chunk ({}, {}): erased {} columns outside coverage",
        chunk.chunk_x(),
        chunk.chunk_z(),
        erased
    );
}

/// Place beach material around sea level next to water.
///
/// A covered column qualifies when its beach control byte exceeds
/// [`BEACH_MIDPOINT`] and any neighbour within `beach_radius` is water: rain
/// height at or below `sea_level - 1` with its ground below that, so dry land
/// sitting exactly at `sea_level - 1` does not count. Rows
/// `sea_level - 2 ..= sea_level` (centred on the water surface at
/// `sea_level - 1`) of a qualifying column take beach material in every cell
/// that is empty and fluid-free. Empty cells are only filled on top of
/// something solid.
pub fn enhance_beaches(state: &OverlayState, chunk: &mut dyn ChunkColumn) {
    if !state.chunk_in_coverage(chunk) || !state.raster.has_layer(LayerKind::WaterBeach.name()) {
        return;
    }
    let sea = state.world.sea_level;
    let world_height = state.world.world_height;
    let radius = state.config.beach_radius.max(0);
    let beach = state.config.palette.beach;
    let rows = (sea - 2).max(1)..=sea.min(world_height - 1);

    let mut placed = Vec::new();
    for (lx, lz, wx, wz) in columns(chunk) {
        if !state.raster.contains_world(wx, wz)
            || state.raster.sample_layer(LayerKind::WaterBeach, wx, wz) <= BEACH_MIDPOINT
        {
            continue;
        }
        if has_water_neighbour(state, chunk, lx, lz, radius) {
            placed.push((lx, lz));
        }
    }
    if placed.is_empty() {
        return;
    }

    let mut y_max = chunk.y_max();
    for (lx, lz) in placed {
        let mut top = None;
        for y in rows.clone() {
            let empty = chunk.block(lx, y, lz) == AIR && chunk.fluid(lx, y, lz) == NO_FLUID;
            if !empty || chunk.block(lx, y - 1, lz) == AIR {
                continue;
            }
            chunk.set_block(lx, y, lz, beach);
            top = Some(y as u16);
        }
        if let Some(top) = top {
            let rain = chunk.rain_height(lx, lz).max(top);
            let height = chunk.terrain_height(lx, lz).max(top);
            chunk.set_rain_height(lx, lz, rain);
            chunk.set_terrain_height(lx, lz, height);
            y_max = y_max.max(rain);
        }
    }
    chunk.set_y_max(y_max);
    chunk.mark_modified();
}

/// Whether any column within `radius` (Chebyshev, excluding the column
/// itself) is water. Neighbours inside the chunk read its height maps;
/// neighbours across the chunk border predict theirs from the raster.
/// Neighbours outside coverage are void, not water.
fn has_water_neighbour(state: &OverlayState, chunk: &dyn ChunkColumn, lx: i32, lz: i32, radius: i32) -> bool {
    let surface = state.world.sea_level - 1;
    let size = chunk.chunk_size();
    let (ox, oz) = (chunk.origin_x(), chunk.origin_z());
    for dz in -radius..=radius {
        for dx in -radius..=radius {
            if dx == 0 && dz == 0 {
                continue;
            }
            let (nx, nz) = (lx + dx, lz + dz);
            let (wx, wz) = (ox + nx, oz + nz);
            if !state.raster.contains_world(wx, wz) {
                continue;
            }
            let (ground, rain) = if (0..size).contains(&nx) && (0..size).contains(&nz) {
                (chunk.terrain_height(nx, nz) as i32, chunk.rain_height(nx, nz) as i32)
            } else {
                let h = state.raster.sample_height(wx, wz, state.world.world_height);
                (h, h.max(surface))
            };
            if rain <= surface && ground < rain {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::host::memory::{blocks, MemoryChunk};
    use crate::pipeline::terrain::{sea_fill, solid_fill};
    use crate::pipeline::WorldInfo;
    use crate::raster::{Layer, RasterContainer};
    use std::sync::Arc;

    const HEIGHT: i32 = 64;
    const SEA: i32 = 30;

    fn state_with(raster: RasterContainer) -> OverlayState {
        let world = WorldInfo {
            size_x: 128,
            size_z: 128,
            world_height: HEIGHT,
            sea_level: SEA,
        };
        OverlayState::new(Arc::new(raster), OverlayConfig::default(), world)
    }

    #[test]
    fn test_reconcile_raises_to_plants_and_ground() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 20));
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        chunk.set_block(2, 21, 2, blocks::SOIL);
        chunk.set_block(2, 22, 2, blocks::TALLGRASS);

        reconcile_heights(&state, &mut chunk);
        assert_eq!(chunk.rain_height(2, 2), 22);
        assert_eq!(chunk.terrain_height(2, 2), 21);
        assert_eq!(chunk.y_max(), 22);
        assert_eq!(chunk.terrain_height(3, 3), 20);
    }

    #[test]
    fn test_reconcile_never_lowers() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 20));
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);
        chunk.set_block(4, 20, 4, AIR);

        reconcile_heights(&state, &mut chunk);
        // Water surface and the authored height survive.
        assert_eq!(chunk.rain_height(4, 4), (SEA - 1) as u16);
        assert_eq!(chunk.terrain_height(4, 4), 20);
    }

    #[test]
    fn test_erase_clears_outside_columns_only() {
        // Coverage is the left half of chunk 0.
        let state = state_with(RasterContainer::uniform(16, 32, 0, 0, 20));
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        for z in 0..32 {
            for x in 0..32 {
                for y in 0..=25 {
                    chunk.set_block(x, y, z, blocks::ROCK);
                }
                chunk.set_fluid(x, 26, z, 1);
                chunk.set_terrain_height(x, z, 25);
                chunk.set_rain_height(x, z, 26);
            }
        }
        chunk.set_y_max(26);
        chunk.set_rain_height(0, 0, 40);

        erase_outside(&state, &mut chunk);

        assert_eq!(chunk.block(20, 0, 3), blocks::ROCK);
        assert!((1..HEIGHT).all(|y| chunk.block(20, y, 3) == AIR && chunk.fluid(20, y, 3) == NO_FLUID));
        assert_eq!((chunk.terrain_height(20, 3), chunk.rain_height(20, 3)), (0, 0));

        assert_eq!(chunk.block(10, 25, 3), blocks::ROCK);
        assert_eq!(chunk.rain_height(10, 3), 26);
        assert_eq!(chunk.y_max(), 40);
    }

    #[test]
    fn test_erase_skips_fully_covered_chunk() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 20));
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        chunk.set_block(31, 5, 31, blocks::ROCK);
        erase_outside(&state, &mut chunk);
        assert_eq!(chunk.block(31, 5, 31), blocks::ROCK);
        assert!(!chunk.is_modified());
    }

    fn beach_raster(shore_x: i32) -> RasterContainer {
        // Land at SEA - 1 for x < shore_x, sea floor beyond.
        let mut raster = RasterContainer::uniform(32, 32, 0, 0, 10);
        for z in 0..32 {
            for x in 0..shore_x {
                raster.set_height_at_pixel(x, z, (SEA - 1) as u16);
            }
        }
        raster.insert_layer(Layer::filled("water_beach", 32, 32, 15));
        raster
    }

    #[test]
    fn test_beach_placed_next_to_water() {
        let state = state_with(beach_raster(16));
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);
        enhance_beaches(&state, &mut chunk);

        let beach = state.config.palette.beach;
        let rock = state.config.palette.rock;
        // Shore column within two blocks of water gets a lip at sea level.
        assert_eq!(chunk.block(15, SEA, 5), beach);
        assert_eq!(chunk.block(14, SEA, 5), beach);
        assert_eq!(chunk.block(15, SEA + 1, 5), AIR);
        // The authored rock column below is never replaced.
        assert_eq!(chunk.block(15, SEA - 1, 5), rock);
        assert_eq!(chunk.block(15, SEA - 2, 5), rock);
        assert_eq!(chunk.rain_height(15, 5), SEA as u16);
        assert_eq!(chunk.terrain_height(15, 5), SEA as u16);
        // Too far inland.
        assert_eq!(chunk.block(13, SEA, 5), AIR);
        // Water cells are never replaced and nothing floats on the water.
        assert_eq!(chunk.block(20, SEA - 1, 5), AIR);
        assert_eq!(chunk.block(16, SEA, 5), AIR);
        assert_eq!(chunk.fluid(20, SEA - 1, 5), state.config.palette.water);
    }

    #[test]
    fn test_land_at_water_surface_is_not_water() {
        // Every column sits exactly at SEA - 1: no flooded neighbour anywhere.
        let mut raster = RasterContainer::uniform(32, 32, 0, 0, (SEA - 1) as u16);
        raster.insert_layer(Layer::filled("water_beach", 32, 32, 15));
        let state = state_with(raster);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);
        assert_eq!(chunk.fluid_count(), 0);

        let before = chunk.clone();
        enhance_beaches(&state, &mut chunk);
        assert!(chunk.same_contents(&before));
        assert_eq!(chunk.block(10, SEA, 10), AIR);
    }

    #[test]
    fn test_beach_fills_empty_cells_below_sea() {
        // A drained pit at SEA - 3 next to open water: the empty rows fill up.
        let mut raster = beach_raster(16);
        raster.set_height_at_pixel(15, 5, (SEA - 3) as u16);
        let state = state_with(raster);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);
        for y in SEA - 2..SEA {
            chunk.set_fluid(15, y, 5, NO_FLUID);
        }
        enhance_beaches(&state, &mut chunk);

        let beach = state.config.palette.beach;
        assert!((SEA - 2..=SEA).all(|y| chunk.block(15, y, 5) == beach));
        assert_eq!(chunk.block(15, SEA - 3, 5), state.config.palette.rock);
    }

    #[test]
    fn test_beach_needs_painted_control() {
        let mut raster = beach_raster(16);
        raster.insert_layer(Layer::filled("water_beach", 32, 32, 7));
        let state = state_with(raster);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);
        enhance_beaches(&state, &mut chunk);
        assert_eq!(chunk.block(15, SEA, 5), AIR);
    }

    #[test]
    fn test_beach_sees_water_across_chunk_border() {
        // Chunk 0 is all land; the water starts in chunk 1 (x = 32).
        let mut raster = RasterContainer::uniform(64, 32, 0, 0, 10);
        for z in 0..32 {
            for x in 0..32 {
                raster.set_height_at_pixel(x, z, (SEA - 1) as u16);
            }
        }
        raster.insert_layer(Layer::filled("water_beach", 64, 32, 15));
        let state = state_with(raster);

        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);
        enhance_beaches(&state, &mut chunk);
        assert_eq!(chunk.block(31, SEA, 0), state.config.palette.beach);
        assert_eq!(chunk.block(29, SEA, 0), AIR);
    }
}
