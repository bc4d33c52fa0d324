//! Height-surface injection, solid fill and sea fill.
//!
//! These replace the host's raw terrain for every column inside coverage.
//! Columns outside coverage are left to the host and erased later.

use crate::host::{ChunkColumn, AIR, NO_FLUID};

use super::{columns, OverlayState};

/// Write the authored height into both height maps of every covered column.
pub fn inject_column_heights(state: &OverlayState, chunk: &mut dyn ChunkColumn) {
    if !state.chunk_in_coverage(chunk) {
        return;
    }
    let world_height = state.world.world_height;
    let mut y_max = chunk.y_max();
    for (lx, lz, wx, wz) in columns(chunk) {
        if !state.raster.contains_world(wx, wz) {
            continue;
        }
        let h = state.raster.sample_height(wx, wz, world_height) as u16;
        chunk.set_terrain_height(lx, lz, h);
        chunk.set_rain_height(lx, lz, h);
        y_max = y_max.max(h);
    }
    chunk.set_y_max(y_max);
}

/// Mantle at y = 0 and rock from y = 1 up to the authored height.
pub fn solid_fill(state: &OverlayState, chunk: &mut dyn ChunkColumn) {
    if !state.chunk_in_coverage(chunk) {
        return;
    }
    let palette = &state.config.palette;
    let world_height = state.world.world_height;
    let mut y_max = chunk.y_max();
    for (lx, lz, wx, wz) in columns(chunk) {
        if !state.raster.contains_world(wx, wz) {
            continue;
        }
        let h = state.raster.sample_height(wx, wz, world_height);
        chunk.set_block(lx, 0, lz, palette.mantle);
        for y in 1..=h {
            chunk.set_block(lx, y, lz, palette.rock);
        }
        chunk.set_terrain_height(lx, lz, h as u16);
        chunk.set_rain_height(lx, lz, h as u16);
        y_max = y_max.max(h as u16);
    }
    chunk.set_y_max(y_max);
    chunk.mark_modified();
}

/// Water from just above the authored height up to sea level minus one, in
/// cells that are still empty. Runs after [`solid_fill`].
pub fn sea_fill(state: &OverlayState, chunk: &mut dyn ChunkColumn) {
    if !state.chunk_in_coverage(chunk) {
        return;
    }
    let water = state.config.palette.water;
    let world_height = state.world.world_height;
    let surface = (state.world.sea_level - 1).min(world_height - 1);
    let mut y_max = chunk.y_max();
    let mut filled = false;
    for (lx, lz, wx, wz) in columns(chunk) {
        if !state.raster.contains_world(wx, wz) {
            continue;
        }
        let h = state.raster.sample_height(wx, wz, world_height);
        if h >= surface {
            continue;
        }
        for y in h + 1..=surface {
            if chunk.block(lx, y, lz) == AIR && chunk.fluid(lx, y, lz) == NO_FLUID {
                chunk.set_fluid(lx, y, lz, water);
            }
        }
        let rain = chunk.rain_height(lx, lz).max(surface as u16);
        chunk.set_rain_height(lx, lz, rain);
        y_max = y_max.max(rain);
        filled = true;
    }
    if filled {
        chunk.set_y_max(y_max);
        chunk.mark_modified();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::host::memory::MemoryChunk;
    use crate::pipeline::WorldInfo;
    use crate::raster::RasterContainer;
    use std::sync::Arc;

    const HEIGHT: i32 = 64;

    fn state_with(raster: RasterContainer, sea_level: i32) -> OverlayState {
        let world = WorldInfo {
            size_x: 128,
            size_z: 128,
            world_height: HEIGHT,
            sea_level,
        };
        OverlayState::new(Arc::new(raster), OverlayConfig::default(), world)
    }

    #[test]
    fn test_solid_fill_column() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 20), 30);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);

        let palette = &state.config.palette;
        assert_eq!(chunk.block(3, 0, 4), palette.mantle);
        assert!((1..=20).all(|y| chunk.block(3, y, 4) == palette.rock));
        assert_eq!(chunk.block(3, 21, 4), AIR);
        assert_eq!(chunk.terrain_height(3, 4), 20);
        assert_eq!(chunk.y_max(), 20);
        assert!(chunk.is_modified());
    }

    #[test]
    fn test_sea_fill_after_solid_fill() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 20), 30);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);

        let water = state.config.palette.water;
        assert_eq!(chunk.fluid(5, 20, 5), NO_FLUID);
        assert!((21..=29).all(|y| chunk.fluid(5, y, 5) == water));
        assert_eq!(chunk.fluid(5, 30, 5), NO_FLUID);
        assert_eq!(chunk.rain_height(5, 5), 29);
        assert_eq!(chunk.terrain_height(5, 5), 20);
    }

    #[test]
    fn test_sea_fill_skips_land_and_occupied_cells() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 40), 30);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut chunk);
        sea_fill(&state, &mut chunk);
        assert!((0..HEIGHT).all(|y| chunk.fluid(0, y, 0) == NO_FLUID));

        let low = state_with(RasterContainer::uniform(32, 32, 0, 0, 10), 30);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        chunk.set_block(1, 15, 1, 99);
        sea_fill(&low, &mut chunk);
        assert_eq!(chunk.fluid(1, 15, 1), NO_FLUID);
        assert_eq!(chunk.fluid(1, 16, 1), low.config.palette.water);
    }

    #[test]
    fn test_heights_outside_raster_untouched() {
        // Raster covers x in [0, 16) of the chunk only.
        let state = state_with(RasterContainer::uniform(16, 32, 0, 0, 20), 30);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        inject_column_heights(&state, &mut chunk);
        solid_fill(&state, &mut chunk);

        assert_eq!(chunk.terrain_height(15, 0), 20);
        assert_eq!(chunk.terrain_height(16, 0), 0);
        assert_eq!(chunk.block(16, 0, 0), AIR);
    }

    #[test]
    fn test_heights_clamped_to_world() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 5000), 30);
        let mut chunk = MemoryChunk::new(0, 0, 32, HEIGHT);
        inject_column_heights(&state, &mut chunk);
        assert_eq!(chunk.terrain_height(0, 0), (HEIGHT - 2) as u16);
    }

    #[test]
    fn test_fills_are_idempotent() {
        let state = state_with(RasterContainer::uniform(32, 32, 0, 0, 12), 30);
        let mut once = MemoryChunk::new(0, 0, 32, HEIGHT);
        solid_fill(&state, &mut once);
        sea_fill(&state, &mut once);

        let mut twice = once.clone();
        solid_fill(&state, &mut twice);
        sea_fill(&state, &mut twice);
        assert!(once.same_contents(&twice));
    }
}
