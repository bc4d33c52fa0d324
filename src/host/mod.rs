//! Interfaces the overlay consumes from the host world generator.
//!
//! The overlay never computes base terrain itself. It sees the host through:
//! - [`passes::PassRegistry`]: named, ordered generation handlers per stage
//! - [`ChunkColumn`]: block, fluid and height-map storage of one chunk column
//! - [`MapRegion`]: per-region scalar and packed maps with padding metadata
//! - [`WorldMeta`]: world size, sea level and save metadata
//! - [`PregenHost`]: "materialize this area, then call me back"
//!
//! [`memory`] provides a complete in-memory host implementing all of these.

pub mod memory;
pub mod passes;

use std::collections::BTreeMap;

use crate::raster::RegionTile;

pub use passes::{ChunkHandler, Named, Pass, PassRegistry, RegionHandler};

pub type BlockId = u32;
pub type FluidId = u32;

pub const AIR: BlockId = 0;
pub const NO_FLUID: FluidId = 0;

// =============================================================================
// REGION MAPS
// =============================================================================

/// Dense square `i32` grid with a padding border, as the host stores per-region
/// climate, vegetation and ore maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntMap {
    /// Full padded edge length
    pub size: usize,
    pub top_left_padding: usize,
    pub bottom_right_padding: usize,
    /// Row-major padded cells
    pub data: Vec<i32>,
}

impl IntMap {
    pub fn new(inner_size: usize, top_left_padding: usize, bottom_right_padding: usize) -> Self {
        let size = inner_size + top_left_padding + bottom_right_padding;
        Self {
            size,
            top_left_padding,
            bottom_right_padding,
            data: vec![0; size * size],
        }
    }

    pub fn filled(inner_size: usize, padding: usize, value: i32) -> Self {
        let mut map = Self::new(inner_size, padding, padding);
        map.data.fill(value);
        map
    }

    pub fn inner_size(&self) -> usize {
        self.size - self.top_left_padding - self.bottom_right_padding
    }

    #[inline]
    pub fn get(&self, px: usize, pz: usize) -> i32 {
        self.data[pz * self.size + px]
    }

    pub fn set(&mut self, px: usize, pz: usize, value: i32) {
        let idx = pz * self.size + px;
        self.data[idx] = value;
    }

    /// Tile geometry of this map for a region.
    pub fn tile(&self, region_x: i32, region_z: i32, blocks_per_region: i32) -> RegionTile {
        RegionTile::new(
            region_x,
            region_z,
            self.size,
            self.top_left_padding,
            self.inner_size(),
            blocks_per_region,
        )
    }

    /// Nearest inner pixel for a world column inside the region.
    pub fn sample_world(
        &self,
        region_x: i32,
        region_z: i32,
        blocks_per_region: i32,
        world_x: i32,
        world_z: i32,
    ) -> i32 {
        let inner = self.inner_size() as i64;
        let bpr = blocks_per_region as i64;
        let local = |world: i32, region: i32| {
            let offset = (world as i64 - region as i64 * bpr).clamp(0, bpr - 1);
            (offset * inner / bpr) as usize + self.top_left_padding
        };
        self.get(local(world_x, region_x), local(world_z, region_z))
    }
}

/// Scalar maps of a region the overlay knows how to steer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarMap {
    Forest,
    Shrub,
    Flower,
    Beach,
    Ocean,
}

impl ScalarMap {
    pub fn all() -> &'static [Self] {
        &[Self::Forest, Self::Shrub, Self::Flower, Self::Beach, Self::Ocean]
    }
}

/// Host-owned maps of one region. Absent maps are `None`.
#[derive(Clone, Debug, Default)]
pub struct MapRegion {
    pub region_x: i32,
    pub region_z: i32,
    pub scalars: BTreeMap<ScalarMap, IntMap>,
    /// Packed temperature / moisture / tectonic cells
    pub climate: Option<IntMap>,
    /// Ore density maps by ore name
    pub ore_maps: BTreeMap<String, IntMap>,
}

impl MapRegion {
    pub fn new(region_x: i32, region_z: i32) -> Self {
        Self {
            region_x,
            region_z,
            ..Default::default()
        }
    }

    pub fn scalar(&self, map: ScalarMap) -> Option<&IntMap> {
        self.scalars.get(&map)
    }

    pub fn scalar_mut(&mut self, map: ScalarMap) -> Option<&mut IntMap> {
        self.scalars.get_mut(&map)
    }
}

// =============================================================================
// CHUNK STORAGE
// =============================================================================

/// Block, fluid and height-map storage of one full-height chunk column.
///
/// Coordinates are chunk-local `x`/`z` in `0..chunk_size()` and world `y` in
/// `0..world_height()`.
pub trait ChunkColumn {
    fn chunk_x(&self) -> i32;
    fn chunk_z(&self) -> i32;
    fn chunk_size(&self) -> i32;
    fn world_height(&self) -> i32;

    fn block(&self, x: i32, y: i32, z: i32) -> BlockId;
    fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId);
    fn fluid(&self, x: i32, y: i32, z: i32) -> FluidId;
    fn set_fluid(&mut self, x: i32, y: i32, z: i32, fluid: FluidId);

    fn terrain_height(&self, x: i32, z: i32) -> u16;
    fn set_terrain_height(&mut self, x: i32, z: i32, y: u16);
    fn rain_height(&self, x: i32, z: i32) -> u16;
    fn set_rain_height(&mut self, x: i32, z: i32, y: u16);

    /// Highest occupied y recorded for the column's region metadata.
    fn y_max(&self) -> u16;
    fn set_y_max(&mut self, y: u16);

    /// Whether rain and roots pass through the block (plants, leaves).
    fn is_permeable(&self, block: BlockId) -> bool;

    /// Region maps the column was generated from, if the host exposes them.
    fn map_region(&self) -> Option<&MapRegion>;

    fn mark_modified(&mut self);

    /// World x of the column's first block.
    fn origin_x(&self) -> i32 {
        self.chunk_x() * self.chunk_size()
    }

    /// World z of the column's first block.
    fn origin_z(&self) -> i32 {
        self.chunk_z() * self.chunk_size()
    }

    /// Inclusive world bounds `(x0, z0, x1, z1)`.
    fn bounds(&self) -> (i32, i32, i32, i32) {
        let size = self.chunk_size();
        let (x0, z0) = (self.origin_x(), self.origin_z());
        (x0, z0, x0 + size - 1, z0 + size - 1)
    }
}

// =============================================================================
// WORLD / SAVE METADATA
// =============================================================================

pub trait WorldMeta {
    /// World extent in blocks along x.
    fn size_x(&self) -> i32;
    /// World extent in blocks along z.
    fn size_z(&self) -> i32;
    fn world_height(&self) -> i32;
    fn sea_level(&self) -> i32;
    /// True only during the first start of a freshly created world.
    fn is_new_world(&self) -> bool;
    fn save_flag(&self, key: &str) -> Option<String>;
    fn set_save_flag(&mut self, key: &str, value: &str);
}

// =============================================================================
// PRE-GENERATION
// =============================================================================

/// Rectangle of chunk columns, exclusive upper bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkArea {
    pub min_cx: i32,
    pub min_cz: i32,
    pub max_cx: i32,
    pub max_cz: i32,
}

impl ChunkArea {
    pub fn new(min_cx: i32, min_cz: i32, max_cx: i32, max_cz: i32) -> Self {
        Self {
            min_cx,
            min_cz,
            max_cx,
            max_cz,
        }
    }

    pub fn chunk_count(&self) -> usize {
        ((self.max_cx - self.min_cx).max(0) as usize) * ((self.max_cz - self.min_cz).max(0) as usize)
    }

    pub fn chunks(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.min_cz..self.max_cz).flat_map(move |cz| (self.min_cx..self.max_cx).map(move |cx| (cx, cz)))
    }
}

/// Completion callback for [`PregenHost::materialize`].
pub type Completion = Box<dyn FnOnce(Result<(), String>) + Send>;

/// Host primitives used by the pre-generation scheduler.
pub trait PregenHost {
    /// Generate every chunk in `area`, write it durably without keeping it
    /// loaded, then call `done`. `done` may run on another thread.
    fn materialize(&mut self, area: ChunkArea, done: Completion);

    /// Stop time, freeze players and disable on-demand generation.
    fn suspend_world(&mut self);

    /// Undo [`PregenHost::suspend_world`].
    fn resume_world(&mut self);
}
