//! In-memory reference host.
//!
//! A small but complete pass-based world generator: Perlin terrain and region
//! maps, strata, ore deposits from ore density maps, scattered tall grass and
//! a lighting pass. Chunks are "saved" into a map and never kept loaded
//! anywhere else. Used by the CLI and the pipeline tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use noise::{NoiseFn, Perlin, Seedable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::{
    BlockId, ChunkArea, ChunkColumn, ChunkHandler, Completion, FluidId, IntMap, MapRegion, Pass,
    PassRegistry, PregenHost, RegionHandler, ScalarMap, WorldMeta, AIR, NO_FLUID,
};
use crate::blend::pack_climate;

/// Block ids of the reference host.
pub mod blocks {
    use crate::host::BlockId;

    pub const MANTLE: BlockId = 1;
    pub const ROCK: BlockId = 2;
    pub const SOIL: BlockId = 3;
    pub const GRASS: BlockId = 4;
    pub const SAND: BlockId = 5;
    pub const TALLGRASS: BlockId = 6;
    pub const LEAVES: BlockId = 7;
    pub const ORE: BlockId = 8;
}

pub const WATER: FluidId = 1;

// Host stage names
pub const CLIMATE_MAPS: &str = "host.climate_maps";
pub const RAW_TERRAIN: &str = "host.raw_terrain";
pub const STRATA: &str = "host.strata";
pub const ORE_DEPOSITS: &str = "host.ore_deposits";
pub const VEGETATION: &str = "host.vegetation";
pub const LIGHTING: &str = "host.lighting";
pub const FINALIZE: &str = "host.finalize";

// =============================================================================
// CHUNK STORAGE
// =============================================================================

#[derive(Clone, Debug)]
pub struct MemoryChunk {
    chunk_x: i32,
    chunk_z: i32,
    size: i32,
    height: i32,
    blocks: Vec<BlockId>,
    fluids: Vec<FluidId>,
    terrain: Vec<u16>,
    rain: Vec<u16>,
    y_max: u16,
    modified: bool,
    region: Option<Arc<MapRegion>>,
}

impl MemoryChunk {
    /// Empty chunk: air everywhere, height maps at zero.
    pub fn new(chunk_x: i32, chunk_z: i32, size: i32, height: i32) -> Self {
        let cells = (size * size * height) as usize;
        let columns = (size * size) as usize;
        Self {
            chunk_x,
            chunk_z,
            size,
            height,
            blocks: vec![AIR; cells],
            fluids: vec![NO_FLUID; cells],
            terrain: vec![0; columns],
            rain: vec![0; columns],
            y_max: 0,
            modified: false,
            region: None,
        }
    }

    pub fn with_region(mut self, region: Arc<MapRegion>) -> Self {
        self.region = Some(region);
        self
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        (0..self.size).contains(&x) && (0..self.size).contains(&z) && (0..self.height).contains(&y)
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        ((y * self.size + z) * self.size + x) as usize
    }

    #[inline]
    fn column(&self, x: i32, z: i32) -> usize {
        (z * self.size + x) as usize
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Same blocks, fluids and height metadata.
    pub fn same_contents(&self, other: &MemoryChunk) -> bool {
        self.blocks == other.blocks
            && self.fluids == other.fluids
            && self.terrain == other.terrain
            && self.rain == other.rain
            && self.y_max == other.y_max
    }

    /// Number of non-air cells above the world floor.
    pub fn solid_above_floor(&self) -> usize {
        let floor = (self.size * self.size) as usize;
        self.blocks[floor..].iter().filter(|&&b| b != AIR).count()
    }

    pub fn fluid_count(&self) -> usize {
        self.fluids.iter().filter(|&&f| f != NO_FLUID).count()
    }

    /// Highest non-air y of a column.
    pub fn top_block(&self, x: i32, z: i32) -> Option<(i32, BlockId)> {
        (0..self.height)
            .rev()
            .map(|y| (y, self.block(x, y, z)))
            .find(|&(_, b)| b != AIR)
    }
}

impl ChunkColumn for MemoryChunk {
    fn chunk_x(&self) -> i32 {
        self.chunk_x
    }

    fn chunk_z(&self) -> i32 {
        self.chunk_z
    }

    fn chunk_size(&self) -> i32 {
        self.size
    }

    fn world_height(&self) -> i32 {
        self.height
    }

    fn block(&self, x: i32, y: i32, z: i32) -> BlockId {
        if !self.in_bounds(x, y, z) {
            return AIR;
        }
        self.blocks[self.index(x, y, z)]
    }

    fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId) {
        if self.in_bounds(x, y, z) {
            let idx = self.index(x, y, z);
            self.blocks[idx] = block;
        }
    }

    fn fluid(&self, x: i32, y: i32, z: i32) -> FluidId {
        if !self.in_bounds(x, y, z) {
            return NO_FLUID;
        }
        self.fluids[self.index(x, y, z)]
    }

    fn set_fluid(&mut self, x: i32, y: i32, z: i32, fluid: FluidId) {
        if self.in_bounds(x, y, z) {
            let idx = self.index(x, y, z);
            self.fluids[idx] = fluid;
        }
    }

    fn terrain_height(&self, x: i32, z: i32) -> u16 {
        self.terrain[self.column(x, z)]
    }

    fn set_terrain_height(&mut self, x: i32, z: i32, y: u16) {
        let idx = self.column(x, z);
        self.terrain[idx] = y;
    }

    fn rain_height(&self, x: i32, z: i32) -> u16 {
        self.rain[self.column(x, z)]
    }

    fn set_rain_height(&mut self, x: i32, z: i32, y: u16) {
        let idx = self.column(x, z);
        self.rain[idx] = y;
    }

    fn y_max(&self) -> u16 {
        self.y_max
    }

    fn set_y_max(&mut self, y: u16) {
        self.y_max = y;
    }

    fn is_permeable(&self, block: BlockId) -> bool {
        matches!(block, blocks::TALLGRASS | blocks::LEAVES)
    }

    fn map_region(&self) -> Option<&MapRegion> {
        self.region.as_deref()
    }

    fn mark_modified(&mut self) {
        self.modified = true;
    }
}

// =============================================================================
// HOST STAGES
// =============================================================================

#[derive(Clone, Debug)]
pub struct MemoryWorldConfig {
    pub seed: u32,
    pub size_x: i32,
    pub size_z: i32,
    pub world_height: i32,
    pub sea_level: i32,
    pub chunk_size: i32,
    pub blocks_per_region: i32,
    /// Inner pixels and padding of climate and vegetation maps
    pub map_inner_size: usize,
    pub map_padding: usize,
    /// Inner pixels and padding of ore density maps
    pub ore_inner_size: usize,
    pub ore_padding: usize,
    pub ore_names: Vec<String>,
}

impl Default for MemoryWorldConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            size_x: 1024,
            size_z: 1024,
            world_height: 256,
            sea_level: 110,
            chunk_size: 32,
            blocks_per_region: 512,
            map_inner_size: 16,
            map_padding: 2,
            ore_inner_size: 32,
            ore_padding: 1,
            ore_names: vec!["iron".to_string(), "copper".to_string()],
        }
    }
}

/// Noise sources and geometry shared by the host's own handlers.
struct HostStages {
    config: MemoryWorldConfig,
    terrain: Perlin,
    detail: Perlin,
    climate: Perlin,
}

impl HostStages {
    fn new(config: MemoryWorldConfig) -> Self {
        let seed = config.seed;
        Self {
            terrain: Perlin::new(1).set_seed(seed),
            detail: Perlin::new(1).set_seed(seed.wrapping_add(1)),
            climate: Perlin::new(1).set_seed(seed.wrapping_add(2)),
            config,
        }
    }

    /// Host terrain height of a world column.
    fn height_at(&self, x: i32, z: i32) -> i32 {
        let (x, z) = (x as f64, z as f64);
        let broad = self.terrain.get([x * 0.004, z * 0.004, 0.5]);
        let fine = self.detail.get([x * 0.03, z * 0.03, 1.5]);
        let h = self.config.sea_level as f64 + broad * 40.0 + fine * 6.0;
        (h.round() as i32).clamp(1, self.config.world_height - 2)
    }

    /// Byte-valued noise field for a region map.
    fn field(&self, x: i32, z: i32, layer: f64) -> i32 {
        let v = self.climate.get([x as f64 * 0.002, z as f64 * 0.002, layer]);
        (((v + 1.0) * 0.5) * 255.0).round().clamp(0.0, 255.0) as i32
    }

    fn chunk_rng(&self, chunk: &dyn ChunkColumn, salt: u64) -> ChaCha8Rng {
        let cx = chunk.chunk_x() as i64 as u64;
        let cz = chunk.chunk_z() as i64 as u64;
        let seed = (self.config.seed as u64)
            ^ cx.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ cz.wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ salt;
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn fill_region_maps(&self, region: &mut MapRegion) {
        let c = &self.config;
        let (rx, rz) = (region.region_x, region.region_z);

        for (i, &map) in ScalarMap::all().iter().enumerate() {
            let mut cells = IntMap::new(c.map_inner_size, c.map_padding, c.map_padding);
            let tile = cells.tile(rx, rz, c.blocks_per_region);
            for p in tile.pixels() {
                cells.data[p.index] = self.field(p.world_x, p.world_z, 10.0 + i as f64);
            }
            region.scalars.insert(map, cells);
        }

        let mut climate = IntMap::new(c.map_inner_size, c.map_padding, c.map_padding);
        let tile = climate.tile(rx, rz, c.blocks_per_region);
        for p in tile.pixels() {
            let t = self.field(p.world_x, p.world_z, 20.0) as u8;
            let m = self.field(p.world_x, p.world_z, 21.0) as u8;
            let g = self.field(p.world_x, p.world_z, 22.0) as u8;
            climate.data[p.index] = pack_climate(t, m, g);
        }
        region.climate = Some(climate);

        for (i, name) in c.ore_names.iter().enumerate() {
            let mut cells = IntMap::new(c.ore_inner_size, c.ore_padding, c.ore_padding);
            let tile = cells.tile(rx, rz, c.blocks_per_region);
            for p in tile.pixels() {
                cells.data[p.index] = self.field(p.world_x, p.world_z, 30.0 + i as f64) / 2;
            }
            region.ore_maps.insert(name.clone(), cells);
        }
    }

    fn raw_terrain(&self, chunk: &mut dyn ChunkColumn) {
        let size = chunk.chunk_size();
        let sea = self.config.sea_level;
        let mut y_max = 0;
        for lz in 0..size {
            for lx in 0..size {
                let h = self.height_at(chunk.origin_x() + lx, chunk.origin_z() + lz);
                chunk.set_block(lx, 0, lz, blocks::MANTLE);
                for y in 1..=h {
                    chunk.set_block(lx, y, lz, blocks::ROCK);
                }
                for y in h + 1..sea {
                    chunk.set_fluid(lx, y, lz, WATER);
                }
                let rain = h.max(sea - 1) as u16;
                chunk.set_terrain_height(lx, lz, h as u16);
                chunk.set_rain_height(lx, lz, rain);
                y_max = y_max.max(rain);
            }
        }
        chunk.set_y_max(y_max);
    }

    fn strata(&self, chunk: &mut dyn ChunkColumn) {
        let size = chunk.chunk_size();
        let sea = self.config.sea_level;
        for lz in 0..size {
            for lx in 0..size {
                let top = chunk.terrain_height(lx, lz) as i32;
                if top < 1 || chunk.block(lx, top, lz) != blocks::ROCK {
                    continue;
                }
                if top >= sea {
                    chunk.set_block(lx, top, lz, blocks::GRASS);
                    for y in (top - 3).max(1)..top {
                        if chunk.block(lx, y, lz) == blocks::ROCK {
                            chunk.set_block(lx, y, lz, blocks::SOIL);
                        }
                    }
                } else {
                    chunk.set_block(lx, top, lz, blocks::SAND);
                }
            }
        }
    }

    fn ore_deposits(&self, chunk: &mut dyn ChunkColumn) {
        let Some((rx, rz)) = chunk.map_region().map(|r| (r.region_x, r.region_z)) else {
            return;
        };
        let mut rng = self.chunk_rng(chunk, 0x04E5);
        let bpr = self.config.blocks_per_region;
        let size = chunk.chunk_size();
        for lz in 0..size {
            for lx in 0..size {
                let (wx, wz) = (chunk.origin_x() + lx, chunk.origin_z() + lz);
                let density: i32 = chunk
                    .map_region()
                    .map(|r| {
                        r.ore_maps
                            .values()
                            .map(|m| m.sample_world(rx, rz, bpr, wx, wz))
                            .sum::<i32>()
                    })
                    .unwrap_or(0);
                let top = chunk.terrain_height(lx, lz) as i32 - 4;
                if top < 2 || rng.gen_range(0..1024) >= density {
                    continue;
                }
                let y = rng.gen_range(1..top);
                if chunk.block(lx, y, lz) == blocks::ROCK {
                    chunk.set_block(lx, y, lz, blocks::ORE);
                }
            }
        }
    }

    fn vegetation(&self, chunk: &mut dyn ChunkColumn) {
        let Some((rx, rz)) = chunk.map_region().map(|r| (r.region_x, r.region_z)) else {
            return;
        };
        let mut rng = self.chunk_rng(chunk, 0x7EE5);
        let bpr = self.config.blocks_per_region;
        let size = chunk.chunk_size();
        for lz in 0..size {
            for lx in 0..size {
                let (wx, wz) = (chunk.origin_x() + lx, chunk.origin_z() + lz);
                let density = chunk
                    .map_region()
                    .and_then(|r| r.scalar(ScalarMap::Forest))
                    .map(|m| m.sample_world(rx, rz, bpr, wx, wz))
                    .unwrap_or(0);
                let top = chunk.terrain_height(lx, lz) as i32;
                let above = top + 1;
                if chunk.block(lx, top, lz) != blocks::GRASS
                    || chunk.block(lx, above, lz) != AIR
                    || chunk.fluid(lx, above, lz) != NO_FLUID
                {
                    continue;
                }
                if rng.gen_range(0..512) < density {
                    chunk.set_block(lx, above, lz, blocks::TALLGRASS);
                }
            }
        }
    }
}

fn host_registry(stages: Arc<HostStages>, lit: Arc<Mutex<HashSet<(i32, i32)>>>) -> PassRegistry {
    fn stage(stages: &Arc<HostStages>, f: fn(&HostStages, &mut dyn ChunkColumn)) -> ChunkHandler {
        let stages = Arc::clone(stages);
        Arc::new(move |chunk: &mut dyn ChunkColumn| f(&stages, chunk))
    }

    let mut registry = PassRegistry::new();
    let maps = Arc::clone(&stages);
    let region: RegionHandler = Arc::new(move |r: &mut MapRegion| maps.fill_region_maps(r));
    registry.append_region(CLIMATE_MAPS, region);

    registry.append(Pass::Terrain, RAW_TERRAIN, stage(&stages, HostStages::raw_terrain));
    registry.append(Pass::TerrainFeatures, STRATA, stage(&stages, HostStages::strata));
    registry.append(Pass::TerrainFeatures, ORE_DEPOSITS, stage(&stages, HostStages::ore_deposits));
    registry.append(Pass::Vegetation, VEGETATION, stage(&stages, HostStages::vegetation));
    registry.append(
        Pass::Lighting,
        LIGHTING,
        Arc::new(move |chunk: &mut dyn ChunkColumn| {
            if let Ok(mut lit) = lit.lock() {
                lit.insert((chunk.chunk_x(), chunk.chunk_z()));
            }
        }),
    );
    registry.append(
        Pass::PreDone,
        FINALIZE,
        Arc::new(|chunk: &mut dyn ChunkColumn| chunk.mark_modified()),
    );
    registry
}

// =============================================================================
// WORLD
// =============================================================================

pub struct MemoryWorld {
    config: MemoryWorldConfig,
    registry: PassRegistry,
    regions: HashMap<(i32, i32), Arc<MapRegion>>,
    chunks: HashMap<(i32, i32), MemoryChunk>,
    lit: Arc<Mutex<HashSet<(i32, i32)>>>,
    flags: HashMap<String, String>,
    new_world: bool,
    suspended: bool,
    suspensions: usize,
    requests: usize,
    fail_on_request: Option<usize>,
}

impl MemoryWorld {
    /// A freshly created world.
    pub fn new(config: MemoryWorldConfig) -> Self {
        let lit = Arc::new(Mutex::new(HashSet::new()));
        let registry = host_registry(Arc::new(HostStages::new(config.clone())), Arc::clone(&lit));
        Self {
            config,
            registry,
            regions: HashMap::new(),
            chunks: HashMap::new(),
            lit,
            flags: HashMap::new(),
            new_world: true,
            suspended: false,
            suspensions: 0,
            requests: 0,
            fail_on_request: None,
        }
    }

    /// A world loaded from an existing save with the given metadata.
    pub fn open_existing(config: MemoryWorldConfig, flags: HashMap<String, String>) -> Self {
        let mut world = Self::new(config);
        world.new_world = false;
        world.flags = flags;
        world
    }

    pub fn config(&self) -> &MemoryWorldConfig {
        &self.config
    }

    pub fn registry(&self) -> &PassRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PassRegistry {
        &mut self.registry
    }

    pub fn chunk(&self, cx: i32, cz: i32) -> Option<&MemoryChunk> {
        self.chunks.get(&(cx, cz))
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn region(&self, rx: i32, rz: i32) -> Option<&Arc<MapRegion>> {
        self.regions.get(&(rx, rz))
    }

    pub fn is_lit(&self, cx: i32, cz: i32) -> bool {
        self.lit.lock().map(|lit| lit.contains(&(cx, cz))).unwrap_or(false)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// How many times the world was suspended.
    pub fn suspensions(&self) -> usize {
        self.suspensions
    }

    /// Make the `index`-th materialize request (0-based) fail.
    pub fn fail_on_request(&mut self, index: usize) {
        self.fail_on_request = Some(index);
    }

    pub fn region_of_chunk(&self, cx: i32, cz: i32) -> (i32, i32) {
        let bpr = self.config.blocks_per_region;
        let cs = self.config.chunk_size;
        ((cx * cs).div_euclid(bpr), (cz * cs).div_euclid(bpr))
    }

    fn build_region(&self, rx: i32, rz: i32) -> MapRegion {
        let mut region = MapRegion::new(rx, rz);
        self.registry.run_region(&mut region);
        region
    }

    fn build_chunk(&self, cx: i32, cz: i32, region: Arc<MapRegion>) -> MemoryChunk {
        let mut chunk =
            MemoryChunk::new(cx, cz, self.config.chunk_size, self.config.world_height).with_region(region);
        self.registry.run_columns(&mut chunk);
        for &pass in Pass::all() {
            self.registry.run_pass(pass, &mut chunk);
        }
        chunk
    }

    fn ensure_region(&mut self, rx: i32, rz: i32) -> Arc<MapRegion> {
        if let Some(region) = self.regions.get(&(rx, rz)) {
            return Arc::clone(region);
        }
        let region = Arc::new(self.build_region(rx, rz));
        self.regions.insert((rx, rz), Arc::clone(&region));
        region
    }

    /// Generate (or return the saved) chunk at `(cx, cz)`.
    pub fn generate_chunk(&mut self, cx: i32, cz: i32) -> &MemoryChunk {
        if !self.chunks.contains_key(&(cx, cz)) {
            let (rx, rz) = self.region_of_chunk(cx, cz);
            let region = self.ensure_region(rx, rz);
            let chunk = self.build_chunk(cx, cz, region);
            self.chunks.insert((cx, cz), chunk);
        }
        &self.chunks[&(cx, cz)]
    }
}

impl WorldMeta for MemoryWorld {
    fn size_x(&self) -> i32 {
        self.config.size_x
    }

    fn size_z(&self) -> i32 {
        self.config.size_z
    }

    fn world_height(&self) -> i32 {
        self.config.world_height
    }

    fn sea_level(&self) -> i32 {
        self.config.sea_level
    }

    fn is_new_world(&self) -> bool {
        self.new_world
    }

    fn save_flag(&self, key: &str) -> Option<String> {
        self.flags.get(key).cloned()
    }

    fn set_save_flag(&mut self, key: &str, value: &str) {
        self.flags.insert(key.to_string(), value.to_string());
    }
}

impl PregenHost for MemoryWorld {
    fn materialize(&mut self, area: ChunkArea, done: Completion) {
        let request = self.requests;
        self.requests += 1;
        if self.fail_on_request == Some(request) {
            done(Err(format!("request {} rejected", request)));
            return;
        }

        let this = &*self;
        let missing: BTreeSet<(i32, i32)> = area
            .chunks()
            .map(|(cx, cz)| this.region_of_chunk(cx, cz))
            .filter(|key| !this.regions.contains_key(key))
            .collect();
        let missing: Vec<(i32, i32)> = missing.into_iter().collect();
        let built: Vec<MapRegion> = missing
            .par_iter()
            .map(|&(rx, rz)| this.build_region(rx, rz))
            .collect();
        for region in built {
            self.regions
                .insert((region.region_x, region.region_z), Arc::new(region));
        }

        let this = &*self;
        let todo: Vec<(i32, i32)> = area
            .chunks()
            .filter(|key| !this.chunks.contains_key(key))
            .collect();
        let chunks: Vec<MemoryChunk> = todo
            .par_iter()
            .map(|&(cx, cz)| {
                let key = this.region_of_chunk(cx, cz);
                let region = match this.regions.get(&key) {
                    Some(region) => Arc::clone(region),
                    None => Arc::new(this.build_region(key.0, key.1)),
                };
                this.build_chunk(cx, cz, region)
            })
            .collect();
        for chunk in chunks {
            self.chunks.insert((chunk.chunk_x, chunk.chunk_z), chunk);
        }

        done(Ok(()));
    }

    fn suspend_world(&mut self) {
        self.suspended = true;
        self.suspensions += 1;
    }

    fn resume_world(&mut self) {
        self.suspended = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MemoryWorldConfig {
        MemoryWorldConfig {
            size_x: 128,
            size_z: 128,
            world_height: 96,
            sea_level: 48,
            blocks_per_region: 64,
            ..Default::default()
        }
    }

    #[test]
    fn test_host_generates_terrain() {
        let mut world = MemoryWorld::new(small_config());
        let chunk = world.generate_chunk(0, 0).clone();

        assert_eq!(chunk.block(0, 0, 0), blocks::MANTLE);
        let h = chunk.terrain_height(5, 5) as i32;
        assert!(h >= 1 && h <= 94);
        assert_ne!(chunk.block(5, h, 5), AIR);
        assert!(chunk.is_modified());
        assert!(world.is_lit(0, 0));
        assert!(world.region(0, 0).is_some());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut a = MemoryWorld::new(small_config());
        let mut b = MemoryWorld::new(small_config());
        assert!(a.generate_chunk(1, -1).same_contents(b.generate_chunk(1, -1)));
    }

    #[test]
    fn test_materialize_area() {
        let mut world = MemoryWorld::new(small_config());
        let (tx, rx) = std::sync::mpsc::channel();
        world.materialize(
            ChunkArea::new(0, 0, 3, 2),
            Box::new(move |result| tx.send(result).unwrap()),
        );
        assert_eq!(rx.recv().unwrap(), Ok(()));
        assert_eq!(world.chunk_count(), 6);
        assert!(world.chunk(2, 1).is_some());
        // 3 chunks * 32 blocks span two 64-block regions.
        assert!(world.region(1, 0).is_some());
    }

    #[test]
    fn test_injected_failure() {
        let mut world = MemoryWorld::new(small_config());
        world.fail_on_request(0);
        let (tx, rx) = std::sync::mpsc::channel();
        world.materialize(ChunkArea::new(0, 0, 1, 1), Box::new(move |r| tx.send(r).unwrap()));
        assert!(rx.recv().unwrap().is_err());
        assert_eq!(world.chunk_count(), 0);
    }

    #[test]
    fn test_save_flags() {
        let mut world = MemoryWorld::new(small_config());
        assert!(world.is_new_world());
        world.set_save_flag("k", "v");
        assert_eq!(world.save_flag("k").as_deref(), Some("v"));

        let reopened = MemoryWorld::open_existing(small_config(), HashMap::new());
        assert!(!reopened.is_new_world());
        assert_eq!(reopened.save_flag("k"), None);
    }

    #[test]
    fn test_permeability() {
        let chunk = MemoryChunk::new(0, 0, 4, 8);
        assert!(chunk.is_permeable(blocks::TALLGRASS));
        assert!(chunk.is_permeable(blocks::LEAVES));
        assert!(!chunk.is_permeable(blocks::ROCK));
    }
}
