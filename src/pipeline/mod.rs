//! Overlay pipeline: what runs inside the host's generation passes.
//!
//! [`register`] wires the overlay into a host [`PassRegistry`]:
//!
//! ```text
//! region maps   host maps ... -> overlay.region_maps
//! column maps   overlay.column_heights -> host ...
//! terrain       overlay.solid_fill -> overlay.sea_fill -> host (guarded)
//! features      host (guarded)
//! vegetation    overlay.reconcile_heights -> host (guarded) -> overlay.erase_outside -> overlay.beach
//! lighting      host (unguarded)
//! pre_done      host (guarded)
//! ```
//!
//! The host's raw terrain handler is removed. Every overlay handler reads the
//! same immutable [`OverlayState`]; the raster is shared, never copied.

pub mod guard;
pub mod region;
pub mod surface;
pub mod terrain;


use std::sync::Arc;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::host::{ChunkColumn, ChunkHandler, MapRegion, Pass, PassRegistry, RegionHandler, WorldMeta};
use crate::raster::RasterContainer;

pub use guard::{guarded, intersects_coverage};

pub const REGION_MAPS: &str = "overlay.region_maps";
pub const COLUMN_HEIGHTS: &str = "overlay.column_heights";
pub const SOLID_FILL: &str = "overlay.solid_fill";
pub const SEA_FILL: &str = "overlay.sea_fill";
pub const RECONCILE_HEIGHTS: &str = "overlay.reconcile_heights";
pub const ERASE_OUTSIDE: &str = "overlay.erase_outside";
pub const BEACH: &str = "overlay.beach";

/// Passes the overlay inserts handlers into.
const REQUIRED_PASSES: &[Pass] = &[Pass::Terrain, Pass::Vegetation];

/// World facts the handlers need, copied out of [`WorldMeta`] once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldInfo {
    pub size_x: i32,
    pub size_z: i32,
    pub world_height: i32,
    pub sea_level: i32,
}

impl WorldInfo {
    pub fn from_meta(meta: &dyn WorldMeta) -> Self {
        Self {
            size_x: meta.size_x(),
            size_z: meta.size_z(),
            world_height: meta.world_height(),
            sea_level: meta.sea_level(),
        }
    }
}

/// Everything the overlay needs at registration time.
///
/// Built once at startup and handed to [`register`]. `raster` is `None` when
/// no raster could be loaded; registration then aborts and the host runs
/// unmodified.
#[derive(Clone, Debug)]
pub struct OverlayContext {
    pub raster: Option<Arc<RasterContainer>>,
    pub config: OverlayConfig,
    pub world: WorldInfo,
}

impl OverlayContext {
    pub fn new(raster: Option<RasterContainer>, config: OverlayConfig, world: WorldInfo) -> Self {
        Self {
            raster: raster.map(Arc::new),
            config,
            world,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.raster.is_some()
    }
}

/// Read-only state shared by every registered handler.
#[derive(Debug)]
pub struct OverlayState {
    pub raster: Arc<RasterContainer>,
    pub config: OverlayConfig,
    pub world: WorldInfo,
}

impl OverlayState {
    pub fn new(raster: Arc<RasterContainer>, config: OverlayConfig, world: WorldInfo) -> Self {
        Self { raster, config, world }
    }

    /// Whether any column of the chunk lies inside coverage.
    pub fn chunk_in_coverage(&self, chunk: &dyn ChunkColumn) -> bool {
        let (x0, z0, x1, z1) = chunk.bounds();
        self.raster.coverage().intersects_inclusive(x0, z0, x1, z1)
    }

    /// Whether every column of the chunk lies inside coverage.
    pub fn chunk_fully_covered(&self, chunk: &dyn ChunkColumn) -> bool {
        let (x0, z0, x1, z1) = chunk.bounds();
        let coverage = self.raster.coverage();
        coverage.contains(x0, z0) && coverage.contains(x1, z1)
    }
}

/// Chunk-local and world coordinates of every column in a chunk, row-major.
pub(crate) fn columns(chunk: &dyn ChunkColumn) -> impl Iterator<Item = (i32, i32, i32, i32)> {
    let size = chunk.chunk_size();
    let (ox, oz) = (chunk.origin_x(), chunk.origin_z());
    (0..size).flat_map(move |lz| (0..size).map(move |lx| (lx, lz, ox + lx, oz + lz)))
}

/// Wire the overlay into `registry`.
///
/// Every prerequisite is checked before the registry is touched, so a failed
/// registration leaves the host pipeline exactly as it was.
pub fn register(ctx: &OverlayContext, registry: &mut PassRegistry) -> Result<Arc<OverlayState>> {
    let state = match validate(ctx, registry) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            log::error!("{}", err);
            return Err(err);
        }
    };

    let removed = registry.remove(Pass::Terrain, &state.config.host_terrain_handler);
    if removed == 0 {
        log::warn!(
            "Host terrain handler '{}' not found; nothing stripped",
            state.config.host_terrain_handler
        );
    }

    // Guard the host handlers before the overlay's own are inserted: erasure
    // and beach placement must also see chunks outside coverage.
    let predicate = intersects_coverage(state.raster.coverage());
    let mut wrapped = 0;
    for &pass in Pass::all() {
        if pass == Pass::Lighting {
            continue;
        }
        wrapped += registry.map_handlers(pass, |_| true, |handler| guarded(predicate.clone(), handler));
    }

    registry.append_region(REGION_MAPS, region_handler(&state, region::inject_region_maps));
    registry.insert_column_first(COLUMN_HEIGHTS, chunk_handler(&state, terrain::inject_column_heights));

    registry.insert_first(Pass::Terrain, SEA_FILL, chunk_handler(&state, terrain::sea_fill));
    registry.insert_first(Pass::Terrain, SOLID_FILL, chunk_handler(&state, terrain::solid_fill));

    registry.insert_first(
        Pass::Vegetation,
        RECONCILE_HEIGHTS,
        chunk_handler(&state, surface::reconcile_heights),
    );
    registry.append(Pass::Vegetation, ERASE_OUTSIDE, chunk_handler(&state, surface::erase_outside));
    registry.append(Pass::Vegetation, BEACH, chunk_handler(&state, surface::enhance_beaches));

    log::info!(
        "Overlay registered: coverage {:?}, {} host handlers guarded, {} stripped",
        state.raster.coverage(),
        wrapped,
        removed
    );
    Ok(state)
}

fn validate(ctx: &OverlayContext, registry: &PassRegistry) -> Result<OverlayState> {
    let raster = ctx
        .raster
        .clone()
        .ok_or_else(|| OverlayError::Registration("no raster loaded".to_string()))?;

    if let Some(pass) = REQUIRED_PASSES.iter().find(|&&p| !registry.has_pass(p)) {
        return Err(OverlayError::Registration(format!(
            "host does not expose the '{}' pass",
            pass
        )));
    }

    let config = &ctx.config;
    if config.chunk_size <= 0 || config.blocks_per_region <= 0 {
        return Err(OverlayError::Registration(format!(
            "invalid host geometry: chunk size {}, blocks per region {}",
            config.chunk_size, config.blocks_per_region
        )));
    }
    if ctx.world.world_height < 3 || ctx.world.sea_level < 1 {
        return Err(OverlayError::Registration(format!(
            "invalid world: height {}, sea level {}",
            ctx.world.world_height, ctx.world.sea_level
        )));
    }

    Ok(OverlayState::new(raster, ctx.config.clone(), ctx.world))
}

fn chunk_handler(state: &Arc<OverlayState>, stage: fn(&OverlayState, &mut dyn ChunkColumn)) -> ChunkHandler {
    let state = Arc::clone(state);
    Arc::new(move |chunk: &mut dyn ChunkColumn| stage(&state, chunk))
}

fn region_handler(state: &Arc<OverlayState>, stage: fn(&OverlayState, &mut MapRegion)) -> RegionHandler {
    let state = Arc::clone(state);
    Arc::new(move |region: &mut MapRegion| stage(&state, region))
}
