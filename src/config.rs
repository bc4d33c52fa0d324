//! Overlay configuration.
//!
//! Every tunable constant of the engine lives here. The defaults match a host
//! with 32-block chunks and 512-block regions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blend::BlendParams;
use crate::error::Result;
use crate::host::{BlockId, FluidId};

/// Host block ids the overlay writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPalette {
    /// Unbreakable floor at y = 0
    pub mantle: BlockId,
    /// Fill for solid columns
    pub rock: BlockId,
    /// Fluid placed below sea level
    pub water: FluidId,
    /// Beach material around sea level
    pub beach: BlockId,
}

impl Default for BlockPalette {
    fn default() -> Self {
        Self {
            mantle: 1,
            rock: 2,
            water: 1,
            beach: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    // =========================================================================
    // Raster discovery
    // =========================================================================
    /// File name of the authored raster
    pub raster_file: String,

    /// Directories searched, in order, for `raster_file`
    pub search_dirs: Vec<PathBuf>,

    /// Center the raster inside the host world bounds at startup
    pub center_in_world: bool,

    // =========================================================================
    // Host geometry
    // =========================================================================
    pub chunk_size: i32,

    /// Blocks covered by one host region map
    pub blocks_per_region: i32,

    // =========================================================================
    // Blending
    // =========================================================================
    /// Influence radius in blocks for vegetation-density and beach maps
    pub vegetation_radius: f32,

    /// Influence radius in blocks for climate channels and the ocean map
    pub climate_radius: f32,

    /// Painted fraction at which a tile is overwritten instead of blended
    pub coverage_threshold: f32,

    // =========================================================================
    // Terrain shaping
    // =========================================================================
    /// Neighbour search radius (blocks) for water next to a beach column
    pub beach_radius: i32,

    pub palette: BlockPalette,

    /// Host handler stripped from the terrain pass
    pub host_terrain_handler: String,

    // =========================================================================
    // Pre-generation
    // =========================================================================
    /// Tile edge length in chunks
    pub pregen_tile_chunks: i32,

    /// Chunks added around the coverage on every side
    pub pregen_padding_chunks: i32,

    // =========================================================================
    // Save compatibility
    // =========================================================================
    /// Save metadata key marking a world created for the overlay
    pub compat_flag: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            raster_file: "overlay.hmov".to_string(),
            search_dirs: vec![PathBuf::from("."), PathBuf::from("overlay")],
            center_in_world: false,
            chunk_size: 32,
            blocks_per_region: 512,
            vegetation_radius: 48.0,
            climate_radius: 256.0,
            coverage_threshold: 0.95,
            beach_radius: 2,
            palette: BlockPalette::default(),
            host_terrain_handler: "host.raw_terrain".to_string(),
            pregen_tile_chunks: 16,
            pregen_padding_chunks: 1,
            compat_flag: "terrain_overlay.v1".to_string(),
        }
    }
}

impl OverlayConfig {
    /// Read a JSON config. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn vegetation_blend(&self) -> BlendParams {
        BlendParams::new(self.vegetation_radius, self.coverage_threshold)
    }

    pub fn climate_blend(&self) -> BlendParams {
        BlendParams::new(self.climate_radius, self.coverage_threshold)
    }

    /// Candidate raster paths in search order.
    pub fn raster_candidates(&self) -> Vec<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&self.raster_file))
            .collect()
    }
}
