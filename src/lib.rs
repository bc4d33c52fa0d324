//! Terrain overlay library
//!
//! Loads an authored height raster with sparse control layers and steers a
//! pass-based voxel world generator with it: authored heights replace the
//! host's raw terrain inside the raster's coverage, control layers are
//! blended into the host's region maps, and everything outside coverage is
//! erased.

pub mod blend;
pub mod command;
pub mod config;
pub mod error;
pub mod export;
pub mod host;
pub mod ore;
pub mod pipeline;
pub mod pregen;
pub mod raster;
pub mod remap;
pub mod startup;

pub use config::OverlayConfig;
pub use error::{OverlayError, Result};
pub use pipeline::{register, OverlayContext};
pub use raster::RasterContainer;
