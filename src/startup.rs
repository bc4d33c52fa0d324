//! Startup: raster discovery, save compatibility and context construction.
//!
//! A missing or unreadable raster disables the overlay and leaves the host to
//! generate an unmodified world. An existing world that was not created for
//! the overlay is refused outright with [`OverlayError::IncompatibleWorld`].

use std::path::PathBuf;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::host::WorldMeta;
use crate::pipeline::{OverlayContext, WorldInfo};
use crate::raster::{self, RasterContainer};

/// Find and decode the raster in the configured search locations.
pub fn discover_raster(config: &OverlayConfig) -> Result<(PathBuf, RasterContainer)> {
    let candidates = config.raster_candidates();
    match candidates.iter().find(|path| path.is_file()) {
        Some(path) => {
            let raster = raster::load(path)?;
            Ok((path.clone(), raster))
        }
        None => Err(OverlayError::MissingResource { searched: candidates }),
    }
}

/// Stamp a new world with `flag`; refuse an existing world without it.
pub fn check_compatibility(meta: &mut dyn WorldMeta, flag: &str) -> Result<()> {
    if meta.is_new_world() {
        meta.set_save_flag(flag, "true");
        log::info!("New world marked with '{}'", flag);
        return Ok(());
    }
    if meta.save_flag(flag).is_some() {
        return Ok(());
    }
    log::error!("Existing world lacks save flag '{}'; refusing to overlay it", flag);
    Err(OverlayError::IncompatibleWorld {
        flag: flag.to_string(),
    })
}

/// Build the overlay context for a world.
///
/// Returns a disabled context when no usable raster exists. The only error is
/// the fatal [`OverlayError::IncompatibleWorld`].
pub fn initialize(meta: &mut dyn WorldMeta, config: OverlayConfig) -> Result<OverlayContext> {
    let mut raster = match discover_raster(&config) {
        Ok((path, raster)) => {
            log::info!(
                "Overlay raster {}: {}x{} at ({}, {}), {} layers",
                path.display(),
                raster.width,
                raster.height,
                raster.origin_x,
                raster.origin_z,
                raster.layer_count()
            );
            raster
        }
        Err(err) => {
            log::warn!("Overlay disabled: {}", err);
            return Ok(OverlayContext::new(None, config, WorldInfo::from_meta(meta)));
        }
    };

    check_compatibility(meta, &config.compat_flag)?;

    let world = WorldInfo::from_meta(meta);
    if config.center_in_world {
        let (dx, dz) = raster.centering_offset(world.size_x, world.size_z);
        raster.apply_offset(dx, dz);
    }
    Ok(OverlayContext::new(Some(raster), config, world))
}
