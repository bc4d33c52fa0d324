//! Region-level injection of authored control layers.
//!
//! Runs after the host generated its own region maps, so authored values are
//! blended over host values rather than overwritten by them.

use crate::blend::{blend_into, BlendOutcome, BlendParams, CellChannel, ClimateChannel, Scalar};
use crate::host::{IntMap, MapRegion, ScalarMap};
use crate::ore;
use crate::raster::RasterContainer;
use crate::remap::LayerKind;

use super::OverlayState;

/// Authored layer steering each scalar map, and whether it blends over the
/// short vegetation radius (`true`) or the long climate radius.
pub const SCALAR_LAYERS: &[(ScalarMap, LayerKind, bool)] = &[
    (ScalarMap::Forest, LayerKind::VegetationForest, true),
    (ScalarMap::Shrub, LayerKind::VegetationShrubbery, true),
    (ScalarMap::Flower, LayerKind::VegetationFlowers, true),
    (ScalarMap::Beach, LayerKind::WaterBeach, true),
    (ScalarMap::Ocean, LayerKind::WaterOcean, false),
];

pub fn climate_layer(channel: ClimateChannel) -> LayerKind {
    match channel {
        ClimateChannel::Temperature => LayerKind::ClimateTemperature,
        ClimateChannel::Moisture => LayerKind::ClimateMoisture,
        ClimateChannel::Tectonic => LayerKind::ClimateTectonic,
    }
}

/// Blend every authored layer into the region's maps and scale its ore maps.
pub fn inject_region_maps(state: &OverlayState, region: &mut MapRegion) {
    let bpr = state.config.blocks_per_region;
    let (x0, z0) = (region.region_x * bpr, region.region_z * bpr);
    // Padding pixels reach into neighbouring regions; one region of slack
    // on each side is more than any host pads.
    if !state
        .raster
        .coverage()
        .intersects_inclusive(x0 - bpr, z0 - bpr, x0 + 2 * bpr - 1, z0 + 2 * bpr - 1)
    {
        return;
    }

    let raster = &*state.raster;
    let (rx, rz) = (region.region_x, region.region_z);
    let vegetation = state.config.vegetation_blend();
    let climate = state.config.climate_blend();

    for &(map, layer, short_radius) in SCALAR_LAYERS {
        let Some(cells) = region.scalar_mut(map) else {
            continue;
        };
        let params = if short_radius { &vegetation } else { &climate };
        let outcome = blend_map(cells, rx, rz, bpr, raster, layer, params, &Scalar);
        log_outcome(rx, rz, layer, outcome);
    }

    if let Some(cells) = region.climate.as_mut() {
        for &channel in ClimateChannel::all() {
            let layer = climate_layer(channel);
            let outcome = blend_map(cells, rx, rz, bpr, raster, layer, &climate, &channel);
            log_outcome(rx, rz, layer, outcome);
        }
    }

    if raster.has_layer(LayerKind::OreMultiplier.name()) {
        for (name, map) in region.ore_maps.iter_mut() {
            let scaled = scale_ore_map(map, rx, rz, bpr, raster);
            log::debug!("Region ({}, {}): scaled {} '{}' ore pixels", rx, rz, scaled, name);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn blend_map<C: CellChannel>(
    map: &mut IntMap,
    rx: i32,
    rz: i32,
    bpr: i32,
    raster: &RasterContainer,
    layer: LayerKind,
    params: &BlendParams,
    channel: &C,
) -> BlendOutcome {
    let tile = map.tile(rx, rz, bpr);
    blend_into(&mut map.data, &tile, raster, layer.name(), channel, params)
}

/// Multiply host ore density by the authored curve on every painted pixel.
/// Returns the number of pixels touched.
pub fn scale_ore_map(map: &mut IntMap, rx: i32, rz: i32, bpr: i32, raster: &RasterContainer) -> usize {
    let tile = map.tile(rx, rz, bpr);
    let mut scaled = 0;
    for p in tile.pixels() {
        let raw = raster.sample_layer_raw(LayerKind::OreMultiplier.name(), p.world_x, p.world_z);
        let density = map.data[p.index].clamp(0, 255) as u8;
        if let Some(value) = ore::scale_density(density, raw) {
            map.data[p.index] = value as i32;
            scaled += 1;
        }
    }
    scaled
}

fn log_outcome(rx: i32, rz: i32, layer: LayerKind, outcome: BlendOutcome) {
    match outcome {
        BlendOutcome::NoLayer | BlendOutcome::NoSeeds => {}
        BlendOutcome::Overwritten { coverage } => {
            log::debug!("Region ({}, {}) {}: overwritten at {:.0}% coverage", rx, rz, layer, coverage * 100.0)
        }
        BlendOutcome::Blended { coverage, seeds } => log::debug!(
            "Region ({}, {}) {}: blended {} seeds at {:.0}% coverage",
            rx,
            rz,
            layer,
            seeds,
            coverage * 100.0
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::{pack_climate, unpack_climate};
    use crate::config::OverlayConfig;
    use crate::pipeline::WorldInfo;
    use crate::raster::Layer;
    use std::sync::Arc;

    const BPR: i32 = 64;

    fn state(raster: RasterContainer) -> OverlayState {
        let config = OverlayConfig {
            blocks_per_region: BPR,
            vegetation_radius: 8.0,
            climate_radius: 32.0,
            ..Default::default()
        };
        let world = WorldInfo {
            size_x: 256,
            size_z: 256,
            world_height: 128,
            sea_level: 64,
        };
        OverlayState::new(Arc::new(raster), config, world)
    }

    fn region_with_maps() -> MapRegion {
        let mut region = MapRegion::new(0, 0);
        for &map in ScalarMap::all() {
            region.scalars.insert(map, IntMap::filled(16, 2, 50));
        }
        region.climate = Some(IntMap::filled(16, 2, pack_climate(10, 20, 30)));
        region.ore_maps.insert("iron".into(), IntMap::filled(8, 1, 100));
        region
    }

    #[test]
    fn test_full_forest_overwrites_only_forest() {
        let mut raster = RasterContainer::uniform(BPR, BPR, 0, 0, 70);
        raster.insert_layer(Layer::filled("vegetation_forest", BPR, BPR, 15));
        let state = state(raster);

        let mut region = region_with_maps();
        inject_region_maps(&state, &mut region);

        let forest = region.scalar(ScalarMap::Forest).unwrap();
        let inner = forest.get(5, 5);
        assert_eq!(inner, 255);
        assert_eq!(region.scalar(ScalarMap::Shrub).unwrap().get(5, 5), 50);
        assert_eq!(
            unpack_climate(region.climate.as_ref().unwrap().get(5, 5)),
            (10, 20, 30)
        );
        assert_eq!(region.ore_maps["iron"].get(3, 3), 100);
    }

    #[test]
    fn test_climate_channel_blend() {
        let mut raster = RasterContainer::uniform(BPR, BPR, 0, 0, 70);
        raster.insert_layer(Layer::filled("climate_temperature", BPR, BPR, 15));
        let state = state(raster);

        let mut region = region_with_maps();
        inject_region_maps(&state, &mut region);
        let (t, m, g) = unpack_climate(region.climate.as_ref().unwrap().get(8, 8));
        assert_eq!((t, m, g), (255, 20, 30));
    }

    #[test]
    fn test_ore_multiplier_scales_density() {
        let mut raster = RasterContainer::uniform(BPR, BPR, 0, 0, 70);
        let mut layer = Layer::filled("ore_multiplier", BPR, BPR, 0);
        for z in 0..BPR / 2 {
            for x in 0..BPR {
                layer.set(x, z, 15);
            }
        }
        raster.insert_layer(layer);
        let state = state(raster);

        let mut region = region_with_maps();
        inject_region_maps(&state, &mut region);
        let ore = &region.ore_maps["iron"];
        // Top half painted at 15 (x4, clamped), bottom half unpainted.
        assert_eq!(ore.get(2, 2), 255);
        assert_eq!(ore.get(2, 7), 100);
    }

    #[test]
    fn test_region_far_from_coverage_untouched() {
        let mut raster = RasterContainer::uniform(BPR, BPR, 0, 0, 70);
        raster.insert_layer(Layer::filled("vegetation_forest", BPR, BPR, 15));
        let state = state(raster);

        let mut region = region_with_maps();
        region.region_x = 5;
        inject_region_maps(&state, &mut region);
        assert!(region.scalar(ScalarMap::Forest).unwrap().data.iter().all(|&v| v == 50));
    }

    #[test]
    fn test_missing_host_maps_are_skipped() {
        let mut raster = RasterContainer::uniform(BPR, BPR, 0, 0, 70);
        raster.insert_layer(Layer::filled("water_ocean", BPR, BPR, 15));
        let state = state(raster);

        let mut region = MapRegion::new(0, 0);
        inject_region_maps(&state, &mut region);
        assert!(region.scalars.is_empty());
        assert!(region.climate.is_none());
    }
}
