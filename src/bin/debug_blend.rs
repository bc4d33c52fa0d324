//! Debug script to preview blend falloff for the configured influence radii.
//!
//! Paints a few seeds into a synthetic raster covering one region, blends
//! them into a flat host map with the vegetation and the climate radius, and
//! writes both results as grayscale PNGs plus a text profile through the
//! first seed.

use image::{GrayImage, ImageBuffer, Luma};

use terrain_overlay::blend::{blend_into, BlendOutcome, BlendParams, Scalar};
use terrain_overlay::host::IntMap;
use terrain_overlay::raster::{Layer, RasterContainer, RegionTile};
use terrain_overlay::OverlayConfig;

const INNER: usize = 64;
const PADDING: usize = 2;
const BASELINE: i32 = 40;
const LAYER: &str = "vegetation_forest";

/// Inner pixel and raw value of each seed
const SEEDS: [(usize, usize, u8); 3] = [(16, 16, 15), (48, 32, 10), (21, 48, 5)];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let config = OverlayConfig::load("overlay.json").unwrap_or_default();
    let bpr = config.blocks_per_region;
    let tile = IntMap::filled(INNER, PADDING, BASELINE).tile(0, 0, bpr);
    let raster = seeded_raster(&tile, bpr);

    println!(
        "Region of {} blocks, {} inner pixels ({:.1} blocks/pixel), {} seeds",
        bpr,
        INNER,
        tile.blocks_per_pixel(),
        SEEDS.len()
    );

    let runs = [
        ("blend_vegetation.png", config.vegetation_blend()),
        ("blend_climate.png", config.climate_blend()),
    ];
    for (file, params) in runs {
        let (map, outcome) = blended(&raster, bpr, &params);
        match outcome {
            BlendOutcome::Blended { coverage, seeds } => {
                println!("{}: blended {} seeds at {:.2}% coverage", file, seeds, coverage * 100.0)
            }
            other => {
                eprintln!("{}: expected a falloff blend, got {:?}", file, other);
                continue;
            }
        }
        if let Err(e) = to_image(&map).save(file) {
            eprintln!("Failed to write {}: {}", file, e);
            continue;
        }
        println!("Wrote {} (radius {} blocks)", file, params.influence_radius);

        let row = SEEDS[0].1 + PADDING;
        let profile: Vec<String> = (0..map.size).step_by(4).map(|x| map.get(x, row).to_string()).collect();
        println!("  row {}: {}", row, profile.join(" "));
    }
}

/// Paint each seed over the full block footprint of its pixel, so the
/// pixel-centre sample always lands on it.
fn seeded_raster(tile: &RegionTile, bpr: i32) -> RasterContainer {
    let mut raster = RasterContainer::uniform(bpr, bpr, 0, 0, 100);
    let mut layer = Layer::filled(LAYER, bpr, bpr, 0);
    let half = (tile.blocks_per_pixel() / 2.0).ceil() as i32;
    for &(px, pz, value) in &SEEDS {
        let cx = tile.world_coord(0, px + PADDING);
        let cz = tile.world_coord(0, pz + PADDING);
        for z in (cz - half).max(0)..=(cz + half).min(bpr - 1) {
            for x in (cx - half).max(0)..=(cx + half).min(bpr - 1) {
                layer.set(x, z, value);
            }
        }
    }
    raster.insert_layer(layer);
    raster
}

fn blended(raster: &RasterContainer, bpr: i32, params: &BlendParams) -> (IntMap, BlendOutcome) {
    let mut map = IntMap::filled(INNER, PADDING, BASELINE);
    let tile = map.tile(0, 0, bpr);
    let outcome = blend_into(&mut map.data, &tile, raster, LAYER, &Scalar, params);
    (map, outcome)
}

fn to_image(map: &IntMap) -> GrayImage {
    ImageBuffer::from_fn(map.size as u32, map.size as u32, |x, z| {
        Luma([map.get(x as usize, z as usize).clamp(0, 255) as u8])
    })
}
