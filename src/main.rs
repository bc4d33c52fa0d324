use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use terrain_overlay::command::{self, Caller};
use terrain_overlay::export;
use terrain_overlay::host::memory::{MemoryWorld, MemoryWorldConfig};
use terrain_overlay::host::ChunkArea;
use terrain_overlay::pregen::plan_tiles;
use terrain_overlay::raster::{self, RasterContainer};
use terrain_overlay::remap::{is_painted, LayerKind};
use terrain_overlay::{pipeline, startup, OverlayConfig, OverlayError, Result};

#[derive(Parser, Debug)]
#[command(name = "terrain_overlay")]
#[command(about = "Author, inspect and apply terrain overlay rasters")]
struct Args {
    /// JSON config file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "overlay.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header and layers of a raster file
    Info { raster: PathBuf },

    /// Build a raster file from PNG images
    Import {
        /// Grayscale height image (8 or 16 bit)
        #[arg(long)]
        heights: PathBuf,

        /// Control layer as NAME=PATH, repeatable
        #[arg(short, long = "layer")]
        layers: Vec<String>,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        origin_x: i32,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        origin_z: i32,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write PNG previews of a raster's heights and layers
    Export {
        raster: PathBuf,

        #[arg(short, long, default_value = "overlay_preview")]
        out_dir: PathBuf,
    },

    /// Pre-generate the coverage area in the reference in-memory host
    Pregen {
        /// World edge length in blocks
        #[arg(long, default_value = "1024")]
        world_size: i32,

        #[arg(long, default_value = "256")]
        world_height: i32,

        #[arg(long, default_value = "110")]
        sea_level: i32,

        #[arg(short, long, default_value = "7")]
        seed: u32,

        /// Center the raster in the world, overriding the config
        #[arg(long)]
        center: bool,

        /// Write generated heights of the pre-generated area to this PNG
        #[arg(long)]
        preview: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("Error: {}", err);
        // A world not created for the overlay must never be touched again
        // in this process.
        std::process::exit(if err.is_fatal() { 2 } else { 1 });
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = OverlayConfig::load(&args.config)?;
    match args.command {
        Command::Info { raster } => info(&raster),
        Command::Import {
            heights,
            layers,
            origin_x,
            origin_z,
            output,
        } => import(&heights, &layers, origin_x, origin_z, &output),
        Command::Export { raster, out_dir } => export_previews(&raster, &out_dir),
        Command::Pregen {
            world_size,
            world_height,
            sea_level,
            seed,
            center,
            preview,
        } => {
            config.center_in_world |= center;
            let world = MemoryWorldConfig {
                seed,
                size_x: world_size,
                size_z: world_size,
                world_height,
                sea_level,
                chunk_size: config.chunk_size,
                blocks_per_region: config.blocks_per_region,
                ..Default::default()
            };
            pregen(config, world, preview.as_deref())
        }
    }
}

fn info(path: &Path) -> Result<()> {
    let raster = raster::load(path)?;
    println!("Raster: {}", path.display());
    println!("  Version: {}", raster.version);
    println!("  Size: {}x{}", raster.width, raster.height);
    println!("  Origin: ({}, {})", raster.origin_x, raster.origin_z);
    println!("  Heights: {}..{}", raster.sample_min, raster.sample_max);
    println!("  Layers: {}", raster.layer_count());
    let cells = (raster.width * raster.height).max(1) as f64;
    for layer in raster.layers() {
        let painted = layer.data.iter().filter(|&&v| is_painted(v)).count();
        let role = match LayerKind::from_name(&layer.name) {
            Some(_) => "control",
            None => "ignored",
        };
        println!(
            "    {:<24} {:>6.1}% painted  ({})",
            layer.name,
            100.0 * painted as f64 / cells,
            role
        );
    }
    Ok(())
}

fn import(heights: &Path, layers: &[String], origin_x: i32, origin_z: i32, output: &Path) -> Result<()> {
    let mut parsed = Vec::with_capacity(layers.len());
    for arg in layers {
        let (name, path) = arg
            .split_once('=')
            .ok_or_else(|| OverlayError::Format(format!("layer '{}' is not NAME=PATH", arg)))?;
        parsed.push((name.to_string(), Path::new(path)));
    }

    println!("Importing {}...", heights.display());
    let raster = export::import_png_heightmap(heights, &parsed, origin_x, origin_z)?;
    raster::save(&raster, output)?;
    println!(
        "Wrote {} ({}x{}, {} layers)",
        output.display(),
        raster.width,
        raster.height,
        raster.layer_count()
    );
    Ok(())
}

fn export_previews(path: &Path, out_dir: &Path) -> Result<()> {
    let raster = raster::load(path)?;
    std::fs::create_dir_all(out_dir)?;

    let heights = out_dir.join("heights.png");
    export::export_heights_png(&raster, &heights)?;
    println!("Exported {}", heights.display());

    for layer in raster.layers() {
        let file = out_dir.join(format!("{}.png", layer.name.to_ascii_lowercase()));
        export::export_layer_png(&raster, &layer.name, &file)?;
        println!("Exported {}", file.display());
    }
    Ok(())
}

fn pregen(config: OverlayConfig, world_config: MemoryWorldConfig, preview: Option<&Path>) -> Result<()> {
    let mut world = MemoryWorld::new(world_config);
    let ctx = startup::initialize(&mut world, config)?;
    let Some(raster) = ctx.raster.clone() else {
        println!("No raster found; nothing to pre-generate.");
        return Ok(());
    };
    pipeline::register(&ctx, world.registry_mut())?;

    let coverage = raster.coverage();
    println!(
        "Pre-generating coverage {}x{} at ({}, {})...",
        coverage.width, coverage.height, coverage.min_x, coverage.min_z
    );
    let report = command::pregen(&Caller::admin("console"), coverage, &ctx.config, &mut world)?;
    println!(
        "Done: {} chunks in {} tiles, {:.1}s",
        report.chunks,
        report.tiles,
        report.elapsed.num_milliseconds() as f64 / 1000.0
    );

    if let Some(path) = preview {
        let area = preview_area(&raster, &ctx.config);
        let (chunk_size, world_height) = (world.config().chunk_size, world.config().world_height);
        export::export_generated_heights_png(area, chunk_size, world_height, |cx, cz| world.chunk(cx, cz), path)?;
        println!("Preview written to {}", path.display());
    }
    Ok(())
}

/// Bounding chunk area of every pre-generated tile.
fn preview_area(raster: &RasterContainer, config: &OverlayConfig) -> ChunkArea {
    let tiles = plan_tiles(
        raster.coverage(),
        config.chunk_size,
        config.pregen_tile_chunks,
        config.pregen_padding_chunks,
    );
    tiles.iter().fold(ChunkArea::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN), |acc, t| {
        ChunkArea::new(
            acc.min_cx.min(t.min_cx),
            acc.min_cz.min(t.min_cz),
            acc.max_cx.max(t.max_cx),
            acc.max_cz.max(t.max_cz),
        )
    })
}
