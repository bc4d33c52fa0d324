//! PNG import of authored rasters and PNG previews of rasters and generated
//! terrain.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use crate::error::{OverlayError, Result};
use crate::host::{ChunkArea, ChunkColumn};
use crate::raster::{Layer, RasterContainer};
use crate::remap;

/// Build a raster from a grayscale height PNG plus one PNG per layer.
///
/// 16-bit height images are read as block heights directly; 8-bit images
/// give heights 0-255. Layer images are 8-bit; fixed-domain layers are
/// quantised from 0-255 down to their authored range.
pub fn import_png_heightmap(
    heights: impl AsRef<Path>,
    layers: &[(String, &Path)],
    origin_x: i32,
    origin_z: i32,
) -> Result<RasterContainer> {
    let heights_img = image::open(heights.as_ref())?;
    let (width, height) = (heights_img.width() as i32, heights_img.height() as i32);
    let grid: Vec<u16> = match heights_img {
        DynamicImage::ImageLuma16(buf) => buf.into_raw(),
        other => other.to_luma8().into_raw().into_iter().map(u16::from).collect(),
    };
    let mut raster = RasterContainer::new(width, height, origin_x, origin_z, grid);

    for (name, path) in layers {
        let img = image::open(path)?.to_luma8();
        if img.width() as i32 != width || img.height() as i32 != height {
            return Err(OverlayError::Format(format!(
                "layer '{}' is {}x{}, heights are {}x{}",
                name,
                img.width(),
                img.height(),
                width,
                height
            )));
        }
        let data = match remap::source_max(name) {
            Some(max) => img
                .into_raw()
                .into_iter()
                .map(|v| (v as f32 * max as f32 / 255.0).round() as u8)
                .collect(),
            None => img.into_raw(),
        };
        raster.insert_layer(Layer::new(name.as_str(), width, height, data));
    }

    log::info!(
        "Imported {}x{} raster with {} layers (heights {}..{})",
        width,
        height,
        raster.layer_count(),
        raster.sample_min,
        raster.sample_max
    );
    Ok(raster)
}

/// Write a layer as grayscale, remapped to the full byte range.
pub fn export_layer_png(raster: &RasterContainer, layer_name: &str, path: impl AsRef<Path>) -> Result<()> {
    let layer = raster
        .layer(layer_name)
        .ok_or_else(|| OverlayError::Format(format!("raster has no layer '{}'", layer_name)))?;
    let mut img: GrayImage = ImageBuffer::new(layer.width as u32, layer.height as u32);
    for z in 0..layer.height {
        for x in 0..layer.width {
            let value = remap::remap(layer_name, layer.get(x, z));
            img.put_pixel(x as u32, z as u32, Luma([value]));
        }
    }
    img.save(path)?;
    Ok(())
}

/// Write the raster heights with a spectral colormap over the sampled range.
pub fn export_heights_png(raster: &RasterContainer, path: impl AsRef<Path>) -> Result<()> {
    let lo = raster.sample_min as f32;
    let span = (raster.sample_max as f32 - lo).max(1.0);
    let mut img: RgbImage = ImageBuffer::new(raster.width as u32, raster.height as u32);
    for z in 0..raster.height {
        for x in 0..raster.width {
            let t = (raster.height_at_pixel(x, z) as f32 - lo) / span;
            img.put_pixel(x as u32, z as u32, Rgb(spectral_colormap(t.clamp(0.0, 1.0))));
        }
    }
    img.save(path)?;
    Ok(())
}

/// Write generated rain heights of a materialized chunk area.
///
/// `lookup` returns the saved chunk at chunk coordinates; chunks it does not
/// know render black.
pub fn export_generated_heights_png<'a, C, F>(
    area: ChunkArea,
    chunk_size: i32,
    world_height: i32,
    lookup: F,
    path: impl AsRef<Path>,
) -> Result<()>
where
    C: ChunkColumn + ?Sized + 'a,
    F: Fn(i32, i32) -> Option<&'a C>,
{
    let size = chunk_size;
    let max = world_height.max(1) as f32;
    let width = ((area.max_cx - area.min_cx).max(0) * size) as u32;
    let height = ((area.max_cz - area.min_cz).max(0) * size) as u32;
    let mut img: RgbImage = ImageBuffer::new(width, height);

    for (cx, cz) in area.chunks() {
        let Some(chunk) = lookup(cx, cz) else {
            continue;
        };
        let (bx, bz) = ((cx - area.min_cx) * size, (cz - area.min_cz) * size);
        for lz in 0..size {
            for lx in 0..size {
                let t = chunk.rain_height(lx, lz) as f32 / max;
                let color = if chunk.rain_height(lx, lz) == 0 {
                    [0, 0, 0]
                } else {
                    spectral_colormap(t)
                };
                img.put_pixel((bx + lx) as u32, (bz + lz) as u32, Rgb(color));
            }
        }
    }
    img.save(path)?;
    Ok(())
}

/// Spectral colormap: dark blue (low) through yellow to dark red (high).
pub fn spectral_colormap(t: f32) -> [u8; 3] {
    const STOPS: [[f32; 3]; 7] = [
        [0.37, 0.31, 0.64],
        [0.20, 0.53, 0.74],
        [0.40, 0.76, 0.65],
        [0.90, 0.96, 0.60],
        [0.99, 0.68, 0.38],
        [0.84, 0.24, 0.31],
        [0.62, 0.00, 0.26],
    ];
    let scaled = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f32;
    let idx = (scaled as usize).min(STOPS.len() - 2);
    let frac = scaled - idx as f32;
    let (a, b) = (STOPS[idx], STOPS[idx + 1]);
    [
        ((a[0] + (b[0] - a[0]) * frac) * 255.0) as u8,
        ((a[1] + (b[1] - a[1]) * frac) * 255.0) as u8,
        ((a[2] + (b[2] - a[2]) * frac) * 255.0) as u8,
    ]
}
