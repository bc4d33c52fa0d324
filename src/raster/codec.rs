//! Binary raster container format (little-endian).
//!
//! ```text
//! header (32 bytes)
//!   magic[4] version:u8 reserved:u8 header_size:u16
//!   width:i32 height:i32 origin_x:i32 origin_z:i32
//!   sample_min:u16 sample_max:u16 reserved[4]
//! heights: width*height × u16, row-major (z, x)
//! zero or more chunks, each starting with a 4-byte tag:
//!   "LAYR" count:u16 reserved:u16
//!     per entry: name_len:u8 flags:u8 width:i32 height:i32 payload_len:u32
//!                name[name_len] payload[payload_len]
//!   any other tag ends parsing; the rest of the file is ignored
//! ```

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{Layer, RasterContainer};
use crate::error::{OverlayError, Result};

pub const MAGIC: [u8; 4] = *b"HMOV";
pub const VERSION: u8 = 1;
pub const HEADER_SIZE: u16 = 32;
pub const LAYER_GROUP_TAG: [u8; 4] = *b"LAYR";

/// Read and decode a raster file.
pub fn load(path: impl AsRef<Path>) -> Result<RasterContainer> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let raster = decode(&bytes)?;
    log::info!(
        "Loaded raster {} ({}x{} at {},{}; heights {}..{}; {} layers)",
        path.display(),
        raster.width,
        raster.height,
        raster.origin_x,
        raster.origin_z,
        raster.sample_min,
        raster.sample_max,
        raster.layer_count()
    );
    Ok(raster)
}

/// Encode and write a raster file.
pub fn save(raster: &RasterContainer, path: impl AsRef<Path>) -> Result<()> {
    let bytes = encode(raster)?;
    fs::write(path, bytes)?;
    Ok(())
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode a raster from its file bytes.
pub fn decode(bytes: &[u8]) -> Result<RasterContainer> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    read_exact(&mut cursor, &mut magic, "magic")?;
    if magic != MAGIC {
        return Err(OverlayError::Format(format!(
            "bad magic {:?}, expected {:?}",
            String::from_utf8_lossy(&magic),
            String::from_utf8_lossy(&MAGIC)
        )));
    }

    let version = field(cursor.read_u8(), "version")?;
    let _reserved = field(cursor.read_u8(), "reserved")?;
    let header_size = field(cursor.read_u16::<LittleEndian>(), "header size")?;
    if header_size != HEADER_SIZE {
        return Err(OverlayError::Format(format!(
            "header size {} (expected {})",
            header_size, HEADER_SIZE
        )));
    }

    let width = field(cursor.read_i32::<LittleEndian>(), "width")?;
    let height = field(cursor.read_i32::<LittleEndian>(), "height")?;
    let origin_x = field(cursor.read_i32::<LittleEndian>(), "origin x")?;
    let origin_z = field(cursor.read_i32::<LittleEndian>(), "origin z")?;
    let sample_min = field(cursor.read_u16::<LittleEndian>(), "sample min")?;
    let sample_max = field(cursor.read_u16::<LittleEndian>(), "sample max")?;
    let mut reserved = [0u8; 4];
    read_exact(&mut cursor, &mut reserved, "header reserved bytes")?;

    if width <= 0 || height <= 0 {
        return Err(OverlayError::Format(format!(
            "invalid dimensions {}x{}",
            width, height
        )));
    }

    let cell_count = width as usize * height as usize;
    if remaining(&cursor) < cell_count as u64 * 2 {
        return Err(OverlayError::truncated("height grid"));
    }
    let mut heights = vec![0u16; cell_count];
    field(
        cursor.read_u16_into::<LittleEndian>(&mut heights),
        "height grid",
    )?;

    let mut raster = RasterContainer::new(width, height, origin_x, origin_z, heights);
    raster.version = version;
    raster.sample_min = sample_min;
    raster.sample_max = sample_max;

    while remaining(&cursor) >= 4 {
        let mut tag = [0u8; 4];
        read_exact(&mut cursor, &mut tag, "chunk tag")?;
        if tag != LAYER_GROUP_TAG {
            log::debug!(
                "Ignoring unrecognized chunk {:?} and {} trailing bytes",
                String::from_utf8_lossy(&tag),
                remaining(&cursor)
            );
            break;
        }
        decode_layer_group(&mut cursor, &mut raster)?;
    }

    Ok(raster)
}

fn decode_layer_group(cursor: &mut Cursor<&[u8]>, raster: &mut RasterContainer) -> Result<()> {
    let count = field(cursor.read_u16::<LittleEndian>(), "layer count")?;
    let _reserved = field(cursor.read_u16::<LittleEndian>(), "layer group reserved")?;

    for index in 0..count {
        let name_len = field(cursor.read_u8(), "layer name length")?;
        let flags = field(cursor.read_u8(), "layer flags")?;
        let width = field(cursor.read_i32::<LittleEndian>(), "layer width")?;
        let height = field(cursor.read_i32::<LittleEndian>(), "layer height")?;
        let payload_len = field(cursor.read_u32::<LittleEndian>(), "layer payload length")?;

        if width != raster.width || height != raster.height {
            return Err(OverlayError::Format(format!(
                "layer {} is {}x{}, container is {}x{}",
                index, width, height, raster.width, raster.height
            )));
        }

        let mut name_bytes = vec![0u8; name_len as usize];
        read_exact(cursor, &mut name_bytes, "layer name")?;
        let name = String::from_utf8(name_bytes)
            .map_err(|_| OverlayError::Format(format!("layer {} name is not UTF-8", index)))?;

        let expected = width as u64 * height as u64;
        if payload_len as u64 != expected {
            return Err(OverlayError::Format(format!(
                "layer '{}' payload is {} bytes, expected {}",
                name, payload_len, expected
            )));
        }
        if remaining(cursor) < expected {
            return Err(OverlayError::truncated(format!("layer '{}' payload", name)));
        }
        let mut data = vec![0u8; payload_len as usize];
        read_exact(cursor, &mut data, "layer payload")?;

        let mut layer = Layer::new(name, width, height, data);
        layer.flags = flags;
        raster.insert_layer(layer);
    }

    Ok(())
}

fn remaining(cursor: &Cursor<&[u8]>) -> u64 {
    (cursor.get_ref().len() as u64).saturating_sub(cursor.position())
}

fn read_exact(cursor: &mut Cursor<&[u8]>, buf: &mut [u8], name: &str) -> Result<()> {
    field(cursor.read_exact(buf), name)
}

/// Map a short read to `Truncated`, naming the field being read.
fn field<T>(result: io::Result<T>, name: &str) -> Result<T> {
    result.map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => OverlayError::truncated(name),
        _ => OverlayError::Io(e),
    })
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode a raster to file bytes. Exact inverse of [`decode`].
pub fn encode(raster: &RasterContainer) -> Result<Vec<u8>> {
    let cells = raster.heights().len();
    let layer_bytes: usize = raster
        .layers()
        .map(|l| 14 + l.name.len() + l.data.len())
        .sum();
    let mut out = Vec::with_capacity(HEADER_SIZE as usize + cells * 2 + 8 + layer_bytes);

    out.extend_from_slice(&MAGIC);
    out.write_u8(raster.version)?;
    out.write_u8(0)?;
    out.write_u16::<LittleEndian>(HEADER_SIZE)?;
    out.write_i32::<LittleEndian>(raster.width)?;
    out.write_i32::<LittleEndian>(raster.height)?;
    out.write_i32::<LittleEndian>(raster.origin_x)?;
    out.write_i32::<LittleEndian>(raster.origin_z)?;
    out.write_u16::<LittleEndian>(raster.sample_min)?;
    out.write_u16::<LittleEndian>(raster.sample_max)?;
    out.write_u32::<LittleEndian>(0)?;

    for &h in raster.heights() {
        out.write_u16::<LittleEndian>(h)?;
    }

    if raster.layer_count() > 0 {
        let count = u16::try_from(raster.layer_count())
            .map_err(|_| OverlayError::Format("too many layers".into()))?;
        out.extend_from_slice(&LAYER_GROUP_TAG);
        out.write_u16::<LittleEndian>(count)?;
        out.write_u16::<LittleEndian>(0)?;

        for layer in raster.layers() {
            let name_len = u8::try_from(layer.name.len()).map_err(|_| {
                OverlayError::Format(format!("layer name '{}' longer than 255 bytes", layer.name))
            })?;
            out.write_u8(name_len)?;
            out.write_u8(layer.flags)?;
            out.write_i32::<LittleEndian>(layer.width)?;
            out.write_i32::<LittleEndian>(layer.height)?;
            out.write_u32::<LittleEndian>(layer.data.len() as u32)?;
            out.extend_from_slice(layer.name.as_bytes());
            out.extend_from_slice(&layer.data);
        }
    }

    Ok(out)
}
