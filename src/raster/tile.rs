//! Pixel ↔ world mapping for host region maps.
//!
//! A host region map covers `blocks_per_region` blocks with `inner_size`
//! pixels plus a padding border on each side. Padding pixels map to world
//! columns of the neighbouring regions, which keeps nearest-neighbour writes
//! stable across region boundaries.

/// Geometry of one padded region map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionTile {
    pub region_x: i32,
    pub region_z: i32,
    /// Full padded edge length in pixels
    pub size: usize,
    /// Top-left padding in pixels
    pub padding: usize,
    /// Unpadded edge length in pixels
    pub inner_size: usize,
    pub blocks_per_region: i32,
}

/// One pixel of a region tile together with the world column it samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePixel {
    pub px: usize,
    pub pz: usize,
    /// Row-major index into the padded map
    pub index: usize,
    pub world_x: i32,
    pub world_z: i32,
}

impl RegionTile {
    pub fn new(
        region_x: i32,
        region_z: i32,
        size: usize,
        padding: usize,
        inner_size: usize,
        blocks_per_region: i32,
    ) -> Self {
        debug_assert!(inner_size > 0, "region tile without inner pixels");
        debug_assert!(padding + inner_size <= size);
        Self {
            region_x,
            region_z,
            size,
            padding,
            inner_size,
            blocks_per_region,
        }
    }

    /// World coordinate sampled by a pixel along one axis:
    /// `floor(region * bpr + ((pixel - padding + 0.5) / inner) * bpr)`.
    #[inline]
    pub fn world_coord(&self, region_index: i32, pixel: usize) -> i32 {
        let bpr = self.blocks_per_region as f64;
        let frac = (pixel as f64 - self.padding as f64 + 0.5) / self.inner_size as f64;
        (region_index as f64 * bpr + frac * bpr).floor() as i32
    }

    /// Block length of one pixel.
    #[inline]
    pub fn blocks_per_pixel(&self) -> f32 {
        self.blocks_per_region as f32 / self.inner_size as f32
    }

    pub fn pixel_count(&self) -> usize {
        self.size * self.size
    }

    pub fn inner_pixel_count(&self) -> usize {
        self.inner_size * self.inner_size
    }

    fn pixel(&self, px: usize, pz: usize) -> TilePixel {
        TilePixel {
            px,
            pz,
            index: pz * self.size + px,
            world_x: self.world_coord(self.region_x, px),
            world_z: self.world_coord(self.region_z, pz),
        }
    }

    /// Every pixel of the padded tile, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = TilePixel> + '_ {
        (0..self.size).flat_map(move |pz| (0..self.size).map(move |px| self.pixel(px, pz)))
    }

    /// Only the unpadded inner rectangle, row-major.
    pub fn inner_pixels(&self) -> impl Iterator<Item = TilePixel> + '_ {
        let range = self.padding..self.padding + self.inner_size;
        range
            .clone()
            .flat_map(move |pz| range.clone().map(move |px| self.pixel(px, pz)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_coord_centers_pixels() {
        // 16 inner pixels over 512 blocks: 32 blocks per pixel, sampled at centers.
        let tile = RegionTile::new(0, 0, 18, 1, 16, 512);
        assert_eq!(tile.world_coord(0, 1), 16);
        assert_eq!(tile.world_coord(0, 2), 48);
        assert_eq!(tile.world_coord(0, 16), 496);
        // Padding pixels land in the neighbouring regions.
        assert_eq!(tile.world_coord(0, 0), -16);
        assert_eq!(tile.world_coord(0, 17), 528);
        assert_eq!(tile.world_coord(2, 1), 1040);
    }

    #[test]
    fn test_padding_stable_across_regions() {
        // The right padding of region 0 samples the same column as the first
        // inner pixel of region 1, and vice versa.
        let tile = RegionTile::new(0, 0, 20, 2, 16, 512);
        assert_eq!(tile.world_coord(0, 18), tile.world_coord(1, 2));
        assert_eq!(tile.world_coord(1, 1), tile.world_coord(0, 17));
    }

    #[test]
    fn test_negative_regions_floor() {
        let tile = RegionTile::new(-1, -1, 4, 0, 4, 10);
        // -10 + (0.5 / 4) * 10 = -8.75 -> -9
        assert_eq!(tile.world_coord(-1, 0), -9);
    }

    #[test]
    fn test_iteration_counts() {
        let tile = RegionTile::new(3, -2, 10, 2, 6, 512);
        assert_eq!(tile.pixels().count(), 100);
        assert_eq!(tile.inner_pixels().count(), 36);

        let first_inner = tile.inner_pixels().next().unwrap();
        assert_eq!((first_inner.px, first_inner.pz), (2, 2));
        assert_eq!(first_inner.index, 22);
        assert!(tile.inner_pixels().all(|p| p.px >= 2 && p.px < 8 && p.pz >= 2 && p.pz < 8));
    }
}
