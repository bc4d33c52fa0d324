//! Two-pass chamfer distance transform with nearest-seed value propagation.

use std::f32::consts::SQRT_2;

/// Sparse painted pixels of one tile.
#[derive(Clone, Debug)]
pub struct SeedField {
    pub size: usize,
    pub mask: Vec<bool>,
    pub values: Vec<u8>,
}

impl SeedField {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            mask: vec![false; size * size],
            values: vec![0; size * size],
        }
    }

    pub fn seed(&mut self, index: usize, value: u8) {
        self.mask[index] = true;
        self.values[index] = value;
    }

    pub fn is_seeded(&self, index: usize) -> bool {
        self.mask[index]
    }

    pub fn seed_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Distance to the nearest seed (in pixels) and that seed's value.
#[derive(Clone, Debug)]
pub struct DistanceField {
    pub size: usize,
    pub distance: Vec<f32>,
    pub nearest: Vec<u8>,
}

/// Forward-pass neighbours: left, upper-left, up, upper-right.
const FORWARD: [(i32, i32, f32); 4] = [(-1, 0, 1.0), (-1, -1, SQRT_2), (0, -1, 1.0), (1, -1, SQRT_2)];
/// Backward-pass neighbours: right, lower-right, down, lower-left.
const BACKWARD: [(i32, i32, f32); 4] = [(1, 0, 1.0), (1, 1, SQRT_2), (0, 1, 1.0), (-1, 1, SQRT_2)];

impl DistanceField {
    /// Run the transform over the whole tile. Pixels no seed can reach keep
    /// an infinite distance.
    pub fn compute(seeds: &SeedField) -> Self {
        let n = seeds.size;
        let mut field = Self {
            size: n,
            distance: vec![f32::INFINITY; n * n],
            nearest: vec![0; n * n],
        };

        for idx in 0..n * n {
            if seeds.mask[idx] {
                field.distance[idx] = 0.0;
                field.nearest[idx] = seeds.values[idx];
            }
        }

        for z in 0..n {
            for x in 0..n {
                field.relax(x, z, &FORWARD);
            }
        }
        for z in (0..n).rev() {
            for x in (0..n).rev() {
                field.relax(x, z, &BACKWARD);
            }
        }

        field
    }

    fn relax(&mut self, x: usize, z: usize, neighbours: &[(i32, i32, f32); 4]) {
        let n = self.size as i32;
        let idx = z * self.size + x;
        let mut best = self.distance[idx];
        let mut best_value = self.nearest[idx];

        for &(dx, dz, cost) in neighbours {
            let nx = x as i32 + dx;
            let nz = z as i32 + dz;
            if nx < 0 || nz < 0 || nx >= n || nz >= n {
                continue;
            }
            let nidx = nz as usize * self.size + nx as usize;
            let candidate = self.distance[nidx] + cost;
            if candidate < best {
                best = candidate;
                best_value = self.nearest[nidx];
            }
        }

        self.distance[idx] = best;
        self.nearest[idx] = best_value;
    }

    pub fn get(&self, x: usize, z: usize) -> (f32, u8) {
        let idx = z * self.size + x;
        (self.distance[idx], self.nearest[idx])
    }
}
