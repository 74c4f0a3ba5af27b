//! First-layer seeding: marks the voxels touching each sample point.
//!
//! Sweeps only propagate sites that already exist somewhere in the
//! grid, so a build starts by stamping every sample into the voxels
//! around it. Conflicts inside the shell are resolved by a per-voxel
//! distance comparison at subvoxel resolution.

use crate::grid::IndexGrid;
use crate::samples::SampleSet;
use crate::types::{VoxelAttr, HALF};

/// Distance quantization step used when comparing shell candidates:
/// distances are held as integer hundredths of a voxel.
pub(crate) const SUBVOXEL_RESOLUTION: f64 = 100.0;

/// Integer offsets whose distance from the origin is at most `radius`,
/// in x, y, z scan order.
pub fn ball_neighborhood(radius: f64) -> Vec<(i32, i32, i32)> {
  let r = radius.floor() as i32;
  let r2 = radius * radius;
  let mut offsets = Vec::new();
  for dx in -r..=r {
    for dy in -r..=r {
      for dz in -r..=r {
        if ((dx * dx + dy * dy + dz * dz) as f64) <= r2 {
          offsets.push((dx, dy, dz));
        }
      }
    }
  }
  offsets
}

/// Seeds the shell of voxels around every sample point.
///
/// A voxel adopts the index of a sample whose distance to the voxel
/// center is within the shell half thickness; when several samples
/// reach the same voxel, the closer one wins, and on an exact tie (at
/// subvoxel resolution) the lower index wins. Runs on the calling
/// thread so the outcome never depends on scheduling.
#[derive(Clone, Debug)]
pub struct ShellBuilder {
  /// Shell reach around each sample, in voxels (default: 1.0).
  pub shell_half_thickness: f64,
}

impl Default for ShellBuilder {
  fn default() -> Self {
    Self {
      shell_half_thickness: 1.0,
    }
  }
}

impl ShellBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_shell_half_thickness(mut self, voxels: f64) -> Self {
    self.shell_half_thickness = voxels;
    self
  }

  /// Writes nearest-sample indices into `grid` for all voxels within
  /// the shell. `samples` must be in grid units. Voxels out of reach
  /// of every sample are left untouched.
  pub fn execute(&self, grid: &IndexGrid, samples: &SampleSet) {
    if samples.is_empty() {
      return;
    }
    let (nx, ny, nz) = grid.dims();
    let neighborhood = ball_neighborhood(self.shell_half_thickness + 1.0);
    // Quantization tolerance keeps boundary samples from losing to
    // round-off at the shell edge.
    let tolerance = 1.0 / SUBVOXEL_RESOLUTION;
    let thickness = self.shell_half_thickness + tolerance;

    // Best distance seen per voxel, in subvoxel steps. Initialized just
    // past the largest distance a shell candidate can quantize to.
    let unreached = (SUBVOXEL_RESOLUTION * (thickness + HALF)) as u16;
    let mut best = vec![unreached; grid.len()];

    let xs = samples.xs();
    let ys = samples.ys();
    let zs = samples.zs();
    for index in 1..=samples.len() {
      let (x, y, z) = (xs[index], ys[index], zs[index]);
      let (ix, iy, iz) = (x as i32, y as i32, z as i32);
      for &(ox, oy, oz) in &neighborhood {
        let (vx, vy, vz) = (ix + ox, iy + oy, iz + oz);
        if vx < 0
          || vy < 0
          || vz < 0
          || vx >= nx as i32
          || vy >= ny as i32
          || vz >= nz as i32
        {
          continue;
        }
        let dx = x - (vx as f64 + HALF);
        let dy = y - (vy as f64 + HALF);
        let dz = z - (vz as f64 + HALF);
        let dist = (dx * dx + dy * dy + dz * dz).sqrt();
        if dist <= thickness {
          let quantized = (dist * SUBVOXEL_RESOLUTION + HALF) as u16;
          let cell = grid.cell_index(vx as usize, vy as usize, vz as usize);
          if quantized < best[cell] {
            best[cell] = quantized;
            grid.set(
              vx as usize,
              vy as usize,
              vz as usize,
              VoxelAttr::from_index(index as u32),
            );
          }
        }
      }
    }
  }
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod shell_test;
