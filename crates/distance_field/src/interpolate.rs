//! Distance queries over a finished index grid.
//!
//! A voxel's distance is reconstructed on demand from its stored
//! sample index: the Euclidean distance from the voxel center to that
//! sample, negated inside the shape. Queries blend the eight voxels
//! around the point, which keeps the field subvoxel-accurate even
//! though the grid only stores indices.

use std::sync::Arc;

use glam::DVec3;

use crate::bounds::GridBounds;
use crate::field::{lerp3, ScalarField};
use crate::grid::FrozenGrid;
use crate::samples::SampleSet;
use crate::types::{InterpolationMode, HALF};

/// Interpolating reader over a frozen grid and its sample set.
///
/// Queries outside the grid are clamped to the outermost voxel
/// centers; with distance extension enabled, the distance walked back
/// to the box is added on top, so the field keeps growing smoothly
/// instead of going flat at the boundary.
#[derive(Clone)]
pub struct IndexedDistanceInterpolator {
  grid: Arc<FrozenGrid>,
  samples: Arc<SampleSet>,
  bounds: GridBounds,
  max_distance: f64,
  extend_distance: bool,
  mode: InterpolationMode,
  // cached query geometry
  scale: f64,
  lo: DVec3,
  hi: DVec3,
  nx1: i64,
  ny1: i64,
  nz1: i64,
}

impl IndexedDistanceInterpolator {
  /// Reader with distance extension on and linear interpolation, the
  /// setup queries almost always want.
  pub fn new(
    grid: Arc<FrozenGrid>,
    samples: Arc<SampleSet>,
    bounds: GridBounds,
    max_distance: f64,
  ) -> Self {
    let (nx, ny, nz) = grid.dims();
    debug_assert_eq!((nx, ny, nz), bounds.dims(), "grid does not match bounds");
    let half = bounds.voxel_size * HALF;
    Self {
      scale: 1.0 / bounds.voxel_size,
      lo: bounds.min + DVec3::splat(half),
      hi: bounds.max - DVec3::splat(half),
      nx1: nx as i64 - 1,
      ny1: ny as i64 - 1,
      nz1: nz as i64 - 1,
      grid,
      samples,
      bounds,
      max_distance,
      extend_distance: true,
      mode: InterpolationMode::Linear,
    }
  }

  pub fn with_extend_distance(mut self, extend: bool) -> Self {
    self.extend_distance = extend;
    self
  }

  pub fn with_mode(mut self, mode: InterpolationMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn bounds(&self) -> GridBounds {
    self.bounds
  }

  pub fn max_distance(&self) -> f64 {
    self.max_distance
  }

  pub fn mode(&self) -> InterpolationMode {
    self.mode
  }

  pub fn grid(&self) -> &FrozenGrid {
    &self.grid
  }

  pub fn samples(&self) -> &SampleSet {
    &self.samples
  }

  /// Signed distance at one voxel: reconstructed from the stored
  /// sample, or the signed far value when the voxel is undefined.
  #[inline(always)]
  fn voxel_distance(&self, ix: i64, iy: i64, iz: i64) -> f64 {
    let ix = ix.clamp(0, self.nx1) as usize;
    let iy = iy.clamp(0, self.ny1) as usize;
    let iz = iz.clamp(0, self.nz1) as usize;
    let att = self.grid.get(ix, iy, iz);
    if att.is_undefined() {
      return att.sign() * self.max_distance;
    }
    let center = self.bounds.voxel_center(ix, iy, iz);
    att.sign() * center.distance(self.samples.point(att.index()))
  }

  /// Aux channel value at one voxel; undefined voxels contribute zero.
  #[inline(always)]
  fn voxel_aux(&self, channel: usize, ix: i64, iy: i64, iz: i64) -> f64 {
    let ix = ix.clamp(0, self.nx1) as usize;
    let iy = iy.clamp(0, self.ny1) as usize;
    let iz = iz.clamp(0, self.nz1) as usize;
    let att = self.grid.get(ix, iy, iz);
    if att.is_undefined() {
      return 0.0;
    }
    self.samples.aux(channel, att.index())
  }

  fn eval_linear(&self, point: DVec3, out: &mut [f64]) {
    let cx = point.x.clamp(self.lo.x, self.hi.x);
    let cy = point.y.clamp(self.lo.y, self.hi.y);
    let cz = point.z.clamp(self.lo.z, self.hi.z);

    // Continuous voxel coordinates of the clamped point; the cell
    // spans the eight voxel centers around it.
    let gx = (cx - self.bounds.min.x) * self.scale - HALF;
    let gy = (cy - self.bounds.min.y) * self.scale - HALF;
    let gz = (cz - self.bounds.min.z) * self.scale - HALF;
    let ix = (gx as i64).clamp(0, self.nx1);
    let iy = (gy as i64).clamp(0, self.ny1);
    let iz = (gz as i64).clamp(0, self.nz1);
    let ix1 = (ix + 1).min(self.nx1);
    let iy1 = (iy + 1).min(self.ny1);
    let iz1 = (iz + 1).min(self.nz1);
    let dx = gx - ix as f64;
    let dy = gy - iy as f64;
    let dz = gz - iz as f64;

    let d000 = self.voxel_distance(ix, iy, iz);
    let d100 = self.voxel_distance(ix1, iy, iz);
    let d010 = self.voxel_distance(ix, iy1, iz);
    let d110 = self.voxel_distance(ix1, iy1, iz);
    let d001 = self.voxel_distance(ix, iy, iz1);
    let d101 = self.voxel_distance(ix1, iy, iz1);
    let d011 = self.voxel_distance(ix, iy1, iz1);
    let d111 = self.voxel_distance(ix1, iy1, iz1);
    let mut dist = lerp3(d000, d100, d010, d110, d001, d101, d011, d111, dx, dy, dz);

    if self.extend_distance {
      let ext = point.distance(DVec3::new(cx, cy, cz));
      if ext > 0.0 {
        dist += ext;
      }
    }
    out[0] = dist;

    // Aux channels blend with the same weights as the distance.
    for channel in 0..self.samples.aux_channels() {
      let a000 = self.voxel_aux(channel, ix, iy, iz);
      let a100 = self.voxel_aux(channel, ix1, iy, iz);
      let a010 = self.voxel_aux(channel, ix, iy1, iz);
      let a110 = self.voxel_aux(channel, ix1, iy1, iz);
      let a001 = self.voxel_aux(channel, ix, iy, iz1);
      let a101 = self.voxel_aux(channel, ix1, iy, iz1);
      let a011 = self.voxel_aux(channel, ix, iy1, iz1);
      let a111 = self.voxel_aux(channel, ix1, iy1, iz1);
      out[channel + 1] = lerp3(a000, a100, a010, a110, a001, a101, a011, a111, dx, dy, dz);
    }
  }

  fn eval_box(&self, point: DVec3, out: &mut [f64]) {
    let cx = point.x.clamp(self.lo.x, self.hi.x);
    let cy = point.y.clamp(self.lo.y, self.hi.y);
    let cz = point.z.clamp(self.lo.z, self.hi.z);
    let ix = ((cx - self.bounds.min.x) * self.scale) as i64;
    let iy = ((cy - self.bounds.min.y) * self.scale) as i64;
    let iz = ((cz - self.bounds.min.z) * self.scale) as i64;

    let mut dist = self.voxel_distance(ix, iy, iz);
    if self.extend_distance {
      let ext = point.distance(DVec3::new(cx, cy, cz));
      if ext > 0.0 {
        dist += ext;
      }
    }
    out[0] = dist;
    for channel in 0..self.samples.aux_channels() {
      out[channel + 1] = self.voxel_aux(channel, ix, iy, iz);
    }
  }
}

impl ScalarField for IndexedDistanceInterpolator {
  fn channel_count(&self) -> usize {
    1 + self.samples.aux_channels()
  }

  fn evaluate(&self, point: DVec3, out: &mut [f64]) {
    debug_assert!(out.len() >= self.channel_count());
    match self.mode {
      InterpolationMode::Box => self.eval_box(point, out),
      InterpolationMode::Linear => self.eval_linear(point, out),
    }
  }
}

#[cfg(test)]
#[path = "interpolate_test.rs"]
mod interpolate_test;
