//! Surface sample storage shared by shell seeding, sweeps and queries.

use glam::DVec3;

use crate::bounds::GridBounds;
use crate::error::{FieldError, Result};
use crate::grid::FrozenGrid;
use crate::sweep::envelope::INF;
use crate::types::{VoxelAttr, HALF};

/// Most aux channels a sample set will carry (u, v, w style data).
pub const MAX_AUX_CHANNELS: usize = 3;

/// Surface sample coordinates as parallel arrays.
///
/// Slot 0 of every array is reserved so voxel attributes can address
/// the arrays directly with their 1-based index; `len()` counts real
/// samples only. Coordinates are stored in whatever unit the caller
/// last requested, world units unless a conversion was applied.
#[derive(Clone, Debug)]
pub struct SampleSet {
  x: Vec<f64>,
  y: Vec<f64>,
  z: Vec<f64>,
  aux: Vec<Vec<f64>>,
}

impl SampleSet {
  pub fn new() -> Self {
    Self::with_capacity(0)
  }

  pub fn with_capacity(count: usize) -> Self {
    let mut x = Vec::with_capacity(count + 1);
    x.push(0.0);
    Self {
      y: x.clone(),
      z: x.clone(),
      x,
      aux: Vec::new(),
    }
  }

  pub fn from_points(points: &[DVec3]) -> Self {
    let mut set = Self::with_capacity(points.len());
    for p in points {
      set.push(*p);
    }
    set
  }

  /// Appends a sample and returns its 1-based index.
  pub fn push(&mut self, p: DVec3) -> u32 {
    debug_assert!(self.x.len() <= VoxelAttr::INDEX_MASK as usize);
    let index = self.x.len() as u32;
    self.x.push(p.x);
    self.y.push(p.y);
    self.z.push(p.z);
    index
  }

  /// Attaches one aux channel, one value per sample in index order.
  pub fn with_aux_channel(mut self, values: &[f64]) -> Result<Self> {
    if self.aux.len() >= MAX_AUX_CHANNELS {
      return Err(FieldError::TooManyAuxChannels {
        limit: MAX_AUX_CHANNELS,
      });
    }
    if values.len() != self.len() {
      return Err(FieldError::AuxChannelMismatch {
        got: values.len(),
        expected: self.len(),
      });
    }
    let mut channel = Vec::with_capacity(values.len() + 1);
    channel.push(0.0);
    channel.extend_from_slice(values);
    self.aux.push(channel);
    Ok(self)
  }

  /// Number of samples, not counting the reserved slot.
  #[inline]
  pub fn len(&self) -> usize {
    self.x.len() - 1
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[inline]
  pub fn aux_channels(&self) -> usize {
    self.aux.len()
  }

  /// Sample position by 1-based index.
  #[inline(always)]
  pub fn point(&self, index: u32) -> DVec3 {
    let i = index as usize;
    debug_assert!(i >= 1 && i <= self.len(), "sample index {index} out of range");
    DVec3::new(self.x[i], self.y[i], self.z[i])
  }

  /// Aux value of one sample.
  #[inline(always)]
  pub fn aux(&self, channel: usize, index: u32) -> f64 {
    self.aux[channel][index as usize]
  }

  pub fn iter(&self) -> impl Iterator<Item = DVec3> + '_ {
    (1..=self.len()).map(|i| self.point(i as u32))
  }

  // Raw per-axis arrays, reserved slot included. Row sweeps index these
  // directly with attribute indices.
  #[inline(always)]
  pub(crate) fn xs(&self) -> &[f64] {
    &self.x
  }

  #[inline(always)]
  pub(crate) fn ys(&self) -> &[f64] {
    &self.y
  }

  #[inline(always)]
  pub(crate) fn zs(&self) -> &[f64] {
    &self.z
  }

  /// World coordinates to grid coordinates (voxel units from the grid
  /// min corner).
  pub fn to_grid_units(&mut self, bounds: &GridBounds) {
    let scale = 1.0 / bounds.voxel_size;
    for i in 1..self.x.len() {
      self.x[i] = (self.x[i] - bounds.min.x) * scale;
      self.y[i] = (self.y[i] - bounds.min.y) * scale;
      self.z[i] = (self.z[i] - bounds.min.z) * scale;
    }
  }

  /// Grid coordinates back to world units.
  pub fn to_world_units(&mut self, bounds: &GridBounds) {
    let vs = bounds.voxel_size;
    for i in 1..self.x.len() {
      self.x[i] = self.x[i] * vs + bounds.min.x;
      self.y[i] = self.y[i] * vs + bounds.min.y;
      self.z[i] = self.z[i] * vs + bounds.min.z;
    }
  }

  /// Moves every sample to the center of its voxel. Grid units only.
  pub fn snap_to_voxels(&mut self) {
    for i in 1..self.x.len() {
      self.x[i] = (self.x[i] as i64) as f64 + HALF;
      self.y[i] = (self.y[i] as i64) as f64 + HALF;
      self.z[i] = (self.z[i] as i64) as f64 + HALF;
    }
  }

  /// Moves samples no voxel points at to a far sentinel so they can
  /// never win a nearest-sample comparison. Returns how many samples
  /// the grid actually references.
  pub fn mask_unused(&mut self, grid: &FrozenGrid) -> usize {
    let mut used = vec![false; self.x.len()];
    for &bits in grid.cells() {
      let index = (bits & VoxelAttr::INDEX_MASK) as usize;
      if index < used.len() {
        used[index] = true;
      }
    }
    let mut count = 0;
    for i in 1..self.x.len() {
      if used[i] {
        count += 1;
      } else {
        self.x[i] = INF;
        self.y[i] = INF;
        self.z[i] = INF;
      }
    }
    count
  }
}

impl Default for SampleSet {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
#[path = "samples_test.rs"]
mod samples_test;
