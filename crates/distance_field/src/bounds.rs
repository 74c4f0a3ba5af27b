//! Axis-aligned boxes in world space and their voxel-grid geometry.

use glam::DVec3;

use crate::types::HALF;

/// Tolerance when counting voxels along an axis, in voxel units.
/// Absorbs float noise after `round_bounds` re-derives the max corner.
const DIMS_EPS: f64 = 1.0e-8;

/// Axis-aligned box in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  pub min: DVec3,
  pub max: DVec3,
}

impl Aabb {
  pub fn new(min: DVec3, max: DVec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "inverted aabb: min {min:?} max {max:?}"
    );
    Self { min, max }
  }

  pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
    Self::new(center - half_extents, center + half_extents)
  }

  /// Smallest box containing every point, or None for an empty slice.
  pub fn from_points(points: &[DVec3]) -> Option<Self> {
    let first = *points.first()?;
    let mut min = first;
    let mut max = first;
    for p in &points[1..] {
      min = min.min(*p);
      max = max.max(*p);
    }
    Some(Self { min, max })
  }

  #[inline]
  pub fn size(&self) -> DVec3 {
    self.max - self.min
  }

  #[inline]
  pub fn center(&self) -> DVec3 {
    (self.min + self.max) * HALF
  }

  #[inline]
  pub fn volume(&self) -> f64 {
    let s = self.size();
    s.x * s.y * s.z
  }

  /// Length of the main diagonal.
  #[inline]
  pub fn diagonal(&self) -> f64 {
    self.size().length()
  }

  #[inline]
  pub fn max_side(&self) -> f64 {
    self.size().max_element()
  }

  /// Box grown by `margin` on all six sides.
  pub fn expand(&self, margin: f64) -> Self {
    Self {
      min: self.min - DVec3::splat(margin),
      max: self.max + DVec3::splat(margin),
    }
  }

  #[inline]
  pub fn contains_point(&self, p: DVec3) -> bool {
    p.cmpge(self.min).all() && p.cmple(self.max).all()
  }
}

/// A world box tied to a voxel size: the geometry of one index grid.
///
/// Voxel `(ix, iy, iz)` occupies the world cube starting at
/// `min + (ix, iy, iz) * voxel_size`; distances are measured from the
/// cube centers, half a voxel further in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridBounds {
  pub min: DVec3,
  pub max: DVec3,
  pub voxel_size: f64,
}

impl GridBounds {
  pub fn new(aabb: Aabb, voxel_size: f64) -> Self {
    debug_assert!(voxel_size > 0.0, "voxel size must be positive: {voxel_size}");
    Self {
      min: aabb.min,
      max: aabb.max,
      voxel_size,
    }
  }

  #[inline]
  pub fn aabb(&self) -> Aabb {
    Aabb {
      min: self.min,
      max: self.max,
    }
  }

  /// Voxel count along each axis, at least 1 per axis.
  pub fn dims(&self) -> (usize, usize, usize) {
    let d = (self.max - self.min) / self.voxel_size;
    let count = |v: f64| ((v - DIMS_EPS).ceil().max(1.0)) as usize;
    (count(d.x), count(d.y), count(d.z))
  }

  /// Total voxel count.
  pub fn voxel_count(&self) -> u64 {
    let (nx, ny, nz) = self.dims();
    nx as u64 * ny as u64 * nz as u64
  }

  /// Moves the max corner outward so every axis holds a whole number
  /// of voxels. The min corner and the voxel size are kept.
  pub fn round_bounds(self) -> Self {
    let (nx, ny, nz) = self.dims();
    Self {
      max: self.min + DVec3::new(nx as f64, ny as f64, nz as f64) * self.voxel_size,
      ..self
    }
  }

  /// Re-derives the voxel size so the total voxel count lands inside
  /// `[min_voxels, max_voxels]`. Inside the window the size is kept.
  pub fn clamp_voxel_count(self, min_voxels: u64, max_voxels: u64) -> Self {
    let voxels = self.voxel_count();
    let volume = self.aabb().volume();
    let voxel_size = if voxels > max_voxels {
      (volume / max_voxels as f64).cbrt()
    } else if voxels < min_voxels {
      (volume / min_voxels as f64).cbrt()
    } else {
      self.voxel_size
    };
    Self { voxel_size, ..self }
  }

  /// World position of the center of voxel `(ix, iy, iz)`.
  #[inline(always)]
  pub fn voxel_center(&self, ix: usize, iy: usize, iz: usize) -> DVec3 {
    self.min + (DVec3::new(ix as f64, iy as f64, iz as f64) + DVec3::splat(HALF)) * self.voxel_size
  }

  /// World point to continuous grid coordinates (voxel units).
  #[inline(always)]
  pub fn world_to_grid(&self, p: DVec3) -> DVec3 {
    (p - self.min) / self.voxel_size
  }

  /// Continuous grid coordinates back to world units.
  #[inline(always)]
  pub fn grid_to_world(&self, p: DVec3) -> DVec3 {
    p * self.voxel_size + self.min
  }
}

#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;
