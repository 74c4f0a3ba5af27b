//! Interior classification: folding an inside/outside decision into
//! the packed voxel attributes.

use rayon::prelude::*;

use crate::bounds::GridBounds;
use crate::field::ScalarField;
use crate::grid::{IndexGrid, MaskGrid};

/// Inside/outside decision per voxel.
///
/// `Sync` because classification runs one y slab per worker.
pub trait InteriorTest: Sync {
  /// True when the center of voxel `(ix, iy, iz)` lies inside the
  /// shape.
  fn is_interior(&self, ix: usize, iy: usize, iz: usize) -> bool;
}

/// Interior test backed by a rasterized voxel mask.
pub struct MaskInterior {
  mask: MaskGrid,
}

impl MaskInterior {
  pub fn new(mask: MaskGrid) -> Self {
    Self { mask }
  }
}

impl InteriorTest for MaskInterior {
  #[inline]
  fn is_interior(&self, ix: usize, iy: usize, iz: usize) -> bool {
    self.mask.get(ix, iy, iz)
  }
}

/// Interior test that samples the sign of a scalar field at voxel
/// centers. Negative means inside.
pub struct FieldInterior<F> {
  field: F,
  bounds: GridBounds,
}

impl<F: ScalarField> FieldInterior<F> {
  pub fn new(field: F, bounds: GridBounds) -> Self {
    Self { field, bounds }
  }
}

impl<F: ScalarField> InteriorTest for FieldInterior<F> {
  #[inline]
  fn is_interior(&self, ix: usize, iy: usize, iz: usize) -> bool {
    self.field.distance(self.bounds.voxel_center(ix, iy, iz)) < 0.0
  }
}

/// ORs the interior bit into every voxel the test reports as inside.
///
/// With `preserve_zero` set, undefined voxels keep a clear bit so that
/// "no data" stays distinguishable from "inside"; otherwise undefined
/// interior voxels are marked too and later read as deep inside.
pub fn apply_interior_mask(grid: &IndexGrid, test: &dyn InteriorTest, preserve_zero: bool) {
  let (nx, ny, nz) = grid.dims();
  (0..ny).into_par_iter().for_each(|iy| {
    for ix in 0..nx {
      for iz in 0..nz {
        if test.is_interior(ix, iy, iz) {
          let att = grid.get(ix, iy, iz);
          if !preserve_zero || !att.is_undefined() {
            grid.set(ix, iy, iz, att.with_interior(true));
          }
        }
      }
    }
  });
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod classify_test;
