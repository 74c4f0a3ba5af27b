//! Voxel grid storage.
//!
//! Cell layout is y-major with z innermost:
//!
//! ```text
//! cell(ix, iy, iz) = (iy * nx + ix) * nz + iz
//! ```
//!
//! so one y slab is a contiguous `nx * nz` block, which is the unit of
//! work most parallel passes hand out.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::types::VoxelAttr;

/// Mutable grid of packed voxel attributes, shared across worker
/// threads during a build.
///
/// Cells are relaxed atomics: passes partition the grid into disjoint
/// regions, so the atomics only make sharing through `&IndexGrid`
/// sound. Cross-pass visibility comes from the barrier between passes,
/// not from the cell ordering.
pub struct IndexGrid {
  nx: usize,
  ny: usize,
  nz: usize,
  cells: Vec<AtomicU32>,
}

impl IndexGrid {
  /// All-undefined grid of the given dimensions.
  pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
    debug_assert!(nx > 0 && ny > 0 && nz > 0, "empty grid: {nx} x {ny} x {nz}");
    let cells = std::iter::repeat_with(|| AtomicU32::new(0))
      .take(nx * ny * nz)
      .collect();
    Self { nx, ny, nz, cells }
  }

  #[inline(always)]
  pub fn dims(&self) -> (usize, usize, usize) {
    (self.nx, self.ny, self.nz)
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  #[inline(always)]
  pub(crate) fn cell_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
    debug_assert!(ix < self.nx && iy < self.ny && iz < self.nz);
    (iy * self.nx + ix) * self.nz + iz
  }

  #[inline(always)]
  pub fn get(&self, ix: usize, iy: usize, iz: usize) -> VoxelAttr {
    VoxelAttr::from_bits(self.cells[self.cell_index(ix, iy, iz)].load(Ordering::Relaxed))
  }

  #[inline(always)]
  pub fn set(&self, ix: usize, iy: usize, iz: usize, att: VoxelAttr) {
    self.cells[self.cell_index(ix, iy, iz)].store(att.bits(), Ordering::Relaxed);
  }

  /// Overwrites every cell with the matching cell of `other`.
  pub fn copy_data_from(&self, other: &IndexGrid) {
    debug_assert_eq!(self.dims(), other.dims());
    for (dst, src) in self.cells.iter().zip(&other.cells) {
      dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
    }
  }

  /// Consumes the build grid into an immutable snapshot.
  pub fn freeze(self) -> FrozenGrid {
    FrozenGrid {
      nx: self.nx,
      ny: self.ny,
      nz: self.nz,
      cells: self.cells.into_iter().map(AtomicU32::into_inner).collect(),
    }
  }
}

impl Clone for IndexGrid {
  fn clone(&self) -> Self {
    Self {
      nx: self.nx,
      ny: self.ny,
      nz: self.nz,
      cells: self
        .cells
        .iter()
        .map(|c| AtomicU32::new(c.load(Ordering::Relaxed)))
        .collect(),
    }
  }
}

/// Immutable snapshot of a finished build, safe to share behind `Arc`.
#[derive(Clone)]
pub struct FrozenGrid {
  nx: usize,
  ny: usize,
  nz: usize,
  cells: Vec<u32>,
}

impl FrozenGrid {
  #[inline(always)]
  pub fn dims(&self) -> (usize, usize, usize) {
    (self.nx, self.ny, self.nz)
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  #[inline(always)]
  pub fn get(&self, ix: usize, iy: usize, iz: usize) -> VoxelAttr {
    debug_assert!(ix < self.nx && iy < self.ny && iz < self.nz);
    VoxelAttr::from_bits(self.cells[(iy * self.nx + ix) * self.nz + iz])
  }

  /// Raw cells in layout order.
  #[inline]
  pub fn cells(&self) -> &[u32] {
    &self.cells
  }
}

/// Bit-packed inside/outside mask at grid resolution.
#[derive(Clone)]
pub struct MaskGrid {
  nx: usize,
  ny: usize,
  nz: usize,
  words: Vec<u64>,
}

impl MaskGrid {
  /// All-exterior mask.
  pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
    let bits = nx * ny * nz;
    Self {
      nx,
      ny,
      nz,
      words: vec![0; bits.div_ceil(64)],
    }
  }

  #[inline(always)]
  pub fn dims(&self) -> (usize, usize, usize) {
    (self.nx, self.ny, self.nz)
  }

  #[inline(always)]
  fn bit(&self, ix: usize, iy: usize, iz: usize) -> (usize, u64) {
    debug_assert!(ix < self.nx && iy < self.ny && iz < self.nz);
    let cell = (iy * self.nx + ix) * self.nz + iz;
    (cell / 64, 1u64 << (cell % 64))
  }

  #[inline(always)]
  pub fn get(&self, ix: usize, iy: usize, iz: usize) -> bool {
    let (word, mask) = self.bit(ix, iy, iz);
    self.words[word] & mask != 0
  }

  #[inline(always)]
  pub fn set(&mut self, ix: usize, iy: usize, iz: usize, interior: bool) {
    let (word, mask) = self.bit(ix, iy, iz);
    if interior {
      self.words[word] |= mask;
    } else {
      self.words[word] &= !mask;
    }
  }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
