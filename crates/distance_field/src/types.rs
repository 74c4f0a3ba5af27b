//! Core value types shared across the crate.

use std::fmt;

/// Distance from a voxel's integer corner to its center, in voxels.
/// Every distance in grid units is measured from voxel centers.
pub(crate) const HALF: f64 = 0.5;

/// Packed per-voxel attribute.
///
/// Bit layout:
///
/// ```text
/// bit 31       bits 30..0
/// +--------+------------------------------+
/// |interior| 1-based nearest sample index |
/// +--------+------------------------------+
/// ```
///
/// Index 0 means no sample has been assigned yet (the voxel is
/// "undefined"); sample indices therefore start at 1. The interior bit
/// is independent of the index and may be set on undefined voxels.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VoxelAttr(u32);

impl VoxelAttr {
  /// Mask selecting the nearest-sample index.
  pub const INDEX_MASK: u32 = 0x7FFF_FFFF;
  /// Mask selecting the interior bit.
  pub const INTERIOR_MASK: u32 = 1 << 31;
  /// Attribute of a voxel no sample has reached: exterior, no index.
  pub const UNDEFINED: VoxelAttr = VoxelAttr(0);

  /// Reassembles an attribute from its stored bits.
  #[inline(always)]
  pub const fn from_bits(bits: u32) -> Self {
    Self(bits)
  }

  /// Attribute pointing at sample `index` with the interior bit clear.
  #[inline(always)]
  pub const fn from_index(index: u32) -> Self {
    Self(index & Self::INDEX_MASK)
  }

  /// Raw stored bits.
  #[inline(always)]
  pub const fn bits(self) -> u32 {
    self.0
  }

  /// 1-based nearest sample index, 0 when undefined.
  #[inline(always)]
  pub const fn index(self) -> u32 {
    self.0 & Self::INDEX_MASK
  }

  /// True when no sample has been assigned to this voxel.
  #[inline(always)]
  pub const fn is_undefined(self) -> bool {
    self.index() == 0
  }

  /// True when the voxel center lies inside the shape.
  #[inline(always)]
  pub const fn is_interior(self) -> bool {
    self.0 & Self::INTERIOR_MASK != 0
  }

  /// Copy of this attribute with the interior bit set or cleared.
  #[inline(always)]
  pub const fn with_interior(self, interior: bool) -> Self {
    if interior {
      Self(self.0 | Self::INTERIOR_MASK)
    } else {
      Self(self.0 & Self::INDEX_MASK)
    }
  }

  /// Distance sign implied by the interior bit: -1.0 inside, 1.0 outside.
  #[inline(always)]
  pub const fn sign(self) -> f64 {
    if self.is_interior() {
      -1.0
    } else {
      1.0
    }
  }
}

impl fmt::Debug for VoxelAttr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("VoxelAttr")
      .field("index", &self.index())
      .field("interior", &self.is_interior())
      .finish()
  }
}

/// How an interpolator turns grid voxels into a continuous field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolationMode {
  /// Nearest voxel only. Piecewise constant, cheap, visibly blocky.
  Box,
  /// Trilinear blend of the eight voxels around the query point.
  #[default]
  Linear,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
