//! Rendering a finished grid to raw distances and packing them into
//! fixed-width words for persistence and interop.

use rayon::prelude::*;

use crate::bounds::GridBounds;
use crate::grid::FrozenGrid;
use crate::samples::SampleSet;

/// Voxels handled per parallel packing unit.
const PACK_CHUNK: usize = 4096;

/// Word width of one packed voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackerWidth {
  Byte,
  Short,
  Int,
}

impl PackerWidth {
  pub const fn bit_width(self) -> u32 {
    match self {
      PackerWidth::Byte => 8,
      PackerWidth::Short => 16,
      PackerWidth::Int => 32,
    }
  }

  pub const fn byte_width(self) -> usize {
    match self {
      PackerWidth::Byte => 1,
      PackerWidth::Short => 2,
      PackerWidth::Int => 4,
    }
  }

  const fn max_word(self) -> u64 {
    match self {
      PackerWidth::Byte => 0xFF,
      PackerWidth::Short => 0xFFFF,
      PackerWidth::Int => 0xFFFF_FFFF,
    }
  }
}

/// Linear quantizer from a distance range onto fixed-width words.
///
/// Word 0 is `min_value`, the all-ones word is `max_value`; encoding
/// clamps into that range and rounds to the nearest step.
#[derive(Clone, Copy, Debug)]
pub struct AttributePacker {
  width: PackerWidth,
  min_value: f64,
  max_value: f64,
  d2b: f64,
  b2d: f64,
}

impl AttributePacker {
  pub fn new(width: PackerWidth, min_value: f64, max_value: f64) -> Self {
    debug_assert!(
      max_value > min_value,
      "inverted packer range [{min_value}, {max_value}]"
    );
    let span = max_value - min_value;
    let max_word = width.max_word() as f64;
    Self {
      width,
      min_value,
      max_value,
      d2b: max_word / span,
      b2d: span / max_word,
    }
  }

  pub fn width(&self) -> PackerWidth {
    self.width
  }

  /// One quantization step in distance units.
  pub fn step(&self) -> f64 {
    self.b2d
  }

  #[inline]
  pub fn encode(&self, value: f64) -> u64 {
    let clamped = value.clamp(self.min_value, self.max_value);
    ((clamped - self.min_value) * self.d2b + 0.5) as u64
  }

  #[inline]
  pub fn decode(&self, word: u64) -> f64 {
    word as f64 * self.b2d + self.min_value
  }
}

/// Reconstructs the raw signed distance of every voxel, in the grid's
/// y-x-z cell order.
///
/// Defined voxels read their exact center-to-sample distance, negated
/// inside. Undefined voxels read the far value for their side:
/// `min_distance` when marked interior, `max_distance` otherwise.
/// Clamping into `[min_distance, max_distance]` happens at packing,
/// not here.
pub fn render_distances(
  grid: &FrozenGrid,
  samples: &SampleSet,
  bounds: &GridBounds,
  min_distance: f64,
  max_distance: f64,
) -> Vec<f64> {
  let (nx, ny, nz) = grid.dims();
  let mut out = vec![0.0f64; nx * ny * nz];
  out
    .par_chunks_mut(nx * nz)
    .enumerate()
    .for_each(|(iy, slab)| {
      for ix in 0..nx {
        for iz in 0..nz {
          let att = grid.get(ix, iy, iz);
          let value = if att.is_undefined() {
            if att.is_interior() {
              min_distance
            } else {
              max_distance
            }
          } else {
            let center = bounds.voxel_center(ix, iy, iz);
            att.sign() * center.distance(samples.point(att.index()))
          };
          slab[ix * nz + iz] = value;
        }
      }
    });
  out
}

/// Packs rendered distances into little-endian words of the packer's
/// width, one word per voxel, same order as the input.
pub fn export_packed(distances: &[f64], packer: &AttributePacker) -> Vec<u8> {
  let byte_width = packer.width().byte_width();
  let mut out = vec![0u8; distances.len() * byte_width];
  out
    .par_chunks_mut(byte_width * PACK_CHUNK)
    .zip(distances.par_chunks(PACK_CHUNK))
    .for_each(|(bytes, values)| {
      for (slot, &value) in bytes.chunks_exact_mut(byte_width).zip(values) {
        let word = packer.encode(value).to_le_bytes();
        slot.copy_from_slice(&word[..byte_width]);
      }
    });
  out
}

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;
