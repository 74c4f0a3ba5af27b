//! Error type shared across the crate.

use thiserror::Error;

/// Convenience alias used by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors reported while configuring or building a distance field.
///
/// Query-time evaluation never fails: interpolators clamp out-of-range
/// points instead of returning errors.
#[derive(Error, Debug)]
pub enum FieldError {
  /// Voxel size must be positive and finite.
  #[error("invalid voxel size {0}")]
  InvalidVoxelSize(f64),

  /// Shell half thickness must be positive and finite.
  #[error("invalid shell half thickness {0}")]
  InvalidShellThickness(f64),

  /// Worker count must be at least 1.
  #[error("invalid thread count {0}")]
  InvalidThreadCount(usize),

  /// A grid box was requested from a source that produced no samples.
  #[error("surface produced no sample points and no explicit bounds were given")]
  EmptySampleSet,

  /// Requested grid does not fit the addressable voxel budget.
  #[error("grid of {nx} x {ny} x {nz} voxels exceeds the {limit} voxel limit")]
  GridTooLarge {
    nx: usize,
    ny: usize,
    nz: usize,
    limit: u64,
  },

  /// More surface samples than the packed voxel attribute can address.
  #[error("{count} samples exceed the {limit} addressable by a voxel attribute")]
  TooManySamples { count: usize, limit: u32 },

  /// Auxiliary channel data does not match the sample count.
  #[error("aux channel of {got} values does not match sample count {expected}")]
  AuxChannelMismatch { got: usize, expected: usize },

  /// A sample set cannot carry more auxiliary channels.
  #[error("sample sets carry at most {limit} aux channels")]
  TooManyAuxChannels { limit: usize },

  /// Worker pool construction failed.
  #[error("worker pool: {0}")]
  WorkerPool(String),
}
