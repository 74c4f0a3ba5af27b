//! distance_field - Indexed closest-point signed distance fields
//!
//! This crate builds volumetric distance fields where every voxel stores the
//! index of its nearest surface sample instead of a baked distance value.
//! Distances are recomputed from the sample positions at query time, which
//! keeps them exact at voxel centers and lets auxiliary surface attributes
//! (colors, material weights) ride along with the same interpolation weights.
//!
//! # Features
//!
//! - **Shell seeding**: Surface samples stamp their index into a thin voxel
//!   shell around the surface
//! - **Envelope sweeps**: Lower-envelope distance propagation fills the rest
//!   of the grid, parallelized over one-voxel slabs
//! - **Interior classification**: A sign bit per voxel turns the unsigned
//!   field into a signed one
//! - **Trilinear queries**: Distances and attributes are interpolated from
//!   the eight surrounding voxels, with optional extension past the grid
//!
//! # Example
//!
//! ```ignore
//! use distance_field::{build_distance_field, FieldConfig, ScalarField, SphereSource};
//! use glam::DVec3;
//!
//! let source = SphereSource::new(DVec3::ZERO, 0.5, 2000);
//! let config = FieldConfig::new(0.05);
//!
//! let field = build_distance_field(&source, &config)?;
//! println!("distance at origin: {}", field.evaluate(DVec3::ZERO));
//! # Ok::<(), distance_field::FieldError>(())
//! ```

pub mod error;
pub use error::{FieldError, Result};

pub mod types;
pub use types::{InterpolationMode, VoxelAttr};

pub mod bounds;
pub use bounds::{Aabb, GridBounds};

pub mod samples;
pub use samples::{SampleSet, MAX_AUX_CHANNELS};

pub mod grid;
pub use grid::{FrozenGrid, IndexGrid, MaskGrid};

// Shell seeding around the surface
pub mod shell;
pub use shell::{ball_neighborhood, ShellBuilder};

// Envelope sweeps that fill the rest of the grid
pub mod sweep;
pub use sweep::{propagate, PropagateConfig, PropagateReport};

// Interior/exterior sign classification
pub mod classify;
pub use classify::{apply_interior_mask, FieldInterior, InteriorTest, MaskInterior};

pub mod field;
pub use field::{lerp3, ScalarField, INLINE_CHANNELS};

pub mod interpolate;
pub use interpolate::IndexedDistanceInterpolator;

pub mod cache;
pub use cache::{FieldCache, MemoryCache, NoCache};

// The build pipeline that ties the stages together
pub mod pipeline;
pub use pipeline::{
  build_distance_field, build_distance_field_with_stats, derive_grid_bounds, BuildStats,
  DistanceField, FieldConfig, SurfaceSource, DEFAULT_MAX_GRID_VOXELS, DEFAULT_MIN_GRID_VOXELS,
};

// Dense rendering and packed binary export
pub mod export;
pub use export::{export_packed, render_distances, AttributePacker, PackerWidth};

// Ready-made surface sources
pub mod sources;
pub use sources::{ImplicitSource, PointCloudSource, SphereField, SphereSource, XorShift32};
