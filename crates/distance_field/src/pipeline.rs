//! End-to-end construction of a distance field from a surface source.
//!
//! ```text
//!   source ──sample──▶ SampleSet
//!                         │ to grid units
//!                         ▼
//!                    shell seeding ──▶ envelope sweeps ──▶ interior bit
//!                                                             │ freeze
//!                                                             ▼
//!                                                        DistanceField
//! ```
//!
//! Builds are pure functions of their configuration, so finished
//! fields are cached under a fingerprint of everything that shapes the
//! grid. Query-time settings (interpolation mode, distance extension)
//! ride along but do not force rebuilds.

use std::sync::Arc;
use std::time::Duration;

use glam::DVec3;
use web_time::Instant;

use crate::bounds::{Aabb, GridBounds};
use crate::cache::{FieldCache, NoCache};
use crate::classify::{apply_interior_mask, InteriorTest};
use crate::error::{FieldError, Result};
use crate::field::ScalarField;
use crate::grid::{FrozenGrid, IndexGrid};
use crate::interpolate::IndexedDistanceInterpolator;
use crate::samples::SampleSet;
use crate::shell::ShellBuilder;
use crate::sweep::{propagate, PropagateConfig};
use crate::types::{InterpolationMode, VoxelAttr, HALF};

/// Smallest grid a build will produce; tiny bounds get their voxel
/// size shrunk to reach it.
pub const DEFAULT_MIN_GRID_VOXELS: u64 = 1_000;

/// Largest grid a build will produce; the voxel size grows to respect
/// it.
pub const DEFAULT_MAX_GRID_VOXELS: u64 = 1_000_000_000;

/// Something the pipeline can turn into a distance field.
///
/// Implementations hand out surface sample points at the resolution
/// the grid bounds ask for, and may optionally supply an inside
/// oracle so the field comes out signed. Sources without one produce
/// an unsigned, everywhere-positive field.
pub trait SurfaceSource {
  /// Stable identity folded into the build fingerprint. Two sources
  /// with equal fingerprints must produce equal sample sets.
  fn fingerprint(&self) -> String;

  /// Natural bounding box of the surface, if it has one.
  fn local_bounds(&self) -> Option<Aabb>;

  /// World-space surface samples, optionally with aux channels.
  fn sample_surface(&self, bounds: &GridBounds) -> Result<SampleSet>;

  /// Inside/outside oracle evaluated at voxel centers.
  fn interior_test(&self, bounds: &GridBounds) -> Option<Box<dyn InteriorTest + '_>> {
    let _ = bounds;
    None
  }
}

/// Build parameters. `voxel_size` is the one required choice;
/// everything else has a workable default.
#[derive(Clone, Debug)]
pub struct FieldConfig {
  /// Edge length of one voxel in world units.
  pub voxel_size: f64,
  /// Padding added around the source bounds; `None` pads by one voxel.
  pub margins: Option<f64>,
  /// How far from the surface distances stay exact; `None` means half
  /// the grid diagonal. Queries beyond it saturate.
  pub max_distance: Option<f64>,
  /// Seed shell radius in voxels.
  pub shell_half_thickness: f64,
  /// Worker threads for propagation; 1 runs single-threaded.
  pub thread_count: usize,
  /// Sweep three axis orderings and keep the best per voxel.
  pub multi_pass: bool,
  /// Neighbor refinement rounds after a multi-pass sweep.
  pub refine_iterations: usize,
  /// Keep growing the distance past the grid boundary at query time.
  pub extend_distance: bool,
  /// Query-time reconstruction mode.
  pub interpolation: InterpolationMode,
  /// Use this box instead of the source bounds. Skips margin
  /// expansion, not voxel-count clamping.
  pub explicit_bounds: Option<Aabb>,
  pub min_grid_voxels: u64,
  pub max_grid_voxels: u64,
  /// Soft wall-clock budget for propagation.
  pub time_budget: Option<Duration>,
}

impl FieldConfig {
  pub fn new(voxel_size: f64) -> Self {
    Self {
      voxel_size,
      margins: None,
      max_distance: None,
      shell_half_thickness: 1.0,
      thread_count: 8,
      multi_pass: false,
      refine_iterations: 0,
      extend_distance: true,
      interpolation: InterpolationMode::Linear,
      explicit_bounds: None,
      min_grid_voxels: DEFAULT_MIN_GRID_VOXELS,
      max_grid_voxels: DEFAULT_MAX_GRID_VOXELS,
      time_budget: None,
    }
  }

  pub fn with_margins(mut self, margins: f64) -> Self {
    self.margins = Some(margins);
    self
  }

  pub fn with_max_distance(mut self, max_distance: f64) -> Self {
    self.max_distance = Some(max_distance);
    self
  }

  pub fn with_shell_half_thickness(mut self, voxels: f64) -> Self {
    self.shell_half_thickness = voxels;
    self
  }

  pub fn with_thread_count(mut self, threads: usize) -> Self {
    self.thread_count = threads;
    self
  }

  pub fn with_multi_pass(mut self, multi_pass: bool) -> Self {
    self.multi_pass = multi_pass;
    self
  }

  pub fn with_refine_iterations(mut self, iterations: usize) -> Self {
    self.refine_iterations = iterations;
    self
  }

  pub fn with_extend_distance(mut self, extend: bool) -> Self {
    self.extend_distance = extend;
    self
  }

  pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
    self.interpolation = mode;
    self
  }

  pub fn with_bounds(mut self, bounds: Aabb) -> Self {
    self.explicit_bounds = Some(bounds);
    self
  }

  pub fn with_grid_voxel_limits(mut self, min_voxels: u64, max_voxels: u64) -> Self {
    self.min_grid_voxels = min_voxels;
    self.max_grid_voxels = max_voxels;
    self
  }

  pub fn with_time_budget(mut self, budget: Duration) -> Self {
    self.time_budget = Some(budget);
    self
  }

  /// Rejects configurations no build could honor.
  pub fn validate(&self) -> Result<()> {
    if !self.voxel_size.is_finite() || self.voxel_size <= 0.0 {
      return Err(FieldError::InvalidVoxelSize(self.voxel_size));
    }
    if !self.shell_half_thickness.is_finite() || self.shell_half_thickness <= 0.0 {
      return Err(FieldError::InvalidShellThickness(self.shell_half_thickness));
    }
    if self.thread_count == 0 {
      return Err(FieldError::InvalidThreadCount(self.thread_count));
    }
    Ok(())
  }

  /// Cache key: the source identity plus every parameter that shapes
  /// the grid. Query-time settings are deliberately absent.
  pub fn fingerprint(&self, source: &dyn SurfaceSource) -> String {
    let max_distance = match self.max_distance {
      Some(d) => format!("{d:.17e}"),
      None => "auto".to_owned(),
    };
    let bounds = match self.explicit_bounds {
      Some(b) => format!("{:?}|{:?}", b.min, b.max),
      None => "auto".to_owned(),
    };
    format!(
      "src={src};vs={vs:.17e};mg={mg:.17e};md={md};sh={sh:.17e};mp={mp};it={it};ed={ed};bb={bb};gv={gmin}-{gmax}",
      src = source.fingerprint(),
      vs = self.voxel_size,
      mg = self.margins.unwrap_or(self.voxel_size),
      md = max_distance,
      sh = self.shell_half_thickness,
      mp = self.multi_pass,
      it = self.refine_iterations,
      ed = self.extend_distance,
      bb = bounds,
      gmin = self.min_grid_voxels,
      gmax = self.max_grid_voxels,
    )
  }
}

/// A finished field: frozen grid, its sample set, and the query
/// settings. Clones share the grid and samples, so handing fields
/// around is cheap.
#[derive(Clone)]
pub struct DistanceField {
  grid: Arc<FrozenGrid>,
  samples: Arc<SampleSet>,
  bounds: GridBounds,
  max_distance: f64,
  extend_distance: bool,
  interpolation: InterpolationMode,
}

impl DistanceField {
  pub fn grid(&self) -> &Arc<FrozenGrid> {
    &self.grid
  }

  pub fn samples(&self) -> &Arc<SampleSet> {
    &self.samples
  }

  pub fn bounds(&self) -> GridBounds {
    self.bounds
  }

  pub fn max_distance(&self) -> f64 {
    self.max_distance
  }

  pub fn interpolation(&self) -> InterpolationMode {
    self.interpolation
  }

  /// A standalone reader over this field. The reader shares the grid,
  /// so it stays valid after the field itself is dropped.
  pub fn interpolator(&self) -> IndexedDistanceInterpolator {
    IndexedDistanceInterpolator::new(
      self.grid.clone(),
      self.samples.clone(),
      self.bounds,
      self.max_distance,
    )
    .with_extend_distance(self.extend_distance)
    .with_mode(self.interpolation)
  }
}

impl ScalarField for DistanceField {
  fn channel_count(&self) -> usize {
    1 + self.samples.aux_channels()
  }

  fn evaluate(&self, point: DVec3, out: &mut [f64]) {
    self.interpolator().evaluate(point, out)
  }
}

impl std::fmt::Debug for DistanceField {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DistanceField")
      .field("dims", &self.grid.dims())
      .field("samples", &self.samples.len())
      .field("max_distance", &self.max_distance)
      .finish()
  }
}

/// Where a build spent its time, and how it degraded if it did.
#[derive(Clone, Debug, Default)]
pub struct BuildStats {
  pub sample_count: usize,
  /// Samples at least one voxel ended up pointing at.
  pub used_samples: usize,
  pub grid_dims: (usize, usize, usize),
  pub surface_us: u128,
  pub shell_us: u128,
  pub sweep_us: u128,
  pub classify_us: u128,
  pub total_us: u128,
  pub sweep_timed_out: bool,
  pub abandoned_slabs: usize,
  pub refine_iterations: usize,
  pub cache_hit: bool,
}

/// Grid bounds a build with this source and config will use: explicit
/// box or margin-expanded source bounds, clamped into the voxel
/// budget, snapped to whole voxels.
pub fn derive_grid_bounds(source: &dyn SurfaceSource, config: &FieldConfig) -> Result<GridBounds> {
  let aabb = match config.explicit_bounds {
    Some(bounds) => bounds,
    None => {
      let local = source.local_bounds().ok_or(FieldError::EmptySampleSet)?;
      local.expand(config.margins.unwrap_or(config.voxel_size))
    }
  };
  let bounds = GridBounds::new(aabb, config.voxel_size)
    .clamp_voxel_count(config.min_grid_voxels, config.max_grid_voxels)
    .round_bounds();

  // Volume-based clamping cannot rescue degenerate aspect ratios, so
  // a hard cap still applies after it.
  let count = bounds.voxel_count();
  if count > config.max_grid_voxels.saturating_mul(2) {
    let (nx, ny, nz) = bounds.dims();
    return Err(FieldError::GridTooLarge {
      nx,
      ny,
      nz,
      limit: config.max_grid_voxels,
    });
  }
  Ok(bounds)
}

/// Builds a field, skipping any cache.
pub fn build_distance_field(
  source: &dyn SurfaceSource,
  config: &FieldConfig,
) -> Result<DistanceField> {
  let (field, _) = build_distance_field_with_stats(source, config, &NoCache)?;
  Ok(field)
}

/// Builds a field through a cache, reporting per-phase stats.
///
/// On a cache hit the stored field is returned with this config's
/// query-time settings applied; only grid-shaping parameters are part
/// of the key.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pipeline::build"))]
pub fn build_distance_field_with_stats(
  source: &dyn SurfaceSource,
  config: &FieldConfig,
  cache: &dyn FieldCache,
) -> Result<(DistanceField, BuildStats)> {
  config.validate()?;
  let total_start = Instant::now();
  let mut stats = BuildStats::default();

  let fingerprint = config.fingerprint(source);
  if let Some(mut hit) = cache.get(&fingerprint) {
    hit.interpolation = config.interpolation;
    stats.cache_hit = true;
    stats.sample_count = hit.samples.len();
    stats.grid_dims = hit.grid.dims();
    stats.total_us = total_start.elapsed().as_micros();
    return Ok((hit, stats));
  }

  let bounds = derive_grid_bounds(source, config)?;
  let (nx, ny, nz) = bounds.dims();
  stats.grid_dims = (nx, ny, nz);
  let max_distance = config
    .max_distance
    .unwrap_or_else(|| bounds.aabb().diagonal() * HALF);

  let surface_start = Instant::now();
  let mut samples = {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("sample_surface").entered();
    source.sample_surface(&bounds)?
  };
  stats.surface_us = surface_start.elapsed().as_micros();
  stats.sample_count = samples.len();
  if samples.len() > VoxelAttr::INDEX_MASK as usize {
    return Err(FieldError::TooManySamples {
      count: samples.len(),
      limit: VoxelAttr::INDEX_MASK,
    });
  }

  let grid = IndexGrid::new(nx, ny, nz);
  samples.to_grid_units(&bounds);

  let shell_start = Instant::now();
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("shell_seed").entered();
    ShellBuilder::new()
      .with_shell_half_thickness(config.shell_half_thickness)
      .execute(&grid, &samples);
  }
  stats.shell_us = shell_start.elapsed().as_micros();

  // The shell already covers distances up to its own thickness; the
  // sweeps only run when the requested range goes beyond it.
  let sweep_start = Instant::now();
  let max_distance_voxels = max_distance / bounds.voxel_size;
  if max_distance_voxels > config.shell_half_thickness {
    let report = propagate(
      &grid,
      &samples,
      &PropagateConfig {
        max_distance_voxels,
        thread_count: config.thread_count,
        multi_pass: config.multi_pass,
        iterations: config.refine_iterations,
        time_budget: config.time_budget,
      },
    )?;
    stats.sweep_timed_out = report.timed_out;
    stats.abandoned_slabs = report.abandoned_slabs;
    stats.refine_iterations = report.refine_iterations;
  }
  stats.sweep_us = sweep_start.elapsed().as_micros();

  samples.to_world_units(&bounds);

  let classify_start = Instant::now();
  if let Some(test) = source.interior_test(&bounds) {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("interior_fold").entered();
    apply_interior_mask(&grid, test.as_ref(), false);
  }
  stats.classify_us = classify_start.elapsed().as_micros();

  let frozen = grid.freeze();
  stats.used_samples = samples.mask_unused(&frozen);

  let field = DistanceField {
    grid: Arc::new(frozen),
    samples: Arc::new(samples),
    bounds,
    max_distance,
    extend_distance: config.extend_distance,
    interpolation: config.interpolation,
  };
  cache.put(&fingerprint, &field);
  stats.total_us = total_start.elapsed().as_micros();
  Ok((field, stats))
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
