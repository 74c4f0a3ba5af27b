//! Closest-site propagation across the index grid.
//!
//! A propagation run takes a grid seeded by the shell builder and
//! spreads the nearest-sample assignment to every voxel (or to a
//! distance bound). Each pass sweeps rows along one axis: a row
//! gathers the sites seeded in its voxels, runs the lower-envelope
//! transform from [`envelope`], and writes the winning site back per
//! voxel. Three axis passes approximate the true closest sample;
//! multi-pass mode runs three different axis orderings and keeps the
//! closest answer per voxel, which removes most of the remaining
//! error.
//!
//! Passes are parallelized by handing out one-voxel-thick slabs that
//! hold whole rows, so workers never share a row.

pub mod envelope;
mod pool;

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use web_time::Instant;

use crate::error::Result;
use crate::grid::IndexGrid;
use crate::samples::SampleSet;
use crate::shell::ball_neighborhood;
use crate::types::{VoxelAttr, HALF};

use self::envelope::{RowScratch, INF};
use self::pool::{PassOutcome, SweepPool};

/// Neighborhood radius for refinement rounds: the center voxel, its 6
/// face and 12 edge neighbors.
const REFINE_BALL_RADIUS: f64 = 1.5;

/// Settings for one propagation run.
#[derive(Clone, Debug)]
pub struct PropagateConfig {
  /// Distance bound in voxels; zero or less propagates everywhere.
  pub max_distance_voxels: f64,
  /// Worker threads; 1 keeps everything on the calling thread.
  pub thread_count: usize,
  /// Combine three sweep orderings instead of sweeping once.
  pub multi_pass: bool,
  /// Neighbor refinement rounds after a multi-pass combine.
  pub iterations: usize,
  /// Soft wall-clock budget: once expired, passes stop claiming new
  /// slabs and the grid is left partially propagated.
  pub time_budget: Option<Duration>,
}

impl Default for PropagateConfig {
  fn default() -> Self {
    Self {
      max_distance_voxels: 0.0,
      thread_count: 8,
      multi_pass: false,
      iterations: 0,
      time_budget: None,
    }
  }
}

/// What a propagation run actually did.
#[derive(Clone, Debug, Default)]
pub struct PropagateReport {
  /// Slabs dropped because a worker panicked on them.
  pub abandoned_slabs: usize,
  /// The time budget expired mid-run.
  pub timed_out: bool,
  /// Refinement rounds executed; they stop early once the grid is
  /// stable.
  pub refine_iterations: usize,
}

impl PropagateReport {
  fn absorb(&mut self, outcome: &PassOutcome) {
    if !outcome.abandoned.is_empty() {
      #[cfg(feature = "tracing")]
      tracing::warn!(slabs = ?outcome.abandoned, "sweep pass abandoned slabs");
      self.abandoned_slabs += outcome.abandoned.len();
    }
    if outcome.timed_out {
      self.timed_out = true;
    }
  }
}

/// Grows the seeded shell until every voxel within the distance bound
/// holds its nearest sample index.
///
/// `samples` must be in grid units, exactly as the shell builder
/// consumed them. The grid must carry plain indices; interior
/// classification happens after propagation. The result does not
/// depend on `thread_count`.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "sweep::propagate"))]
pub fn propagate(
  grid: &IndexGrid,
  samples: &SampleSet,
  config: &PropagateConfig,
) -> Result<PropagateReport> {
  let mut report = PropagateReport::default();
  if samples.is_empty() {
    return Ok(report);
  }
  let runner = Runner::new(config.thread_count)?;
  let deadline = config.time_budget.map(|budget| Instant::now() + budget);

  if config.multi_pass {
    run_multi_pass(grid, samples, config, &runner, deadline, &mut report);
  } else {
    run_ordering(
      grid,
      samples,
      config.max_distance_voxels,
      ORDER_XYZ,
      &runner,
      deadline,
      &mut report,
    );
  }
  Ok(report)
}

const ORDER_XYZ: [SweepAxis; 3] = [SweepAxis::X, SweepAxis::Y, SweepAxis::Z];
const ORDER_YZX: [SweepAxis; 3] = [SweepAxis::Y, SweepAxis::Z, SweepAxis::X];
const ORDER_ZXY: [SweepAxis; 3] = [SweepAxis::Z, SweepAxis::X, SweepAxis::Y];

/// Three orderings, each on its own copy of the seeded grid, merged by
/// keeping the closer assignment per voxel. Optional refinement rounds
/// then let voxels adopt better assignments from their neighborhood.
fn run_multi_pass(
  grid: &IndexGrid,
  samples: &SampleSet,
  config: &PropagateConfig,
  runner: &Runner,
  deadline: Option<Instant>,
  report: &mut PropagateReport,
) {
  let max_distance = config.max_distance_voxels;
  let original = grid.clone();
  let work = grid.clone();

  run_ordering(grid, samples, max_distance, ORDER_XYZ, runner, deadline, report);
  run_ordering(&work, samples, max_distance, ORDER_YZX, runner, deadline, report);
  combine_pass(grid, &work, samples, runner, deadline, report);

  work.copy_data_from(&original);
  run_ordering(&work, samples, max_distance, ORDER_ZXY, runner, deadline, report);
  combine_pass(grid, &work, samples, runner, deadline, report);

  if config.iterations == 0 {
    return;
  }
  let ball = ball_neighborhood(REFINE_BALL_RADIUS);
  for _ in 0..config.iterations {
    work.copy_data_from(grid);
    let changed = refine_pass(grid, &work, samples, &ball, runner, deadline, report);
    report.refine_iterations += 1;
    if changed == 0 {
      break;
    }
  }
}

fn run_ordering(
  grid: &IndexGrid,
  samples: &SampleSet,
  max_distance: f64,
  order: [SweepAxis; 3],
  runner: &Runner,
  deadline: Option<Instant>,
  report: &mut PropagateReport,
) {
  let dims = grid.dims();
  let max_dim = dims.0.max(dims.1).max(dims.2);
  for axis in order {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("sweep_axis", axis = ?axis).entered();
    let outcome = runner.run_pass(
      axis.slab_count(dims),
      deadline,
      || RowScratch::new(max_dim),
      |slab, scratch| sweep_rows(grid, samples, max_distance, axis, slab..slab + 1, scratch),
    );
    report.absorb(&outcome);
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SweepAxis {
  X,
  Y,
  Z,
}

impl SweepAxis {
  /// Slab count for one pass: x and y sweeps hand out z slabs, the z
  /// sweep hands out y slabs. Rows always stay whole.
  fn slab_count(self, dims: (usize, usize, usize)) -> usize {
    match self {
      SweepAxis::X | SweepAxis::Y => dims.2,
      SweepAxis::Z => dims.1,
    }
  }
}

fn sweep_rows(
  grid: &IndexGrid,
  samples: &SampleSet,
  max_distance: f64,
  axis: SweepAxis,
  slab: Range<usize>,
  scratch: &mut RowScratch,
) {
  match axis {
    SweepAxis::X => sweep_rows_x(grid, samples, max_distance, slab, scratch),
    SweepAxis::Y => sweep_rows_y(grid, samples, max_distance, slab, scratch),
    SweepAxis::Z => sweep_rows_z(grid, samples, max_distance, slab, scratch),
  }
}

/// Rows along x for every y of the given z slabs. A seeded site enters
/// the chain with its true x coordinate and the squared distance of
/// its sample to the row as the off-row term.
fn sweep_rows_x(
  grid: &IndexGrid,
  samples: &SampleSet,
  max_distance: f64,
  iz_range: Range<usize>,
  scratch: &mut RowScratch,
) {
  let (nx, ny, _nz) = grid.dims();
  let (xs, ys, zs) = (samples.xs(), samples.ys(), samples.zs());
  let bounded = max_distance > 0.0;
  for iz in iz_range {
    let vz = iz as f64 + HALF;
    for iy in 0..ny {
      let vy = iy as f64 + HALF;
      scratch.clear();
      for ix in 0..nx {
        let index = grid.get(ix, iy, iz).index();
        if index != 0 {
          let dy = ys[index as usize] - vy;
          let dz = zs[index as usize] - vz;
          scratch.add_site(xs, index, dy * dy + dz * dz);
        }
      }
      if scratch.site_count() == 0 {
        continue;
      }
      if bounded {
        scratch.lower_envelope_bounded(nx, xs, max_distance);
        for ix in 0..nx {
          let index = scratch.row()[ix];
          if index != 0 {
            grid.set(ix, iy, iz, VoxelAttr::from_index(index));
          }
        }
      } else {
        scratch.lower_envelope(nx, xs);
        for ix in 0..nx {
          grid.set(ix, iy, iz, VoxelAttr::from_index(scratch.row()[ix]));
        }
      }
    }
  }
}

fn sweep_rows_y(
  grid: &IndexGrid,
  samples: &SampleSet,
  max_distance: f64,
  iz_range: Range<usize>,
  scratch: &mut RowScratch,
) {
  let (nx, ny, _nz) = grid.dims();
  let (xs, ys, zs) = (samples.xs(), samples.ys(), samples.zs());
  let bounded = max_distance > 0.0;
  for iz in iz_range {
    let vz = iz as f64 + HALF;
    for ix in 0..nx {
      let vx = ix as f64 + HALF;
      scratch.clear();
      for iy in 0..ny {
        let index = grid.get(ix, iy, iz).index();
        if index != 0 {
          let dx = xs[index as usize] - vx;
          let dz = zs[index as usize] - vz;
          scratch.add_site(ys, index, dx * dx + dz * dz);
        }
      }
      if scratch.site_count() == 0 {
        continue;
      }
      if bounded {
        scratch.lower_envelope_bounded(ny, ys, max_distance);
        for iy in 0..ny {
          let index = scratch.row()[iy];
          if index != 0 {
            grid.set(ix, iy, iz, VoxelAttr::from_index(index));
          }
        }
      } else {
        scratch.lower_envelope(ny, ys);
        for iy in 0..ny {
          grid.set(ix, iy, iz, VoxelAttr::from_index(scratch.row()[iy]));
        }
      }
    }
  }
}

fn sweep_rows_z(
  grid: &IndexGrid,
  samples: &SampleSet,
  max_distance: f64,
  iy_range: Range<usize>,
  scratch: &mut RowScratch,
) {
  let (nx, _ny, nz) = grid.dims();
  let (xs, ys, zs) = (samples.xs(), samples.ys(), samples.zs());
  let bounded = max_distance > 0.0;
  for iy in iy_range {
    let vy = iy as f64 + HALF;
    for ix in 0..nx {
      let vx = ix as f64 + HALF;
      scratch.clear();
      for iz in 0..nz {
        let index = grid.get(ix, iy, iz).index();
        if index != 0 {
          let dx = xs[index as usize] - vx;
          let dy = ys[index as usize] - vy;
          scratch.add_site(zs, index, dx * dx + dy * dy);
        }
      }
      if scratch.site_count() == 0 {
        continue;
      }
      if bounded {
        scratch.lower_envelope_bounded(nz, zs, max_distance);
        for iz in 0..nz {
          let index = scratch.row()[iz];
          if index != 0 {
            grid.set(ix, iy, iz, VoxelAttr::from_index(index));
          }
        }
      } else {
        scratch.lower_envelope(nz, zs);
        for iz in 0..nz {
          grid.set(ix, iy, iz, VoxelAttr::from_index(scratch.row()[iz]));
        }
      }
    }
  }
}

/// Squared distance from the center of voxel `(ix, iy, iz)` to a
/// sample; the undefined index is treated as infinitely far.
#[inline(always)]
fn voxel_distance2(samples: &SampleSet, index: u32, ix: usize, iy: usize, iz: usize) -> f64 {
  if index == 0 {
    return INF;
  }
  let i = index as usize;
  let dx = samples.xs()[i] - (ix as f64 + HALF);
  let dy = samples.ys()[i] - (iy as f64 + HALF);
  let dz = samples.zs()[i] - (iz as f64 + HALF);
  dx * dx + dy * dy + dz * dz
}

/// Per voxel, keeps the closer of the two assignments in `grid`.
fn combine_rows(grid: &IndexGrid, other: &IndexGrid, samples: &SampleSet, iy_range: Range<usize>) {
  let (nx, _ny, nz) = grid.dims();
  for iy in iy_range {
    for ix in 0..nx {
      for iz in 0..nz {
        let ind1 = grid.get(ix, iy, iz).index();
        let ind2 = other.get(ix, iy, iz).index();
        if ind1 == ind2 {
          continue;
        }
        let d1 = voxel_distance2(samples, ind1, ix, iy, iz);
        let d2 = voxel_distance2(samples, ind2, ix, iy, iz);
        if d2 < d1 {
          grid.set(ix, iy, iz, VoxelAttr::from_index(ind2));
        }
      }
    }
  }
}

fn combine_pass(
  grid: &IndexGrid,
  other: &IndexGrid,
  samples: &SampleSet,
  runner: &Runner,
  deadline: Option<Instant>,
  report: &mut PropagateReport,
) {
  let (_nx, ny, _nz) = grid.dims();
  let outcome = runner.run_pass(ny, deadline, || (), |slab, _| {
    combine_rows(grid, other, samples, slab..slab + 1);
  });
  report.absorb(&outcome);
}

/// One refinement round: every defined voxel adopts the closest sample
/// referenced anywhere in its ball neighborhood in `prev`. Returns the
/// number of voxels that changed.
fn refine_rows(
  grid: &IndexGrid,
  prev: &IndexGrid,
  samples: &SampleSet,
  ball: &[(i32, i32, i32)],
  iy_range: Range<usize>,
) -> u64 {
  let (nx, ny, nz) = grid.dims();
  let mut changed = 0;
  for iy in iy_range {
    for ix in 0..nx {
      for iz in 0..nz {
        let center = prev.get(ix, iy, iz).index();
        if center == 0 {
          continue;
        }
        let mut best = center;
        let mut best_dist = voxel_distance2(samples, center, ix, iy, iz);
        for &(ox, oy, oz) in ball {
          let jx = ix as i32 + ox;
          let jy = iy as i32 + oy;
          let jz = iz as i32 + oz;
          if jx < 0 || jy < 0 || jz < 0 || jx >= nx as i32 || jy >= ny as i32 || jz >= nz as i32
          {
            continue;
          }
          let index = prev.get(jx as usize, jy as usize, jz as usize).index();
          if index != 0 && index != best {
            let d = voxel_distance2(samples, index, ix, iy, iz);
            if d < best_dist {
              best_dist = d;
              best = index;
            }
          }
        }
        if best != center {
          grid.set(ix, iy, iz, VoxelAttr::from_index(best));
          changed += 1;
        }
      }
    }
  }
  changed
}

fn refine_pass(
  grid: &IndexGrid,
  prev: &IndexGrid,
  samples: &SampleSet,
  ball: &[(i32, i32, i32)],
  runner: &Runner,
  deadline: Option<Instant>,
  report: &mut PropagateReport,
) -> u64 {
  let (_nx, ny, _nz) = grid.dims();
  let changed = AtomicU64::new(0);
  let outcome = runner.run_pass(ny, deadline, || (), |slab, _| {
    let n = refine_rows(grid, prev, samples, ball, slab..slab + 1);
    changed.fetch_add(n, Ordering::Relaxed);
  });
  report.absorb(&outcome);
  changed.into_inner()
}

/// Pass executor: either the calling thread or a dedicated pool. Both
/// hand out the same slabs in the same shape, so results match.
enum Runner {
  Single,
  Pool(SweepPool),
}

impl Runner {
  fn new(thread_count: usize) -> Result<Self> {
    if thread_count <= 1 {
      Ok(Self::Single)
    } else {
      Ok(Self::Pool(SweepPool::new(thread_count)?))
    }
  }

  fn run_pass<S, M, F>(
    &self,
    slab_count: usize,
    deadline: Option<Instant>,
    make_scratch: M,
    work: F,
  ) -> PassOutcome
  where
    M: Fn() -> S + Sync,
    F: Fn(usize, &mut S) + Sync,
  {
    match self {
      Self::Single => {
        let mut scratch = make_scratch();
        let mut outcome = PassOutcome::default();
        for slab in 0..slab_count {
          if deadline.is_some_and(|d| Instant::now() >= d) {
            outcome.timed_out = true;
            break;
          }
          work(slab, &mut scratch);
        }
        outcome
      }
      Self::Pool(pool) => pool.run_pass(slab_count, deadline, make_scratch, work),
    }
  }
}
