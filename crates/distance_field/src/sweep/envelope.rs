//! One-dimensional lower envelope of parabolas rooted at sample sites.
//!
//! Each site `i` on a row contributes the parabola
//! `(x - coord[i])^2 + value[i]`, where `value` is its squared distance
//! off the row. The closest site at a voxel is the one whose parabola
//! is lowest at the voxel center, so a row transform is: build the
//! lower envelope of all parabolas left to right, then walk the voxel
//! centers and read off the winning site. Sites sit at their true
//! coordinates, not on the voxel lattice, which is what lets distances
//! stay subvoxel-exact.
//!
//! ```text
//!  value
//!    \      site a        site b
//!     \    .      \      /
//!      \  /        \    /         envelope = min of all parabolas
//!       \/          \  /
//!   -----+-----------\/--------------> row coordinate
//!        |    a wins  |   b wins
//! ```

use crate::types::HALF;

/// Coordinate tolerance when comparing site positions, in voxels.
/// Sites closer than this along a row collapse into one.
pub(crate) const EPS: f64 = 1.0e-5;

/// Far sentinel, well beyond any distance the grid can produce.
pub(crate) const INF: f64 = 1.0e10;

/// Reusable buffers for row transforms, sized once for the longest
/// grid axis. Each worker thread owns one.
pub struct RowScratch {
  /// Chain of sites on the current row, ascending by coordinate.
  sites: Vec<u32>,
  /// Squared off-row distance per chain slot.
  values: Vec<f64>,
  /// Envelope stack: chain slots whose parabolas form the envelope.
  env_slots: Vec<usize>,
  /// Coordinate where each envelope entry starts winning.
  env_x: Vec<f64>,
  /// Winning site per voxel after a scan.
  row: Vec<u32>,
  count: usize,
}

impl RowScratch {
  pub fn new(max_dim: usize) -> Self {
    Self {
      sites: vec![0; max_dim + 1],
      values: vec![0.0; max_dim],
      env_slots: vec![0; max_dim],
      env_x: vec![0.0; max_dim + 1],
      row: vec![0; max_dim],
      count: 0,
    }
  }

  /// Drops the current chain to start a new row.
  #[inline]
  pub fn clear(&mut self) {
    self.count = 0;
  }

  /// Sites currently on the chain.
  #[inline]
  pub fn site_count(&self) -> usize {
    self.count
  }

  /// Winning site per voxel from the last envelope scan.
  #[inline]
  pub fn row(&self) -> &[u32] {
    &self.row
  }

  /// Inserts site `index` with off-row term `value`, keeping the chain
  /// sorted by `coord[index]`. Sites coincident within [`EPS`] merge,
  /// the lower parabola surviving.
  pub fn add_site(&mut self, coord: &[f64], index: u32, value: f64) {
    let x = coord[index as usize];
    let mut at = self.count;
    while at > 0 && x < coord[self.sites[at - 1] as usize] - EPS {
      at -= 1;
    }
    if at > 0 && x - coord[self.sites[at - 1] as usize] <= EPS {
      if value < self.values[at - 1] {
        self.values[at - 1] = value;
        self.sites[at - 1] = index;
      }
      return;
    }
    let mut k = self.count;
    while k > at {
      self.sites[k] = self.sites[k - 1];
      self.values[k] = self.values[k - 1];
      k -= 1;
    }
    self.sites[at] = index;
    self.values[at] = value;
    self.count += 1;
  }

  /// Builds the envelope stack from the current chain. Returns with
  /// `env_slots`/`env_x` describing the envelope left to right.
  fn build_envelope(&mut self, coord: &[f64]) {
    debug_assert!(self.count > 0, "envelope of an empty chain");
    let mut k: i64 = 0;
    self.env_slots[0] = 0;
    self.env_x[0] = -INF;
    self.env_x[1] = INF;
    let mut s = 0.0;
    for p in 1..self.count {
      let x1 = coord[self.sites[p] as usize];
      while k >= 0 {
        let slot = self.env_slots[k as usize];
        let x0 = coord[self.sites[slot] as usize];
        if (x0 - x1).abs() > EPS {
          // Where parabola p overtakes the stack top.
          s = (x1 * x1 - x0 * x0 + self.values[p] - self.values[slot])
            / (2.0 * (x1 - x0));
          if s > self.env_x[k as usize] {
            break;
          }
        }
        // Overtaken before its own start (or coincident): pop.
        k -= 1;
      }
      k += 1;
      self.env_slots[k as usize] = p;
      self.env_x[k as usize] = s;
      self.env_x[k as usize + 1] = INF;
    }
  }

  /// Assigns every voxel of the row its closest site.
  /// `row()[q]` receives the site index at voxel center `q + 0.5`.
  pub fn lower_envelope(&mut self, grid_size: usize, coord: &[f64]) {
    self.build_envelope(coord);
    let mut k = 0;
    for q in 0..grid_size {
      let x = q as f64 + HALF;
      while self.env_x[k + 1] < x {
        k += 1;
      }
      self.row[q] = self.sites[self.env_slots[k]];
    }
  }

  /// Like [`lower_envelope`](Self::lower_envelope), but voxels whose
  /// winning site is further than `max_distance` get 0 instead.
  pub fn lower_envelope_bounded(&mut self, grid_size: usize, coord: &[f64], max_distance: f64) {
    self.build_envelope(coord);
    let max_dist2 = max_distance * max_distance;
    let mut k = 0;
    for q in 0..grid_size {
      let mut x = q as f64 + HALF;
      while self.env_x[k + 1] < x {
        k += 1;
      }
      let slot = self.env_slots[k];
      let index = self.sites[slot];
      x -= coord[index as usize];
      let dist2 = x * x + self.values[slot];
      self.row[q] = if dist2 < max_dist2 { index } else { 0 };
    }
  }
}

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;
