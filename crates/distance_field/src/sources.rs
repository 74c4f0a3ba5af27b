//! Ready-made surface sources for tests, demos and benches.

use glam::DVec3;

use crate::bounds::{Aabb, GridBounds};
use crate::classify::{FieldInterior, InteriorTest};
use crate::error::Result;
use crate::field::ScalarField;
use crate::pipeline::SurfaceSource;
use crate::samples::SampleSet;

/// Tiny deterministic generator for scattering debug points.
#[derive(Clone, Copy, Debug)]
pub struct XorShift32 {
  state: u32,
}

impl XorShift32 {
  pub fn new(seed: u32) -> Self {
    Self {
      state: if seed == 0 { 1 } else { seed },
    }
  }

  #[inline]
  pub fn next(&mut self) -> u32 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    self.state = x;
    x
  }

  /// Uniform in `[0, 1)`.
  #[inline]
  pub fn next_f64(&mut self) -> f64 {
    f64::from(self.next()) / (f64::from(u32::MAX) + 1.0)
  }
}

/// A raw point cloud; every point is a surface sample.
///
/// Point clouds carry no inside notion, so fields built from them are
/// positive everywhere.
#[derive(Clone, Debug)]
pub struct PointCloudSource {
  label: String,
  points: Vec<DVec3>,
}

impl PointCloudSource {
  /// The label is the source identity for caching; callers must keep
  /// it unique per point set.
  pub fn new(label: impl Into<String>, points: Vec<DVec3>) -> Self {
    Self {
      label: label.into(),
      points,
    }
  }

  pub fn points(&self) -> &[DVec3] {
    &self.points
  }
}

impl SurfaceSource for PointCloudSource {
  fn fingerprint(&self) -> String {
    format!("point_cloud:{}:{}", self.label, self.points.len())
  }

  fn local_bounds(&self) -> Option<Aabb> {
    Aabb::from_points(&self.points)
  }

  fn sample_surface(&self, _bounds: &GridBounds) -> Result<SampleSet> {
    Ok(SampleSet::from_points(&self.points))
  }
}

/// Analytic sphere distance, the classic smoke-test field.
#[derive(Clone, Copy, Debug)]
pub struct SphereField {
  pub center: DVec3,
  pub radius: f64,
}

impl SphereField {
  pub fn new(center: DVec3, radius: f64) -> Self {
    Self { center, radius }
  }
}

impl ScalarField for SphereField {
  fn evaluate(&self, point: DVec3, out: &mut [f64]) {
    out[0] = point.distance(self.center) - self.radius;
  }
}

/// Sphere surface sampled along a golden-angle spiral, with the
/// analytic sphere as its inside oracle. The go-to source for
/// round-trip tests.
#[derive(Clone, Debug)]
pub struct SphereSource {
  center: DVec3,
  radius: f64,
  sample_count: usize,
}

impl SphereSource {
  pub fn new(center: DVec3, radius: f64, sample_count: usize) -> Self {
    Self {
      center,
      radius,
      sample_count,
    }
  }

  pub fn center(&self) -> DVec3 {
    self.center
  }

  pub fn radius(&self) -> f64 {
    self.radius
  }
}

impl SurfaceSource for SphereSource {
  fn fingerprint(&self) -> String {
    format!(
      "sphere:{:?}:{:.17e}:{}",
      self.center, self.radius, self.sample_count
    )
  }

  fn local_bounds(&self) -> Option<Aabb> {
    (self.radius > 0.0).then(|| {
      Aabb::from_center_half_extents(self.center, DVec3::splat(self.radius))
    })
  }

  fn sample_surface(&self, _bounds: &GridBounds) -> Result<SampleSet> {
    let mut set = SampleSet::with_capacity(self.sample_count);
    // Spiral with the golden angle between consecutive points: even
    // coverage, no clustering at the poles.
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let count = self.sample_count;
    for i in 0..count {
      let t = (i as f64 + 0.5) / count as f64;
      let y = 1.0 - 2.0 * t;
      let ring = (1.0 - y * y).max(0.0).sqrt();
      let theta = golden_angle * i as f64;
      let dir = DVec3::new(theta.cos() * ring, y, theta.sin() * ring);
      set.push(self.center + dir * self.radius);
    }
    Ok(set)
  }

  fn interior_test(&self, bounds: &GridBounds) -> Option<Box<dyn InteriorTest + '_>> {
    Some(Box::new(FieldInterior::new(
      SphereField::new(self.center, self.radius),
      *bounds,
    )))
  }
}

/// Samples an arbitrary scalar field by locating the sign flips of its
/// first channel between neighboring voxel centers; each axis crossing
/// yields one surface point, placed by linear interpolation of the two
/// field values.
pub struct ImplicitSource<F> {
  label: String,
  field: F,
  bounds: Aabb,
}

impl<F: ScalarField> ImplicitSource<F> {
  pub fn new(label: impl Into<String>, field: F, bounds: Aabb) -> Self {
    Self {
      label: label.into(),
      field,
      bounds,
    }
  }

  pub fn field(&self) -> &F {
    &self.field
  }
}

impl<F: ScalarField> SurfaceSource for ImplicitSource<F> {
  fn fingerprint(&self) -> String {
    format!("implicit:{}", self.label)
  }

  fn local_bounds(&self) -> Option<Aabb> {
    Some(self.bounds)
  }

  fn sample_surface(&self, bounds: &GridBounds) -> Result<SampleSet> {
    let (nx, ny, nz) = bounds.dims();
    let at = |ix: usize, iy: usize, iz: usize| (iy * nx + ix) * nz + iz;

    // One field read per voxel center, shared by the three axis scans.
    let mut values = vec![0.0f64; nx * ny * nz];
    for iy in 0..ny {
      for ix in 0..nx {
        for iz in 0..nz {
          values[at(ix, iy, iz)] = self.field.distance(bounds.voxel_center(ix, iy, iz));
        }
      }
    }

    let mut set = SampleSet::new();
    for iy in 0..ny {
      for ix in 0..nx {
        for iz in 0..nz {
          let v0 = values[at(ix, iy, iz)];
          let p0 = bounds.voxel_center(ix, iy, iz);
          if ix + 1 < nx {
            let v1 = values[at(ix + 1, iy, iz)];
            if (v0 < 0.0) != (v1 < 0.0) {
              let t = v0 / (v0 - v1);
              set.push(p0.lerp(bounds.voxel_center(ix + 1, iy, iz), t));
            }
          }
          if iy + 1 < ny {
            let v1 = values[at(ix, iy + 1, iz)];
            if (v0 < 0.0) != (v1 < 0.0) {
              let t = v0 / (v0 - v1);
              set.push(p0.lerp(bounds.voxel_center(ix, iy + 1, iz), t));
            }
          }
          if iz + 1 < nz {
            let v1 = values[at(ix, iy, iz + 1)];
            if (v0 < 0.0) != (v1 < 0.0) {
              let t = v0 / (v0 - v1);
              set.push(p0.lerp(bounds.voxel_center(ix, iy, iz + 1), t));
            }
          }
        }
      }
    }
    Ok(set)
  }

  fn interior_test(&self, bounds: &GridBounds) -> Option<Box<dyn InteriorTest + '_>> {
    Some(Box::new(FieldInterior::new(&self.field, *bounds)))
  }
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod sources_test;
