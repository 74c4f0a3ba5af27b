//! The scalar field contract queries are built on.

use glam::DVec3;
use smallvec::SmallVec;

/// Channels `distance` can hold without a heap allocation.
pub const INLINE_CHANNELS: usize = 4;

/// A continuous multi-channel field sampled at arbitrary world points.
///
/// Channel 0 is the signed distance; any further channels carry
/// per-point data such as color, interpolated the same way the
/// distance is. Evaluation never fails: implementations clamp
/// out-of-range queries instead of erroring.
pub trait ScalarField: Send + Sync {
  /// Channels written by `evaluate`, at least 1.
  fn channel_count(&self) -> usize {
    1
  }

  /// Writes `channel_count()` values at `point` into `out`.
  /// `out` must hold at least that many slots.
  fn evaluate(&self, point: DVec3, out: &mut [f64]);

  /// The distance channel alone.
  fn distance(&self, point: DVec3) -> f64 {
    let mut out: SmallVec<[f64; INLINE_CHANNELS]> =
      smallvec::smallvec![0.0; self.channel_count()];
    self.evaluate(point, &mut out);
    out[0]
  }
}

impl<F: ScalarField + ?Sized> ScalarField for &F {
  fn channel_count(&self) -> usize {
    (**self).channel_count()
  }

  fn evaluate(&self, point: DVec3, out: &mut [f64]) {
    (**self).evaluate(point, out)
  }
}

/// Trilinear blend of the eight values at a cell's corners.
/// Corner order is `vXYZ` with each axis 0 = low side, 1 = high side;
/// `dx`, `dy`, `dz` are the fractional offsets inside the cell.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
pub fn lerp3(
  v000: f64,
  v100: f64,
  v010: f64,
  v110: f64,
  v001: f64,
  v101: f64,
  v011: f64,
  v111: f64,
  dx: f64,
  dy: f64,
  dz: f64,
) -> f64 {
  let v00 = v000 + dx * (v100 - v000);
  let v10 = v010 + dx * (v110 - v010);
  let v01 = v001 + dx * (v101 - v001);
  let v11 = v011 + dx * (v111 - v011);
  let v0 = v00 + dy * (v10 - v00);
  let v1 = v01 + dy * (v11 - v01);
  v0 + dz * (v1 - v0)
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Plane;

  impl ScalarField for Plane {
    fn evaluate(&self, point: DVec3, out: &mut [f64]) {
      out[0] = point.y;
    }
  }

  #[test]
  fn test_distance_reads_channel_zero() {
    assert_eq!(Plane.distance(DVec3::new(3.0, -2.5, 1.0)), -2.5);
    assert_eq!(Plane.channel_count(), 1);
  }

  #[test]
  fn test_reference_impl_delegates() {
    let plane = Plane;
    let by_ref: &dyn ScalarField = &plane;
    assert_eq!((&by_ref).distance(DVec3::new(0.0, 4.0, 0.0)), 4.0);
  }

  #[test]
  fn test_lerp3_corners() {
    let v = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    let corner = |dx: f64, dy: f64, dz: f64| {
      lerp3(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], dx, dy, dz)
    };
    assert_eq!(corner(0.0, 0.0, 0.0), 1.0);
    assert_eq!(corner(1.0, 0.0, 0.0), 2.0);
    assert_eq!(corner(0.0, 1.0, 0.0), 3.0);
    assert_eq!(corner(1.0, 1.0, 0.0), 4.0);
    assert_eq!(corner(0.0, 0.0, 1.0), 5.0);
    assert_eq!(corner(1.0, 0.0, 1.0), 6.0);
    assert_eq!(corner(0.0, 1.0, 1.0), 7.0);
    assert_eq!(corner(1.0, 1.0, 1.0), 8.0);
  }

  #[test]
  fn test_lerp3_center_is_the_mean() {
    let mid = lerp3(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 0.5, 0.5, 0.5);
    assert_eq!(mid, 4.5);
  }
}
