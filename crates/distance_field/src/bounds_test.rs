use approx::assert_relative_eq;
use glam::DVec3;

use super::*;

#[test]
fn test_aabb_from_points() {
  assert_eq!(Aabb::from_points(&[]), None);

  let points = [
    DVec3::new(1.0, -2.0, 0.5),
    DVec3::new(-1.0, 3.0, 0.0),
    DVec3::new(0.0, 0.0, 2.0),
  ];
  let aabb = Aabb::from_points(&points).unwrap();
  assert_eq!(aabb.min, DVec3::new(-1.0, -2.0, 0.0));
  assert_eq!(aabb.max, DVec3::new(1.0, 3.0, 2.0));
}

#[test]
fn test_aabb_derived_quantities() {
  let aabb = Aabb::new(DVec3::ZERO, DVec3::new(2.0, 3.0, 4.0));
  assert_eq!(aabb.size(), DVec3::new(2.0, 3.0, 4.0));
  assert_eq!(aabb.center(), DVec3::new(1.0, 1.5, 2.0));
  assert_relative_eq!(aabb.volume(), 24.0);
  assert_relative_eq!(aabb.diagonal(), (4.0f64 + 9.0 + 16.0).sqrt());
  assert_relative_eq!(aabb.max_side(), 4.0);

  let grown = aabb.expand(0.5);
  assert_eq!(grown.min, DVec3::splat(-0.5));
  assert_eq!(grown.max, DVec3::new(2.5, 3.5, 4.5));

  assert!(aabb.contains_point(DVec3::new(1.0, 1.0, 1.0)));
  assert!(!aabb.contains_point(DVec3::new(1.0, 1.0, 4.1)));
}

#[test]
fn test_dims_round_up_partial_voxels() {
  let bounds = GridBounds::new(
    Aabb::new(DVec3::ZERO, DVec3::new(1.0, 0.95, 1.05)),
    0.1,
  );
  // 10 exact, 9.5 and 10.5 round up.
  assert_eq!(bounds.dims(), (10, 10, 11));
}

#[test]
fn test_dims_never_zero() {
  let bounds = GridBounds::new(Aabb::new(DVec3::ZERO, DVec3::splat(0.001)), 1.0);
  assert_eq!(bounds.dims(), (1, 1, 1));
}

#[test]
fn test_round_bounds_is_stable() {
  let bounds = GridBounds::new(
    Aabb::new(DVec3::new(-0.33, 0.1, 0.0), DVec3::new(0.97, 1.0, 0.61)),
    0.07,
  );
  let rounded = bounds.round_bounds();
  assert_eq!(rounded.dims(), bounds.dims(), "rounding must keep the voxel count");
  // A second rounding changes nothing.
  let again = rounded.round_bounds();
  assert_eq!(again.dims(), rounded.dims());
  assert!((again.max - rounded.max).length() < 1.0e-12);

  // Every axis now holds a whole number of voxels.
  let (nx, ny, nz) = rounded.dims();
  let size = rounded.aabb().size();
  assert_relative_eq!(size.x, nx as f64 * 0.07, max_relative = 1.0e-12);
  assert_relative_eq!(size.y, ny as f64 * 0.07, max_relative = 1.0e-12);
  assert_relative_eq!(size.z, nz as f64 * 0.07, max_relative = 1.0e-12);
}

#[test]
fn test_clamp_voxel_count_shrinks_large_grids() {
  let bounds = GridBounds::new(Aabb::new(DVec3::ZERO, DVec3::splat(1.0)), 1.0e-4);
  assert_eq!(bounds.voxel_count(), 1_000_000_000_000);

  let clamped = bounds.clamp_voxel_count(1_000, 1_000_000);
  let voxels = clamped.voxel_count();
  assert!(clamped.voxel_size > bounds.voxel_size);
  // cbrt derivation lands close to the requested budget; rounding can
  // overshoot by a voxel per axis.
  assert!(voxels <= 1_030_301, "got {voxels} voxels");
  assert!(voxels >= 990_000, "got {voxels} voxels");
}

#[test]
fn test_clamp_voxel_count_grows_small_grids() {
  let bounds = GridBounds::new(Aabb::new(DVec3::ZERO, DVec3::splat(1.0)), 0.5);
  assert_eq!(bounds.voxel_count(), 8);

  let clamped = bounds.clamp_voxel_count(1_000, 1_000_000_000);
  assert!(clamped.voxel_size < bounds.voxel_size);
  assert!(clamped.voxel_count() >= 1_000);
}

#[test]
fn test_clamp_voxel_count_keeps_size_inside_window() {
  let bounds = GridBounds::new(Aabb::new(DVec3::ZERO, DVec3::splat(1.0)), 0.05);
  let clamped = bounds.clamp_voxel_count(1_000, 1_000_000_000);
  assert_eq!(clamped.voxel_size, 0.05);
}

#[test]
fn test_voxel_center() {
  let bounds = GridBounds::new(Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0)), 0.5);
  assert_eq!(bounds.voxel_center(0, 0, 0), DVec3::splat(-0.75));
  assert_eq!(bounds.voxel_center(3, 0, 1), DVec3::new(0.75, -0.75, -0.25));
}

#[test]
fn test_world_grid_round_trip() {
  let bounds = GridBounds::new(
    Aabb::new(DVec3::new(-2.0, 1.0, 0.0), DVec3::new(2.0, 3.0, 1.0)),
    0.25,
  );
  let p = DVec3::new(0.3, 1.7, 0.9);
  let g = bounds.world_to_grid(p);
  assert_relative_eq!(g.x, 9.2, max_relative = 1.0e-12);
  let back = bounds.grid_to_world(g);
  assert!((back - p).length() < 1.0e-12);
}
