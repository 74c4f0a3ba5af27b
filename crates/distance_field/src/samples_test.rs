use glam::DVec3;

use super::*;
use crate::bounds::Aabb;
use crate::grid::IndexGrid;

#[test]
fn test_reserved_slot() {
  let set = SampleSet::new();
  assert_eq!(set.len(), 0);
  assert!(set.is_empty());
  assert_eq!(set.xs().len(), 1, "empty set still carries the reserved slot");
  assert_eq!(set.xs()[0], 0.0);
}

#[test]
fn test_push_assigns_one_based_indices() {
  let mut set = SampleSet::new();
  let a = set.push(DVec3::new(1.0, 2.0, 3.0));
  let b = set.push(DVec3::new(4.0, 5.0, 6.0));
  assert_eq!(a, 1);
  assert_eq!(b, 2);
  assert_eq!(set.len(), 2);
  assert_eq!(set.point(1), DVec3::new(1.0, 2.0, 3.0));
  assert_eq!(set.point(2), DVec3::new(4.0, 5.0, 6.0));
}

#[test]
fn test_from_points_matches_push() {
  let points = [DVec3::ZERO, DVec3::ONE, DVec3::new(-1.0, 0.5, 2.0)];
  let set = SampleSet::from_points(&points);
  assert_eq!(set.len(), 3);
  let collected: Vec<DVec3> = set.iter().collect();
  assert_eq!(collected, points);
}

#[test]
fn test_aux_channel_validation() {
  let set = SampleSet::from_points(&[DVec3::ZERO, DVec3::ONE]);
  let err = set.clone().with_aux_channel(&[1.0]).unwrap_err();
  assert!(matches!(
    err,
    crate::error::FieldError::AuxChannelMismatch { got: 1, expected: 2 }
  ));

  let set = set.with_aux_channel(&[0.25, 0.75]).unwrap();
  assert_eq!(set.aux_channels(), 1);
  assert_eq!(set.aux(0, 1), 0.25);
  assert_eq!(set.aux(0, 2), 0.75);

  let full = set
    .with_aux_channel(&[0.0, 0.0])
    .unwrap()
    .with_aux_channel(&[0.0, 0.0])
    .unwrap();
  let err = full.with_aux_channel(&[0.0, 0.0]).unwrap_err();
  assert!(matches!(
    err,
    crate::error::FieldError::TooManyAuxChannels { limit: MAX_AUX_CHANNELS }
  ));
}

#[test]
fn test_unit_conversion_round_trip() {
  let bounds = GridBounds::new(
    Aabb::new(DVec3::new(-1.0, 0.0, 2.0), DVec3::new(1.0, 1.0, 3.0)),
    0.125,
  );
  let points = [DVec3::new(-0.5, 0.25, 2.5), DVec3::new(0.75, 0.875, 2.125)];
  let mut set = SampleSet::from_points(&points);

  set.to_grid_units(&bounds);
  assert_eq!(set.point(1), DVec3::new(4.0, 2.0, 4.0));
  assert_eq!(set.point(2), DVec3::new(14.0, 7.0, 1.0));

  set.to_world_units(&bounds);
  for (i, p) in points.iter().enumerate() {
    assert!((set.point(i as u32 + 1) - *p).length() < 1.0e-12);
  }
}

#[test]
fn test_snap_to_voxels() {
  let mut set = SampleSet::from_points(&[
    DVec3::new(0.1, 1.9, 3.5),
    DVec3::new(2.0, 0.0, 5.99),
  ]);
  set.snap_to_voxels();
  assert_eq!(set.point(1), DVec3::new(0.5, 1.5, 3.5));
  assert_eq!(set.point(2), DVec3::new(2.5, 0.5, 5.5));
}

#[test]
fn test_mask_unused() {
  let mut set = SampleSet::from_points(&[
    DVec3::new(0.5, 0.5, 0.5),
    DVec3::new(1.5, 0.5, 0.5),
    DVec3::new(1.5, 1.5, 0.5),
  ]);

  // Grid references samples 1 and 3 only.
  let grid = IndexGrid::new(2, 2, 1);
  grid.set(0, 0, 0, crate::types::VoxelAttr::from_index(1));
  grid.set(1, 1, 0, crate::types::VoxelAttr::from_index(3));
  let frozen = grid.freeze();

  let used = set.mask_unused(&frozen);
  assert_eq!(used, 2);
  assert_eq!(set.point(1), DVec3::new(0.5, 0.5, 0.5));
  assert!(set.point(2).x >= 1.0e9, "unused sample must move far away");
  assert_eq!(set.point(3), DVec3::new(1.5, 1.5, 0.5));
}
