use glam::DVec3;

use super::*;

fn count_defined(grid: &IndexGrid) -> usize {
  let (nx, ny, nz) = grid.dims();
  let mut count = 0;
  for ix in 0..nx {
    for iy in 0..ny {
      for iz in 0..nz {
        if !grid.get(ix, iy, iz).is_undefined() {
          count += 1;
        }
      }
    }
  }
  count
}

#[test]
fn test_ball_neighborhood_sizes() {
  // r = 1: center plus the six face neighbors.
  assert_eq!(ball_neighborhood(1.0).len(), 7);
  // r = 1.5: center, 6 face, 12 edge neighbors.
  assert_eq!(ball_neighborhood(1.5).len(), 19);
  // r = 2: adds 8 corner neighbors and 6 at distance 2.
  assert_eq!(ball_neighborhood(2.0).len(), 33);
  assert!(ball_neighborhood(1.0).contains(&(0, 0, 0)));
}

#[test]
fn test_single_sample_marks_face_neighbors() {
  // Sample exactly at a voxel center: with the default thickness 1.0
  // the voxel itself and its six face neighbors are inside the shell,
  // the edge diagonals (distance sqrt(2)) are not.
  let grid = IndexGrid::new(5, 5, 5);
  let samples = SampleSet::from_points(&[DVec3::splat(2.5)]);
  ShellBuilder::new().execute(&grid, &samples);

  assert_eq!(count_defined(&grid), 7);
  assert_eq!(grid.get(2, 2, 2).index(), 1);
  assert_eq!(grid.get(1, 2, 2).index(), 1);
  assert_eq!(grid.get(3, 2, 2).index(), 1);
  assert_eq!(grid.get(2, 1, 2).index(), 1);
  assert_eq!(grid.get(2, 3, 2).index(), 1);
  assert_eq!(grid.get(2, 2, 1).index(), 1);
  assert_eq!(grid.get(2, 2, 3).index(), 1);
  assert!(grid.get(1, 1, 2).is_undefined());
}

#[test]
fn test_off_center_sample() {
  let grid = IndexGrid::new(4, 4, 4);
  let samples = SampleSet::from_points(&[DVec3::new(1.1, 1.5, 1.5)]);
  ShellBuilder::new().execute(&grid, &samples);

  // Both (1,1,1) and (0,1,1) centers are within 1.01 of the sample.
  assert_eq!(grid.get(1, 1, 1).index(), 1);
  assert_eq!(grid.get(0, 1, 1).index(), 1);
  // (2,1,1) center is 1.4 away, outside the shell.
  assert!(grid.get(2, 1, 1).is_undefined());
}

#[test]
fn test_closer_sample_wins() {
  let grid = IndexGrid::new(6, 3, 3);
  let samples = SampleSet::from_points(&[
    DVec3::new(1.5, 1.5, 1.5),
    DVec3::new(3.9, 1.5, 1.5),
  ]);
  ShellBuilder::new().execute(&grid, &samples);

  assert_eq!(grid.get(1, 1, 1).index(), 1);
  // Voxel (2,_,_) center x = 2.5: 1.0 from sample 1, 1.4 from sample 2.
  assert_eq!(grid.get(2, 1, 1).index(), 1);
  assert_eq!(grid.get(3, 1, 1).index(), 2);
  assert_eq!(grid.get(4, 1, 1).index(), 2);
}

#[test]
fn test_exact_tie_keeps_lower_index() {
  let grid = IndexGrid::new(3, 1, 1);
  // Voxel (1,0,0) center sits exactly one voxel from both samples.
  let samples = SampleSet::from_points(&[
    DVec3::new(0.5, 0.5, 0.5),
    DVec3::new(2.5, 0.5, 0.5),
  ]);
  ShellBuilder::new().execute(&grid, &samples);
  assert_eq!(grid.get(1, 0, 0).index(), 1);
}

#[test]
fn test_sample_near_grid_border() {
  // Offsets reaching outside the grid are skipped, not wrapped.
  let grid = IndexGrid::new(3, 3, 3);
  let samples = SampleSet::from_points(&[DVec3::new(0.2, 0.5, 0.5)]);
  ShellBuilder::new().execute(&grid, &samples);
  assert_eq!(grid.get(0, 0, 0).index(), 1);
  assert!(grid.get(2, 2, 2).is_undefined());
}

#[test]
fn test_thicker_shell_reaches_further() {
  let grid = IndexGrid::new(11, 11, 11);
  let samples = SampleSet::from_points(&[DVec3::splat(5.5)]);
  ShellBuilder::new()
    .with_shell_half_thickness(2.6)
    .execute(&grid, &samples);

  // Distance 2 is inside the shell, distance 3 is not.
  assert_eq!(grid.get(7, 5, 5).index(), 1);
  assert!(grid.get(8, 5, 5).is_undefined());
}

#[test]
fn test_empty_sample_set_is_a_no_op() {
  let grid = IndexGrid::new(4, 4, 4);
  ShellBuilder::new().execute(&grid, &SampleSet::new());
  assert_eq!(count_defined(&grid), 0);
}

#[test]
fn test_seeding_is_deterministic() {
  let points: Vec<DVec3> = (0..40)
    .map(|i| {
      let t = i as f64 * 0.37;
      DVec3::new(
        4.0 + 3.0 * t.sin(),
        4.0 + 3.0 * (t * 1.7).cos(),
        4.0 + 3.0 * (t * 0.9).sin(),
      )
    })
    .collect();
  let samples = SampleSet::from_points(&points);

  let a = IndexGrid::new(8, 8, 8);
  let b = IndexGrid::new(8, 8, 8);
  ShellBuilder::new().execute(&a, &samples);
  ShellBuilder::new().execute(&b, &samples);

  let (fa, fb) = (a.freeze(), b.freeze());
  assert_eq!(fa.cells(), fb.cells());
}
