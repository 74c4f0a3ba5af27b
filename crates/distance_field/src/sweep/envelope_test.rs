use super::*;

// Site coordinate arrays are 1-based like the sample arrays they
// mirror: slot 0 is reserved.

#[test]
fn test_single_site_wins_everywhere() {
  let coord = [0.0, 3.3];
  let mut scratch = RowScratch::new(8);
  scratch.add_site(&coord, 1, 0.0);
  scratch.lower_envelope(8, &coord);
  assert_eq!(scratch.row()[..8], [1, 1, 1, 1, 1, 1, 1, 1]);
}

#[test]
fn test_two_sites_split_at_midpoint() {
  let coord = [0.0, 1.0, 7.0];
  let mut scratch = RowScratch::new(8);
  scratch.add_site(&coord, 1, 0.0);
  scratch.add_site(&coord, 2, 0.0);
  scratch.lower_envelope(8, &coord);
  // Midpoint is 4.0: centers 0.5..3.5 go left, 4.5..7.5 go right.
  assert_eq!(scratch.row()[..8], [1, 1, 1, 1, 2, 2, 2, 2]);
}

#[test]
fn test_off_row_term_shifts_the_boundary() {
  // Site 2 is 3 voxels off the row (value 9), so it wins less ground:
  // the crossover of the two parabolas sits at x = 5.125.
  let coord = [0.0, 2.0, 6.0];
  let mut scratch = RowScratch::new(8);
  scratch.add_site(&coord, 1, 0.0);
  scratch.add_site(&coord, 2, 9.0);
  scratch.lower_envelope(8, &coord);
  assert_eq!(scratch.row()[..8], [1, 1, 1, 1, 1, 2, 2, 2]);
}

#[test]
fn test_insertion_order_does_not_matter() {
  let coord = [0.0, 9.1, 2.7, 5.3, 0.4];
  let values = [0.0, 1.3, 0.2, 2.0, 0.7];

  let mut forward = RowScratch::new(12);
  for index in 1..=4u32 {
    forward.add_site(&coord, index, values[index as usize]);
  }
  assert_eq!(forward.site_count(), 4);
  forward.lower_envelope(12, &coord);

  let mut backward = RowScratch::new(12);
  for index in (1..=4u32).rev() {
    backward.add_site(&coord, index, values[index as usize]);
  }
  backward.lower_envelope(12, &coord);

  assert_eq!(forward.row()[..12], backward.row()[..12]);
}

#[test]
fn test_coincident_sites_merge_keeping_lower_parabola() {
  let coord = [0.0, 4.0, 4.0 + 0.5e-5];
  let mut scratch = RowScratch::new(8);
  scratch.add_site(&coord, 1, 5.0);
  scratch.add_site(&coord, 2, 1.0);
  assert_eq!(scratch.site_count(), 1, "sites within EPS must merge");
  scratch.lower_envelope(8, &coord);
  assert_eq!(scratch.row()[0], 2, "the lower parabola survives a merge");

  // Reversed arrival keeps the lower parabola too.
  let mut scratch = RowScratch::new(8);
  scratch.add_site(&coord, 2, 1.0);
  scratch.add_site(&coord, 1, 5.0);
  assert_eq!(scratch.site_count(), 1);
  scratch.lower_envelope(8, &coord);
  assert_eq!(scratch.row()[0], 2);
}

#[test]
fn test_matches_brute_force() {
  // Deterministic pseudo-random sites; the envelope must agree with a
  // direct argmin at every voxel center.
  let mut state = 0x2545_f491u32;
  let mut next = move || {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    state as f64 / u32::MAX as f64
  };

  let grid_size = 32;
  let site_count = 12;
  let mut coord = vec![0.0];
  let mut values = vec![0.0];
  for _ in 0..site_count {
    coord.push(next() * grid_size as f64);
    values.push(next() * 9.0);
  }

  let mut scratch = RowScratch::new(grid_size);
  for index in 1..=site_count as u32 {
    scratch.add_site(&coord, index, values[index as usize]);
  }
  scratch.lower_envelope(grid_size, &coord);

  for q in 0..grid_size {
    let x = q as f64 + 0.5;
    let best = (1..=site_count)
      .map(|i| (x - coord[i]) * (x - coord[i]) + values[i])
      .fold(f64::INFINITY, f64::min);
    let picked = scratch.row()[q] as usize;
    let picked_dist = (x - coord[picked]) * (x - coord[picked]) + values[picked];
    assert!(
      picked_dist <= best + 1.0e-9,
      "voxel {q}: picked {picked_dist}, best {best}"
    );
  }
}

#[test]
fn test_bounded_scan_zeroes_far_voxels() {
  let coord = [0.0, 10.0];
  let mut scratch = RowScratch::new(20);
  scratch.add_site(&coord, 1, 0.0);
  scratch.lower_envelope_bounded(20, &coord, 2.5);

  for q in 0..20 {
    let dist = (q as f64 + 0.5 - 10.0).abs();
    let expect = if dist < 2.5 { 1 } else { 0 };
    assert_eq!(scratch.row()[q], expect, "voxel {q} at distance {dist}");
  }
}

#[test]
fn test_bounded_respects_off_row_term() {
  // Site right on the row axis but 2 voxels off the row: with a bound
  // of 2.1 only centers within sqrt(2.1^2 - 4) of it survive.
  let coord = [0.0, 5.0];
  let mut scratch = RowScratch::new(10);
  scratch.add_site(&coord, 1, 4.0);
  scratch.lower_envelope_bounded(10, &coord, 2.1);

  for q in 0..10 {
    let x = q as f64 + 0.5;
    let dist2 = (x - 5.0) * (x - 5.0) + 4.0;
    let expect = if dist2 < 2.1 * 2.1 { 1 } else { 0 };
    assert_eq!(scratch.row()[q], expect, "voxel {q}");
  }
}

#[test]
fn test_non_positive_bound_never_matches() {
  // Callers treat a bound of zero as "unbounded" and use the plain
  // scan; the bounded scan itself just never matches.
  let coord = [0.0, 3.0];
  let mut scratch = RowScratch::new(6);
  scratch.add_site(&coord, 1, 0.0);
  scratch.lower_envelope_bounded(6, &coord, 0.0);
  assert_eq!(scratch.row()[..6], [0, 0, 0, 0, 0, 0]);
}
