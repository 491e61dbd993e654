use super::*;

/// One Adam7 pass: starting offset and step, both per axis.
///
/// Pass `n` covers the full-image positions `(x0 + i*dx, y0 + j*dy)`.
#[derive(Debug, Clone, Copy)]
struct Adam7Pass {
  x0: u32,
  y0: u32,
  dx: u32,
  dy: u32,
}

const ADAM7_PASSES: [Adam7Pass; 7] = [
  Adam7Pass { x0: 0, y0: 0, dx: 8, dy: 8 },
  Adam7Pass { x0: 4, y0: 0, dx: 8, dy: 8 },
  Adam7Pass { x0: 0, y0: 4, dx: 4, dy: 8 },
  Adam7Pass { x0: 2, y0: 0, dx: 4, dy: 4 },
  Adam7Pass { x0: 0, y0: 2, dx: 2, dy: 4 },
  Adam7Pass { x0: 1, y0: 0, dx: 2, dy: 2 },
  Adam7Pass { x0: 0, y0: 1, dx: 1, dy: 2 },
];

/// Given a full image's dimensions, computes the dimensions of each reduced
/// image in the interlaced form.
///
/// Index 0 holds the full dimensions, indexes 1 through 7 hold the reduced
/// images of the seven passes in order. A pass that lands entirely outside a
/// small image comes out as zero in one or both dimensions, and contributes
/// no scanlines at all to the datastream.
#[must_use]
pub const fn reduced_image_dimensions(full_width: u32, full_height: u32) -> [(u32, u32); 8] {
  // the count of steps that land within `full`, starting at `offset`.
  const fn steps_within(full: u32, offset: u32, step: u32) -> u32 {
    if full > offset {
      (full - offset).div_ceil(step)
    } else {
      0
    }
  }
  let mut out = [(0_u32, 0_u32); 8];
  out[0] = (full_width, full_height);
  let mut i = 0;
  while i < 7 {
    let pass = ADAM7_PASSES[i];
    out[i + 1] = (
      steps_within(full_width, pass.x0, pass.dx),
      steps_within(full_height, pass.y0, pass.dy),
    );
    i += 1;
  }
  out
}

/// Converts a position within a reduced image to its position within the full
/// image.
///
/// The `level` is 1 through 7, matching the indexing that
/// [reduced_image_dimensions] uses.
#[inline]
#[must_use]
pub const fn interlaced_pos_to_full_pos(
  level: usize, reduced_x: u32, reduced_y: u32,
) -> (u32, u32) {
  let pass = ADAM7_PASSES[level - 1];
  (pass.x0 + reduced_x * pass.dx, pass.y0 + reduced_y * pass.dy)
}

#[test]
fn test_reduced_image_dimensions() {
  assert_eq!(reduced_image_dimensions(0, 0), [(0, 0); 8]);
  // one pixel only shows up in pass 1.
  assert_eq!(
    reduced_image_dimensions(1, 1),
    [(1, 1), (1, 1), (0, 1), (1, 0), (0, 1), (1, 0), (0, 1), (1, 0)]
  );
  // the classic 8x8 case gives exactly one full tile of the pattern.
  assert_eq!(
    reduced_image_dimensions(8, 8),
    [(8, 8), (1, 1), (1, 1), (2, 1), (2, 2), (4, 2), (4, 4), (8, 4)]
  );
  // all pass pixel counts always sum to the full pixel count.
  for width in 0..=32_u32 {
    for height in 0..=32_u32 {
      let dims = reduced_image_dimensions(width, height);
      let total: u32 = dims.iter().skip(1).map(|(w, h)| w * h).sum();
      assert_eq!(total, width * height, "size {width}x{height}");
    }
  }
}

#[test]
fn test_interlaced_pos_to_full_pos() {
  assert_eq!(interlaced_pos_to_full_pos(1, 0, 0), (0, 0));
  assert_eq!(interlaced_pos_to_full_pos(2, 0, 0), (4, 0));
  assert_eq!(interlaced_pos_to_full_pos(3, 1, 0), (4, 4));
  assert_eq!(interlaced_pos_to_full_pos(4, 1, 1), (6, 4));
  assert_eq!(interlaced_pos_to_full_pos(5, 3, 1), (6, 6));
  assert_eq!(interlaced_pos_to_full_pos(6, 2, 3), (5, 6));
  assert_eq!(interlaced_pos_to_full_pos(7, 7, 3), (7, 7));
  // every full position in an 8x8 image is hit exactly once across passes.
  let mut seen = [[0_u32; 8]; 8];
  let dims = reduced_image_dimensions(8, 8);
  for level in 1..=7 {
    let (w, h) = dims[level];
    for ry in 0..h {
      for rx in 0..w {
        let (x, y) = interlaced_pos_to_full_pos(level, rx, ry);
        seen[y as usize][x as usize] += 1;
      }
    }
  }
  assert!(seen.iter().flatten().all(|&count| count == 1));
}
