use super::*;

/// The Paeth filter's predictor: whichever of `a`, `b`, and `c` is closest to
/// `a + b - c`.
///
/// Ties prefer `a`, then `b`, then `c`. Both filtering and unfiltering use
/// the same predictor, so the order can't be shuffled without breaking
/// compatibility with every other PNG implementation.
#[inline]
#[must_use]
const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let p = a as i32 + b as i32 - c as i32;
  let pa = (p - a as i32).abs();
  let pb = (p - b as i32).abs();
  let pc = (p - c as i32).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Unfilters the decompressed datastream and hands each pixel to `op`.
///
/// The input must be exactly the size that
/// [get_zlib_decompression_requirement](IHDR::get_zlib_decompression_requirement)
/// demands for this header. Unfiltering happens in place, one scanline at a
/// time, with each line's filter byte naming how that line was filtered.
///
/// `op` is called as `op(x, y, data)` for every pixel:
/// * `x` and `y` are positions in the *full* image, already de-interlaced
///   when the header says the data is interlaced.
/// * `data` is the raw (big-endian) channel data of one pixel. For bit
///   depths below 8 this is a single byte holding just the unpacked bits,
///   still at their stored magnitude.
///
/// Pixels arrive in datastream order, which for interlaced images is not
/// row-major order over the full image.
pub fn unfilter_decompressed_data<F>(
  header: IHDR, mut decompressed: &mut [u8], mut op: F,
) -> PngResult<()>
where
  F: FnMut(u32, u32, &[u8]),
{
  let bpp = header.filter_chunk_size();
  let dims = reduced_image_dimensions(header.width, header.height);
  let levels: &[usize] = if header.is_interlaced { &[1, 2, 3, 4, 5, 6, 7] } else { &[0] };
  for &level in levels {
    let (width, height) = dims[level];
    if width == 0 || height == 0 {
      // empty passes contribute no bytes at all, not even filter bytes.
      continue;
    }
    let bytes_per_filterline = header.bytes_per_filterline(width);
    let image_bytes = bytes_per_filterline
      .checked_mul(height as usize)
      .ok_or(PngError::UnexpectedEndOfInput)?;
    if decompressed.len() < image_bytes {
      return Err(PngError::UnexpectedEndOfInput);
    }
    let (these_bytes, rest) = core::mem::take(&mut decompressed).split_at_mut(image_bytes);
    decompressed = rest;
    //
    let mut previous: &[u8] = &[];
    for (y, row) in these_bytes.chunks_exact_mut(bytes_per_filterline).enumerate() {
      let [filter_ty, line @ ..] = row else {
        return Err(PngError::UnexpectedEndOfInput);
      };
      match *filter_ty {
        0 => (),
        1 => {
          for i in bpp..line.len() {
            line[i] = line[i].wrapping_add(line[i - bpp]);
          }
        }
        2 => {
          for (i, item) in line.iter_mut().enumerate() {
            let b = previous.get(i).copied().unwrap_or(0);
            *item = item.wrapping_add(b);
          }
        }
        3 => {
          for i in 0..line.len() {
            let a = if i >= bpp { line[i - bpp] } else { 0 };
            let b = previous.get(i).copied().unwrap_or(0);
            line[i] = line[i].wrapping_add(((a as u16 + b as u16) / 2) as u8);
          }
        }
        4 => {
          for i in 0..line.len() {
            let a = if i >= bpp { line[i - bpp] } else { 0 };
            let b = previous.get(i).copied().unwrap_or(0);
            let c = if i >= bpp { previous.get(i - bpp).copied().unwrap_or(0) } else { 0 };
            line[i] = line[i].wrapping_add(paeth_predict(a, b, c));
          }
        }
        _ => return Err(PngError::IllegalFilterType),
      }
      //
      let y = y as u32;
      if header.bit_depth < 8 {
        let depth = header.bit_depth as u32;
        let pixels_per_byte = 8 / depth;
        let mask = (1_u8 << depth) - 1;
        let mut reduced_x = 0_u32;
        'per_line: for byte in line.iter() {
          // sub-byte samples pack MSB-first, and a partial final byte pads
          // low with bits that aren't pixels.
          for p in 0..pixels_per_byte {
            if reduced_x >= width {
              break 'per_line;
            }
            let sample = (*byte >> (8 - depth * (p + 1))) & mask;
            let (image_x, image_y) = if header.is_interlaced {
              interlaced_pos_to_full_pos(level, reduced_x, y)
            } else {
              (reduced_x, y)
            };
            op(image_x, image_y, &[sample]);
            reduced_x += 1;
          }
        }
      } else {
        for (reduced_x, pixel) in line.chunks_exact(bpp).enumerate() {
          let (image_x, image_y) = if header.is_interlaced {
            interlaced_pos_to_full_pos(level, reduced_x as u32, y)
          } else {
            (reduced_x as u32, y)
          };
          op(image_x, image_y, pixel);
        }
      }
      previous = line;
    }
  }
  Ok(())
}
