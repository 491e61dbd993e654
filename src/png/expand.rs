use super::*;

/// A transparency key from a `tRNS` chunk, for the non-indexed color types.
///
/// Keys are stored at the datastream's full sample precision. A pixel only
/// becomes transparent on an *exact* match, so the comparison has to happen
/// before any precision is thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transparency {
  None,
  GrayKey(u16),
  RgbKey([u16; 3]),
}

/// Converts unfiltered pixel data to `RGBA8888`, one pixel at a time.
///
/// For indexed color the palette must already have any `tRNS` alpha values
/// folded in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PixelExpander<'d> {
  pub header: IHDR,
  pub palette: &'d [RGBA8888],
  pub transparency: Transparency,
}

impl PixelExpander<'_> {
  /// Expands one pixel's raw channel data.
  ///
  /// `data` is what [unfilter_decompressed_data] hands out: big-endian
  /// channel values, or a single low-bits byte for sub-byte depths.
  ///
  /// 16-bit channels keep only the high byte. That's the same value as a
  /// proper `(x * 255 + 32895) >> 16` rescale for every input, just without
  /// the arithmetic.
  #[must_use]
  pub fn expand_pixel(&self, data: &[u8]) -> RGBA8888 {
    let bit_depth = self.header.bit_depth;
    match self.header.color_type {
      PngColorType::Y => {
        let (y, full) = if bit_depth == 16 {
          (data[0], u16::from_be_bytes([data[0], data[1]]))
        } else {
          (u8_replicate_bits(bit_depth as u32, data[0]), data[0] as u16)
        };
        let a = if self.transparency == Transparency::GrayKey(full) { 0 } else { 255 };
        RGBA8888 { r: y, g: y, b: y, a }
      }
      PngColorType::RGB => {
        let ([r, g, b], full) = if bit_depth == 16 {
          (
            [data[0], data[2], data[4]],
            [
              u16::from_be_bytes([data[0], data[1]]),
              u16::from_be_bytes([data[2], data[3]]),
              u16::from_be_bytes([data[4], data[5]]),
            ],
          )
        } else {
          ([data[0], data[1], data[2]], [data[0] as u16, data[1] as u16, data[2] as u16])
        };
        let a = if self.transparency == Transparency::RgbKey(full) { 0 } else { 255 };
        RGBA8888 { r, g, b, a }
      }
      PngColorType::Index => {
        // out of range indexes read as opaque black rather than failing the
        // whole decode.
        *self.palette.get(data[0] as usize).unwrap_or(&RGBA8888 {
          r: 0,
          g: 0,
          b: 0,
          a: 255,
        })
      }
      PngColorType::YA => {
        let [y, a] =
          if bit_depth == 16 { [data[0], data[2]] } else { [data[0], data[1]] };
        RGBA8888 { r: y, g: y, b: y, a }
      }
      PngColorType::RGBA => {
        let [r, g, b, a] = if bit_depth == 16 {
          [data[0], data[2], data[4], data[6]]
        } else {
          [data[0], data[1], data[2], data[3]]
        };
        RGBA8888 { r, g, b, a }
      }
    }
  }
}
