use super::*;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette has RGB8 data. There may optionally be a transparency
  /// chunk with per-index alpha.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> PngResult<Self> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(PngError::IllegalColorType),
    })
  }
}

/// Image Header, parsed and validated from the 13-byte `IHDR` payload.
///
/// Immutable once created; everything downstream of chunk parsing sizes its
/// buffers off of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels, more than 0
  pub width: u32,
  /// height in pixels, more than 0
  pub height: u32,
  /// bits per channel: 1, 2, 4, 8, or 16, as the color type allows
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// if the image data is stored interlaced (Adam7).
  pub is_interlaced: bool,
}

impl IHDR {
  /// Parses and validates an `IHDR` chunk payload.
  ///
  /// Everything illegal is rejected here, up front: zero dimensions,
  /// color type / bit depth combinations that don't exist, nonzero
  /// compression or filter methods, unknown interlace methods. No partial
  /// decode ever starts from a bad header.
  pub fn try_from_ihdr_payload(data: &[u8]) -> PngResult<Self> {
    let [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =
      *data
    else {
      return Err(PngError::IllegalChunkLength);
    };
    let width = u32::from_be_bytes([w0, w1, w2, w3]);
    let height = u32::from_be_bytes([h0, h1, h2, h3]);
    if width == 0 || height == 0 {
      return Err(PngError::WidthOrHeightZero);
    }
    if compression_method != 0 {
      return Err(PngError::IllegalCompressionMethod);
    }
    if filter_method != 0 {
      return Err(PngError::IllegalFilterMethod);
    }
    let color_type = PngColorType::try_from(color_type)?;
    let depth_is_legal = match color_type {
      PngColorType::Y => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
      PngColorType::Index => matches!(bit_depth, 1 | 2 | 4 | 8),
      PngColorType::RGB | PngColorType::YA | PngColorType::RGBA => matches!(bit_depth, 8 | 16),
    };
    if !depth_is_legal {
      return Err(PngError::IllegalColorTypeBitDepthCombination);
    }
    let is_interlaced = match interlace_method {
      0 => false,
      1 => true,
      _ => return Err(PngError::IllegalInterlaceMethod),
    };
    Ok(Self { width, height, bit_depth, color_type, is_interlaced })
  }

  /// Bits for one complete pixel.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Bytes for one filtered line at the given width: a filter byte plus the
  /// packed pixel data, rounded up to whole bytes.
  #[inline]
  #[must_use]
  pub const fn bytes_per_filterline(&self, width: u32) -> usize {
    1 + ((self.bits_per_pixel() * (width as usize)) + 7) / 8
  }

  /// The unit that filtering operates on: bytes per complete pixel, but
  /// never less than 1 even when pixels pack below a byte.
  #[inline]
  #[must_use]
  pub const fn filter_chunk_size(&self) -> usize {
    let bytes = self.bits_per_pixel() / 8;
    if bytes > 0 {
      bytes
    } else {
      1
    }
  }

  /// Gets the exact buffer size that zlib decompression must produce.
  ///
  /// Interlaced images sum the filtered size of all 7 reduced images;
  /// non-interlaced images are just the one full image.
  #[must_use]
  pub fn get_zlib_decompression_requirement(&self) -> usize {
    #[inline]
    #[must_use]
    fn filtered_bytes_for_image(header: &IHDR, width: u32, height: u32) -> usize {
      if width == 0 || height == 0 {
        return 0;
      }
      header.bytes_per_filterline(width).saturating_mul(height as usize)
    }
    if self.is_interlaced {
      let mut total = 0_usize;
      for (width, height) in
        reduced_image_dimensions(self.width, self.height).into_iter().skip(1)
      {
        total = total.saturating_add(filtered_bytes_for_image(self, width, height));
      }
      total
    } else {
      filtered_bytes_for_image(self, self.width, self.height)
    }
  }
}

#[test]
fn test_ihdr_validation() {
  fn payload(
    w: u32, h: u32, depth: u8, color: u8, compression: u8, filter: u8, interlace: u8,
  ) -> [u8; 13] {
    let mut p = [0_u8; 13];
    p[0..4].copy_from_slice(&w.to_be_bytes());
    p[4..8].copy_from_slice(&h.to_be_bytes());
    p[8] = depth;
    p[9] = color;
    p[10] = compression;
    p[11] = filter;
    p[12] = interlace;
    p
  }
  // every legal (color, depth) pair parses
  for (color, depths) in [
    (0, &[1_u8, 2, 4, 8, 16][..]),
    (2, &[8, 16]),
    (3, &[1, 2, 4, 8]),
    (4, &[8, 16]),
    (6, &[8, 16]),
  ] {
    for &depth in depths {
      assert!(IHDR::try_from_ihdr_payload(&payload(4, 4, depth, color, 0, 0, 0)).is_ok());
    }
  }
  // every other (color, depth) pair is rejected
  for color in [0_u8, 2, 3, 4, 6] {
    for depth in 0..=255_u8 {
      let ok = match color {
        0 => matches!(depth, 1 | 2 | 4 | 8 | 16),
        3 => matches!(depth, 1 | 2 | 4 | 8),
        _ => matches!(depth, 8 | 16),
      };
      let got = IHDR::try_from_ihdr_payload(&payload(4, 4, depth, color, 0, 0, 0));
      assert_eq!(got.is_ok(), ok, "color {color} depth {depth}");
      if !ok {
        assert_eq!(got, Err(PngError::IllegalColorTypeBitDepthCombination));
      }
    }
  }
  // other field validation
  assert_eq!(
    IHDR::try_from_ihdr_payload(&payload(0, 4, 8, 0, 0, 0, 0)),
    Err(PngError::WidthOrHeightZero)
  );
  assert_eq!(
    IHDR::try_from_ihdr_payload(&payload(4, 4, 8, 1, 0, 0, 0)),
    Err(PngError::IllegalColorType)
  );
  assert_eq!(
    IHDR::try_from_ihdr_payload(&payload(4, 4, 8, 0, 1, 0, 0)),
    Err(PngError::IllegalCompressionMethod)
  );
  assert_eq!(
    IHDR::try_from_ihdr_payload(&payload(4, 4, 8, 0, 0, 1, 0)),
    Err(PngError::IllegalFilterMethod)
  );
  assert_eq!(
    IHDR::try_from_ihdr_payload(&payload(4, 4, 8, 0, 0, 0, 2)),
    Err(PngError::IllegalInterlaceMethod)
  );
  assert_eq!(IHDR::try_from_ihdr_payload(&[0; 12]), Err(PngError::IllegalChunkLength));
}

#[test]
fn test_sizes() {
  let header = IHDR {
    width: 3,
    height: 2,
    bit_depth: 1,
    color_type: PngColorType::Y,
    is_interlaced: false,
  };
  assert_eq!(header.bits_per_pixel(), 1);
  assert_eq!(header.bytes_per_filterline(3), 2);
  assert_eq!(header.filter_chunk_size(), 1);
  assert_eq!(header.get_zlib_decompression_requirement(), 4);
  //
  let header = IHDR {
    width: 4,
    height: 4,
    bit_depth: 16,
    color_type: PngColorType::RGBA,
    is_interlaced: false,
  };
  assert_eq!(header.bits_per_pixel(), 64);
  assert_eq!(header.filter_chunk_size(), 8);
  assert_eq!(header.get_zlib_decompression_requirement(), 4 * (1 + 32));
}
