use super::*;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The 4-byte tag naming a chunk's type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(missing_docs)]
impl ChunkType {
  pub const IHDR: Self = ChunkType(*b"IHDR");
  pub const PLTE: Self = ChunkType(*b"PLTE");
  pub const IDAT: Self = ChunkType(*b"IDAT");
  pub const IEND: Self = ChunkType(*b"IEND");
  pub const TRNS: Self = ChunkType(*b"tRNS");

  /// Ancillary chunks (lowercase first letter) are skippable; critical ones
  /// are not.
  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    (self.0[0] & 32) != 0
  }
}
impl core::fmt::Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let [a, b, c, d] = self.0;
    write!(f, "{}{}{}{}", a as char, b as char, c as char, d as char)
  }
}

/// An unparsed chunk from a PNG: tag, payload span, and declared CRC.
///
/// Ephemeral, consumed as the stream is scanned.
#[derive(Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PngRawChunk<'b> {
  pub chunk_ty: ChunkType,
  pub data: &'b [u8],
  pub declared_crc: u32,
}
impl Debug for PngRawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngRawChunk")
      .field("chunk_ty", &self.chunk_ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}

const fn make_crc_table() -> [u32; 256] {
  let mut table = [0_u32; 256];
  let mut n = 0;
  while n < 256 {
    let mut c: u32 = n as _;
    let mut k = 0;
    while k < 8 {
      c = if (c & 1) != 0 { 0xedb88320 ^ (c >> 1) } else { c >> 1 };
      //
      k += 1;
    }
    table[n] = c;
    //
    n += 1;
  }
  table
}
const CRC_TABLE: [u32; 256] = make_crc_table();

impl<'b> PngRawChunk<'b> {
  /// Computes the CRC-32 of this chunk's tag and payload, for comparison
  /// against [declared_crc](Self::declared_crc).
  #[inline]
  #[must_use]
  pub fn compute_actual_crc(&self) -> u32 {
    let mut c = u32::MAX;
    self.chunk_ty.0.iter().copied().chain(self.data.iter().copied()).for_each(|b| {
      c = CRC_TABLE[((c ^ (b as u32)) & 0xFF) as usize] ^ (c >> 8);
    });
    c ^ u32::MAX
  }
}

/// An iterator over the raw chunks of a PNG datastream.
///
/// Items are `Result` values: an input that runs out mid-chunk yields one
/// [UnexpectedEndOfInput](PngError::UnexpectedEndOfInput) and then fuses.
#[derive(Debug, Clone)]
pub struct PngChunkIter<'b> {
  bytes: &'b [u8],
  poisoned: bool,
}
impl<'b> PngChunkIter<'b> {
  /// Verifies the PNG signature and positions the iterator after it.
  pub fn from_png_bytes(bytes: &'b [u8]) -> PngResult<Self> {
    if bytes.len() < PNG_SIGNATURE.len() {
      Err(PngError::UnexpectedEndOfInput)
    } else if bytes[..8] != PNG_SIGNATURE {
      Err(PngError::NoPngSignature)
    } else {
      Ok(Self { bytes: &bytes[8..], poisoned: false })
    }
  }
}
impl<'b> Iterator for PngChunkIter<'b> {
  type Item = PngResult<PngRawChunk<'b>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.poisoned || self.bytes.is_empty() {
      return None;
    }
    // length(4) + type(4) + data(length) + crc(4)
    if self.bytes.len() >= 12 {
      let length = u32::from_be_bytes(self.bytes[0..4].try_into().unwrap()) as usize;
      let chunk_ty = ChunkType(self.bytes[4..8].try_into().unwrap());
      if self.bytes.len() - 12 >= length {
        let data = &self.bytes[8..(8 + length)];
        let declared_crc =
          u32::from_be_bytes(self.bytes[(8 + length)..(12 + length)].try_into().unwrap());
        self.bytes = &self.bytes[(12 + length)..];
        return Some(Ok(PngRawChunk { chunk_ty, data, declared_crc }));
      }
    }
    self.poisoned = true;
    Some(Err(PngError::UnexpectedEndOfInput))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let more_chunks = self.bytes.len() >= 12;
    (more_chunks as usize, Some(self.bytes.len() / 12))
  }
}

#[test]
fn test_chunk_iter_truncation_is_an_error() {
  // signature + an IHDR chunk that claims 13 bytes but has fewer.
  let mut bytes = PNG_SIGNATURE.to_vec();
  bytes.extend_from_slice(&13_u32.to_be_bytes());
  bytes.extend_from_slice(b"IHDR");
  bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0]);
  let mut it = PngChunkIter::from_png_bytes(&bytes).unwrap();
  assert_eq!(it.next(), Some(Err(PngError::UnexpectedEndOfInput)));
  assert_eq!(it.next(), None);
}

#[test]
fn test_chunk_crc() {
  // The IEND chunk has a well-known CRC since it has no payload.
  let chunk = PngRawChunk { chunk_ty: ChunkType::IEND, data: &[], declared_crc: 0xAE42_6082 };
  assert_eq!(chunk.compute_actual_crc(), chunk.declared_crc);
}
