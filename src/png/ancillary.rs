use super::*;
use alloc::vec::Vec;

/// An ancillary chunk's data, parsed where the format is simple and carried
/// as raw bytes where it isn't.
///
/// None of these affect pixel decoding. They're collected and handed back so
/// that a caller who cares about gamma, text records, and so on can act on
/// them. Integer fields hold the chunk's raw values, without unit
/// conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AncillaryChunk {
  /// `gAMA`: gamma times 100,000.
  Gamma(u32),
  /// `cHRM`: white point and primary chromaticities, each times 100,000, in
  /// the order wx, wy, rx, ry, gx, gy, bx, by.
  Chromaticity([u32; 8]),
  /// `sRGB`: the standard rendering intent (0 through 3).
  SrgbIntent(u8),
  /// `iCCP`: profile name and the still-compressed profile data.
  IccProfile { name: Vec<u8>, compressed_profile: Vec<u8> },
  /// `sBIT`: significant bits per channel, one byte per channel.
  SignificantBits(Vec<u8>),
  /// `bKGD`: preferred background, layout depending on color type.
  Background(Vec<u8>),
  /// `hIST`: palette usage frequency, parallel to `PLTE`.
  Histogram(Vec<u16>),
  /// `pHYs`: pixels per unit on each axis, and the unit specifier.
  Physical { x: u32, y: u32, unit: u8 },
  /// `tEXt`: an uncompressed latin-1 keyword / text pair.
  Text { keyword: Vec<u8>, text: Vec<u8> },
  /// `zTXt`: keyword and still-compressed text.
  CompressedText { keyword: Vec<u8>, compressed_text: Vec<u8> },
  /// `iTXt`: an international text record, raw.
  InternationalText(Vec<u8>),
  /// `tIME`: last modification time, as stored.
  Time { year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8 },
  /// `cICP`: coding-independent code points for video signal type.
  Cicp { color_primaries: u8, transfer_function: u8, matrix_coefficients: u8, video_full_range: u8 },
  /// `mDCV`: mastering display color volume, raw 24-byte payload.
  MasteringDisplayColorVolume(Vec<u8>),
  /// `cLLI`: max content light level and max frame-average light level,
  /// each in units of 0.0001 cd/m².
  ContentLightLevel { max_content: u32, max_frame_average: u32 },
  /// `eXIf`: raw Exif data.
  Exif(Vec<u8>),
  /// Any ancillary chunk this library doesn't recognize.
  Unknown { chunk_ty: ChunkType, data: Vec<u8> },
}

/// Parses one ancillary chunk's payload.
///
/// Gives `None` when a *recognized* chunk has a malformed payload, in which
/// case the chunk is simply dropped. Unrecognized chunk types always parse,
/// as [Unknown](AncillaryChunk::Unknown).
#[must_use]
pub(crate) fn parse_ancillary(chunk_ty: ChunkType, data: &[u8]) -> Option<AncillaryChunk> {
  fn be_u32s<const N: usize>(data: &[u8]) -> Option<[u32; N]> {
    if data.len() != 4 * N {
      return None;
    }
    let mut out = [0_u32; N];
    for (o, chunk) in out.iter_mut().zip(data.chunks_exact(4)) {
      *o = u32::from_be_bytes(chunk.try_into().ok()?);
    }
    Some(out)
  }
  fn split_keyword(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = data.iter().position(|b| *b == 0)?;
    // keywords are 1 to 79 bytes.
    if nul == 0 || nul > 79 {
      return None;
    }
    Some((&data[..nul], &data[(nul + 1)..]))
  }
  Some(match &chunk_ty.0 {
    b"gAMA" => AncillaryChunk::Gamma(be_u32s::<1>(data)?[0]),
    b"cHRM" => AncillaryChunk::Chromaticity(be_u32s::<8>(data)?),
    b"sRGB" => match data {
      [intent @ 0..=3] => AncillaryChunk::SrgbIntent(*intent),
      _ => return None,
    },
    b"iCCP" => {
      let (name, rest) = split_keyword(data)?;
      // compression method byte, then the deflate stream.
      let [0, compressed_profile @ ..] = rest else {
        return None;
      };
      AncillaryChunk::IccProfile {
        name: name.to_vec(),
        compressed_profile: compressed_profile.to_vec(),
      }
    }
    b"sBIT" => match data.len() {
      1..=4 => AncillaryChunk::SignificantBits(data.to_vec()),
      _ => return None,
    },
    b"bKGD" => match data.len() {
      1 | 2 | 6 => AncillaryChunk::Background(data.to_vec()),
      _ => return None,
    },
    b"hIST" => {
      if data.is_empty() || (data.len() % 2) != 0 || data.len() > 2 * 256 {
        return None;
      }
      AncillaryChunk::Histogram(
        data.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect(),
      )
    }
    b"pHYs" => match *data {
      [x0, x1, x2, x3, y0, y1, y2, y3, unit @ 0..=1] => AncillaryChunk::Physical {
        x: u32::from_be_bytes([x0, x1, x2, x3]),
        y: u32::from_be_bytes([y0, y1, y2, y3]),
        unit,
      },
      _ => return None,
    },
    b"tEXt" => {
      let (keyword, text) = split_keyword(data)?;
      AncillaryChunk::Text { keyword: keyword.to_vec(), text: text.to_vec() }
    }
    b"zTXt" => {
      let (keyword, rest) = split_keyword(data)?;
      let [0, compressed_text @ ..] = rest else {
        return None;
      };
      AncillaryChunk::CompressedText {
        keyword: keyword.to_vec(),
        compressed_text: compressed_text.to_vec(),
      }
    }
    b"iTXt" => AncillaryChunk::InternationalText(data.to_vec()),
    b"tIME" => match *data {
      [y0, y1, month @ 1..=12, day @ 1..=31, hour @ 0..=23, minute @ 0..=59, second @ 0..=60] => {
        AncillaryChunk::Time {
          year: u16::from_be_bytes([y0, y1]),
          month,
          day,
          hour,
          minute,
          second,
        }
      }
      _ => return None,
    },
    b"cICP" => match *data {
      [color_primaries, transfer_function, matrix_coefficients, video_full_range @ 0..=1] => {
        AncillaryChunk::Cicp {
          color_primaries,
          transfer_function,
          matrix_coefficients,
          video_full_range,
        }
      }
      _ => return None,
    },
    b"mDCV" => match data.len() {
      24 => AncillaryChunk::MasteringDisplayColorVolume(data.to_vec()),
      _ => return None,
    },
    b"cLLI" => {
      let [max_content, max_frame_average] = be_u32s::<2>(data)?;
      AncillaryChunk::ContentLightLevel { max_content, max_frame_average }
    }
    b"eXIf" => AncillaryChunk::Exif(data.to_vec()),
    _ => AncillaryChunk::Unknown { chunk_ty, data: data.to_vec() },
  })
}
