//! Parsing for PNG datastreams.
//!
//! [decode_png] is the whole pipeline: verify the signature, walk the chunks,
//! validate the header, inflate the `IDAT` zlib stream, unfilter the
//! scanlines (de-interlacing on the way), and expand every pixel to
//! [RGBA8888]. Ancillary chunks come along for the ride as [AncillaryChunk]
//! records.
//!
//! Each stage also has its own entry point for callers that want to work
//! below the top level, such as [PngChunkIter] for scanning chunks without
//! decoding anything.

use crate::{
  debug_log,
  image::ImageRGBA8,
  inflate::zlib_inflate,
  pixel_formats::{RGB888, RGBA8888},
  trace_log, PngError, PngResult,
};
use alloc::vec::Vec;
use bitfrob::u8_replicate_bits;
use core::fmt::Debug;

mod adam7;
mod ancillary;
mod chunk;
mod expand;
mod ihdr;
mod unfilter;

pub use self::adam7::*;
pub use self::ancillary::*;
pub use self::chunk::*;
pub use self::ihdr::*;
pub use self::unfilter::*;
use self::expand::*;

/// Width or height above this means [decode_png] refuses the image.
///
/// 16k by 16k RGBA8 is already a gigabyte of pixels. Anything claiming to be
/// bigger is far more likely to be hostile input than a real picture.
pub const MAX_DIMENSION: u32 = 16384;

/// The output of [decode_png]: the pixels, plus everything ancillary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngDecoded {
  /// The image, top-left origin, row-major.
  pub image: ImageRGBA8,
  /// The ancillary chunks, in datastream order.
  pub ancillary: Vec<AncillaryChunk>,
}

/// Decodes a complete PNG datastream into RGBA8 pixels.
///
/// All color types and bit depths decode, interlaced or not, with `tRNS`
/// transparency applied. Channels above 8 bits are narrowed to 8.
///
/// Strictness, roughly, follows how much a problem can corrupt the output:
/// * Malformed critical data is always a hard error: bad signature, bad
///   header, a CRC mismatch on a critical chunk, or any damage to the
///   compressed image data.
/// * Ancillary chunks that are malformed or fail their CRC are skipped, and
///   with the `log` feature on that's logged at debug level.
pub fn decode_png(bytes: &[u8]) -> PngResult<PngDecoded> {
  let mut chunks = PngChunkIter::from_png_bytes(bytes)?;
  let first = chunks.next().ok_or(PngError::UnexpectedEndOfInput)??;
  if first.chunk_ty != ChunkType::IHDR {
    return Err(PngError::FirstChunkNotIHDR);
  }
  if first.compute_actual_crc() != first.declared_crc {
    return Err(PngError::ChunkCrcMismatch);
  }
  let header = IHDR::try_from_ihdr_payload(first.data)?;
  if header.width > MAX_DIMENSION || header.height > MAX_DIMENSION {
    return Err(PngError::ImageTooLargeForAutomaticDecoding);
  }
  debug_log!(
    "decoding {}x{} {:?} depth {}{}",
    header.width,
    header.height,
    header.color_type,
    header.bit_depth,
    if header.is_interlaced { ", interlaced" } else { "" }
  );

  let mut idat: Vec<u8> = Vec::new();
  let mut palette: Vec<RGBA8888> = Vec::new();
  let mut transparency = Transparency::None;
  let mut ancillary: Vec<AncillaryChunk> = Vec::new();
  let mut saw_iend = false;

  for chunk in chunks {
    let chunk = chunk?;
    if chunk.compute_actual_crc() != chunk.declared_crc {
      if chunk.chunk_ty.is_ancillary() {
        debug_log!("skipping {:?} chunk with a bad crc", chunk.chunk_ty);
        continue;
      } else {
        return Err(PngError::ChunkCrcMismatch);
      }
    }
    match chunk.chunk_ty {
      ChunkType::IHDR => {
        debug_log!("ignoring a duplicate IHDR chunk");
      }
      ChunkType::PLTE => {
        let len = chunk.data.len();
        if len == 0 || (len % 3) != 0 || len > 3 * 256 {
          return Err(PngError::IllegalChunkLength);
        }
        palette.clear();
        palette.try_reserve(len / 3)?;
        for rgb in chunk.data.chunks_exact(3) {
          palette.push(RGB888 { r: rgb[0], g: rgb[1], b: rgb[2] }.into());
        }
      }
      ChunkType::IDAT => {
        idat.try_reserve(chunk.data.len())?;
        idat.extend_from_slice(chunk.data);
      }
      ChunkType::IEND => {
        saw_iend = true;
        break;
      }
      ChunkType::TRNS => match header.color_type {
        PngColorType::Y => {
          let [hi, lo] = *chunk.data else {
            return Err(PngError::IllegalChunkLength);
          };
          transparency = Transparency::GrayKey(u16::from_be_bytes([hi, lo]));
        }
        PngColorType::RGB => {
          let [r0, r1, g0, g1, b0, b1] = *chunk.data else {
            return Err(PngError::IllegalChunkLength);
          };
          transparency = Transparency::RgbKey([
            u16::from_be_bytes([r0, r1]),
            u16::from_be_bytes([g0, g1]),
            u16::from_be_bytes([b0, b1]),
          ]);
        }
        PngColorType::Index => {
          // one alpha per palette entry, at most; entries without one stay
          // opaque.
          if chunk.data.len() > palette.len() {
            return Err(PngError::IllegalChunkLength);
          }
          for (entry, alpha) in palette.iter_mut().zip(chunk.data.iter()) {
            entry.a = *alpha;
          }
        }
        PngColorType::YA | PngColorType::RGBA => {
          debug_log!("ignoring tRNS for an alpha-carrying color type");
        }
      },
      other => {
        if other.is_ancillary() {
          match parse_ancillary(other, chunk.data) {
            Some(parsed) => {
              trace_log!("keeping ancillary chunk {:?}", other);
              ancillary.try_reserve(1)?;
              ancillary.push(parsed);
            }
            None => debug_log!("skipping malformed {:?} chunk", other),
          }
        } else {
          // an unrecognized critical chunk; nothing useful to do but note it
          // and press on with the pixels we do understand.
          debug_log!("ignoring unknown critical chunk {:?}", other);
        }
      }
    }
  }
  if !saw_iend {
    return Err(PngError::UnexpectedEndOfInput);
  }

  let expected_len = header.get_zlib_decompression_requirement();
  let mut decompressed = zlib_inflate(&idat, expected_len)?;
  if decompressed.len() != expected_len {
    debug_log!(
      "zlib stream gave {} bytes, the header requires {expected_len}",
      decompressed.len()
    );
    return Err(PngError::UnexpectedEndOfInput);
  }

  let pixel_count = (header.width as usize) * (header.height as usize);
  let mut pixels: Vec<RGBA8888> = Vec::new();
  pixels.try_reserve(pixel_count)?;
  pixels.resize(pixel_count, RGBA8888::default());
  let mut image =
    ImageRGBA8 { width: header.width, height: header.height, pixels };

  let expander = PixelExpander { header, palette: &palette, transparency };
  unfilter_decompressed_data(header, &mut decompressed, |x, y, data| {
    if let Some(p) = image.get_mut(x, y) {
      *p = expander.expand_pixel(data);
    }
  })?;

  Ok(PngDecoded { image, ancillary })
}

/// As [decode_png], discarding the ancillary chunks.
#[inline]
pub fn decode_png_to_image_rgba8(bytes: &[u8]) -> PngResult<ImageRGBA8> {
  decode_png(bytes).map(|decoded| decoded.image)
}
