//! End to end decoding tests, using PNG datastreams built byte by byte.
//!
//! Everything here writes its own chunk framing, CRC-32, and zlib stream
//! (stored blocks only), so these tests exercise the library against data it
//! had no hand in producing.

use pngling::png::{decode_png, decode_png_to_image_rgba8, AncillaryChunk};
use pngling::{ImageRGBA8, PngError, RGBA8888};

fn crc32(bytes: &[u8]) -> u32 {
  let mut c = u32::MAX;
  for b in bytes {
    c ^= *b as u32;
    for _ in 0..8 {
      c = if (c & 1) != 0 { 0xedb88320 ^ (c >> 1) } else { c >> 1 };
    }
  }
  c ^ u32::MAX
}

fn adler32(bytes: &[u8]) -> u32 {
  let mut a = 1_u32;
  let mut b = 0_u32;
  for byte in bytes {
    a = (a + *byte as u32) % 65521;
    b = (b + a) % 65521;
  }
  (b << 16) | a
}

/// One full chunk: length, type, data, CRC.
fn chunk(ty: &[u8; 4], data: &[u8]) -> Vec<u8> {
  let mut out = Vec::new();
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(ty);
  out.extend_from_slice(data);
  let mut crc_input = ty.to_vec();
  crc_input.extend_from_slice(data);
  out.extend_from_slice(&crc32(&crc_input).to_be_bytes());
  out
}

/// A zlib stream holding `data` in a single stored deflate block.
fn zlib_stored(data: &[u8]) -> Vec<u8> {
  assert!(data.len() < 65536);
  let mut out = vec![0x78, 0x01];
  out.push(0b001); // BFINAL=1, BTYPE=00
  out.extend_from_slice(&(data.len() as u16).to_le_bytes());
  out.extend_from_slice(&(!(data.len() as u16)).to_le_bytes());
  out.extend_from_slice(data);
  out.extend_from_slice(&adler32(data).to_be_bytes());
  out
}

fn ihdr_data(width: u32, height: u32, bit_depth: u8, color: u8, interlace: u8) -> [u8; 13] {
  let mut data = [0_u8; 13];
  data[0..4].copy_from_slice(&width.to_be_bytes());
  data[4..8].copy_from_slice(&height.to_be_bytes());
  data[8] = bit_depth;
  data[9] = color;
  data[12] = interlace;
  data
}

fn png_from_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
  let mut out = vec![137, 80, 78, 71, 13, 10, 26, 10];
  for c in chunks {
    out.extend_from_slice(c);
  }
  out
}

/// The simple case: IHDR, one IDAT with a stored zlib stream, IEND.
fn simple_png(
  width: u32, height: u32, bit_depth: u8, color: u8, interlace: u8, filtered: &[u8],
) -> Vec<u8> {
  png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(width, height, bit_depth, color, interlace)),
    chunk(b"IDAT", &zlib_stored(filtered)),
    chunk(b"IEND", &[]),
  ])
}

fn px(r: u8, g: u8, b: u8, a: u8) -> RGBA8888 {
  RGBA8888 { r, g, b, a }
}

#[test]
fn test_1x1_rgb8() {
  let png = simple_png(1, 1, 8, 2, 0, &[0, 255, 0, 0]);
  let image = decode_png_to_image_rgba8(&png).unwrap();
  assert_eq!((image.width, image.height), (1, 1));
  assert_eq!(image.pixels, vec![px(255, 0, 0, 255)]);
  assert_eq!(image.as_rgba_bytes(), &[255, 0, 0, 255]);
}

#[test]
fn test_decoding_is_deterministic() {
  let png = simple_png(2, 1, 8, 0, 0, &[0, 7, 200]);
  let once = decode_png(&png).unwrap();
  let twice = decode_png(&png).unwrap();
  assert_eq!(once.image, twice.image);
  assert_eq!(once.ancillary, twice.ancillary);
}

#[test]
fn test_signature_errors() {
  assert_eq!(decode_png(&[]), Err(PngError::UnexpectedEndOfInput));
  assert_eq!(decode_png(&[1, 2, 3]), Err(PngError::UnexpectedEndOfInput));
  let mut png = simple_png(1, 1, 8, 0, 0, &[0, 0]);
  png[0] = 0;
  assert_eq!(decode_png(&png), Err(PngError::NoPngSignature));
}

#[test]
fn test_truncated_at_every_length_is_a_typed_error() {
  let png = simple_png(1, 1, 8, 2, 0, &[0, 255, 0, 0]);
  for len in 0..png.len() {
    assert!(decode_png(&png[..len]).is_err(), "length {len}");
  }
}

#[test]
fn test_first_chunk_must_be_ihdr() {
  let png = png_from_chunks(&[chunk(b"IEND", &[])]);
  assert_eq!(decode_png(&png), Err(PngError::FirstChunkNotIHDR));
}

#[test]
fn test_missing_iend() {
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(1, 1, 8, 0, 0)),
    chunk(b"IDAT", &zlib_stored(&[0, 0])),
  ]);
  assert_eq!(decode_png(&png), Err(PngError::UnexpectedEndOfInput));
}

#[test]
fn test_dimension_limit() {
  let png = simple_png(20000, 1, 8, 0, 0, &[]);
  assert_eq!(decode_png(&png), Err(PngError::ImageTooLargeForAutomaticDecoding));
}

#[test]
fn test_critical_crc_is_checked() {
  let mut png = simple_png(1, 1, 8, 0, 0, &[0, 9]);
  // flip a bit inside the IDAT payload; its declared CRC no longer matches.
  let idat_payload_start = 8 + (4 + 4 + 13 + 4) + 8;
  png[idat_payload_start] ^= 0x40;
  assert_eq!(decode_png(&png), Err(PngError::ChunkCrcMismatch));
}

#[test]
fn test_ancillary_bad_crc_is_skipped() {
  let mut gama = chunk(b"gAMA", &45455_u32.to_be_bytes());
  let last = gama.len() - 1;
  gama[last] ^= 0xFF;
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(1, 1, 8, 0, 0)),
    gama,
    chunk(b"IDAT", &zlib_stored(&[0, 77])),
    chunk(b"IEND", &[]),
  ]);
  let decoded = decode_png(&png).unwrap();
  assert!(decoded.ancillary.is_empty());
  assert_eq!(decoded.image.pixels, vec![px(77, 77, 77, 255)]);
}

#[test]
fn test_ancillary_chunks_are_collected() {
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(1, 1, 8, 0, 0)),
    chunk(b"gAMA", &45455_u32.to_be_bytes()),
    chunk(b"IDAT", &zlib_stored(&[0, 0])),
    chunk(b"tEXt", b"Comment\0hello"),
    chunk(b"IEND", &[]),
  ]);
  let decoded = decode_png(&png).unwrap();
  assert_eq!(
    decoded.ancillary,
    vec![
      AncillaryChunk::Gamma(45455),
      AncillaryChunk::Text { keyword: b"Comment".to_vec(), text: b"hello".to_vec() },
    ]
  );
}

#[test]
fn test_adler_mismatch() {
  let mut zlib = zlib_stored(&[0, 5]);
  let last = zlib.len() - 1;
  zlib[last] ^= 1;
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(1, 1, 8, 0, 0)),
    chunk(b"IDAT", &zlib),
    chunk(b"IEND", &[]),
  ]);
  assert_eq!(decode_png(&png), Err(PngError::AdlerChecksumMismatch));
}

#[test]
fn test_reserved_deflate_block_type() {
  // zlib header then BFINAL=1, BTYPE=11 (reserved).
  let zlib = vec![0x78, 0x01, 0b111, 0, 0, 0, 0];
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(1, 1, 8, 0, 0)),
    chunk(b"IDAT", &zlib),
    chunk(b"IEND", &[]),
  ]);
  assert_eq!(decode_png(&png), Err(PngError::IllegalBlockType));
}

#[test]
fn test_idat_split_across_chunks() {
  // the zlib stream may be cut anywhere across multiple IDAT chunks.
  let zlib = zlib_stored(&[0, 1, 2, 0, 3, 4]);
  let (front, back) = zlib.split_at(5);
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(2, 2, 8, 0, 0)),
    chunk(b"IDAT", front),
    chunk(b"IDAT", back),
    chunk(b"IEND", &[]),
  ]);
  let image = decode_png_to_image_rgba8(&png).unwrap();
  assert_eq!(
    image.pixels,
    vec![px(1, 1, 1, 255), px(2, 2, 2, 255), px(3, 3, 3, 255), px(4, 4, 4, 255)]
  );
}

fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
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

/// Filters gray8 rows, using `filter_ty` on every line.
fn filter_gray8(rows: &[Vec<u8>], filter_ty: u8) -> Vec<u8> {
  let mut out = Vec::new();
  let mut previous: &[u8] = &[];
  for row in rows {
    out.push(filter_ty);
    for i in 0..row.len() {
      let a = if i >= 1 { row[i - 1] } else { 0 };
      let b = previous.get(i).copied().unwrap_or(0);
      let c = if i >= 1 { previous.get(i - 1).copied().unwrap_or(0) } else { 0 };
      let predicted = match filter_ty {
        0 => 0,
        1 => a,
        2 => b,
        3 => ((a as u16 + b as u16) / 2) as u8,
        4 => paeth_predict(a, b, c),
        _ => unreachable!(),
      };
      out.push(row[i].wrapping_sub(predicted));
    }
    previous = row;
  }
  out
}

#[test]
fn test_every_filter_type_decodes() {
  let rows = vec![
    vec![3, 250, 7, 96],
    vec![90, 91, 92, 93],
    vec![0, 255, 0, 255],
    vec![17, 17, 200, 1],
  ];
  let want: Vec<RGBA8888> =
    rows.iter().flatten().map(|&y| px(y, y, y, 255)).collect();
  for filter_ty in 0..=4 {
    let filtered = filter_gray8(&rows, filter_ty);
    let png = simple_png(4, 4, 8, 0, 0, &filtered);
    let image = decode_png_to_image_rgba8(&png).unwrap();
    assert_eq!(image.pixels, want, "filter {filter_ty}");
  }
}

#[test]
fn test_illegal_filter_type_errors() {
  let png = simple_png(1, 1, 8, 0, 0, &[9, 0]);
  assert_eq!(decode_png(&png), Err(PngError::IllegalFilterType));
}

#[test]
fn test_palette_with_transparency() {
  let plte = [0, 0, 255, 255, 128, 0];
  let trns = [200];
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(2, 1, 8, 3, 0)),
    chunk(b"PLTE", &plte),
    chunk(b"tRNS", &trns),
    chunk(b"IDAT", &zlib_stored(&[0, 0, 1])),
    chunk(b"IEND", &[]),
  ]);
  let image = decode_png_to_image_rgba8(&png).unwrap();
  assert_eq!(image.pixels, vec![px(0, 0, 255, 200), px(255, 128, 0, 255)]);
}

#[test]
fn test_palette_length_validation() {
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(1, 1, 8, 3, 0)),
    chunk(b"PLTE", &[1, 2, 3, 4]),
    chunk(b"IDAT", &zlib_stored(&[0, 0])),
    chunk(b"IEND", &[]),
  ]);
  assert_eq!(decode_png(&png), Err(PngError::IllegalChunkLength));
}

#[test]
fn test_sub_byte_indexed() {
  // 2 bit indexed, 3 pixels in one byte: indexes 2, 0, 1 then pad.
  let plte = [10, 0, 0, 0, 20, 0, 0, 0, 30];
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(3, 1, 2, 3, 0)),
    chunk(b"PLTE", &plte),
    chunk(b"IDAT", &zlib_stored(&[0, 0b10_00_01_00])),
    chunk(b"IEND", &[]),
  ]);
  let image = decode_png_to_image_rgba8(&png).unwrap();
  assert_eq!(
    image.pixels,
    vec![px(0, 0, 30, 255), px(10, 0, 0, 255), px(0, 20, 0, 255)]
  );
}

#[test]
fn test_gray_transparency_key() {
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(2, 1, 8, 0, 0)),
    chunk(b"tRNS", &[0, 42]),
    chunk(b"IDAT", &zlib_stored(&[0, 42, 43])),
    chunk(b"IEND", &[]),
  ]);
  let image = decode_png_to_image_rgba8(&png).unwrap();
  assert_eq!(image.pixels, vec![px(42, 42, 42, 0), px(43, 43, 43, 255)]);
}

#[test]
fn test_sixteen_bit_channels_keep_the_high_byte() {
  let filtered = [0, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
  let png = simple_png(1, 1, 16, 2, 0, &filtered);
  let image = decode_png_to_image_rgba8(&png).unwrap();
  assert_eq!(image.pixels, vec![px(0x12, 0x56, 0x9A, 255)]);
}

/// The Adam7 pass pattern, used here to *build* interlaced datastreams.
const PASSES: [(u32, u32, u32, u32); 7] =
  [(0, 0, 8, 8), (4, 0, 8, 8), (0, 4, 4, 8), (2, 0, 4, 4), (0, 2, 2, 4), (1, 0, 2, 2), (0, 1, 1, 2)];

/// Packs `bit_depth` gray samples into interlaced, unfiltered scanlines.
fn interlace_gray(samples: &[Vec<u8>], bit_depth: u32) -> Vec<u8> {
  let height = samples.len() as u32;
  let width = samples[0].len() as u32;
  let mut out = Vec::new();
  for (x0, y0, dx, dy) in PASSES {
    let reduced_w = (width.saturating_sub(x0)).div_ceil(dx);
    let reduced_h = (height.saturating_sub(y0)).div_ceil(dy);
    if reduced_w == 0 || reduced_h == 0 {
      continue;
    }
    for ry in 0..reduced_h {
      out.push(0); // filter: none
      if bit_depth == 8 {
        // whole-byte samples go straight through.
        for rx in 0..reduced_w {
          out.push(samples[(y0 + ry * dy) as usize][(x0 + rx * dx) as usize]);
        }
      } else {
        let mut byte = 0_u8;
        let mut bits = 0;
        for rx in 0..reduced_w {
          let sample = samples[(y0 + ry * dy) as usize][(x0 + rx * dx) as usize];
          byte = (byte << bit_depth) | sample;
          bits += bit_depth;
          if bits == 8 {
            out.push(byte);
            byte = 0;
            bits = 0;
          }
        }
        if bits > 0 {
          out.push(byte << (8 - bits));
        }
      }
    }
  }
  out
}

/// Encodes the same gray8 pixels both linearly and interlaced, and checks
/// that decoding gives the same image either way.
fn assert_interlaced_matches_progressive_gray8(width: u32, height: u32) {
  let samples: Vec<Vec<u8>> =
    (0..height).map(|y| (0..width).map(|x| (y * 37 + x * 11) as u8).collect()).collect();
  let mut progressive_data = Vec::new();
  for row in &samples {
    progressive_data.push(0);
    progressive_data.extend_from_slice(row);
  }
  let progressive = simple_png(width, height, 8, 0, 0, &progressive_data);
  let interlaced = simple_png(width, height, 8, 0, 1, &interlace_gray(&samples, 8));
  assert_eq!(
    decode_png_to_image_rgba8(&progressive).unwrap(),
    decode_png_to_image_rgba8(&interlaced).unwrap(),
    "size {width}x{height}"
  );
}

#[test]
fn test_interlaced_matches_progressive() {
  // one full tile of the pass pattern, and the single-pixel case.
  assert_interlaced_matches_progressive_gray8(8, 8);
  assert_interlaced_matches_progressive_gray8(1, 1);
}

#[test]
fn test_interlaced_one_bit_tiny_image() {
  // 2x2, 1 bit: pixels (0,0)=1 (1,0)=0 (0,1)=0 (1,1)=1.
  let samples = vec![vec![1, 0], vec![0, 1]];
  let interlaced = simple_png(2, 2, 1, 0, 1, &interlace_gray(&samples, 1));
  let image = decode_png_to_image_rgba8(&interlaced).unwrap();
  let w = px(255, 255, 255, 255);
  let k = px(0, 0, 0, 255);
  assert_eq!(image.pixels, vec![w, k, k, w]);
}

#[test]
fn test_interlaced_odd_dimensions() {
  // sizes where some passes go empty or end in partial strides.
  assert_interlaced_matches_progressive_gray8(3, 5);
  assert_interlaced_matches_progressive_gray8(7, 2);
  assert_interlaced_matches_progressive_gray8(13, 9);
}

#[test]
fn test_wrong_decompressed_size_is_an_error() {
  // one byte short of the 1x1 gray8 requirement of 2 bytes.
  let png = png_from_chunks(&[
    chunk(b"IHDR", &ihdr_data(1, 1, 8, 0, 0)),
    chunk(b"IDAT", &zlib_stored(&[0])),
    chunk(b"IEND", &[]),
  ]);
  assert_eq!(decode_png(&png), Err(PngError::UnexpectedEndOfInput));
}

#[test]
fn test_output_is_plain_rgba_bytes() {
  let png = simple_png(2, 1, 8, 6, 0, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
  let image: ImageRGBA8 = decode_png_to_image_rgba8(&png).unwrap();
  assert_eq!(image.as_rgba_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
}
