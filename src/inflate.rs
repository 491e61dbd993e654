//! Decompression of zlib data streams (RFC 1950) and the DEFLATE format
//! inside them (RFC 1951).
//!
//! This is a from-scratch inflater: stored, fixed-Huffman, and
//! dynamic-Huffman blocks, LZ77 back-reference expansion, and Adler-32
//! verification of the result. The compressed input is entirely untrusted;
//! every misstep in it maps to a [PngError] rather than a panic.

use alloc::vec::Vec;

use crate::{BitCursor, HuffmanTable, PngError, PngResult};

/// Base match length for length symbols 257 through 285.
static LENGTH_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
  163, 195, 227, 258,
];
/// Extra bits to read after each length symbol.
static LENGTH_EXTRA: [u32; 29] =
  [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];
/// Base distance for distance symbols 0 through 29.
static DISTANCE_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
  2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
/// Extra bits to read after each distance symbol.
static DISTANCE_EXTRA: [u32; 30] = [
  0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
  13,
];
/// The order that code-length-code lengths are stored in a dynamic block.
static CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

const LIT_LEN_COUNT: usize = 288;
const DIST_COUNT: usize = 32;
const END_OF_BLOCK: u16 = 256;

/// Computes the Adler-32 checksum of a byte slice (RFC 1950 section 8.2).
#[must_use]
pub fn adler32(bytes: &[u8]) -> u32 {
  const ADLER_MOD: u32 = 65521;
  // 5552 is the largest run that can't overflow the u32 accumulators.
  let mut s1: u32 = 1;
  let mut s2: u32 = 0;
  for chunk in bytes.chunks(5552) {
    for &b in chunk {
      s1 += b as u32;
      s2 += s1;
    }
    s1 %= ADLER_MOD;
    s2 %= ADLER_MOD;
  }
  (s2 << 16) | s1
}

fn fixed_lit_len_table() -> PngResult<HuffmanTable> {
  let mut lengths = [0_u16; LIT_LEN_COUNT];
  for (symbol, len) in lengths.iter_mut().enumerate() {
    *len = match symbol {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
  }
  HuffmanTable::from_code_lengths(&lengths)
}

fn fixed_dist_table() -> PngResult<HuffmanTable> {
  HuffmanTable::from_code_lengths(&[5_u16; DIST_COUNT])
}

/// Reads the HLIT/HDIST/HCLEN prelude of a dynamic block and builds the
/// block's two decode tables.
fn read_dynamic_tables(bc: &mut BitCursor<'_>) -> PngResult<(HuffmanTable, HuffmanTable)> {
  let hlit = bc.next_bits_lsb(5)? as usize + 257;
  let hdist = bc.next_bits_lsb(5)? as usize + 1;
  let hclen = bc.next_bits_lsb(4)? as usize + 4;
  trace_log!("dynamic block: hlit {hlit}, hdist {hdist}, hclen {hclen}");

  let mut cl_lengths = [0_u16; 19];
  for &symbol in CODE_LENGTH_ORDER.iter().take(hclen) {
    cl_lengths[symbol] = bc.next_bits_lsb(3)? as u16;
  }
  let cl_table = HuffmanTable::from_code_lengths(&cl_lengths)?;

  // One shared run of lengths covers the literal/length tree and then the
  // distance tree.
  let mut lengths = [0_u16; LIT_LEN_COUNT + DIST_COUNT];
  let wanted = hlit + hdist;
  let mut acquired = 0_usize;
  while acquired < wanted {
    let symbol = cl_table.decode_symbol(bc)?;
    match symbol {
      0..=15 => {
        lengths[acquired] = symbol;
        acquired += 1;
      }
      16 => {
        if acquired == 0 {
          return Err(PngError::BadDynamicHuffmanTreeData);
        }
        let repeat = 3 + bc.next_bits_lsb(2)? as usize;
        if acquired + repeat > wanted {
          return Err(PngError::BadDynamicHuffmanTreeData);
        }
        let previous = lengths[acquired - 1];
        lengths[acquired..(acquired + repeat)].fill(previous);
        acquired += repeat;
      }
      17 | 18 => {
        let repeat = if symbol == 17 {
          3 + bc.next_bits_lsb(3)? as usize
        } else {
          11 + bc.next_bits_lsb(7)? as usize
        };
        if acquired + repeat > wanted {
          return Err(PngError::BadDynamicHuffmanTreeData);
        }
        // the buffer started zeroed, just skip forward.
        acquired += repeat;
      }
      _ => return Err(PngError::BadDynamicHuffmanTreeData),
    }
  }

  // A block with no way to end is not a block.
  if lengths[END_OF_BLOCK as usize] == 0 {
    return Err(PngError::BadDynamicHuffmanTreeData);
  }

  let lit_len = HuffmanTable::from_code_lengths(&lengths[..hlit])?;
  let dist = HuffmanTable::from_code_lengths(&lengths[hlit..wanted])?;
  Ok((lit_len, dist))
}

/// Copies a stored (BTYPE=0) block to the output.
fn inflate_stored(bc: &mut BitCursor<'_>, out: &mut Vec<u8>, max_len: usize) -> PngResult<()> {
  bc.align_to_byte();
  let header = bc.take_bytes(4)?;
  let len = u16::from_le_bytes([header[0], header[1]]);
  let nlen = u16::from_le_bytes([header[2], header[3]]);
  if len != !nlen {
    return Err(PngError::IllegalStoredBlock);
  }
  let data = bc.take_bytes(len as usize)?;
  if out.len() + data.len() > max_len {
    return Err(PngError::TooMuchDecompressedData);
  }
  out.extend_from_slice(data);
  Ok(())
}

/// Decodes symbols until end-of-block, expanding back-references as it goes.
fn inflate_huffman_block(
  bc: &mut BitCursor<'_>, out: &mut Vec<u8>, lit_len: &HuffmanTable, dist: &HuffmanTable,
  max_len: usize,
) -> PngResult<()> {
  loop {
    let symbol = lit_len.decode_symbol(bc)?;
    if symbol < END_OF_BLOCK {
      if out.len() >= max_len {
        return Err(PngError::TooMuchDecompressedData);
      }
      out.push(symbol as u8);
    } else if symbol == END_OF_BLOCK {
      return Ok(());
    } else {
      // length symbols 286 and 287 exist in the fixed tree but must never
      // appear in data.
      let length_index = (symbol - 257) as usize;
      if length_index >= LENGTH_BASE.len() {
        return Err(PngError::CouldNotFindHuffmanSymbol);
      }
      let length =
        LENGTH_BASE[length_index] as usize + bc.next_bits_lsb(LENGTH_EXTRA[length_index])? as usize;

      let dist_symbol = dist.decode_symbol(bc)? as usize;
      if dist_symbol >= DISTANCE_BASE.len() {
        return Err(PngError::CouldNotFindHuffmanSymbol);
      }
      let distance =
        DISTANCE_BASE[dist_symbol] as usize + bc.next_bits_lsb(DISTANCE_EXTRA[dist_symbol])? as usize;

      if distance > out.len() {
        return Err(PngError::BackRefDistanceTooFar);
      }
      if out.len() + length > max_len {
        return Err(PngError::TooMuchDecompressedData);
      }
      // byte at a time, because the reference can overlap the bytes it's
      // still producing (distance < length repeats the pattern).
      for _ in 0..length {
        let b = out[out.len() - distance];
        out.push(b);
      }
    }
  }
}

/// Inflates a complete zlib stream.
///
/// `expected_len` is the exact decompressed size the caller computed from
/// the image header; it caps the output so a hostile stream can't balloon
/// memory. Producing *more* than `expected_len` bytes is an error; producing
/// fewer is left for the caller to judge.
///
/// The trailing Adler-32 is always verified, and a mismatch fails the whole
/// call: the data may decompress, but it isn't the data that was written.
pub fn zlib_inflate(compressed: &[u8], expected_len: usize) -> PngResult<Vec<u8>> {
  let [cmf, flg, rest @ ..] = compressed else {
    return Err(PngError::UnexpectedEndOfInput);
  };
  // CM must be 8 ("deflate"), CINFO at most 7, no preset dictionary, and the
  // whole header must be a multiple of 31.
  if (cmf & 0x0F) != 8 || (cmf >> 4) > 7 || (flg & 0x20) != 0 {
    return Err(PngError::IllegalZlibHeader);
  }
  if ((*cmf as u32) * 256 + (*flg as u32)) % 31 != 0 {
    return Err(PngError::IllegalZlibHeader);
  }

  let mut bc = BitCursor::new(rest);
  let mut out: Vec<u8> = Vec::new();
  out.try_reserve(expected_len)?;

  loop {
    let bfinal = bc.next_bits_lsb(1)? != 0;
    let btype = bc.next_bits_lsb(2)?;
    trace_log!("deflate block: bfinal {bfinal}, btype {btype}");
    match btype {
      0 => inflate_stored(&mut bc, &mut out, expected_len)?,
      1 => {
        let lit_len = fixed_lit_len_table()?;
        let dist = fixed_dist_table()?;
        inflate_huffman_block(&mut bc, &mut out, &lit_len, &dist, expected_len)?;
      }
      2 => {
        let (lit_len, dist) = read_dynamic_tables(&mut bc)?;
        inflate_huffman_block(&mut bc, &mut out, &lit_len, &dist, expected_len)?;
      }
      _ => return Err(PngError::IllegalBlockType),
    }
    if bfinal {
      break;
    }
  }

  bc.align_to_byte();
  let trailer = bc.take_bytes(4)?;
  let declared = u32::from_be_bytes(trailer.try_into().unwrap());
  let actual = adler32(&out);
  if declared != actual {
    debug_log!("adler-32 mismatch: declared {declared:08x}, actual {actual:08x}");
    return Err(PngError::AdlerChecksumMismatch);
  }
  Ok(out)
}
