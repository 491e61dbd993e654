//! Canonical Huffman decode tables for DEFLATE.
//!
//! A table is built from nothing but an array of per-symbol code lengths
//! (RFC 1951 section 3.2.2): codes of equal length are consecutive integers
//! assigned in increasing symbol order, and no code is a prefix of another.
//!
//! Decoding uses a two-level lookup: a root table indexed by the next
//! [FIRSTBITS] bits of input (bit-reversed, since DEFLATE codes are packed
//! MSB-first into an LSB-first stream), with overflow tables hanging off the
//! root entries for the rare codes longer than that.

use alloc::vec::Vec;

use crate::{BitCursor, PngError, PngResult};

/// Bits consumed by the root table lookup.
pub(crate) const FIRSTBITS: u32 = 9;

const HEAD_SIZE: usize = 1 << FIRSTBITS;

/// Marks a table entry that no code maps to.
const INVALID_SYMBOL: u16 = 0xFFFF;

/// During the build, marks a table slot that hasn't been filled yet.
const UNFILLED: u8 = 16;

/// The longest legal DEFLATE code length.
pub(crate) const MAX_BIT_LEN: u16 = 15;

/// Reverses the low `count` bits of `bits`.
#[inline]
#[must_use]
const fn reverse_bits(bits: u32, count: u32) -> u32 {
  let mut output = 0;
  let mut i = 0;
  while i < count {
    output |= ((bits >> (count - i - 1)) & 1) << i;
    i += 1;
  }
  output
}

/// A canonical-Huffman symbol decode table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HuffmanTable {
  /// Code length per table entry.
  table_len: Vec<u8>,
  /// Decoded symbol (or second-level start index) per table entry.
  table_value: Vec<u16>,
}

impl HuffmanTable {
  /// Builds the decode table from per-symbol code lengths.
  ///
  /// A length of 0 means the symbol doesn't participate. Over-subscribed
  /// length sets (violating the Kraft inequality) are rejected; incomplete
  /// sets are allowed, their dead input patterns simply fail to decode.
  pub fn from_code_lengths(lengths: &[u16]) -> PngResult<Self> {
    let numcodes = lengths.len();
    debug_assert!(numcodes <= INVALID_SYMBOL as usize);

    // 1) Count the number of codes for each code length.
    let mut bl_count = [0_u32; (MAX_BIT_LEN + 1) as usize];
    for &len in lengths {
      if len > MAX_BIT_LEN {
        return Err(PngError::BadDynamicHuffmanTreeData);
      }
      bl_count[len as usize] += 1;
    }
    bl_count[0] = 0;

    // 2) Find the numerical value of the smallest code for each code length.
    let mut next_code = [0_u32; (MAX_BIT_LEN + 1) as usize];
    let mut code = 0_u32;
    for bits in 1..=(MAX_BIT_LEN as usize) {
      code = (code + bl_count[bits - 1]) << 1;
      next_code[bits] = code;
    }

    // 3) Assign consecutive values to all codes of the same length, in
    //    symbol order. If a code would need more bits than its declared
    //    length then the length set was over-subscribed.
    let mut codes: Vec<u32> = Vec::new();
    codes.try_reserve(numcodes)?;
    for &len in lengths {
      if len == 0 {
        codes.push(0);
      } else {
        let len = len as usize;
        if next_code[len] & !((1_u32 << len) - 1) != 0 {
          return Err(PngError::BadDynamicHuffmanTreeData);
        }
        codes.push(next_code[len]);
        next_code[len] += 1;
      }
    }

    // 4) Lay out the lookup table. Every root entry whose bit pattern is the
    //    start of a code longer than FIRSTBITS points at a second-level
    //    region sized for the longest such code.
    let mut maxlens = [0_u32; HEAD_SIZE];
    for (i, &len) in lengths.iter().enumerate() {
      let l = len as u32;
      if l <= FIRSTBITS {
        continue;
      }
      let index = reverse_bits(codes[i] >> (l - FIRSTBITS), FIRSTBITS) as usize;
      maxlens[index] = maxlens[index].max(l);
    }
    let mut size = HEAD_SIZE;
    for &l in maxlens.iter() {
      if l > FIRSTBITS {
        size += 1_usize << (l - FIRSTBITS);
      }
    }
    let mut table_len: Vec<u8> = Vec::new();
    table_len.try_reserve(size)?;
    table_len.resize(size, UNFILLED);
    let mut table_value: Vec<u16> = Vec::new();
    table_value.try_reserve(size)?;
    table_value.resize(size, INVALID_SYMBOL);

    let mut pointer = HEAD_SIZE;
    for (i, maxlen) in maxlens.iter().copied().enumerate() {
      if maxlen > FIRSTBITS {
        table_len[i] = maxlen as u8;
        table_value[i] = pointer as u16;
        pointer += 1_usize << (maxlen - FIRSTBITS);
      }
    }

    // 5) Fill in the symbols. A code shorter than FIRSTBITS owns every root
    //    entry whose low bits match its reversed pattern.
    for (i, &len) in lengths.iter().enumerate() {
      let l = len as u32;
      if l == 0 {
        continue;
      }
      let reverse = reverse_bits(codes[i], l);
      if l <= FIRSTBITS {
        for j in 0..(1_u32 << (FIRSTBITS - l)) {
          let index = (reverse | (j << l)) as usize;
          table_len[index] = l as u8;
          table_value[index] = i as u16;
        }
      } else {
        let root = (reverse & (HEAD_SIZE as u32 - 1)) as usize;
        let maxlen = table_len[root] as u32;
        debug_assert!(maxlen >= l);
        let start = table_value[root] as usize;
        let reverse2 = reverse >> FIRSTBITS;
        for j in 0..(1_u32 << (maxlen - l)) {
          let index2 = start + (reverse2 | (j << (l - FIRSTBITS))) as usize;
          if let Some(slot) = table_len.get_mut(index2) {
            *slot = l as u8;
            table_value[index2] = i as u16;
          }
        }
      }
    }

    // Any slot still unfilled belongs to no code (an incomplete length set):
    // give it a consumable length and the invalid-symbol sentinel.
    for (len, value) in table_len.iter_mut().zip(table_value.iter_mut()) {
      if *len == UNFILLED {
        *len = 1;
        *value = INVALID_SYMBOL;
      }
    }

    Ok(Self { table_len, table_value })
  }

  /// Decodes one symbol from the cursor.
  pub fn decode_symbol(&self, bc: &mut BitCursor<'_>) -> PngResult<u16> {
    let index = bc.peek_bits(FIRSTBITS) as usize;
    let l = self.table_len[index] as u32;
    let value = self.table_value[index];
    if l <= FIRSTBITS {
      if value == INVALID_SYMBOL {
        return Err(PngError::CouldNotFindHuffmanSymbol);
      }
      bc.advance_bits(l)?;
      Ok(value)
    } else {
      bc.advance_bits(FIRSTBITS)?;
      let index2 = (value as usize) + bc.peek_bits(l - FIRSTBITS) as usize;
      let l2 = *self.table_len.get(index2).ok_or(PngError::CouldNotFindHuffmanSymbol)? as u32;
      let value2 = self.table_value[index2];
      if value2 == INVALID_SYMBOL {
        return Err(PngError::CouldNotFindHuffmanSymbol);
      }
      bc.advance_bits(l2 - FIRSTBITS)?;
      Ok(value2)
    }
  }
}

/// Writes Huffman codes MSB-first into an LSB-first byte stream, the way
/// DEFLATE packs them. Test helper.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct BitSink {
  pub bytes: Vec<u8>,
  pub bit_len: usize,
}
#[cfg(test)]
impl BitSink {
  pub fn push_bit(&mut self, bit: u32) {
    if self.bit_len % 8 == 0 {
      self.bytes.push(0);
    }
    if bit != 0 {
      *self.bytes.last_mut().unwrap() |= 1 << (self.bit_len % 8);
    }
    self.bit_len += 1;
  }
  /// Pushes a Huffman code, most significant bit first.
  pub fn push_code(&mut self, code: u32, len: u32) {
    for i in (0..len).rev() {
      self.push_bit((code >> i) & 1);
    }
  }
  /// Pushes a plain value, least significant bit first (extra bits, headers).
  pub fn push_lsb(&mut self, value: u32, len: u32) {
    for i in 0..len {
      self.push_bit((value >> i) & 1);
    }
  }
}

#[test]
fn test_canonical_code_assignment() {
  // the small example in RFC 1951: lengths (2, 1, 3, 3) must produce the
  // codes (10, 0, 110, 111).
  fn codes_for(lengths: &[u16]) -> Vec<u32> {
    // recompute what from_code_lengths assigns by decoding each symbol back
    // out of its own bit pattern.
    let table = HuffmanTable::from_code_lengths(lengths).unwrap();
    let mut out = Vec::new();
    for (i, &len) in lengths.iter().enumerate() {
      if len == 0 {
        out.push(0);
        continue;
      }
      // scan all patterns of this length for the one that decodes to i.
      let found = (0..(1_u32 << len))
        .find(|&code| {
          let mut sink = BitSink::default();
          sink.push_code(code, len as u32);
          let mut bc = BitCursor::new(&sink.bytes);
          table.decode_symbol(&mut bc) == Ok(i as u16)
        })
        .unwrap();
      out.push(found);
    }
    out
  }
  assert_eq!(codes_for(&[2, 1, 3, 3]), [0b10, 0b0, 0b110, 0b111]);
  // the bigger example in RFC 1951.
  assert_eq!(
    codes_for(&[3, 3, 3, 3, 3, 2, 4, 4]),
    [0b010, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111]
  );
}

#[test]
fn test_round_trip_through_table() {
  // lengths straddling FIRSTBITS so both table levels get exercised.
  let mut lengths = [0_u16; 300];
  for (i, len) in lengths.iter_mut().enumerate() {
    *len = match i {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
  }
  let table = HuffmanTable::from_code_lengths(&lengths[..288]).unwrap();
  // fixed-tree spot checks from RFC 1951: symbol 0 is 00110000, symbol 256
  // is 0000000, symbol 280 is 11000000.
  let mut sink = BitSink::default();
  sink.push_code(0b00110000, 8);
  sink.push_code(0b0000000, 7);
  sink.push_code(0b11000000, 8);
  sink.push_code(0b110010000, 9); // symbol 144
  let mut bc = BitCursor::new(&sink.bytes);
  assert_eq!(table.decode_symbol(&mut bc), Ok(0));
  assert_eq!(table.decode_symbol(&mut bc), Ok(256));
  assert_eq!(table.decode_symbol(&mut bc), Ok(280));
  assert_eq!(table.decode_symbol(&mut bc), Ok(144));
}

#[test]
fn test_long_codes_use_second_level() {
  // depth-15 codes force the two-level path.
  let lengths: [u16; 16] =
    [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 15];
  let table = HuffmanTable::from_code_lengths(&lengths).unwrap();
  let mut sink = BitSink::default();
  // symbol 0 is the single-bit code 0; symbol 15 is all ones.
  sink.push_code(0b0, 1);
  sink.push_code(0b111_1111_1111_1111, 15);
  sink.push_code(0b0, 1);
  let mut bc = BitCursor::new(&sink.bytes);
  assert_eq!(table.decode_symbol(&mut bc), Ok(0));
  assert_eq!(table.decode_symbol(&mut bc), Ok(15));
  assert_eq!(table.decode_symbol(&mut bc), Ok(0));
}

#[test]
fn test_bad_length_sets() {
  // over-subscribed: five codes of length 2.
  assert_eq!(
    HuffmanTable::from_code_lengths(&[2, 2, 2, 2, 2]),
    Err(PngError::BadDynamicHuffmanTreeData)
  );
  // incomplete sets build, but dead patterns fail to decode.
  let table = HuffmanTable::from_code_lengths(&[2, 2]).unwrap();
  let mut sink = BitSink::default();
  sink.push_code(0b11, 2);
  let mut bc = BitCursor::new(&sink.bytes);
  assert_eq!(table.decode_symbol(&mut bc), Err(PngError::CouldNotFindHuffmanSymbol));
}
