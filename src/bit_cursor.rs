//! A bit-granular cursor over a byte buffer.
//!
//! DEFLATE packs its data LSB-first within each byte, so that's the only bit
//! order this cursor speaks. Huffman codes are conceptually MSB-first, but
//! the re-ordering for that is handled by the lookup tables in the `huffman`
//! module, not here.

use crate::{PngError, PngResult};

/// Tracks a bit position over a borrowed byte buffer.
///
/// Peeking zero-pads past the end of the input so that table lookups near the
/// end of a stream stay simple, but *consuming* bits past the end is always a
/// typed error. Untrusted input can never cause an out of bounds access.
#[derive(Debug, Clone)]
pub struct BitCursor<'b> {
  bytes: &'b [u8],
  bit_pos: usize,
}

impl<'b> BitCursor<'b> {
  /// Starts a cursor at the first bit of `bytes`.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, bit_pos: 0 }
  }

  #[inline]
  #[must_use]
  const fn bit_len(&self) -> usize {
    self.bytes.len() * 8
  }

  /// Views the next `count` bits (LSB-first) without consuming anything.
  ///
  /// Bits past the end of the buffer read as 0.
  #[inline]
  #[must_use]
  pub fn peek_bits(&self, count: u32) -> u32 {
    debug_assert!(count <= 25);
    let start = self.bit_pos >> 3;
    let mut buffer = 0_u32;
    for i in 0..4 {
      if let Some(b) = self.bytes.get(start + i) {
        buffer |= (*b as u32) << (8 * i as u32);
      }
    }
    buffer >>= (self.bit_pos & 7) as u32;
    buffer & ((1_u32 << count) - 1)
  }

  /// Consumes `count` bits, or errors if that passes the end of the buffer.
  #[inline]
  pub fn advance_bits(&mut self, count: u32) -> PngResult<()> {
    let new_pos = self.bit_pos + count as usize;
    if new_pos > self.bit_len() {
      Err(PngError::UnexpectedEndOfInput)
    } else {
      self.bit_pos = new_pos;
      Ok(())
    }
  }

  /// Reads `count` bits LSB-first.
  #[inline]
  pub fn next_bits_lsb(&mut self, count: u32) -> PngResult<u32> {
    let bits = self.peek_bits(count);
    self.advance_bits(count)?;
    Ok(bits)
  }

  /// Skips forward to the next byte boundary (a no-op when already aligned).
  #[inline]
  pub fn align_to_byte(&mut self) {
    self.bit_pos = (self.bit_pos + 7) & !7;
  }

  /// Takes the next `count` whole bytes as a slice.
  ///
  /// The cursor must be byte-aligned when calling this.
  #[inline]
  pub fn take_bytes(&mut self, count: usize) -> PngResult<&'b [u8]> {
    debug_assert_eq!(self.bit_pos & 7, 0);
    let start = self.bit_pos >> 3;
    let end = start.checked_add(count).ok_or(PngError::UnexpectedEndOfInput)?;
    if end > self.bytes.len() {
      Err(PngError::UnexpectedEndOfInput)
    } else {
      self.bit_pos = end * 8;
      Ok(&self.bytes[start..end])
    }
  }
}

#[test]
fn test_bit_cursor_lsb_order() {
  // 0b0110_1001: bits come out low to high.
  let mut bc = BitCursor::new(&[0b0110_1001, 0xFF]);
  assert_eq!(bc.next_bits_lsb(1).unwrap(), 1);
  assert_eq!(bc.next_bits_lsb(2).unwrap(), 0b00);
  assert_eq!(bc.next_bits_lsb(3).unwrap(), 0b101);
  // crosses the byte boundary: high 2 bits of byte 0, low bit of byte 1.
  assert_eq!(bc.next_bits_lsb(3).unwrap(), 0b1_01);
  assert_eq!(bc.peek_bits(7), 0b111_1111);
}

#[test]
fn test_bit_cursor_end_of_input() {
  let mut bc = BitCursor::new(&[0xAB]);
  // peeking past the end pads with zero and doesn't move anything
  assert_eq!(bc.peek_bits(16), 0xAB);
  assert_eq!(bc.next_bits_lsb(8).unwrap(), 0xAB);
  assert_eq!(bc.next_bits_lsb(1), Err(PngError::UnexpectedEndOfInput));
  //
  let mut bc = BitCursor::new(&[1, 2, 3]);
  bc.advance_bits(3).unwrap();
  bc.align_to_byte();
  assert_eq!(bc.take_bytes(2).unwrap(), &[2, 3]);
  assert_eq!(bc.take_bytes(1), Err(PngError::UnexpectedEndOfInput));
}
