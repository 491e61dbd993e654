use core::fmt::{Debug, Display};

/// An error from PNG decoding.
///
/// Every variant is fatal to the decode call that produced it: no partial
/// image is ever returned. Malformed binary data is not transient, so there
/// is also nothing to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PngError {
  /// The first 8 bytes of the data stream are not the PNG signature.
  NoPngSignature,
  /// The input ended in the middle of a declared chunk, block, or trailer.
  UnexpectedEndOfInput,
  /// The first chunk was not a 13-byte `IHDR`.
  FirstChunkNotIHDR,
  /// The declared width and/or height of this image is 0.
  WidthOrHeightZero,
  /// The color type byte is not one of 0, 2, 3, 4, 6.
  IllegalColorType,
  /// The (color type, bit depth) pair isn't a PNG-legal combination.
  IllegalColorTypeBitDepthCombination,
  /// The compression method byte must be 0.
  IllegalCompressionMethod,
  /// The filter method byte must be 0.
  IllegalFilterMethod,
  /// The interlace method byte must be 0 or 1.
  IllegalInterlaceMethod,
  /// A chunk's payload has an illegal length (eg: a `PLTE` chunk that isn't
  /// a non-zero multiple of 3 bytes, or more than 768 bytes).
  IllegalChunkLength,
  /// A critical chunk's CRC-32 didn't match its declared value.
  ChunkCrcMismatch,
  /// The 2-byte zlib header is invalid (bad method, a preset dictionary, or
  /// a failed check value).
  IllegalZlibHeader,
  /// A DEFLATE block declared the reserved block type 3.
  IllegalBlockType,
  /// A stored block's `LEN` and `NLEN` fields aren't one's complements.
  IllegalStoredBlock,
  /// A dynamic block's Huffman tree data is unusable (over-subscribed
  /// lengths, a bad repeat position, or no end-of-block code).
  BadDynamicHuffmanTreeData,
  /// The compressed bits didn't resolve to any symbol in the current tree.
  CouldNotFindHuffmanSymbol,
  /// An LZ77 back-reference pointed further back than the bytes emitted so
  /// far.
  BackRefDistanceTooFar,
  /// The DEFLATE stream produced more bytes than the image header calls for.
  TooMuchDecompressedData,
  /// The Adler-32 of the decompressed data didn't match the zlib trailer.
  AdlerChecksumMismatch,
  /// A scanline's filter type byte was greater than 4.
  IllegalFilterType,
  /// The image is too large.
  ///
  /// The automatic decoder limits the width and height of images it
  /// processes to 16,384 or less to prevent accidental out-of-memory
  /// problems from hostile headers.
  ImageTooLargeForAutomaticDecoding,
  /// The allocator couldn't give us enough space.
  #[cfg(feature = "alloc")]
  AllocationFailed,
}

impl Display for PngError {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    Debug::fmt(self, f)
  }
}

#[cfg(feature = "alloc")]
impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::AllocationFailed
  }
}

/// Alias for a `Result` with [PngError] as the error type.
pub type PngResult<T> = Result<T, PngError>;
