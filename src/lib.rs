#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! A crate for decoding PNG data into RGBA8 pixels.
//!
//! Unlike most PNG crates this one carries its own zlib/DEFLATE inflater, so
//! the whole path from raw bytes to pixels is bounds-checked safe Rust with no
//! compression dependency.
//!
//! The decoder consumes a complete PNG byte buffer and produces an owned
//! [`ImageRGBA8`], plus the ancillary chunks as opaque records. All input is
//! treated as untrusted: malformed data gives a typed [`PngError`], never a
//! panic or out of bounds access.
//!
//! ```no_run
//! let bytes: &[u8] = unimplemented!("png data from somewhere");
//! let decoded = pngling::png::decode_png(bytes).unwrap();
//! let image: &pngling::ImageRGBA8 = &decoded.image;
//! ```

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

// Logging is an optional observer: with the `log` feature off these calls
// compile to nothing.
macro_rules! debug_log {
  ($($arg:tt)*) => {{
    #[cfg(feature = "log")]
    log::debug!($($arg)*);
  }};
}
macro_rules! trace_log {
  ($($arg:tt)*) => {{
    #[cfg(feature = "log")]
    log::trace!($($arg)*);
  }};
}
pub(crate) use {debug_log, trace_log};

mod error;
pub use error::*;

pub mod pixel_formats;
pub use pixel_formats::*;

mod bit_cursor;
pub(crate) use bit_cursor::*;

#[cfg(feature = "alloc")]
mod huffman;
#[cfg(feature = "alloc")]
pub(crate) use huffman::*;

#[cfg(feature = "alloc")]
pub mod inflate;

#[cfg(feature = "alloc")]
pub mod image;
#[cfg(feature = "alloc")]
pub use image::*;

#[cfg(feature = "alloc")]
pub mod png;
