//! The pixel formats the decoder works with.
//!
//! PNG stores many on-disk pixel layouts, but everything is normalized to
//! [RGBA8888] on the way out. [RGB888] only shows up as the palette entry
//! type.

use bytemuck::{Pod, Zeroable};

/// An 8-bit-per-channel RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB888 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// An 8-bit-per-channel RGBA pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8888 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl From<RGB888> for RGBA8888 {
  /// Alpha becomes fully opaque.
  #[inline]
  #[must_use]
  fn from(RGB888 { r, g, b }: RGB888) -> Self {
    Self { r, g, b, a: 255 }
  }
}
