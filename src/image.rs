//! Provides the heap-allocated image type that decoding produces.

use alloc::vec::Vec;

use crate::pixel_formats::RGBA8888;

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// index.
///
/// This is how [Bitmap] converts 2d coordinates into index values within its
/// payload vector. If you'd like to use the exact same function for some
/// reason, you can.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  (y as usize) * (width as usize) + (x as usize)
}

/// A direct-color image, row-major, top-to-bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct Bitmap<P> {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<P>,
}
impl<P> Bitmap<P> {
  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<&P> {
    if x < self.width && y < self.height {
      self.pixels.get(xy_width_to_index(x, y, self.width))
    } else {
      None
    }
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut P> {
    if x < self.width && y < self.height {
      self.pixels.get_mut(xy_width_to_index(x, y, self.width))
    } else {
      None
    }
  }
}

/// The image type that PNG decoding outputs.
pub type ImageRGBA8 = Bitmap<RGBA8888>;

impl ImageRGBA8 {
  /// Views the pixels as a flat `width * height * 4` byte slice.
  #[inline]
  #[must_use]
  pub fn as_rgba_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.pixels)
  }
}
