//! Image geometry and the 8-direction step table.
//!
//! All positions are flat indices into a row-major RGBA `f32` buffer:
//! stack `k` occupies channels `4k .. 4k + 4` and `4k + 3` is its alpha.
//! Directional movement is expressed as signed deltas between alpha
//! indices, so "one pixel right" is `+4` and "one row down" is
//! `+width * 4`. Deltas are computed in `i64` regardless of image size;
//! buffer indexing uses `usize`.

/// Channels per pixel stack (RGBA).
pub const CHANNELS: usize = 4;

/// Number of compass directions probed per ring.
pub const DIRECTIONS: usize = 8;

/// Number of axis-aligned (cardinal) directions. The cardinal deltas are
/// the first four entries of the step table.
pub const CARDINALS: usize = 4;

/// Dimensions of the image backing a pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageGeometry {
  width: u32,
  height: u32,
}

impl ImageGeometry {
  /// Creates geometry for a `width` x `height` RGBA image.
  ///
  /// Pure bookkeeping; dimension validation happens at the engine
  /// boundary before any geometry is derived.
  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  /// Image width in pixels.
  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  /// Image height in pixels.
  #[inline]
  pub fn height(&self) -> u32 {
    self.height
  }

  /// Channels per row (`width * 4`).
  #[inline]
  pub fn row_stride(&self) -> i64 {
    self.width as i64 * CHANNELS as i64
  }

  /// Total channel count (`width * height * 4`).
  #[inline]
  pub fn channel_len(&self) -> usize {
    self.width as usize * self.height as usize * CHANNELS
  }

  /// Total RGBA stack count (`width * height`).
  #[inline]
  pub fn stack_count(&self) -> usize {
    self.width as usize * self.height as usize
  }

  /// Number of expanding rings a probe walks: `max(width, height)`.
  #[inline]
  pub fn ring_count(&self) -> usize {
    self.width.max(self.height) as usize
  }
}

/// Flat-index deltas for the eight compass directions, cardinals first:
/// down, right, up, left, then the four diagonals.
///
/// The deltas are pure index arithmetic, so a cardinal ray that runs off
/// a row edge continues on the neighboring row rather than stopping; only
/// the `[0, channel_len)` bounds clip it. That wrap is part of the search
/// order, not an artifact.
#[derive(Clone, Copy, Debug)]
pub struct StepTable {
  steps: [i64; DIRECTIONS],
}

impl StepTable {
  /// Derives the step table from image geometry.
  pub fn new(geometry: &ImageGeometry) -> Self {
    let row = geometry.row_stride();
    let px = CHANNELS as i64;
    Self {
      steps: [
        row,
        px,
        -row,
        -px,
        row + px,
        -row + px,
        -row - px,
        row - px,
      ],
    }
  }

  /// Delta for one step along `direction`.
  #[inline]
  pub fn step(&self, direction: usize) -> i64 {
    self.steps[direction]
  }

  /// All eight deltas in probe order.
  #[inline]
  pub fn steps(&self) -> &[i64; DIRECTIONS] {
    &self.steps
  }

  /// Whether `direction` is axis-aligned.
  #[inline]
  pub fn is_cardinal(direction: usize) -> bool {
    direction < CARDINALS
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_geometry_derives_sizes() {
    let geometry = ImageGeometry::new(4, 3);
    assert_eq!(geometry.row_stride(), 16);
    assert_eq!(geometry.channel_len(), 48);
    assert_eq!(geometry.stack_count(), 12);
    assert_eq!(geometry.ring_count(), 4);
  }

  #[test]
  fn test_step_table_order() {
    let steps = StepTable::new(&ImageGeometry::new(4, 4));
    assert_eq!(steps.steps(), &[16, 4, -16, -4, 20, -12, -20, 12]);
  }

  #[test]
  fn test_cardinal_subset_is_first_four() {
    for direction in 0..DIRECTIONS {
      assert_eq!(StepTable::is_cardinal(direction), direction < 4);
    }
  }
}
