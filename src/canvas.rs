//! Shared pixel canvas for cooperating fill workers.
//!
//! Every worker can read and write the whole buffer, not just its own
//! partition, because a run fill extends from the probed stack toward its
//! source and may cross a partition edge. There is no lock; safety rests
//! on the monotonic-write contract:
//!
//! - every fill transitions a stack from transparent to opaque and
//!   nothing ever un-fills a stack;
//! - only fabricated stacks are ever rewritten (a later run may repaint
//!   one it crosses); original opaque stacks never sit on a run's
//!   interior, so their color channels are never touched;
//! - alpha is stored last with release ordering as the publish flag, so
//!   a probe that observes a non-zero alpha reads fully-written color.
//!
//! The [`MarginCanvas::claim`] compare-and-set on the modified mask
//! keeps the fill *count* exact: each stack is counted once no matter
//! how many runs write it. Two workers repainting the same fabricated
//! stack can still interleave channel stores; both candidates are
//! opaque fill colors and alpha never drops back to zero, so the
//! opacity mask stays deterministic while colors near partition edges
//! may vary between runs. That residual non-determinism is accepted.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::geometry::CHANNELS;

/// Atomic view over a pixel buffer plus the per-stack modified mask.
///
/// The modified mask distinguishes fabricated fill colors from original
/// opaque sources: original stacks are never marked, so a probe can
/// refuse to treat a previous fill as ground truth.
pub struct MarginCanvas<'a> {
  pixels: &'a [AtomicU32],
  modified: &'a [AtomicBool],
  filled: AtomicUsize,
}

impl<'a> MarginCanvas<'a> {
  /// Wraps a pixel buffer and its modified mask.
  ///
  /// `pixels.len()` must be `modified.len() * 4`.
  pub fn new(pixels: &'a mut [f32], modified: &'a [AtomicBool]) -> Self {
    debug_assert_eq!(pixels.len(), modified.len() * CHANNELS);
    let ptr = pixels as *mut [f32] as *const [AtomicU32];
    // SAFETY: AtomicU32 has the same size and alignment as f32, and the
    // exclusive borrow guarantees no non-atomic alias exists for 'a.
    // Channel values are stored as f32 bit patterns; every access below
    // goes through atomic loads and stores.
    let pixels = unsafe { &*ptr };
    Self {
      pixels,
      modified,
      filled: AtomicUsize::new(0),
    }
  }

  /// Total channel count.
  #[inline]
  pub fn channel_len(&self) -> usize {
    self.pixels.len()
  }

  /// Total stack count.
  #[inline]
  pub fn stack_count(&self) -> usize {
    self.modified.len()
  }

  /// Reads one channel.
  ///
  /// Alpha channels are read with acquire ordering so that color
  /// channels published before a non-zero alpha are visible.
  #[inline]
  pub fn channel(&self, index: usize) -> f32 {
    f32::from_bits(self.pixels[index].load(Ordering::Acquire))
  }

  /// Writes one channel (relaxed; not a publish point).
  #[inline]
  pub fn set_channel(&self, index: usize, value: f32) {
    self.pixels[index].store(value.to_bits(), Ordering::Relaxed);
  }

  /// Reads a whole stack's RGBA given its first channel index.
  #[inline]
  pub fn read_stack(&self, rgba_start: usize) -> [f32; 4] {
    [
      self.channel(rgba_start),
      self.channel(rgba_start + 1),
      self.channel(rgba_start + 2),
      self.channel(rgba_start + 3),
    ]
  }

  /// Writes a stack's RGBA, alpha last with release ordering.
  ///
  /// May be called again on an already-fabricated stack to repaint it;
  /// must never be called on an original opaque stack.
  #[inline]
  pub fn write_stack(&self, stack: usize, rgba: [f32; 4]) {
    let base = stack * CHANNELS;
    self.pixels[base].store(rgba[0].to_bits(), Ordering::Relaxed);
    self.pixels[base + 1].store(rgba[1].to_bits(), Ordering::Relaxed);
    self.pixels[base + 2].store(rgba[2].to_bits(), Ordering::Relaxed);
    // Alpha is the publish flag: once it reads non-zero, the color
    // channels above are guaranteed visible.
    self.pixels[base + 3].store(rgba[3].to_bits(), Ordering::Release);
  }

  /// Whether `stack`'s color was fabricated by this run.
  #[inline]
  pub fn is_modified(&self, stack: usize) -> bool {
    self.modified[stack].load(Ordering::Relaxed)
  }

  /// Marks `stack` as fabricated. Returns true exactly once per stack
  /// across all workers, which keeps the fill counter exact; runs write
  /// the color regardless of who claimed first.
  #[inline]
  pub fn claim(&self, stack: usize) -> bool {
    let won = self.modified[stack]
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
      .is_ok();
    if won {
      self.filled.fetch_add(1, Ordering::Relaxed);
    }
    won
  }

  /// Number of stacks filled so far, across all workers.
  ///
  /// Monotonically increasing; used by the convergence loop to tell a
  /// stalled run from one still progressing elsewhere.
  #[inline]
  pub fn filled_count(&self) -> usize {
    self.filled.load(Ordering::Relaxed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mask(stacks: usize) -> Vec<AtomicBool> {
    std::iter::repeat_with(|| AtomicBool::new(false))
      .take(stacks)
      .collect()
  }

  #[test]
  fn test_channel_roundtrip() {
    let mut pixels = vec![0.0f32; 8];
    let modified = mask(2);
    let canvas = MarginCanvas::new(&mut pixels, &modified);
    canvas.set_channel(3, 1.0);
    assert_eq!(canvas.channel(3), 1.0);
    assert_eq!(canvas.channel(7), 0.0);
  }

  #[test]
  fn test_write_stack_lands_in_place() {
    let mut pixels = vec![0.0f32; 8];
    let modified = mask(2);
    let canvas = MarginCanvas::new(&mut pixels, &modified);
    canvas.write_stack(1, [0.25, 0.5, 0.75, 1.0]);
    assert_eq!(canvas.read_stack(4), [0.25, 0.5, 0.75, 1.0]);
    assert_eq!(canvas.read_stack(0), [0.0; 4]);
  }

  #[test]
  fn test_claim_is_exclusive() {
    let mut pixels = vec![0.0f32; 4];
    let modified = mask(1);
    let canvas = MarginCanvas::new(&mut pixels, &modified);
    assert!(!canvas.is_modified(0));
    assert!(canvas.claim(0));
    assert!(!canvas.claim(0), "second claim must lose");
    assert!(canvas.is_modified(0));
    assert_eq!(canvas.filled_count(), 1);
  }

  #[test]
  fn test_view_writes_back_to_caller_buffer() {
    let mut pixels = vec![0.0f32; 4];
    let modified = mask(1);
    {
      let canvas = MarginCanvas::new(&mut pixels, &modified);
      canvas.write_stack(0, [1.0, 0.0, 0.0, 1.0]);
    }
    assert_eq!(pixels, vec![1.0, 0.0, 0.0, 1.0]);
  }
}
