//! Run coordination: validation, worker launch, and the caller boundary.
//!
//! [`dilate_in_place`] is the engine proper: it validates the buffer,
//! partitions the stack range, runs one fill worker per partition on the
//! rayon pool, and blocks until the scope joins. [`MarginJob`] wraps the
//! same run on a background thread for callers that poll instead of
//! block, and [`MarginImage`] + [`add_infinite_margin`] adapt an image
//! resource that exposes bulk pixel read/write.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crate::canvas::MarginCanvas;
use crate::config::MarginConfig;
use crate::fill::{FillReport, fill_partition};
use crate::geometry::{CHANNELS, ImageGeometry, StepTable};
use crate::partition::partition_stacks;
use crate::rays::RayTable;

/// A fatal error surfaced before or instead of a completed run.
///
/// Validation failures are rejected before any partitioning, with no
/// partial work attempted. A panicked run is fatal and never retried.
#[derive(Debug)]
pub enum MarginError {
  /// Width or height is zero.
  ZeroSizedImage { width: u32, height: u32 },
  /// Buffer length is not `width * height * 4`.
  BufferSizeMismatch { expected: usize, actual: usize },
  /// No opaque stack anywhere: there is nothing to extend, and every
  /// probe would come back empty forever.
  NoOpaquePixels,
  /// A background run panicked.
  WorkerPanic,
}

impl fmt::Display for MarginError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ZeroSizedImage { width, height } => {
        write!(f, "zero-sized image: {}x{}", width, height)
      }
      Self::BufferSizeMismatch { expected, actual } => {
        write!(
          f,
          "pixel buffer length mismatch: expected {}, got {}",
          expected, actual
        )
      }
      Self::NoOpaquePixels => write!(f, "image has no opaque pixels to extend"),
      Self::WorkerPanic => write!(f, "margin worker panicked"),
    }
  }
}

impl std::error::Error for MarginError {}

/// Aggregated result of a completed run.
#[derive(Clone, Copy, Debug)]
pub struct MarginOutcome {
  /// Stacks filled with a fabricated color.
  pub filled: usize,
  /// Stacks left transparent because no ray could reach an opaque
  /// source (zero unless the image has isolated empty regions or a
  /// sweep cap cut a partition short).
  pub unfilled: usize,
  /// Largest sweep count any worker needed to converge.
  pub sweeps: u32,
  /// Workers the run was partitioned across.
  pub workers: usize,
}

/// Extends opaque borders into every reachable transparent stack,
/// mutating `pixels` in place.
///
/// `pixels` is a flat row-major RGBA buffer of length
/// `width * height * 4` with values in `[0, 1]`. On success every
/// originally opaque stack keeps its RGB with alpha pinned to 1.0, and
/// every reachable transparent stack holds the color of its nearest
/// opaque source under the ring search order.
pub fn dilate_in_place(
  pixels: &mut [f32],
  width: u32,
  height: u32,
  config: &MarginConfig,
) -> Result<MarginOutcome, MarginError> {
  #[cfg(feature = "tracy")]
  let _span = tracing::info_span!("dilate", width, height).entered();

  let timer = Instant::now();

  if width == 0 || height == 0 {
    return Err(MarginError::ZeroSizedImage { width, height });
  }
  let geometry = ImageGeometry::new(width, height);
  if pixels.len() != geometry.channel_len() {
    return Err(MarginError::BufferSizeMismatch {
      expected: geometry.channel_len(),
      actual: pixels.len(),
    });
  }
  if !pixels.iter().skip(3).step_by(CHANNELS).any(|&a| a != 0.0) {
    return Err(MarginError::NoOpaquePixels);
  }

  let workers = config.clamped_workers();
  let steps = StepTable::new(&geometry);
  let rays = RayTable::build(&steps, geometry.ring_count());
  let partitions = partition_stacks(geometry.stack_count(), workers);

  let modified: Vec<AtomicBool> = std::iter::repeat_with(|| AtomicBool::new(false))
    .take(geometry.stack_count())
    .collect();
  let canvas = MarginCanvas::new(pixels, &modified);

  log::debug!(
    "margin init for {}x{} ({} stacks, {} workers) finished in {:.2?}",
    width,
    height,
    geometry.stack_count(),
    workers,
    timer.elapsed()
  );

  let reports: Mutex<Vec<FillReport>> = Mutex::new(Vec::with_capacity(workers));
  let done = AtomicUsize::new(0);

  rayon::scope(|scope| {
    for (worker, stacks) in partitions.into_iter().enumerate() {
      let canvas = &canvas;
      let steps = &steps;
      let rays = &rays;
      let reports = &reports;
      let done = &done;
      let max_sweeps = config.max_sweeps;
      scope.spawn(move |_| {
        let report = fill_partition(canvas, steps, rays, stacks, max_sweeps);
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!(
          "margin worker {}: {}/{} workers finished ({} sweeps, {} filled)",
          worker,
          finished,
          workers,
          report.sweeps,
          report.filled
        );
        if let Ok(mut reports) = reports.lock() {
          reports.push(report);
        }
      });
    }
  });

  let reports = match reports.into_inner() {
    Ok(reports) => reports,
    Err(poisoned) => poisoned.into_inner(),
  };
  let outcome = MarginOutcome {
    filled: reports.iter().map(|r| r.filled).sum(),
    unfilled: reports.iter().map(|r| r.unfilled).sum(),
    sweeps: reports.iter().map(|r| r.sweeps).max().unwrap_or(0),
    workers,
  };

  log::info!(
    "margin for {}x{} finished in {:.2?} ({} filled, {} left transparent)",
    width,
    height,
    timer.elapsed(),
    outcome.filled,
    outcome.unfilled
  );

  Ok(outcome)
}

/// Handle to an image resource the engine reads from and writes back to.
///
/// Image decoding, host-application bindings, and file formats live
/// behind this trait; the engine only sees dimensions and a flat RGBA
/// sequence.
pub trait MarginImage {
  /// Image dimensions in pixels.
  fn size(&self) -> (u32, u32);
  /// Bulk pixel read: flat RGBA f32 sequence of length
  /// `width * height * 4`.
  fn read_pixels(&self) -> Vec<f32>;
  /// Bulk pixel write of the same shape, applied after the run.
  fn write_pixels(&mut self, pixels: &[f32]);
}

/// Reads an image, dilates it, and writes the result back.
///
/// The write only happens after every worker has finished; a validation
/// error leaves the image untouched.
pub fn add_infinite_margin<I: MarginImage>(
  image: &mut I,
  config: &MarginConfig,
) -> Result<MarginOutcome, MarginError> {
  let (width, height) = image.size();
  let mut pixels = image.read_pixels();
  let outcome = dilate_in_place(&mut pixels, width, height, config)?;
  image.write_pixels(&pixels);
  Ok(outcome)
}

/// A dilation run on a background thread, for callers that poll.
///
/// The buffer moves into the job at start and comes back from
/// [`MarginJob::join`]; there is no cancellation, matching the
/// run-to-completion model of the engine itself.
pub struct MarginJob {
  handle: thread::JoinHandle<Result<(Vec<f32>, MarginOutcome), MarginError>>,
}

impl MarginJob {
  /// Starts the run. Validation happens on the job thread; errors
  /// surface from [`MarginJob::join`].
  pub fn start(mut pixels: Vec<f32>, width: u32, height: u32, config: MarginConfig) -> Self {
    let handle = thread::Builder::new()
      .name("pixel-margin".into())
      .spawn(move || {
        let outcome = dilate_in_place(&mut pixels, width, height, &config)?;
        Ok((pixels, outcome))
      })
      .expect("failed to spawn margin job thread");
    Self { handle }
  }

  /// Whether the run is still in flight.
  pub fn is_running(&self) -> bool {
    !self.handle.is_finished()
  }

  /// Blocks until the run completes and returns the dilated buffer.
  pub fn join(self) -> Result<(Vec<f32>, MarginOutcome), MarginError> {
    self.handle.join().map_err(|_| MarginError::WorkerPanic)?
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_zero_sized_image_is_rejected() {
    let config = MarginConfig::default();
    let err = dilate_in_place(&mut [], 0, 4, &config).unwrap_err();
    assert!(matches!(err, MarginError::ZeroSizedImage { width: 0, height: 4 }));
  }

  #[test]
  fn test_buffer_length_is_checked() {
    let config = MarginConfig::default();
    let mut pixels = vec![0.0f32; 15];
    let err = dilate_in_place(&mut pixels, 2, 2, &config).unwrap_err();
    assert!(matches!(
      err,
      MarginError::BufferSizeMismatch {
        expected: 16,
        actual: 15
      }
    ));
  }

  #[test]
  fn test_fully_transparent_image_is_rejected() {
    let config = MarginConfig::default();
    let mut pixels = vec![0.0f32; 16];
    let err = dilate_in_place(&mut pixels, 2, 2, &config).unwrap_err();
    assert!(matches!(err, MarginError::NoOpaquePixels));
  }

  #[test]
  fn test_error_messages_name_the_numbers() {
    let err = MarginError::BufferSizeMismatch {
      expected: 16,
      actual: 15,
    };
    assert_eq!(
      err.to_string(),
      "pixel buffer length mismatch: expected 16, got 15"
    );
  }
}
