//! The dilation sweep and its convergence loop.
//!
//! Each worker scans the alpha channels of its assigned stack range.
//! Opaque stacks get their alpha normalized to 1.0 and are otherwise left
//! alone. For a transparent stack the worker re-centers its ray table and
//! takes the first in-bounds opaque hit in ring order; a diagonal hit is
//! straightened through the first opaque stack on the connecting line.
//! The whole run of stacks from the probe toward the resolved source is
//! then filled with the source color in one operation. Runs write
//! through fabricated stacks they cross, so a stack filled early in a
//! sweep is repainted when a later probe reaches an original source
//! through it; original stacks are never on a run's interior and keep
//! their color.
//!
//! The first sweep only accepts *original* opaque stacks as sources, so
//! fabricated colors never outcompete ground truth. The original-opaque
//! set is fixed for the entire run, which means a second strict sweep
//! could never find a candidate the first one missed, so every sweep
//! after the first accepts fabricated stacks too, letting fills propagate
//! until the partition converges. A relaxed sweep that fills nothing
//! while the global fill count is also unchanged proves the remaining
//! stacks unreachable; they are left transparent and reported rather
//! than spinning forever.

use std::ops::Range;

use crate::canvas::MarginCanvas;
use crate::geometry::{CHANNELS, StepTable};
use crate::rays::RayTable;

/// Per-worker result of one partition's convergence loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillReport {
  /// Sweeps run over the partition, including the final clean one.
  pub sweeps: u32,
  /// Stacks this worker filled (anywhere in the buffer, runs included).
  pub filled: usize,
  /// Stacks in the partition left transparent as unreachable.
  pub unfilled: usize,
}

/// Outcome of a single sweep over the scan range.
#[derive(Clone, Copy, Debug, Default)]
struct SweepStats {
  filled: usize,
  incomplete: usize,
}

/// Runs the convergence loop over one partition until it converges, the
/// remainder is proven unreachable, or `max_sweeps` is exhausted.
pub fn fill_partition(
  canvas: &MarginCanvas<'_>,
  steps: &StepTable,
  rays: &RayTable,
  stacks: Range<usize>,
  max_sweeps: Option<u32>,
) -> FillReport {
  #[cfg(feature = "tracy")]
  let _span = tracing::info_span!(
    "fill_partition",
    start = stacks.start,
    end = stacks.end
  )
  .entered();

  // Worker-local translated ray copy. The running offset persists across
  // sweeps so re-centering by `a - last_a` stays exact on every pass.
  let mut rays_at = rays.deltas().to_vec();
  let mut last_a = 0i64;

  let mut report = FillReport::default();
  let mut accept_modified = false;

  loop {
    report.sweeps += 1;
    let global_before = canvas.filled_count();

    let stats = sweep(
      canvas,
      steps,
      stacks.clone(),
      &mut rays_at,
      &mut last_a,
      accept_modified,
    );
    report.filled += stats.filled;

    if stats.incomplete == 0 {
      return report;
    }
    if let Some(cap) = max_sweeps
      && report.sweeps >= cap
    {
      log::warn!(
        "margin partition {:?} stopped at sweep cap {} with {} stacks unfilled",
        stacks,
        cap,
        stats.incomplete
      );
      report.unfilled = stats.incomplete;
      return report;
    }
    if !accept_modified {
      // Strict candidates are fixed for the whole run; switch to
      // accepting fabricated sources instead of re-running a sweep that
      // cannot find anything new.
      accept_modified = true;
      continue;
    }
    if stats.filled == 0 && canvas.filled_count() == global_before {
      // Nothing moved here or anywhere else: the remainder has no opaque
      // stack reachable by any ray.
      log::debug!(
        "margin partition {:?} left {} unreachable stacks transparent",
        stacks,
        stats.incomplete
      );
      report.unfilled = stats.incomplete;
      return report;
    }
  }
}

/// One pass over the scan range. Returns how many stacks were filled by
/// this worker and how many transparent stacks found no source.
fn sweep(
  canvas: &MarginCanvas<'_>,
  steps: &StepTable,
  stacks: Range<usize>,
  rays_at: &mut [i64],
  last_a: &mut i64,
  accept_modified: bool,
) -> SweepStats {
  let len = canvas.channel_len() as i64;
  let mut stats = SweepStats::default();

  for stack in stacks {
    let a = (stack * CHANNELS + 3) as i64;

    if canvas.channel(a as usize) != 0.0 {
      // Alpha is a presence flag downstream; pin it to exactly 1.0.
      canvas.set_channel(a as usize, 1.0);
      continue;
    }

    // Re-center the ray table on this stack.
    let shift = a - *last_a;
    if shift != 0 {
      for delta in rays_at.iter_mut() {
        *delta += shift;
      }
      *last_a = a;
    }

    let Some((ray_index, target_a)) = probe(canvas, rays_at, len, accept_modified) else {
      stats.incomplete += 1;
      continue;
    };

    let direction = RayTable::direction_of(ray_index);
    let step = steps.step(direction);

    let mut source_a = target_a;
    if !StepTable::is_cardinal(direction) {
      // Straighten a diagonal hit: the first opaque stack on the line
      // toward the target is closer, so its color wins. Any opaque stack
      // qualifies here, fabricated ones included.
      let mut line = a + step;
      while line != target_a {
        if canvas.channel(line as usize) != 0.0 {
          source_a = line;
          break;
        }
        line += step;
      }
    }

    stats.filled += fill_run(canvas, a, source_a, step);
  }

  stats
}

/// Finds the first surviving ray in ring order: in bounds, pointing at an
/// opaque stack, and (in strict mode) not at a fabricated fill.
#[inline]
fn probe(
  canvas: &MarginCanvas<'_>,
  rays_at: &[i64],
  len: i64,
  accept_modified: bool,
) -> Option<(usize, i64)> {
  for (index, &target) in rays_at.iter().enumerate() {
    if target < 0 || target >= len {
      continue;
    }
    let target_u = target as usize;
    if canvas.channel(target_u) == 0.0 {
      continue;
    }
    if !accept_modified && canvas.is_modified(target_u / CHANNELS) {
      continue;
    }
    return Some((index, target));
  }
  None
}

/// Fills every stack from `a` (inclusive) toward `source_a` (exclusive)
/// along `step` with the source's RGBA. Fabricated stacks on the way are
/// repainted, so the last run through a stack decides its color. Returns
/// how many stacks this worker newly claimed; repaints are not counted
/// again.
fn fill_run(canvas: &MarginCanvas<'_>, a: i64, source_a: i64, step: i64) -> usize {
  let rgba = canvas.read_stack((source_a - 3) as usize);
  let stack_step = step / CHANNELS as i64;
  let source_stack = source_a / CHANNELS as i64;

  let mut filled = 0;
  let mut stack = a / CHANNELS as i64;
  while stack != source_stack {
    let stack_u = stack as usize;
    if canvas.claim(stack_u) {
      filled += 1;
    }
    canvas.write_stack(stack_u, rgba);
    stack += stack_step;
  }
  filled
}
