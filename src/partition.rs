//! Static work distribution across fill workers.
//!
//! The stack range is split once, up front, into contiguous roughly-equal
//! sub-ranges; there is no rebalancing if one partition converges slower
//! than the rest. Partitions bound each worker's *scan* responsibility
//! only; run fills may write past a partition edge into a neighbor's
//! range, which the canvas claim protocol makes safe.

use std::ops::Range;

/// Splits `stack_count` stacks into `workers` contiguous half-open
/// ranges covering `[0, stack_count)` exactly once.
///
/// Ranges are stack-aligned so every scanned index `4s + 3` is a real
/// alpha channel. The last range absorbs the division remainder; with
/// more workers than stacks the leading ranges are empty and the tail
/// takes everything. `workers` must already be clamped to at least 1.
pub fn partition_stacks(stack_count: usize, workers: usize) -> Vec<Range<usize>> {
  debug_assert!(workers >= 1, "worker count must be clamped before partitioning");

  let section = stack_count / workers;
  (0..workers)
    .map(|worker| {
      let start = worker * section;
      let stop = if worker + 1 == workers {
        stack_count
      } else {
        (worker + 1) * section
      };
      start..stop
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Asserts that `ranges` tile `[0, stack_count)` exactly once.
  fn assert_exact_cover(ranges: &[Range<usize>], stack_count: usize) {
    let mut next = 0;
    for range in ranges {
      assert_eq!(range.start, next, "ranges must be contiguous");
      assert!(range.start <= range.end);
      next = range.end;
    }
    assert_eq!(next, stack_count, "ranges must cover the whole buffer");
  }

  #[test]
  fn test_single_worker_covers_everything() {
    let ranges = partition_stacks(64, 1);
    assert_eq!(ranges, vec![0..64]);
  }

  #[test]
  fn test_remainder_goes_to_last_partition() {
    let ranges = partition_stacks(10, 3);
    assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
    assert_exact_cover(&ranges, 10);
  }

  #[test]
  fn test_even_split() {
    let ranges = partition_stacks(16, 4);
    assert_eq!(ranges, vec![0..4, 4..8, 8..12, 12..16]);
  }

  #[test]
  fn test_more_workers_than_stacks() {
    let ranges = partition_stacks(4, 8);
    assert_exact_cover(&ranges, 4);
    // Leading sections are empty, the tail picks up every stack.
    assert!(ranges[..7].iter().all(|r| r.is_empty()));
    assert_eq!(ranges[7], 0..4);
  }

  #[test]
  fn test_empty_buffer() {
    let ranges = partition_stacks(0, 3);
    assert_exact_cover(&ranges, 0);
  }
}
