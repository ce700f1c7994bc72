//! Expanding-ring ray-offset table.
//!
//! A probe from a transparent stack walks rings of increasing radius.
//! Ring `r` contributes the four cardinal deltas at multiplier `r + 1`
//! followed by the four diagonal deltas at multiplier `r`, so cardinal
//! hits win ties within a ring. The table is built once per run as deltas
//! relative to the probing alpha index; workers re-center their own copy
//! by additive translation while scanning.

use crate::geometry::{DIRECTIONS, StepTable};

/// Flat sequence of ray deltas ordered by ring radius.
///
/// Immutable after construction. Entry `i` steps along direction
/// `i % 8`, which is how a hit is mapped back to its step delta.
pub struct RayTable {
  deltas: Vec<i64>,
}

impl RayTable {
  /// Builds the table for `rings` expanding rings.
  ///
  /// Ring 0's diagonal multipliers are zero, producing four self-deltas;
  /// they always point at the (transparent) probing stack and fall out of
  /// the opacity filter, matching the reference table layout.
  pub fn build(steps: &StepTable, rings: usize) -> Self {
    let mut deltas = Vec::with_capacity(rings * DIRECTIONS);
    for ring in 0..rings as i64 {
      for direction in 0..DIRECTIONS {
        let multiplier = if StepTable::is_cardinal(direction) {
          ring + 1
        } else {
          ring
        };
        deltas.push(steps.step(direction) * multiplier);
      }
    }
    Self { deltas }
  }

  /// The ray deltas in probe order.
  #[inline]
  pub fn deltas(&self) -> &[i64] {
    &self.deltas
  }

  /// Number of entries (`rings * 8`).
  #[inline]
  pub fn len(&self) -> usize {
    self.deltas.len()
  }

  /// Returns true if the table holds no rays.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.deltas.is_empty()
  }

  /// Direction index of entry `index`.
  #[inline]
  pub fn direction_of(index: usize) -> usize {
    index % DIRECTIONS
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::ImageGeometry;

  #[test]
  fn test_table_length_is_rings_times_directions() {
    let geometry = ImageGeometry::new(5, 3);
    let steps = StepTable::new(&geometry);
    let rays = RayTable::build(&steps, geometry.ring_count());
    assert_eq!(rays.len(), 5 * 8);
  }

  #[test]
  fn test_first_two_rings_for_4x4() {
    let geometry = ImageGeometry::new(4, 4);
    let steps = StepTable::new(&geometry);
    let rays = RayTable::build(&steps, 2);
    assert_eq!(
      rays.deltas(),
      &[
        // Ring 0: cardinals at distance 1, diagonals at distance 0.
        16, 4, -16, -4, 0, 0, 0, 0,
        // Ring 1: cardinals at distance 2, diagonals at distance 1.
        32, 8, -32, -8, 20, -12, -20, 12,
      ]
    );
  }

  #[test]
  fn test_direction_recovery() {
    assert_eq!(RayTable::direction_of(0), 0);
    assert_eq!(RayTable::direction_of(7), 7);
    assert_eq!(RayTable::direction_of(13), 5);
  }
}
