//! Pixel Margin - parallel infinite-margin (dilation) engine for flat
//! RGBA pixel buffers.
//!
//! Fills every transparent pixel with the color of the nearest opaque
//! pixel under an 8-directional expanding-ring search, extending painted
//! borders outward indefinitely. This removes the seams and halos that
//! appear when a baked texture is sampled with filtering past UV-island
//! edges.
//!
//! The buffer is split into contiguous partitions, one fill worker per
//! partition, all cooperating on the same shared canvas without locks;
//! see [`canvas`] for the write contract that makes that safe.
//!
//! ```
//! use pixel_margin::{MarginConfig, dilate_in_place};
//!
//! // 2x1: one red pixel, one transparent pixel.
//! let mut pixels = vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
//! let config = MarginConfig::default().with_workers(1);
//! let outcome = dilate_in_place(&mut pixels, 2, 1, &config).unwrap();
//! assert_eq!(outcome.filled, 1);
//! assert_eq!(&pixels[4..], &[1.0, 0.0, 0.0, 1.0]);
//! ```

pub mod canvas;
pub mod config;
pub mod engine;
pub mod fill;
pub mod geometry;
pub mod partition;
pub mod rays;

pub use canvas::MarginCanvas;
pub use config::{ConfigError, MAX_WORKERS, MIN_WORKERS, MarginConfig};
pub use engine::{
  MarginError, MarginImage, MarginJob, MarginOutcome, add_infinite_margin, dilate_in_place,
};
pub use fill::FillReport;
pub use geometry::{CHANNELS, ImageGeometry, StepTable};
pub use partition::partition_stacks;
pub use rays::RayTable;
