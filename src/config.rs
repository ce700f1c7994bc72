//! Run configuration.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Deserialize;

/// Lowest worker count a run is clamped to.
pub const MIN_WORKERS: usize = 1;

/// Highest worker count a run is clamped to.
pub const MAX_WORKERS: usize = 61;

/// Configuration surface of a dilation run.
///
/// # Example
/// ```
/// use pixel_margin::MarginConfig;
///
/// let config = MarginConfig::default().with_workers(8);
/// assert_eq!(config.clamped_workers(), 8);
/// ```
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MarginConfig {
  /// Requested worker count; clamped to `[1, 61]` at run time.
  pub workers: usize,
  /// Optional hard cap on sweeps per partition. `None` runs each
  /// partition until it converges or proves its remainder unreachable.
  pub max_sweeps: Option<u32>,
}

impl Default for MarginConfig {
  fn default() -> Self {
    Self {
      workers: std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS),
      max_sweeps: None,
    }
  }
}

impl MarginConfig {
  /// Sets the requested worker count.
  pub fn with_workers(mut self, workers: usize) -> Self {
    self.workers = workers;
    self
  }

  /// Sets the per-partition sweep cap.
  pub fn with_max_sweeps(mut self, max_sweeps: u32) -> Self {
    self.max_sweeps = Some(max_sweeps);
    self
  }

  /// Worker count actually used by a run.
  #[inline]
  pub fn clamped_workers(&self) -> usize {
    self.workers.clamp(MIN_WORKERS, MAX_WORKERS)
  }

  /// Parses a config from TOML text.
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(text)?)
  }

  /// Loads a config from a TOML file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_toml_str(&text)
  }
}

/// Error reading or parsing a config file.
#[derive(Debug)]
pub enum ConfigError {
  Io(io::Error),
  Parse(toml::de::Error),
}

impl From<io::Error> for ConfigError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(e) => write!(f, "I/O error: {}", e),
      Self::Parse(e) => write!(f, "config parse error: {}", e),
    }
  }
}

impl std::error::Error for ConfigError {}
