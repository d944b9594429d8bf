//! Error taxonomy for the terrain core.
//!
//! Only configuration mistakes are reported as errors. Everything else the
//! pipeline can encounter (an all-zero flow field, a degenerate seed) is
//! handled in-band with a defined fallback output; see the module docs on
//! [`crate::hydrology`] for the all-zero-flow case.
//!
//! Modeled on the `erosion::ErosionError` style of one `thiserror` enum per
//! failure surface; the derive-heavy layout is borrowed from
//! `terra-core`'s error module.

use thiserror::Error;

/// Validation failure surfaced before any generation work begins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("overlap {overlap} must be > 0 and 2*overlap < tileSize {tile_size}")]
    InvalidOverlap { overlap: usize, tile_size: usize },

    #[error("rows and cols must be >= 1, got rows={rows} cols={cols}")]
    InvalidGridDimensions { rows: usize, cols: usize },

    #[error(
        "tileSize {tile_size} is not reachable from baseSize {base_size} after {steps} pyramid steps"
    )]
    TileSizeNotCoveredByPyramid {
        tile_size: usize,
        base_size: usize,
        steps: u32,
    },
}
