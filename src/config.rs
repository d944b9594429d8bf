//! Grid and erosion configuration accepted by [`crate::generator::generate`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level knobs for a single [`generate`](crate::generator::generate) call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenConfig {
    /// Number of tile rows.
    pub rows: usize,
    /// Number of tile columns.
    pub cols: usize,
    /// Side length of one tile, including its overlap margin on both sides.
    pub tile_size: usize,
    /// Overlap margin shared by all four sides of a tile.
    pub overlap: usize,
    /// Side length of the smallest pyramid level.
    pub base_size: usize,
    /// Number of pyramid levels; level `i` has side `base_size * 2^i`.
    /// `None` derives the count from `log2` of the canvas's largest
    /// dimension (see [`Self::effective_steps`]), per the default described
    /// in `spec.md` §6 ("steps (default derived from log2 of atlas size)").
    pub steps: Option<u32>,
    /// World-space scale applied to FBM sampling coordinates.
    pub world_scale: f64,
    /// Master seed. Determines every downstream noise and erosion result.
    pub seed: u64,
    /// Legacy seam-blend mode. Weakens the tile-continuity invariant; off by default.
    pub blend_seams: bool,
    /// Sea level in meters, used by the hydrology mask builder and erosion.
    pub sea_level_m: f32,
    /// Simulated geological time budget, in years, for [`crate::erosion`].
    pub erosion_years: f64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            tile_size: 512,
            overlap: 32,
            base_size: 64,
            steps: None,
            world_scale: 1.0,
            seed: 0,
            blend_seams: false,
            sea_level_m: 23.0,
            erosion_years: 2500.0,
        }
    }
}

impl GenConfig {
    /// Side length of a tile's inner (atlas-contributing) region.
    pub fn inner_size(&self) -> usize {
        self.tile_size - 2 * self.overlap
    }

    /// Width/height, in pixels, of the continuous heightfield the pipeline
    /// must produce before tiles are extracted.
    pub fn canvas_size(&self) -> (usize, usize) {
        let inner = self.inner_size();
        (
            self.cols * inner + 2 * self.overlap,
            self.rows * inner + 2 * self.overlap,
        )
    }

    /// Number of pyramid levels to run. Uses the explicit override when
    /// set; otherwise derives the smallest step count whose final level
    /// (`base_size * 2^(steps-1)`) reaches the canvas's largest dimension,
    /// i.e. `ceil(log2(canvas_max / base_size)) + 1`. This is what makes the
    /// unconfigured default always produce a pyramid large enough for
    /// whatever grid shape the caller asked for, rather than a fixed
    /// constant that only happens to cover a 1x1 grid.
    pub fn effective_steps(&self) -> u32 {
        if let Some(s) = self.steps {
            return s;
        }
        let (canvas_w, canvas_h) = self.canvas_size();
        let target = canvas_w.max(canvas_h).max(self.base_size.max(1));
        let mut size = self.base_size.max(1);
        let mut steps = 1u32;
        while size < target {
            size *= 2;
            steps += 1;
        }
        steps
    }

    /// Side length of the pyramid's final (square) level.
    pub fn pyramid_final_size(&self) -> usize {
        self.base_size * 2usize.pow(self.effective_steps().saturating_sub(1))
    }

    /// Validate the config, surfacing every dimension mismatch as a
    /// [`ConfigError`] before any allocation happens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < 1 || self.cols < 1 {
            return Err(ConfigError::InvalidGridDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.overlap == 0 || 2 * self.overlap >= self.tile_size {
            return Err(ConfigError::InvalidOverlap {
                overlap: self.overlap,
                tile_size: self.tile_size,
            });
        }
        let (canvas_w, canvas_h) = self.canvas_size();
        let final_size = self.pyramid_final_size();
        if final_size < canvas_w.max(canvas_h) {
            return Err(ConfigError::TileSizeNotCoveredByPyramid {
                tile_size: self.tile_size,
                base_size: self.base_size,
                steps: self.effective_steps(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GenConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_overlap_not_less_than_half_tile() {
        let cfg = GenConfig {
            overlap: 256,
            tile_size: 512,
            ..GenConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidOverlap { .. })
        ));
    }

    #[test]
    fn rejects_zero_rows() {
        let cfg = GenConfig {
            rows: 0,
            ..GenConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidGridDimensions { .. })
        ));
    }

    #[test]
    fn rejects_pyramid_too_small_for_grid() {
        let cfg = GenConfig {
            rows: 4,
            cols: 4,
            steps: Some(1),
            ..GenConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TileSizeNotCoveredByPyramid { .. })
        ));
    }

    #[test]
    fn inner_and_canvas_size_agree_with_grid_formula() {
        let cfg = GenConfig {
            rows: 2,
            cols: 3,
            tile_size: 512,
            overlap: 32,
            ..GenConfig::default()
        };
        assert_eq!(cfg.inner_size(), 448);
        assert_eq!(cfg.canvas_size(), (3 * 448 + 64, 2 * 448 + 64));
    }
}
