//! Multi-scale pyramid driver.
//!
//! Builds the single continuous heightfield the rest of the pipeline (flow
//! solver, hydrology, river carver, erosion, tile extraction) operates on.
//! This is the authoritative continuous-then-split architecture; there is
//! no per-tile-then-blend path in this crate.

use rayon::prelude::*;

use crate::biome::BiomeParams;
use crate::config::GenConfig;
use crate::filters::{Filter, SlopeBlurParams};
use crate::heightfield::HeightField;
use crate::noise::{self, FbmConfig};

/// Reduce a `u64` seed to a small, well-conditioned scalar for use inside
/// `sin()`-based hashing. Keeps the FBM coordinate offsets in a range where
/// `f64` sine stays numerically stable regardless of how large the seed is.
fn seed_scalar(seed: u64) -> f64 {
    (seed % 1_000_003) as f64 * 1e-3
}

fn add_fbm_layer(field: &mut HeightField, cfg: &FbmConfig, seed: u64, world_scale: f64) {
    let (w, h) = (field.width, field.height);
    let seed_f = seed_scalar(seed);

    let rows: Vec<Vec<f32>> = (0..h)
        .into_par_iter()
        .map(|y| {
            let mut row = Vec::with_capacity(w);
            for x in 0..w {
                let (u, v) = noise::canvas_uv(x, y, w, h, world_scale);
                let contribution = noise::fbm(u, v, seed_f, cfg) as f32;
                row.push(field.get(x as i64, y as i64) + contribution);
            }
            row
        })
        .collect();

    for (y, row) in rows.into_iter().enumerate() {
        for (x, v) in row.into_iter().enumerate() {
            field.set(x, y, v);
        }
    }
}

/// Runs the `base * 2^i` level schedule and resamples the final square
/// level down to the exact rectangular canvas the grid config requires.
pub struct PyramidPipeline;

impl PyramidPipeline {
    pub fn generate(cfg: &GenConfig, biome: &BiomeParams) -> HeightField {
        let final_size = cfg.pyramid_final_size();
        let mut field = HeightField::create(cfg.base_size, cfg.base_size, 0.0);

        for i in 0..cfg.effective_steps() {
            let size = cfg.base_size * 2usize.pow(i);
            field = field.resample_to(size, size);

            let attenuated_amplitude =
                biome.fbm.amplitude / (1.0 + (final_size.saturating_sub(size)) as f64 / 128.0);
            let level_fbm = FbmConfig {
                amplitude: attenuated_amplitude,
                ..biome.fbm.clone()
            };
            add_fbm_layer(&mut field, &level_fbm, cfg.seed, cfg.world_scale);

            let slope_params = SlopeBlurParams {
                radius: biome.slope_blur.radius,
                k: biome.slope_blur.k,
                iterations: biome.slope_blur.iterations,
            };
            Filter::SlopeBlur(&slope_params).apply(&mut field);

            if size >= 256 {
                if let Some(dunes) = &biome.dunes {
                    Filter::Dunes(dunes).apply(&mut field);
                }
            }
        }

        Filter::RidgeSharpen(biome.ridge_sharpen).apply(&mut field);

        let (canvas_w, canvas_h) = cfg.canvas_size();
        field.resample_to(canvas_w, canvas_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeKind;

    #[test]
    fn generate_produces_exact_canvas_size() {
        let cfg = GenConfig {
            rows: 1,
            cols: 1,
            tile_size: 256,
            overlap: 16,
            base_size: 32,
            ..GenConfig::default()
        };
        let biome = BiomeKind::Temperate.params();
        let field = PyramidPipeline::generate(&cfg, &biome);
        let (w, h) = cfg.canvas_size();
        assert_eq!((field.width, field.height), (w, h));
    }

    #[test]
    fn generate_is_deterministic() {
        let cfg = GenConfig {
            rows: 1,
            cols: 1,
            tile_size: 256,
            overlap: 16,
            base_size: 32,
            seed: 1337,
            ..GenConfig::default()
        };
        let biome = BiomeKind::Temperate.params();
        let a = PyramidPipeline::generate(&cfg, &biome);
        let b = PyramidPipeline::generate(&cfg, &biome);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_amplitude_and_ridge_and_no_dunes_reduces_variance() {
        let cfg = GenConfig {
            rows: 1,
            cols: 1,
            tile_size: 256,
            overlap: 16,
            base_size: 32,
            seed: 7,
            ..GenConfig::default()
        };
        let base = BiomeKind::Temperate.params();
        let mut flattened = base.clone();
        flattened.fbm.amplitude = 0.0;
        flattened.ridge_sharpen = 0.0;
        flattened.dunes = None;

        let variance = |f: &HeightField| -> f64 {
            let n = (f.width * f.height) as f64;
            let mean: f64 = f.as_slice().iter().map(|&v| v as f64).sum::<f64>() / n;
            f.as_slice()
                .iter()
                .map(|&v| (v as f64 - mean).powi(2))
                .sum::<f64>()
                / n
        };

        let v_base = variance(&PyramidPipeline::generate(&cfg, &base));
        let v_flat = variance(&PyramidPipeline::generate(&cfg, &flattened));
        assert!(v_flat < v_base);
    }
}
