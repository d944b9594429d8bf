//! Filter bank.
//!
//! Filters are modeled as a variant over `{SlopeBlur, RidgeSharpen, Dunes}`
//! with a single `apply` entry point. FBM accumulation itself is driven
//! directly by [`crate::pipeline`] rather than through this enum, since it
//! adds a scalar per-pixel contribution rather than transforming an
//! existing field in place.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::heightfield::HeightField;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SlopeBlurParams {
    pub radius: usize,
    pub k: f64,
    pub iterations: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DunesParams {
    pub scale: f64,
    pub amplitude: f64,
    pub direction_radians: f64,
}

/// One filter-bank operation and its parameters.
pub enum Filter<'a> {
    SlopeBlur(&'a SlopeBlurParams),
    RidgeSharpen(f64),
    Dunes(&'a DunesParams),
}

impl<'a> Filter<'a> {
    pub fn apply(&self, field: &mut HeightField) {
        match self {
            Filter::SlopeBlur(p) => slope_blur(field, p),
            Filter::RidgeSharpen(strength) => ridge_sharpen(field, *strength),
            Filter::Dunes(p) => dunes(field, p),
        }
    }
}

fn central_gradient(field: &HeightField, x: i64, y: i64) -> (f32, f32) {
    let dx = (field.get(x + 1, y) - field.get(x - 1, y)) * 0.5;
    let dy = (field.get(x, y + 1) - field.get(x, y - 1)) * 0.5;
    (dx, dy)
}

/// Slope-adaptive blur. Run for `iterations` double-buffered passes;
/// effective radius shrinks on steep slopes so ridgelines stay sharp while
/// flats smooth out.
pub fn slope_blur(field: &mut HeightField, params: &SlopeBlurParams) {
    for _ in 0..params.iterations {
        let src = field.clone();
        let width = src.width;
        let height = src.height;

        let rows: Vec<Vec<f32>> = (0..height)
            .into_par_iter()
            .map(|y| {
                let mut row = Vec::with_capacity(width);
                for x in 0..width {
                    let (gx, gy) = central_gradient(&src, x as i64, y as i64);
                    let s = ((gx * gx + gy * gy) as f64).sqrt();
                    let r_eff = (params.radius as f64 * (1.0 - params.k * (10.0 * s).min(1.0)))
                        .round()
                        .max(1.0) as i64;

                    let mut sum = 0.0f64;
                    let mut count = 0.0f64;
                    for dy in -r_eff..=r_eff {
                        for dx in -r_eff..=r_eff {
                            sum += src.get(x as i64 + dx, y as i64 + dy) as f64;
                            count += 1.0;
                        }
                    }
                    row.push((sum / count) as f32);
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
}

/// Unsharp mask via the 5-point Laplacian.
pub fn ridge_sharpen(field: &mut HeightField, strength: f64) {
    let src = field.clone();
    for y in 0..field.height {
        for x in 0..field.width {
            let (xi, yi) = (x as i64, y as i64);
            let h = src.get(xi, yi);
            let laplacian = src.get(xi + 1, yi) + src.get(xi - 1, yi) + src.get(xi, yi + 1)
                + src.get(xi, yi - 1)
                - 4.0 * h;
            field.set(x, y, h - (strength as f32) * laplacian);
        }
    }
}

/// Directional dune sinusoid, only meaningful at resolutions >= 256; callers
/// gate the resolution check (see [`crate::pipeline::PyramidPipeline`]).
pub fn dunes(field: &mut HeightField, params: &DunesParams) {
    let n = field.width.max(field.height) as f64;
    let (cos_t, sin_t) = (params.direction_radians.cos(), params.direction_radians.sin());
    for y in 0..field.height {
        for x in 0..field.width {
            let proj = (x as f64 * cos_t + y as f64 * sin_t) / n;
            let d = (proj * params.scale * std::f64::consts::TAU).sin() * params.amplitude;
            let h = field.get(x as i64, y as i64);
            field.set(x, y, h + d as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_blur_smooths_flat_field_to_itself() {
        let mut h = HeightField::create(16, 16, 3.0);
        let params = SlopeBlurParams {
            radius: 2,
            k: 0.4,
            iterations: 2,
        };
        slope_blur(&mut h, &params);
        for (x, y) in h.iter_coords() {
            assert!((h.get(x as i64, y as i64) - 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn ridge_sharpen_is_noop_on_flat_field() {
        let mut h = HeightField::create(8, 8, 2.0);
        ridge_sharpen(&mut h, 0.35);
        for (x, y) in h.iter_coords() {
            assert!((h.get(x as i64, y as i64) - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn dunes_adds_bounded_sinusoid() {
        let mut h = HeightField::create(256, 256, 0.0);
        let params = DunesParams {
            scale: 16.0,
            amplitude: 0.03,
            direction_radians: std::f64::consts::FRAC_PI_4,
        };
        dunes(&mut h, &params);
        for (x, y) in h.iter_coords() {
            assert!(h.get(x as i64, y as i64).abs() <= 0.03 + 1e-6);
        }
    }
}
