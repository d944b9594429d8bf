//! Deterministic 2D value noise and FBM with domain warp.
//!
//! The hash is a sine-lattice value noise, not the `noise` crate's `Perlin`,
//! kept deliberately simple and closed-form for bit-identical
//! reproducibility across tile seams rather than swapping in a
//! higher-quality hash-lattice noise.

use serde::{Deserialize, Serialize};

/// Coordinates are rounded to this grid before `floor`/`fract`, so that two
/// tiles sampling the same nominal world coordinate agree bit-for-bit even
/// after independent floating point roundoff.
const COORD_QUANT: f64 = 1e-6;

fn quantize(v: f64) -> f64 {
    (v / COORD_QUANT).round() * COORD_QUANT
}

fn hash_corner(i: f64, j: f64) -> f64 {
    let s = (i * 15731.0 + j * 789221.0).sin() * 43758.5453123;
    s - s.floor()
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Deterministic 2D value noise in `[0,1]`: hash the four lattice corners,
/// smoothstep-interpolate between them.
pub fn value_noise(x: f64, y: f64) -> f64 {
    let x = quantize(x);
    let y = quantize(y);

    let xi = x.floor();
    let yi = y.floor();
    let xf = x - xi;
    let yf = y - yi;

    let h00 = hash_corner(xi, yi);
    let h10 = hash_corner(xi + 1.0, yi);
    let h01 = hash_corner(xi, yi + 1.0);
    let h11 = hash_corner(xi + 1.0, yi + 1.0);

    let u = smoothstep(xf);
    let v = smoothstep(yf);

    let a = h00 * (1.0 - u) + h10 * u;
    let b = h01 * (1.0 - u) + h11 * u;
    a * (1.0 - v) + b * v
}

/// Parameters for one FBM accumulation pass.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FbmConfig {
    pub amplitude: f64,
    pub frequency: f64,
    pub octaves: u32,
    pub lacunarity: f64,
    pub gain: f64,
    pub warp: f64,
}

/// Accumulate an FBM sample with domain warp at world coordinates `(u,v)`,
/// returning the height contribution to add to the field (not an absolute
/// height).
pub fn fbm(u: f64, v: f64, seed: f64, cfg: &FbmConfig) -> f64 {
    let wx = value_noise((u + seed) * 8.123, (v - seed) * 7.321) * cfg.warp;
    let wy = value_noise((u - seed) * 5.551, (v + seed) * 9.173) * cfg.warp;

    let mut sum = 0.0;
    let mut amp = 1.0;
    let mut freq = cfg.frequency;
    for _ in 0..cfg.octaves {
        sum += value_noise((u + wx) * freq + seed * 1.7, (v + wy) * freq - seed * 2.1) * amp;
        freq *= cfg.lacunarity;
        amp *= cfg.gain;
    }

    (sum * 2.0 - 1.0) * cfg.amplitude
}

/// Map a pixel at tile grid position `(r,c,x,y)` within an `inner x inner`
/// tile to the shared world-UV coordinate sampled by the continuous pipeline.
/// This is what guarantees adjacent tiles sample identical coordinates
/// along their shared seam.
pub fn world_uv(r: usize, c: usize, x_inner: usize, y_inner: usize, inner: usize, scale: f64) -> (f64, f64) {
    let denom = (inner - 1).max(1) as f64;
    let u = (c as f64 + x_inner as f64 / denom) * scale;
    let v = (r as f64 + y_inner as f64 / denom) * scale;
    (u, v)
}

/// Normalized `(u,v)` for a pixel in the single continuous canvas, scaled by
/// `world_scale`. Because the continuous-then-split pipeline samples every
/// pixel of one backing array exactly once, any two grid-adjacent tiles
/// necessarily read the same array cells along their shared edge regardless
/// of which UV parametrization is used; `world_uv` above is the
/// per-tile-then-blend formula this degenerates to when treated as one tile
/// spanning the whole canvas.
pub fn canvas_uv(x: usize, y: usize, w: usize, h: usize, scale: f64) -> (f64, f64) {
    let denom_x = (w - 1).max(1) as f64;
    let denom_y = (h - 1).max(1) as f64;
    (x as f64 / denom_x * scale, y as f64 / denom_y * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_noise_in_unit_range() {
        for i in 0..50 {
            let x = i as f64 * 0.37;
            let y = i as f64 * 0.11;
            let n = value_noise(x, y);
            assert!((0.0..=1.0).contains(&n), "noise({x},{y}) = {n}");
        }
    }

    #[test]
    fn value_noise_is_deterministic() {
        assert_eq!(value_noise(1.2345, 6.789), value_noise(1.2345, 6.789));
    }

    #[test]
    fn value_noise_quantizes_drift() {
        let a = value_noise(1.0, 1.0);
        let b = value_noise(1.0 + 1e-9, 1.0 - 1e-9);
        assert_eq!(a, b);
    }

    #[test]
    fn world_uv_matches_across_shared_seam() {
        let inner = 64;
        // Right edge of tile (0,0) == left edge of tile (0,1).
        let right_edge = world_uv(0, 0, inner - 1, 10, inner, 1.0);
        let left_edge = world_uv(0, 1, 0, 10, inner, 1.0);
        assert_eq!(right_edge, left_edge);
    }

    #[test]
    fn fbm_is_deterministic_given_same_inputs() {
        let cfg = FbmConfig {
            amplitude: 0.22,
            frequency: 1.6,
            octaves: 5,
            lacunarity: 2.0,
            gain: 0.5,
            warp: 0.1,
        };
        let a = fbm(0.3, 0.7, 1337.0, &cfg);
        let b = fbm(0.3, 0.7, 1337.0, &cfg);
        assert_eq!(a, b);
    }
}
