//! Hydrology mask builder.
//!
//! Derives the river, water, and beach masks from the flow-accumulation
//! field. The dilation/tributary-band shaping has no direct prior
//! analogue. Flow accumulation was previously thresholded only to decide
//! river *sources* (`rivers::RiverErosionParams::source_min_accumulation`),
//! not to shape a continuous mask, so it is grounded in the same
//! radius-weighted-falloff style as `erosion::utils::create_erosion_brush`.

use crate::heightfield::HeightField;

/// Build the river mask from flow accumulation and a threshold in `[0,1]`.
/// Returns an all-zero mask when the flow field is entirely flat, an
/// in-band fallback rather than an error.
pub fn river_mask(flow: &HeightField, threshold: f32) -> HeightField {
    let (w, h) = (flow.width, flow.height);
    let f_max = flow.as_slice().iter().cloned().fold(0.0f32, f32::max);

    let mut base = HeightField::create(w, h, 0.0);
    if f_max <= 0.0 || threshold >= 1.0 {
        return base;
    }

    for (x, y) in flow.iter_coords() {
        let n = flow.get(x as i64, y as i64) / f_max;
        let value = if n > threshold {
            (1.0f32).min((n - threshold) / (1.0 - threshold))
        } else if n > 0.3 * threshold {
            ((n - 0.3 * threshold) / (0.7 * threshold)) * 0.3
        } else {
            0.0
        };
        base.set(x, y, value);
    }

    // Dilation pass: cells with base > 0.5 spill into neighbors within radius 1.5.
    let mut result = base.clone();
    let radius = 1.5f32;
    let r = radius.ceil() as i32;
    for (x, y) in base.iter_coords() {
        let bp = base.get(x as i64, y as i64);
        if bp <= 0.5 {
            continue;
        }
        for dy in -r..=r {
            for dx in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                if dist > radius {
                    continue;
                }
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                let expansion = bp * 0.6 * (1.0 - dist / radius);
                let cur = result.get(nx as i64, ny as i64);
                result.set(nx as usize, ny as usize, cur.max(expansion));
            }
        }
    }

    result
}

/// `waterMask(p) = max([H(p) <= seaLevel], riverMask(p))`.
pub fn water_mask(height: &HeightField, river: &HeightField, sea_level: f32) -> HeightField {
    let (w, h) = (height.width, height.height);
    let mut out = HeightField::create(w, h, 0.0);
    for (x, y) in out.iter_coords() {
        let is_sea = if height.get(x as i64, y as i64) <= sea_level {
            1.0
        } else {
            0.0
        };
        let river_v = river.get(x as i64, y as i64);
        out.set(x, y, is_sea.max(river_v));
    }
    out
}

/// Beach mask: land cells within `beach_width` pixels of water, falloff
/// linear in distance.
pub fn beach_mask(water: &HeightField, beach_width: f32) -> HeightField {
    let (w, h) = (water.width, water.height);
    let window = beach_width.ceil() as i32;
    let mut out = HeightField::create(w, h, 0.0);

    for (x, y) in water.iter_coords() {
        if water.get(x as i64, y as i64) >= 1.0 {
            continue; // water cells themselves contribute no beach value
        }
        let mut min_dist: Option<f32> = None;
        for dy in -window..=window {
            for dx in -window..=window {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                if water.get(nx as i64, ny as i64) >= 1.0 {
                    let dist = ((dx * dx + dy * dy) as f32).sqrt();
                    min_dist = Some(min_dist.map_or(dist, |d| d.min(dist)));
                }
            }
        }
        if let Some(dist) = min_dist {
            let v = (1.0 - dist / beach_width).max(0.0);
            out.set(x, y, v);
        }
    }

    out
}
