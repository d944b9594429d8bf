//! River carver.
//!
//! Hardness-adaptive channel erosion plus a two-pass connection smoother.
//! The hardness-band profile selection (canyon/normal/broad) generalizes
//! the single-profile channel carving of `erosion::rivers::erode_rivers`
//! into three named bands; the per-cell hardness formula below replaces the
//! rock-type-driven hardness of `erosion::materials` with a purely
//! geometric slope+height formula; there is no rock typology in this
//! crate.

use crate::heightfield::HeightField;

const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Per-cell resistance to fluvial erosion.
pub fn hardness_map(height: &HeightField) -> HeightField {
    let (w, h) = (height.width, height.height);
    let mut out = HeightField::create(w, h, 0.0);
    for (x, y) in height.iter_coords() {
        let hp = height.get(x as i64, y as i64);
        let mut sum = 0.0f32;
        for &(dx, dy) in &NEIGHBORS_8 {
            let hn = height.get(x as i64 + dx as i64, y as i64 + dy as i64);
            sum += (hp - hn).abs();
        }
        let avg_slope = sum / 8.0;
        let height_factor = (hp + 0.3).max(0.0);
        let hardness = (3.0 * avg_slope + 0.4 * height_factor).min(1.0);
        out.set(x, y, hardness);
    }
    out
}

struct Profile {
    carve_width: f32,
    carve_depth: f32,
    erosion_at: fn(f32) -> f32,
}

fn canyon_profile(erosion_width: f32, erosion_depth: f32) -> Profile {
    Profile {
        carve_width: 0.3 * erosion_width,
        carve_depth: 2.0 * erosion_depth,
        erosion_at: |d| (1.0 - d * d).max(0.0),
    }
}

fn normal_profile(erosion_width: f32, erosion_depth: f32) -> Profile {
    Profile {
        carve_width: 0.7 * erosion_width,
        carve_depth: 1.2 * erosion_depth,
        erosion_at: |d| (1.0 - d.powf(1.5)).max(0.0),
    }
}

fn broad_profile(erosion_width: f32, erosion_depth: f32) -> Profile {
    Profile {
        carve_width: 1.8 * erosion_width,
        carve_depth: 0.4 * erosion_depth,
        erosion_at: |d| (std::f32::consts::FRAC_PI_2 * d).cos().max(0.0),
    }
}

fn profile_for(hardness: f32, width: f32, depth: f32) -> Profile {
    if hardness > 0.7 {
        canyon_profile(width, depth)
    } else if hardness > 0.4 {
        normal_profile(width, depth)
    } else {
        broad_profile(width, depth)
    }
}

/// Carve rivers into `height` given `river_mask`, base channel `width` and
/// `depth`, and the precomputed `hardness` map.
pub fn carve_rivers(height: &mut HeightField, river: &HeightField, hardness: &HeightField, width: f32, depth: f32) {
    let (w, h) = (height.width, height.height);
    let mut delta = HeightField::create(w, h, 0.0);

    for (x, y) in height.iter_coords() {
        let m = river.get(x as i64, y as i64);
        if m <= 0.0 {
            continue;
        }
        let hard = hardness.get(x as i64, y as i64);
        let profile = profile_for(hard, width, depth);
        let carve_radius = (profile.carve_width / 2.0).ceil().max(1.0) as i32;
        let hp = height.get(x as i64, y as i64);
        let river_level = hp - profile.carve_depth * m;

        for dy in -carve_radius..=carve_radius {
            for dx in -carve_radius..=carve_radius {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                let d = (dist / carve_radius as f32).min(1.0);
                let max_erosion = profile.carve_depth * m * (profile.erosion_at)(d);

                let hn = height.get(nx as i64, ny as i64);
                let target = river_level.max(hn - max_erosion);
                let blended = hn + (target - hn) * 0.7;
                let cur_delta = delta.get(nx as i64, ny as i64);
                delta.set(nx as usize, ny as usize, cur_delta + (blended - hn));
            }
        }
    }

    for (x, y) in height.iter_coords() {
        let d = delta.get(x as i64, y as i64);
        if d != 0.0 {
            let cur = height.get(x as i64, y as i64);
            height.set(x, y, cur + d);
        }
    }

    smooth_connections(height, river);
}

/// Second pass: smooth confluences so carved channels connect cleanly.
fn smooth_connections(height: &mut HeightField, river: &HeightField) {
    let (w, h) = (height.width, height.height);
    let src = height.clone();

    for (x, y) in src.iter_coords() {
        let m = river.get(x as i64, y as i64);
        if m > 0.5 {
            let mut sum = 0.0f32;
            let mut count = 0.0f32;
            for &(dx, dy) in &NEIGHBORS_8 {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                if river.get(nx as i64, ny as i64) > 0.3 {
                    sum += src.get(nx as i64, ny as i64);
                    count += 1.0;
                }
            }
            if count > 0.0 {
                height.set(x, y, sum / count);
            }
        } else if m > 0.1 {
            let mut sum = 0.0f32;
            let mut count = 0.0f32;
            for &(dx, dy) in &NEIGHBORS_8 {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                sum += src.get(nx as i64, ny as i64);
                count += 1.0;
            }
            let mean = if count > 0.0 { sum / count } else { src.get(x as i64, y as i64) };
            let cur = src.get(x as i64, y as i64);
            height.set(x, y, 0.7 * cur + 0.3 * mean);
        }
    }
}
