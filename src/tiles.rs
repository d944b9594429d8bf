//! Tile extraction and atlas packing.
//!
//! The continuous canvas produced by [`crate::pipeline`] is sliced into
//! per-tile windows (with their overlap margin) and packed, margin-dropped,
//! into one seam-free atlas. Grounded in the row-major packing style of
//! `map_export::export_all_maps` and the windowed-grid bookkeeping of
//! `Tilemap`, generalized from `Tilemap`'s horizontal wrap to a fixed
//! `rows x cols` grid with no wraparound.

use crate::config::GenConfig;
use crate::heightfield::HeightField;

/// Normalized UV rectangle `(u0,v0,u1,v1)` a tile occupies within the atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// One extracted tile: its grid position and its `tile_size x tile_size`
/// window, overlap margin included.
pub struct Tile {
    pub row: usize,
    pub col: usize,
    pub data: HeightField,
    pub rect: TileRect,
}

fn tile_rect(cfg: &GenConfig, row: usize, col: usize) -> TileRect {
    let inner = cfg.inner_size();
    let atlas_w = (cfg.cols * inner) as f32;
    let atlas_h = (cfg.rows * inner) as f32;
    TileRect {
        u0: (col * inner) as f32 / atlas_w,
        v0: (row * inner) as f32 / atlas_h,
        u1: ((col + 1) * inner) as f32 / atlas_w,
        v1: ((row + 1) * inner) as f32 / atlas_h,
    }
}

/// Extract the full `tile_size x tile_size` window (including the overlap
/// margin) for tile `(row, col)` from the continuous canvas.
pub fn extract_tile_window(canvas: &HeightField, cfg: &GenConfig, row: usize, col: usize) -> HeightField {
    let inner = cfg.inner_size();
    let x0 = (col * inner) as i64;
    let y0 = (row * inner) as i64;
    let mut out = HeightField::create(cfg.tile_size, cfg.tile_size, 0.0);
    for ty in 0..cfg.tile_size {
        for tx in 0..cfg.tile_size {
            out.set(tx, ty, canvas.get(x0 + tx as i64, y0 + ty as i64));
        }
    }
    out
}

/// Extract just the inner (non-overlap) region for tile `(row, col)`.
pub fn extract_inner_region(canvas: &HeightField, cfg: &GenConfig, row: usize, col: usize) -> HeightField {
    let inner = cfg.inner_size();
    let x0 = (col * inner + cfg.overlap) as i64;
    let y0 = (row * inner + cfg.overlap) as i64;
    let mut out = HeightField::create(inner, inner, 0.0);
    for y in 0..inner {
        for x in 0..inner {
            out.set(x, y, canvas.get(x0 + x as i64, y0 + y as i64));
        }
    }
    out
}

/// Extract every tile in `(row, col)` order, row-major.
pub fn extract_tiles(canvas: &HeightField, cfg: &GenConfig) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(cfg.rows * cfg.cols);
    for row in 0..cfg.rows {
        for col in 0..cfg.cols {
            tiles.push(Tile {
                row,
                col,
                data: extract_tile_window(canvas, cfg, row, col),
                rect: tile_rect(cfg, row, col),
            });
        }
    }
    tiles
}

/// Pack a field's inner tile regions into a single `cols*inner x rows*inner`
/// atlas. Because every inner region is a literal slice of one continuous
/// `canvas`, the atlas is a contiguous crop of `canvas` with the outer
/// `overlap` margin dropped; no blending needed to avoid seams.
pub fn pack_atlas(canvas: &HeightField, cfg: &GenConfig) -> HeightField {
    let inner = cfg.inner_size();
    let mut atlas = HeightField::create(cfg.cols * inner, cfg.rows * inner, 0.0);
    for row in 0..cfg.rows {
        for col in 0..cfg.cols {
            let region = extract_inner_region(canvas, cfg, row, col);
            for y in 0..inner {
                for x in 0..inner {
                    atlas.set(col * inner + x, row * inner + y, region.get(x as i64, y as i64));
                }
            }
        }
    }
    atlas
}

/// Legacy seam-blend mode: averages a band of width `overlap` straddling
/// each internal tile boundary. Off by default; the atlas is already a
/// seam-free crop of one shared canvas, so this blend only exists to
/// reproduce older, pre-continuous-canvas output and deliberately perturbs
/// the atlas-is-a-crop invariant when enabled.
pub fn blend_seams(atlas: &mut HeightField, cfg: &GenConfig) {
    if !cfg.blend_seams {
        return;
    }
    let inner = cfg.inner_size();
    let band = cfg.overlap.max(1);
    let src = atlas.clone();

    // Vertical boundaries (between columns).
    for col in 1..cfg.cols {
        let seam_x = col * inner;
        for y in 0..atlas.height {
            for k in 1..=band {
                if seam_x < k || seam_x + k - 1 >= atlas.width {
                    continue;
                }
                let left = src.get((seam_x - k) as i64, y as i64);
                let right = src.get((seam_x + k - 1) as i64, y as i64);
                let t = k as f32 / (band + 1) as f32;
                let blended = left * (1.0 - t) + right * t;
                atlas.set(seam_x - k, y, (src.get((seam_x - k) as i64, y as i64) + blended) * 0.5);
                atlas.set(
                    seam_x + k - 1,
                    y,
                    (src.get((seam_x + k - 1) as i64, y as i64) + blended) * 0.5,
                );
            }
        }
    }

    // Horizontal boundaries (between rows).
    let src = atlas.clone();
    for row in 1..cfg.rows {
        let seam_y = row * inner;
        for x in 0..atlas.width {
            for k in 1..=band {
                if seam_y < k || seam_y + k - 1 >= atlas.height {
                    continue;
                }
                let top = src.get(x as i64, (seam_y - k) as i64);
                let bottom = src.get(x as i64, (seam_y + k - 1) as i64);
                let t = k as f32 / (band + 1) as f32;
                let blended = top * (1.0 - t) + bottom * t;
                atlas.set(x, seam_y - k, (src.get(x as i64, (seam_y - k) as i64) + blended) * 0.5);
                atlas.set(
                    x,
                    seam_y + k - 1,
                    (src.get(x as i64, (seam_y + k - 1) as i64) + blended) * 0.5,
                );
            }
        }
    }
}

/// Atlas-packed hydrology outputs, one field per mask, laid out identically
/// to the height atlas so they can be sampled with the same UV rects.
pub struct WaterFeatures {
    pub water_mask: HeightField,
    pub river_mask: HeightField,
    pub beach_mask: HeightField,
    pub flow_accumulation: HeightField,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg() -> GenConfig {
        GenConfig {
            rows: 2,
            cols: 2,
            tile_size: 48,
            overlap: 8,
            ..GenConfig::default()
        }
    }

    #[test]
    fn extracted_tile_has_declared_tile_size() {
        let cfg = test_cfg();
        let (w, h) = cfg.canvas_size();
        let canvas = HeightField::create(w, h, 1.0);
        let tile = extract_tile_window(&canvas, &cfg, 0, 0);
        assert_eq!((tile.width, tile.height), (cfg.tile_size, cfg.tile_size));
    }

    #[test]
    fn atlas_has_exact_packed_dimensions() {
        let cfg = test_cfg();
        let (w, h) = cfg.canvas_size();
        let canvas = HeightField::create(w, h, 0.0);
        let atlas = pack_atlas(&canvas, &cfg);
        let inner = cfg.inner_size();
        assert_eq!((atlas.width, atlas.height), (cfg.cols * inner, cfg.rows * inner));
    }

    #[test]
    fn packed_atlas_is_a_contiguous_crop_of_the_canvas() {
        let cfg = test_cfg();
        let (w, h) = cfg.canvas_size();
        let mut canvas = HeightField::create(w, h, 0.0);
        for (x, y) in canvas.iter_coords() {
            canvas.set(x, y, (x * 7 + y * 3) as f32);
        }
        let atlas = pack_atlas(&canvas, &cfg);
        for (x, y) in atlas.iter_coords() {
            assert_eq!(
                atlas.get(x as i64, y as i64),
                canvas.get((x + cfg.overlap) as i64, (y + cfg.overlap) as i64)
            );
        }
    }

    #[test]
    fn adjacent_tiles_agree_across_their_shared_overlap_band() {
        let cfg = test_cfg();
        let (w, h) = cfg.canvas_size();
        let mut canvas = HeightField::create(w, h, 0.0);
        for (x, y) in canvas.iter_coords() {
            canvas.set(x, y, (x * 7 + y * 3) as f32);
        }
        let left = extract_tile_window(&canvas, &cfg, 0, 0);
        let right = extract_tile_window(&canvas, &cfg, 0, 1);
        for y in 0..cfg.tile_size {
            for k in 0..(2 * cfg.overlap) {
                let lx = cfg.tile_size - 2 * cfg.overlap + k;
                assert_eq!(left.get(lx as i64, y as i64), right.get(k as i64, y as i64));
            }
        }
    }

    #[test]
    fn tile_rects_tile_the_unit_square_without_gaps() {
        let cfg = test_cfg();
        let r00 = tile_rect(&cfg, 0, 0);
        let r01 = tile_rect(&cfg, 0, 1);
        assert!((r00.u1 - r01.u0).abs() < 1e-6);
        assert!((r00.u0 - 0.0).abs() < 1e-6);
        let r11 = tile_rect(&cfg, 1, 1);
        assert!((r11.u1 - 1.0).abs() < 1e-6);
        assert!((r11.v1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn blend_seams_is_noop_when_disabled() {
        let mut cfg = test_cfg();
        cfg.blend_seams = false;
        let mut atlas = HeightField::create(cfg.cols * cfg.inner_size(), cfg.rows * cfg.inner_size(), 0.0);
        for (x, y) in atlas.iter_coords() {
            atlas.set(x, y, (x + y) as f32);
        }
        let before = atlas.clone();
        blend_seams(&mut atlas, &cfg);
        assert_eq!(atlas, before);
    }
}
