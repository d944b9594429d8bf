//! End-to-end scenarios against the public `generate` entry point, one test
//! per quantified invariant plus the boundary behaviors.

use terra_core::biome::{BiomeKind, BiomeOverride};
use terra_core::config::GenConfig;
use terra_core::error::ConfigError;
use terra_core::generator::TerrainGenerator;

fn cfg(rows: usize, cols: usize) -> GenConfig {
    GenConfig {
        rows,
        cols,
        tile_size: 128,
        overlap: 16,
        base_size: 32,
        seed: 1337,
        erosion_years: 1000.0,
        ..GenConfig::default()
    }
}

#[test]
fn invariant_1_determinism_across_two_runs() {
    let c = cfg(2, 2);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let a = gen.generate(&c, &biome).unwrap();
    let b = gen.generate(&c, &biome).unwrap();
    assert_eq!(a.atlas, b.atlas);
    assert_eq!(a.rects, b.rects);
}

#[test]
fn invariant_2_tile_continuity_across_all_adjacent_tile_pairs() {
    let c = cfg(2, 3);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();

    // Tiles are literal windows into one continuous canvas, so any two
    // horizontally adjacent tiles' full `tile_size` windows overlap by
    // `2*overlap` columns and must agree pixel-for-pixel there.
    for row in 0..c.rows {
        for col in 0..c.cols - 1 {
            let left = &result.tiles[row * c.cols + col];
            let right = &result.tiles[row * c.cols + col + 1];
            for y in 0..c.tile_size {
                for k in 0..(2 * c.overlap) {
                    let lx = c.tile_size - 2 * c.overlap + k;
                    let rx = k;
                    assert_eq!(
                        left.data.get(lx as i64, y as i64),
                        right.data.get(rx as i64, y as i64)
                    );
                }
            }
        }
    }
}

#[test]
fn invariant_3_mask_domains_stay_in_unit_range() {
    let c = cfg(2, 2);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();
    let water = result.water_features.unwrap();
    for v in water.water_mask.as_slice() {
        assert!((0.0..=1.0).contains(v));
    }
    for v in water.river_mask.as_slice() {
        assert!((0.0..=1.0).contains(v));
    }
    for v in water.beach_mask.as_slice() {
        assert!((0.0..=1.0).contains(v));
    }
}

#[test]
fn invariant_4_flow_accumulation_floor_is_one() {
    let c = cfg(2, 2);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();
    let water = result.water_features.unwrap();
    for v in water.flow_accumulation.as_slice() {
        assert!(*v >= 1.0);
    }
}

#[test]
fn invariant_5_river_cells_are_always_water_cells() {
    let c = cfg(2, 2);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();
    let water = result.water_features.unwrap();
    for (x, y) in water.river_mask.iter_coords() {
        let r = water.river_mask.get(x as i64, y as i64);
        let w = water.water_mask.get(x as i64, y as i64);
        if r > 0.0 {
            assert!(w > 0.0, "river cell ({x},{y}) is not a water cell");
        }
    }
}

#[test]
fn invariant_6_heights_are_non_negative_after_erosion() {
    let c = cfg(2, 2);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();
    for tile in &result.tiles {
        for v in tile.data.as_slice() {
            assert!(*v >= 0.0);
        }
    }
}

#[test]
fn invariant_7_rectangles_tile_the_unit_square_without_gaps_or_overlap() {
    let c = cfg(2, 3);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();

    for row in 0..c.rows {
        for col in 0..c.cols {
            let rect = result.rects[row * c.cols + col];
            if col > 0 {
                let left = result.rects[row * c.cols + col - 1];
                assert!((left.u1 - rect.u0).abs() < 1e-6);
            }
            if row > 0 {
                let above = result.rects[(row - 1) * c.cols + col];
                assert!((above.v1 - rect.v0).abs() < 1e-6);
            }
        }
    }
    let top_left = result.rects[0];
    let bottom_right = result.rects[c.rows * c.cols - 1];
    assert!((top_left.u0 - 0.0).abs() < 1e-6);
    assert!((top_left.v0 - 0.0).abs() < 1e-6);
    assert!((bottom_right.u1 - 1.0).abs() < 1e-6);
    assert!((bottom_right.v1 - 1.0).abs() < 1e-6);
}

#[test]
fn boundary_one_by_one_grid_atlas_equals_its_single_inner_region() {
    let c = cfg(1, 1);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();
    let inner = c.inner_size();
    assert_eq!(result.atlas_size, (inner, inner));
    assert_eq!(result.rects.len(), 1);
    let r = result.rects[0];
    assert_eq!((r.u0, r.v0, r.u1, r.v1), (0.0, 0.0, 1.0, 1.0));
}

#[test]
fn boundary_large_grid_maintains_continuity_at_every_internal_edge() {
    let c = cfg(4, 4);
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();

    // Every tile is a literal window into one continuous canvas, so any two
    // grid-adjacent tiles' full windows overlap by a `2*overlap`-wide band
    // and must agree pixel-for-pixel there, at every internal edge in the grid.
    for row in 0..c.rows {
        for col in 0..c.cols - 1 {
            let left = &result.tiles[row * c.cols + col];
            let right = &result.tiles[row * c.cols + col + 1];
            for y in 0..c.tile_size {
                for k in 0..(2 * c.overlap) {
                    let lx = c.tile_size - 2 * c.overlap + k;
                    assert_eq!(left.data.get(lx as i64, y as i64), right.data.get(k as i64, y as i64));
                }
            }
        }
    }

    for row in 0..c.rows - 1 {
        for col in 0..c.cols {
            let top = &result.tiles[row * c.cols + col];
            let bottom = &result.tiles[(row + 1) * c.cols + col];
            for x in 0..c.tile_size {
                for k in 0..(2 * c.overlap) {
                    let ty = c.tile_size - 2 * c.overlap + k;
                    assert_eq!(top.data.get(x as i64, ty as i64), bottom.data.get(x as i64, k as i64));
                }
            }
        }
    }
}

#[test]
fn boundary_threshold_edge_river_just_above_and_below_max_flow() {
    let mut biome = BiomeKind::Temperate.params();
    let water = biome.water.as_mut().unwrap();
    water.river_threshold = 1.5; // above any normalized flow ratio (max is 1.0)
    let c = GenConfig {
        erosion_years: 0.0,
        ..cfg(1, 1)
    };
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();
    let water_out = result.water_features.unwrap();
    assert!(water_out.river_mask.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn scenario_zero_erosion_years_skips_the_erosion_stage() {
    let c = GenConfig {
        erosion_years: 0.0,
        ..cfg(1, 1)
    };
    let biome = BiomeKind::Desert.params();
    let gen = TerrainGenerator::new();
    let result = gen.generate(&c, &biome).unwrap();
    assert!(result.erosion_stats.is_none());
}

#[test]
fn scenario_biome_override_reduces_variance() {
    let c = cfg(1, 1);
    let base = BiomeKind::Temperate.params();
    let flattened = base.merge(&BiomeOverride {
        fbm_amplitude: Some(0.0),
        ridge_sharpen: Some(0.0),
        dunes: Some(None),
        ..Default::default()
    });

    let gen = TerrainGenerator::new();
    let base_result = gen.generate(&c, &base).unwrap();
    let flat_result = gen.generate(&c, &flattened).unwrap();

    let variance = |data: &[f32]| -> f64 {
        let n = data.len() as f64;
        let mean: f64 = data.iter().map(|&v| v as f64).sum::<f64>() / n;
        data.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
    };

    assert!(variance(flat_result.atlas.as_slice()) < variance(base_result.atlas.as_slice()));
}

#[test]
fn invalid_config_is_rejected_before_any_generation_work() {
    let c = GenConfig {
        rows: 0,
        ..cfg(1, 1)
    };
    let biome = BiomeKind::Temperate.params();
    let gen = TerrainGenerator::new();
    assert!(matches!(
        gen.generate(&c, &biome),
        Err(ConfigError::InvalidGridDimensions { .. })
    ));
}
