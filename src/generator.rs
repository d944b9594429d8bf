//! Top-level orchestration: wires the pyramid, flow, hydrology, river carver,
//! and geological erosion stages into one `generate` entry point and packs
//! the result into tiles.
//!
//! One reusable instance drives a fixed stage order end to end and owns the
//! working buffers that can be shared across calls.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::biome::BiomeParams;
use crate::config::GenConfig;
use crate::error::ConfigError;
use crate::erosion::{self, ErosionParams, ErosionStats};
use crate::flow::flow_accumulation;
use crate::heightfield::HeightField;
use crate::hydrology::{beach_mask, river_mask, water_mask};
use crate::pipeline::PyramidPipeline;
use crate::river_carve::{carve_rivers, hardness_map};
use crate::tiles::{self, Tile, TileRect, WaterFeatures};

/// Everything a caller needs to render or export one generated terrain.
pub struct GenerationResult {
    pub tiles: Vec<Tile>,
    pub inner_size: usize,
    pub atlas: HeightField,
    pub atlas_size: (usize, usize),
    pub rects: Vec<TileRect>,
    pub water_features: Option<WaterFeatures>,
    pub erosion_stats: Option<ErosionStats>,
    /// Per-cell resistance to fluvial/geological erosion, retrievable for
    /// visualization. Computed unconditionally since both the river carver
    /// and the erosion passes need it regardless of whether a caller reads it.
    pub hardness: HeightField,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerationStats {
    pub tile_count: usize,
    pub canvas_size: (usize, usize),
}

/// Scratch allocations reused across `generate` calls on one
/// `TerrainGenerator` instance, so repeated calls at the same canvas size
/// don't reallocate the no-water-config fallback fields. Keyed by
/// `(width, height)`; a size change drops and reallocates.
struct ScratchBuffers {
    size: (usize, usize),
    zero_river: HeightField,
    zero_water: HeightField,
    zero_flow: HeightField,
}

impl ScratchBuffers {
    fn for_size(cache: &mut Option<ScratchBuffers>, w: usize, h: usize) -> (HeightField, HeightField, HeightField) {
        let needs_realloc = !matches!(cache, Some(s) if s.size == (w, h));
        if needs_realloc {
            *cache = Some(ScratchBuffers {
                size: (w, h),
                zero_river: HeightField::create(w, h, 0.0),
                zero_water: HeightField::create(w, h, 0.0),
                zero_flow: HeightField::create(w, h, 1.0),
            });
        }
        let s = cache.as_ref().unwrap();
        (s.zero_river.clone(), s.zero_water.clone(), s.zero_flow.clone())
    }
}

/// Reusable generator instance. Owns the scratch buffers backing the
/// no-water-config fallback fields so repeated `generate` calls at a fixed
/// canvas size don't reallocate them, following the same long-lived,
/// buffer-owning struct shape as the rest of the stage pipeline.
///
/// The flow/hydrology/erosion stages themselves (`flow_accumulation`,
/// `river_mask`, `water_mask`, `beach_mask`) still allocate fresh output
/// fields per call. Converting them to write into a caller-supplied
/// scratch buffer instead of returning an owned `HeightField` is a larger,
/// deliberately deferred follow-up, since every one of those call sites
/// would need a write-into-buffer signature.
#[derive(Default)]
pub struct TerrainGenerator {
    scratch: RefCell<Option<ScratchBuffers>>,
}

impl TerrainGenerator {
    pub fn new() -> Self {
        Self {
            scratch: RefCell::new(None),
        }
    }

    /// Run the full pipeline: pyramid synthesis, flow/hydrology, river
    /// carving, geological erosion (with a flow/hydrology reflow), then tile
    /// extraction and atlas packing. Config is validated before any
    /// allocation.
    pub fn generate(&self, cfg: &GenConfig, biome: &BiomeParams) -> Result<GenerationResult, ConfigError> {
        cfg.validate()?;

        let mut height = PyramidPipeline::generate(cfg, biome);

        let water_cfg = biome.water.clone();
        let mut hardness = hardness_map(&height);

        let (mut river, mut water, mut flow) = if let Some(w) = &water_cfg {
            let flow = flow_accumulation(&height);
            let river = river_mask(&flow, w.river_threshold);
            carve_rivers(&mut height, &river, &hardness, w.river_width, w.river_depth);

            // Carving redistributes mass, so flow, the river mask, and the
            // hardness map (which depends on local slope) are recomputed
            // once before hydrology masks are finalized.
            hardness = hardness_map(&height);
            let flow = flow_accumulation(&height);
            let river = river_mask(&flow, w.river_threshold);
            let water = water_mask(&height, &river, w.sea_level);
            (river, water, flow)
        } else {
            let (w_, h_) = (height.width, height.height);
            ScratchBuffers::for_size(&mut self.scratch.borrow_mut(), w_, h_)
        };

        let mut beach = water_cfg
            .as_ref()
            .map(|w| beach_mask(&water, w.beach_width))
            .unwrap_or_else(|| HeightField::create(height.width, height.height, 0.0));

        let mut erosion_stats = None;
        if cfg.erosion_years > 0.0 {
            let sea_level_normalized = water_cfg.as_ref().map(|w| w.sea_level).unwrap_or(0.0);
            let river_threshold = water_cfg.as_ref().map(|w| w.river_threshold).unwrap_or(0.12);

            let params = ErosionParams {
                time_years: cfg.erosion_years,
                wind_strength: 0.3,
                rain_intensity: 0.3,
                temperature_cycles: 0.3,
            };
            let outcome = erosion::run(&mut height, &params, river_threshold, sea_level_normalized);
            flow = outcome.final_flow;
            river = outcome.final_river_mask;
            water = outcome.final_water_mask;
            beach = water_cfg
                .as_ref()
                .map(|w| beach_mask(&water, w.beach_width))
                .unwrap_or(beach);
            erosion_stats = Some(outcome.stats);
            hardness = hardness_map(&height);
        }

        let mut atlas = tiles::pack_atlas(&height, cfg);
        tiles::blend_seams(&mut atlas, cfg);

        let tile_list = tiles::extract_tiles(&height, cfg);
        let rects = tile_list.iter().map(|t| t.rect).collect();

        let water_features = water_cfg.as_ref().map(|_| WaterFeatures {
            water_mask: tiles::pack_atlas(&water, cfg),
            river_mask: tiles::pack_atlas(&river, cfg),
            beach_mask: tiles::pack_atlas(&beach, cfg),
            flow_accumulation: tiles::pack_atlas(&flow, cfg),
        });

        let atlas_size = (atlas.width, atlas.height);

        Ok(GenerationResult {
            tiles: tile_list,
            inner_size: cfg.inner_size(),
            atlas,
            atlas_size,
            rects,
            water_features,
            erosion_stats,
            hardness,
        })
    }
}
