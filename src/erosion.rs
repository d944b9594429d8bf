//! Geological erosion: wind, thermal, hydraulic passes.
//!
//! This supersedes the particle/droplet hydraulic model previously in
//! `erosion/hydraulic.rs` and `erosion/gpu.rs`, and the ice-sheet SIA
//! glacial model in `erosion/glacial.rs`, with three budgeted passes:
//! different physics answering the same architectural question, so the
//! module keeps the prior erosion *pipeline shape*
//! (`erosion::simulate_erosion`'s ordered pass list, stats accumulation,
//! thermal's double-buffered write) rather than the droplet/ice specifics.

use serde::{Deserialize, Serialize};

use crate::flow::flow_accumulation;
use crate::heightfield::HeightField;
use crate::hydrology::{river_mask, water_mask};

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

/// The erosion state machine:
/// `base -> wind -> thermal -> hydraulic(with-reflow) -> finalized`.
/// Passes whose strength parameter is zero are skipped; the order is fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErosionStage {
    Base,
    Wind,
    Thermal,
    Hydraulic,
    Finalized,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErosionParams {
    pub time_years: f64,
    pub wind_strength: f32,
    pub rain_intensity: f32,
    pub temperature_cycles: f32,
}

/// Iteration budget derived from the simulated time budget. This linear
/// discretization is a fixed contract and must not be tuned without
/// versioning the outputs it produces.
pub fn iteration_counts(years: f64) -> (u32, u32, u32) {
    let wind = (years / 100.0).max(0.0).ceil() as u32;
    let thermal = (years / 50.0).max(0.0).ceil() as u32;
    let hydraulic = (years / 25.0).max(0.0).ceil() as u32;
    (wind, thermal, hydraulic)
}

fn max_neighbor_height(height: &HeightField, x: usize, y: usize) -> f32 {
    let mut m = f32::MIN;
    for &(dx, dy) in &NEIGHBORS_8 {
        let v = height.get(x as i64 + dx as i64, y as i64 + dy as i64);
        if v > m {
            m = v;
        }
    }
    m
}

fn is_interior(x: usize, y: usize, w: usize, h: usize) -> bool {
    x > 0 && y > 0 && x < w - 1 && y < h - 1
}

/// Wind pass: deflates exposed high points. Processed row-major, in place;
/// only the thermal pass below needs double buffering.
fn wind_pass(height: &mut HeightField, erosion_mask: &mut HeightField, wind_strength: f32) {
    let (w, h) = (height.width, height.height);
    for y in 0..h {
        for x in 0..w {
            if !is_interior(x, y, w, h) {
                continue;
            }
            let hp = height.get(x as i64, y as i64);
            let exposure = (hp - max_neighbor_height(height, x, y) + 0.1).max(0.0);
            let delta = wind_strength * exposure * 0.01;
            let new_h = (hp - delta).max(0.0);
            height.set(x, y, new_h);
            let cur_mask = erosion_mask.get(x as i64, y as i64);
            erosion_mask.set(x, y, cur_mask + (hp - new_h));
        }
    }
}

/// Thermal pass: talus-angle-limited mass movement, double-buffered per
/// pass.
fn thermal_pass(height: &mut HeightField, temperature_cycles: f32) {
    let (w, h) = (height.width, height.height);
    let src = height.clone();
    let mut delta = HeightField::create(w, h, 0.0);

    for y in 0..h {
        for x in 0..w {
            if !is_interior(x, y, w, h) {
                continue;
            }
            let hp = src.get(x as i64, y as i64);
            for &(dx, dy) in &NEIGHBORS_8 {
                let nx = (x as i32 + dx) as usize;
                let ny = (y as i32 + dy) as usize;
                let hn = src.get(nx as i64, ny as i64);
                let diff = hp - hn;
                if diff > 0.8 {
                    let moved = (diff - 0.8) * temperature_cycles * 0.001 * 0.5;
                    let dp = delta.get(x as i64, y as i64);
                    delta.set(x, y, dp - moved);
                    let dn = delta.get(nx as i64, ny as i64);
                    delta.set(nx, ny, dn + moved);
                }
            }
        }
    }

    for (x, y) in height.iter_coords() {
        let cur = height.get(x as i64, y as i64);
        let d = delta.get(x as i64, y as i64);
        height.set(x, y, (cur + d).max(0.0));
    }
}

/// Hydraulic pass: recomputes flow and the river mask, then transports and
/// deposits sediment along the steepest downhill neighbor.
fn hydraulic_pass(height: &mut HeightField, rain_intensity: f32, river_threshold: f32) {
    let flow = flow_accumulation(height);
    let f_max = flow.as_slice().iter().cloned().fold(0.0f32, f32::max).max(1.0);
    let river = river_mask(&flow, river_threshold);

    let (w, h) = (height.width, height.height);
    for y in 0..h {
        for x in 0..w {
            if !is_interior(x, y, w, h) {
                continue;
            }
            let hp = height.get(x as i64, y as i64);
            let flow_norm = flow.get(x as i64, y as i64) / f_max;

            let mut slope_sum = 0.0f32;
            let mut steepest_drop = 0.0f32;
            let mut steepest: Option<(usize, usize)> = None;
            for &(dx, dy) in &NEIGHBORS_8 {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                let hn = height.get(nx as i64, ny as i64);
                slope_sum += (hp - hn).abs();
                let drop = hp - hn;
                if drop > steepest_drop {
                    steepest_drop = drop;
                    steepest = Some((nx as usize, ny as usize));
                }
            }
            let slope = slope_sum / 8.0;

            let hydro = flow_norm * slope * rain_intensity * 0.02;
            let river_v = river.get(x as i64, y as i64) * slope * rain_intensity * 0.05;
            let total = hydro + river_v;

            height.set(x, y, hp - total);
            if let Some((nx, ny)) = steepest {
                let cur = height.get(nx as i64, ny as i64);
                height.set(nx, ny, cur + 0.3 * total);
            }
        }
    }
}

/// Diagnostic summary of one erosion run. Not part of the invariant-bearing
/// output contract, informational only.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ErosionStats {
    pub total_eroded: f64,
    pub total_deposited: f64,
    pub max_erosion: f32,
    pub max_deposition: f32,
    pub wind_iterations: u32,
    pub thermal_iterations: u32,
    pub hydraulic_iterations: u32,
}

/// Outcome of running the full erosion state machine.
pub struct ErosionOutcome {
    pub erosion_mask: HeightField,
    pub final_flow: HeightField,
    pub final_river_mask: HeightField,
    pub final_water_mask: HeightField,
    pub stage: ErosionStage,
    pub stats: ErosionStats,
}

/// Run the erosion state machine: `base -> wind -> thermal ->
/// hydraulic(with-reflow) -> finalized`. `river_threshold` and
/// `sea_level_normalized` are the terrain-relative `[0,1]` values from the
/// biome's water config; see `DESIGN.md` on the two sea-level units in
/// play (normalized here, meters in [`ErosionParams`]'s caller-facing twin).
pub fn run(
    height: &mut HeightField,
    params: &ErosionParams,
    river_threshold: f32,
    sea_level_normalized: f32,
) -> ErosionOutcome {
    let mut stage = ErosionStage::Base;
    let (w, h) = (height.width, height.height);
    let mut erosion_mask = HeightField::create(w, h, 0.0);
    let (wind_iters, thermal_iters, hydraulic_iters) = iteration_counts(params.time_years);
    let mut stats = ErosionStats {
        wind_iterations: wind_iters,
        thermal_iterations: thermal_iters,
        hydraulic_iterations: hydraulic_iters,
        ..Default::default()
    };

    stage = ErosionStage::Wind;
    if params.wind_strength > 0.0 {
        for _ in 0..wind_iters {
            wind_pass(height, &mut erosion_mask, params.wind_strength);
        }
        for &d in erosion_mask.as_slice() {
            if d > 0.0 {
                stats.total_eroded += d as f64;
                stats.max_erosion = stats.max_erosion.max(d);
            }
        }
    }

    stage = ErosionStage::Thermal;
    if params.temperature_cycles > 0.0 {
        let before = height.clone();
        for _ in 0..thermal_iters {
            thermal_pass(height, params.temperature_cycles);
        }
        accumulate_diff_stats(&before, height, &mut stats);
    }

    stage = ErosionStage::Hydraulic;
    if params.rain_intensity > 0.0 {
        let before = height.clone();
        for _ in 0..hydraulic_iters {
            hydraulic_pass(height, params.rain_intensity, river_threshold);
            // Heights stay non-negative after every process.
            for (x, y) in height.iter_coords() {
                let v = height.get(x as i64, y as i64).max(0.0);
                height.set(x, y, v);
            }
        }
        accumulate_diff_stats(&before, height, &mut stats);
    }

    stage = ErosionStage::Finalized;
    let final_flow = flow_accumulation(height);
    let final_river_mask = river_mask(&final_flow, river_threshold);
    let final_water_mask = water_mask(height, &final_river_mask, sea_level_normalized);

    ErosionOutcome {
        erosion_mask,
        final_flow,
        final_river_mask,
        final_water_mask,
        stage,
        stats,
    }
}

fn accumulate_diff_stats(before: &HeightField, after: &HeightField, stats: &mut ErosionStats) {
    for (x, y) in before.iter_coords() {
        let diff = after.get(x as i64, y as i64) - before.get(x as i64, y as i64);
        if diff < 0.0 {
            stats.total_eroded += (-diff) as f64;
            stats.max_erosion = stats.max_erosion.max(-diff);
        } else if diff > 0.0 {
            stats.total_deposited += diff as f64;
            stats.max_deposition = stats.max_deposition.max(diff);
        }
    }
}
