//! Deterministic procedural terrain synthesis core.
//!
//! Builds one continuous heightfield per call: multi-scale value-noise FBM,
//! a D8 flow-accumulation hydrology pass, hardness-adaptive river carving,
//! and a budgeted geological erosion pass (wind, thermal, hydraulic). Then
//! splits it into an overlap-margined tile grid and a seam-free atlas.
//!
//! See [`generator::TerrainGenerator`] for the entry point.

pub mod biome;
pub mod config;
pub mod error;
pub mod erosion;
#[cfg(feature = "gpu")]
pub mod erosion_gpu;
pub mod filters;
pub mod flow;
pub mod generator;
pub mod heightfield;
pub mod hydrology;
pub mod noise;
pub mod pipeline;
pub mod river_carve;
pub mod tiles;
