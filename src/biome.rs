//! Biome registry.
//!
//! Three canonical presets plus a per-axis override merge, following the
//! preset-plus-override idiom used elsewhere in this codebase for parameter
//! bundles: a base struct, named constructors, and partial overrides,
//! expressed here as an `Option`-field [`BiomeOverride`] merged field-by-field
//! so the override itself can round-trip through `serde`.

use serde::{Deserialize, Serialize};

use crate::filters::DunesParams;
use crate::noise::FbmConfig;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WaterConfig {
    pub sea_level: f32,
    pub river_threshold: f32,
    pub river_width: f32,
    pub river_depth: f32,
    pub coastal_erosion: f32,
    pub beach_width: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SlopeBlurBiomeParams {
    pub radius: usize,
    pub k: f64,
    pub iterations: u32,
}

/// Full parameter bundle consumed by the noise, filter, hydrology, and
/// erosion stages.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BiomeParams {
    pub fbm: FbmConfig,
    pub slope_blur: SlopeBlurBiomeParams,
    pub ridge_sharpen: f64,
    pub dunes: Option<DunesParams>,
    pub height_scale_meters: f64,
    pub water: Option<WaterConfig>,
}

/// Named biome identifier.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BiomeKind {
    Temperate,
    Alpine,
    Desert,
}

impl BiomeKind {
    pub fn params(&self) -> BiomeParams {
        match self {
            BiomeKind::Temperate => temperate(),
            BiomeKind::Alpine => alpine(),
            BiomeKind::Desert => desert(),
        }
    }
}

fn temperate() -> BiomeParams {
    BiomeParams {
        fbm: FbmConfig {
            amplitude: 0.22,
            frequency: 1.6,
            octaves: 5,
            lacunarity: 2.0,
            gain: 0.5,
            warp: 0.1,
        },
        slope_blur: SlopeBlurBiomeParams {
            radius: 2,
            k: 0.4,
            iterations: 2,
        },
        ridge_sharpen: 0.35,
        dunes: None,
        height_scale_meters: 900.0,
        water: Some(WaterConfig {
            sea_level: 0.08,
            river_threshold: 0.12,
            river_width: 3.0,
            river_depth: 0.025,
            coastal_erosion: 0.04,
            beach_width: 10.0,
        }),
    }
}

fn alpine() -> BiomeParams {
    BiomeParams {
        fbm: FbmConfig {
            amplitude: 0.35,
            frequency: 1.3,
            octaves: 6,
            lacunarity: 2.0,
            gain: 0.5,
            warp: 0.12,
        },
        slope_blur: SlopeBlurBiomeParams {
            radius: 1,
            k: 0.2,
            iterations: 1,
        },
        ridge_sharpen: 0.6,
        dunes: None,
        height_scale_meters: 1800.0,
        water: Some(WaterConfig {
            sea_level: 0.05,
            river_threshold: 0.15,
            river_width: 1.5,
            river_depth: 0.04,
            coastal_erosion: 0.03,
            beach_width: 6.0,
        }),
    }
}

fn desert() -> BiomeParams {
    BiomeParams {
        fbm: FbmConfig {
            amplitude: 0.15,
            frequency: 2.0,
            octaves: 5,
            lacunarity: 2.0,
            gain: 0.5,
            warp: 0.15,
        },
        slope_blur: SlopeBlurBiomeParams {
            radius: 2,
            k: 0.6,
            iterations: 2,
        },
        ridge_sharpen: 0.2,
        dunes: Some(DunesParams {
            scale: 16.0,
            amplitude: 0.03,
            direction_radians: std::f64::consts::FRAC_PI_4,
        }),
        height_scale_meters: 600.0,
        water: Some(WaterConfig {
            sea_level: 0.1,
            river_threshold: 0.2,
            river_width: 2.0,
            river_depth: 0.03,
            coastal_erosion: 0.05,
            beach_width: 8.0,
        }),
    }
}

/// Lookup table for the canonical presets, mirroring the
/// `ErosionPreset::all()` lookup pattern.
pub struct BiomeRegistry;

impl BiomeRegistry {
    pub fn all() -> &'static [BiomeKind] {
        &[BiomeKind::Temperate, BiomeKind::Alpine, BiomeKind::Desert]
    }

    pub fn get(kind: BiomeKind) -> BiomeParams {
        kind.params()
    }
}

/// Per-axis partial override merged onto a base [`BiomeParams`]; every
/// `None` field inherits the base value unchanged.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BiomeOverride {
    pub fbm_amplitude: Option<f64>,
    pub fbm_frequency: Option<f64>,
    pub fbm_octaves: Option<u32>,
    pub fbm_lacunarity: Option<f64>,
    pub fbm_gain: Option<f64>,
    pub fbm_warp: Option<f64>,
    pub ridge_sharpen: Option<f64>,
    pub dunes: Option<Option<DunesParams>>,
    pub height_scale_meters: Option<f64>,
}

impl BiomeParams {
    /// Merge an override onto `self`, returning the resulting bundle.
    /// Merging an empty `BiomeOverride::default()` is the identity.
    pub fn merge(&self, over: &BiomeOverride) -> BiomeParams {
        let mut out = self.clone();
        if let Some(v) = over.fbm_amplitude {
            out.fbm.amplitude = v;
        }
        if let Some(v) = over.fbm_frequency {
            out.fbm.frequency = v;
        }
        if let Some(v) = over.fbm_octaves {
            out.fbm.octaves = v;
        }
        if let Some(v) = over.fbm_lacunarity {
            out.fbm.lacunarity = v;
        }
        if let Some(v) = over.fbm_gain {
            out.fbm.gain = v;
        }
        if let Some(v) = over.fbm_warp {
            out.fbm.warp = v;
        }
        if let Some(v) = over.ridge_sharpen {
            out.ridge_sharpen = v;
        }
        if let Some(v) = over.dunes.clone() {
            out.dunes = v;
        }
        if let Some(v) = over.height_scale_meters {
            out.height_scale_meters = v;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_identity_is_a_noop() {
        let base = temperate();
        let merged = base.merge(&BiomeOverride::default());
        assert_eq!(base, merged);
    }

    #[test]
    fn override_replaces_only_named_fields() {
        let base = desert();
        let over = BiomeOverride {
            fbm_amplitude: Some(0.0),
            ridge_sharpen: Some(0.0),
            dunes: Some(None),
            ..Default::default()
        };
        let merged = base.merge(&over);
        assert_eq!(merged.fbm.amplitude, 0.0);
        assert_eq!(merged.ridge_sharpen, 0.0);
        assert_eq!(merged.dunes, None);
        // Untouched fields are inherited.
        assert_eq!(merged.fbm.frequency, base.fbm.frequency);
        assert_eq!(merged.height_scale_meters, base.height_scale_meters);
    }

    #[test]
    fn canonical_presets_match_documented_values() {
        let t = temperate();
        assert_eq!(t.fbm.octaves, 5);
        assert_eq!(t.height_scale_meters, 900.0);
        let a = alpine();
        assert_eq!(a.height_scale_meters, 1800.0);
        let d = desert();
        assert!(d.dunes.is_some());
        assert_eq!(d.height_scale_meters, 600.0);
    }
}
