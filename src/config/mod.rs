//! Solver Configuration
//!
//! Tuning constants for extraction and matching, stored in TOML format.
//! The heuristic values here are calibrated empirically against reference
//! captcha sets; they carry no claim of general correctness across arbitrary
//! fonts or distortions.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Solver settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Character extraction settings
    pub extraction: ExtractionConfig,
    /// Shape matching settings
    pub matching: MatchingConfig,
}

/// Raster extraction and character splitting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Images shorter than this are upscaled before morphology
    pub upscale_below_height: u32,
    /// Upscale factor applied to small images
    pub upscale_factor: u32,
    /// Gaussian blur sigma applied before thresholding
    pub blur_sigma: f32,
    /// Connected components with a smaller contour area are dropped as noise
    pub min_component_area: f64,
    /// Connected components shorter than this are dropped as noise
    pub min_component_height: f64,
    /// Components with a larger width/height ratio are split into bands
    pub split_aspect_threshold: f64,
    /// Assumed width/height ratio of a single character when splitting
    pub split_char_aspect: f64,
    /// Split bands with this many points or fewer are dropped as spurious
    pub min_band_points: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            upscale_below_height: 50,
            upscale_factor: 3,
            blur_sigma: 0.8,
            min_component_area: 150.0,
            min_component_height: 20.0,
            split_aspect_threshold: 1.1,
            split_char_aspect: 0.80,
            min_band_points: 10,
        }
    }
}

/// Matching and classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Side length of the canonical box character clouds are normalized into
    pub normalize_size: f64,
    /// Point-count cap applied to both clouds before a distance computation
    pub max_distance_points: usize,
    /// Best scores above this yield the unknown sentinel instead of a label
    pub rejection_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            normalize_size: 100.0,
            max_distance_points: 100,
            rejection_threshold: 1000.0,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<SolverConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: SolverConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &SolverConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
