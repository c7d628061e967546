//! Character Extraction Layer
//!
//! Converts a captcha source into an ordered sequence of per-character point
//! clouds. Supports two input variants:
//! - Vector markup (filled path elements flattened into point clouds)
//! - Raster images (binarized, cleaned, and traced into contours)
//!
//! Unparsable input yields an empty sequence, never an error: callers treat
//! empty output as "nothing recognized".

pub mod raster;
pub mod vector;

use crate::config::ExtractionConfig;
use crate::geometry::{bounding_box, Point};

/// Captcha content resolved into a tagged input variant
#[derive(Debug, Clone)]
pub enum ContourSource {
    /// Markup string containing drawable path elements
    Vector(String),
    /// Raw encoded image bytes
    Raster(Vec<u8>),
}

/// One extracted character shape, tagged with its leftmost x-coordinate to
/// establish left-to-right reading order. Only the point cloud survives into
/// matching.
#[derive(Debug, Clone)]
pub struct CharacterSample {
    pub points: Vec<Point>,
    pub min_x: f64,
}

impl CharacterSample {
    /// Build a sample from a point cloud, or `None` when the cloud is empty
    pub fn from_points(points: Vec<Point>) -> Option<Self> {
        let bounds = bounding_box(&points)?;
        Some(Self {
            points,
            min_x: bounds.min_x,
        })
    }
}

/// Extract character shapes from a captcha source in reading order
pub fn extract_characters(
    source: &ContourSource,
    config: &ExtractionConfig,
) -> Vec<CharacterSample> {
    match source {
        ContourSource::Vector(markup) => vector::extract(markup),
        ContourSource::Raster(bytes) => raster::extract(bytes, config),
    }
}
