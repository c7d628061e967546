//! Vector-markup character extraction
//!
//! Scans markup text for drawable path elements and flattens each one's path
//! data into a point cloud. Only filled glyph outlines are kept; stroked or
//! unfilled paths are treated as decoration lines and skipped.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extract::CharacterSample;
use crate::geometry::Point;

static PATH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<path[^>]+>").expect("valid regex"));
static D_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bd="([^"]+)""#).expect("valid regex"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d*\.?\d+").expect("valid regex"));

/// Extract character shapes from markup, ordered left to right
pub fn extract(markup: &str) -> Vec<CharacterSample> {
    let mut samples: Vec<CharacterSample> = PATH_TAG
        .find_iter(markup)
        .map(|m| m.as_str())
        .filter(|tag| !tag.contains(r#"fill="none""#) && !tag.contains("stroke"))
        .filter_map(|tag| D_ATTR.captures(tag))
        .filter_map(|caps| {
            let points = points_from_path_data(caps.get(1).map_or("", |m| m.as_str()));
            CharacterSample::from_points(points)
        })
        .collect();

    samples.sort_by(|a, b| a.min_x.total_cmp(&b.min_x));
    debug!("Extracted {} character path(s) from markup", samples.len());
    samples
}

/// Flatten path data into a point cloud by pairing consecutive coordinates.
///
/// Command letters are ignored; an unpaired trailing number is dropped.
fn points_from_path_data(data: &str) -> Vec<Point> {
    let numbers: Vec<f64> = NUMBER
        .find_iter(data)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}
