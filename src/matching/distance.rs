//! Point-cloud distance
//!
//! One-way Chamfer distance between two clouds: for each point in the first
//! cloud, the squared distance to its nearest neighbor in the second, averaged
//! over the first cloud. Symmetrized by averaging both directions. Clouds are
//! capped before the scan so cost stays bounded regardless of input size.

use crate::geometry::{downsample, Point};

/// Mean squared nearest-neighbor distance from `a` into `b`.
///
/// Returns infinity when either cloud is empty so degenerate shapes can never
/// win a nearest-neighbor scan.
pub fn directed_distance(a: &[Point], b: &[Point], max_points: usize) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }

    let a = downsample(a, max_points);
    let b = downsample(b, max_points);

    let total: f64 = a
        .iter()
        .map(|p| {
            b.iter()
                .map(|q| p.squared_distance(q))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();

    total / a.len() as f64
}

/// Average of the two directed distances
pub fn symmetric_distance(a: &[Point], b: &[Point], max_points: usize) -> f64 {
    (directed_distance(a, b, max_points) + directed_distance(b, a, max_points)) / 2.0
}
