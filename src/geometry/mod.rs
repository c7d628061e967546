//! Point-cloud geometry utilities
//!
//! Normalization to a canonical box, uniform-stride downsampling, and an
//! ASCII renderer for inspecting extracted character shapes.

use serde::{Deserialize, Serialize};

/// A 2D point with no identity beyond its coordinates.
///
/// Serializes as a two-element `[x, y]` array to match the persisted
/// reference database format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point
    pub fn squared_distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Axis-aligned bounding box of a point cloud
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Compute the bounding box of a point cloud, or `None` if it is empty
pub fn bounding_box(points: &[Point]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut bounds = Bounds {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    for p in points {
        bounds.min_x = bounds.min_x.min(p.x);
        bounds.min_y = bounds.min_y.min(p.y);
        bounds.max_x = bounds.max_x.max(p.x);
        bounds.max_y = bounds.max_y.max(p.y);
    }

    Some(bounds)
}

/// Normalize a point cloud into a canonical `target_size` box.
///
/// Scales uniformly so the larger bounding-box dimension spans `target_size`
/// and re-centers so the box center maps to the box midpoint. Aspect ratio is
/// preserved. Returns an empty cloud for degenerate input (empty, a single
/// point, or a straight line along an axis).
pub fn normalize(points: &[Point], target_size: f64) -> Vec<Point> {
    let Some(bounds) = bounding_box(points) else {
        return Vec::new();
    };

    let w = bounds.width();
    let h = bounds.height();
    if w == 0.0 || h == 0.0 {
        return Vec::new();
    }

    let scale = target_size / w.max(h);
    let (cx, cy) = bounds.center();
    let half = target_size / 2.0;

    points
        .iter()
        .map(|p| Point::new((p.x - cx) * scale + half, (p.y - cy) * scale + half))
        .collect()
}

/// Reduce a point cloud to at most `max_points` points.
///
/// Uses uniform-stride index sampling, preserving traversal order. Identity
/// when the cloud is already small enough. Exists purely to bound distance
/// computation cost; there is no shape-fidelity guarantee beyond an even
/// spread in traversal order.
pub fn downsample(points: &[Point], max_points: usize) -> Vec<Point> {
    if points.len() <= max_points {
        return points.to_vec();
    }

    let step = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| points[(i as f64 * step) as usize])
        .collect()
}

/// Render a point cloud as ASCII art for debugging.
///
/// Occupied grid cells become `#`. Returns an empty string for degenerate
/// clouds.
pub fn render_ascii(points: &[Point], width: usize, height: usize) -> String {
    let Some(bounds) = bounding_box(points) else {
        return String::new();
    };

    let w = bounds.width();
    let h = bounds.height();
    if w == 0.0 || h == 0.0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; width]; height];

    for p in points {
        let ix = ((p.x - bounds.min_x) / w * (width - 1) as f64) as usize;
        let iy = ((p.y - bounds.min_y) / h * (height - 1) as f64) as usize;
        if ix < width && iy < height {
            grid[iy][ix] = '#';
        }
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cloud() -> Vec<Point> {
        vec![
            Point::new(1.0, 2.0),
            Point::new(5.0, 8.0),
            Point::new(3.0, 4.0),
            Point::new(9.0, 1.0),
        ]
    }

    fn clouds_approx_equal(a: &[Point], b: &[Point]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|(p, q)| (p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9)
    }

    #[test]
    fn test_bounding_box() {
        let bounds = bounding_box(&sample_cloud()).unwrap();
        assert_eq!(bounds.min_x, 1.0);
        assert_eq!(bounds.max_x, 9.0);
        assert_eq!(bounds.min_y, 1.0);
        assert_eq!(bounds.max_y, 8.0);
        assert_eq!(bounds.width(), 8.0);
        assert_eq!(bounds.height(), 7.0);
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_normalize_fits_target_box() {
        let normalized = normalize(&sample_cloud(), 100.0);
        let bounds = bounding_box(&normalized).unwrap();

        // The larger dimension spans the full box, the other is centered
        assert!((bounds.width() - 100.0).abs() < 1e-9);
        assert!(bounds.height() < 100.0 + 1e-9);
        let (cx, cy) = bounds.center();
        assert!((cx - 50.0).abs() < 1e-9);
        assert!((cy - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize(&sample_cloud(), 100.0);
        let twice = normalize(&once, 100.0);
        assert!(clouds_approx_equal(&once, &twice));
    }

    #[test]
    fn test_normalize_scale_and_translation_invariant() {
        let cloud = sample_cloud();
        let mapped: Vec<Point> = cloud
            .iter()
            .map(|p| Point::new(p.x * 3.5 + 42.0, p.y * 3.5 - 17.0))
            .collect();

        let a = normalize(&cloud, 100.0);
        let b = normalize(&mapped, 100.0);
        assert!(clouds_approx_equal(&a, &b));
    }

    #[test]
    fn test_normalize_degenerate_returns_empty() {
        // Single point
        assert!(normalize(&[Point::new(5.0, 5.0)], 100.0).is_empty());

        // Horizontal line (zero height)
        let line = vec![Point::new(0.0, 3.0), Point::new(10.0, 3.0)];
        assert!(normalize(&line, 100.0).is_empty());

        // Vertical line (zero width)
        let line = vec![Point::new(3.0, 0.0), Point::new(3.0, 10.0)];
        assert!(normalize(&line, 100.0).is_empty());

        // Empty input
        assert!(normalize(&[], 100.0).is_empty());
    }

    #[test]
    fn test_downsample_identity_when_small() {
        let cloud = sample_cloud();
        let result = downsample(&cloud, 100);
        assert_eq!(result, cloud);
    }

    #[test]
    fn test_downsample_caps_count_and_preserves_order() {
        let cloud: Vec<Point> = (0..500).map(|i| Point::new(i as f64, 0.0)).collect();
        let result = downsample(&cloud, 100);

        assert_eq!(result.len(), 100);
        // Survivors keep original traversal order
        for pair in result.windows(2) {
            assert!(pair[0].x < pair[1].x);
        }
        // First index maps to the first point
        assert_eq!(result[0], cloud[0]);
    }

    #[test]
    fn test_downsample_never_increases_count() {
        let cloud: Vec<Point> = (0..250).map(|i| Point::new(i as f64, i as f64)).collect();
        for cap in [1, 10, 100, 249, 250, 300] {
            let result = downsample(&cloud, cap);
            assert!(result.len() <= cloud.len());
            assert_eq!(result.len(), cloud.len().min(cap));
        }
    }

    #[test]
    fn test_render_ascii_marks_corners() {
        let cloud = vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        let art = render_ascii(&cloud, 4, 4);
        let rows: Vec<&str> = art.split('\n').collect();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].chars().next(), Some('#'));
        assert_eq!(rows[3].chars().last(), Some('#'));
    }

    #[test]
    fn test_render_ascii_degenerate() {
        assert_eq!(render_ascii(&[], 10, 5), "");
        assert_eq!(render_ascii(&[Point::new(1.0, 1.0)], 10, 5), "");
    }

    #[test]
    fn test_point_serde_shape() {
        let p = Point::new(1.5, -2.0);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[1.5,-2.0]");

        let back: Point = serde_json::from_str("[3.0,4.0]").unwrap();
        assert_eq!(back, Point::new(3.0, 4.0));
    }
}
