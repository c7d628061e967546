//! Raster character extraction
//!
//! Decodes an encoded image, binarizes it, suppresses thin horizontal
//! distortion lines, and traces the surviving ink blobs into per-character
//! point clouds. Blobs wide enough to hold several glyphs are split into
//! equal-width vertical bands.

use image::imageops::FilterType;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::erode;
use tracing::debug;

use crate::config::ExtractionConfig;
use crate::extract::CharacterSample;
use crate::geometry::{bounding_box, Point};

/// Extract character shapes from encoded image bytes, ordered left to right
pub fn extract(bytes: &[u8], config: &ExtractionConfig) -> Vec<CharacterSample> {
    let gray = match image::load_from_memory(bytes) {
        Ok(img) => img.to_luma8(),
        Err(e) => {
            debug!("Image decode failed, treating as no characters: {e}");
            return Vec::new();
        }
    };

    let binary = binarize(gray, config);
    let components = trace_components(&binary, config);

    let mut samples = Vec::new();
    for component in components {
        samples.extend(split_component(&component, config));
    }
    debug!("Extracted {} character shape(s) from raster image", samples.len());
    samples
}

/// Threshold the grayscale image into an ink mask (ink = white).
///
/// Small images are upscaled first so morphology operates at a usable
/// resolution. A vertical-preserving opening removes 1px horizontal
/// distortion lines before the final erosion rounds off staircase edges.
fn binarize(gray: GrayImage, config: &ExtractionConfig) -> GrayImage {
    let gray = if gray.height() < config.upscale_below_height {
        let f = config.upscale_factor.max(1);
        image::imageops::resize(
            &gray,
            gray.width() * f,
            gray.height() * f,
            FilterType::CatmullRom,
        )
    } else {
        gray
    };

    let blurred = if config.blur_sigma > 0.0 {
        gaussian_blur_f32(&gray, config.blur_sigma)
    } else {
        gray
    };

    let level = otsu_level(&blurred);
    let binary = threshold(&blurred, level, ThresholdType::BinaryInverted);

    let opened = vertical_open(&binary);
    erode(&opened, Norm::LInf, 1)
}

/// Morphological opening with a 1x2 vertical structuring element.
///
/// Removes ink runs with no vertical neighbor (horizontal strike-through
/// lines) while leaving glyph strokes intact. Hand-rolled: the isotropic
/// morphology helpers cannot express an asymmetric element.
fn vertical_open(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();

    let mut eroded = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let below = if y + 1 < h { mask.get_pixel(x, y + 1)[0] } else { 0 };
            eroded.put_pixel(x, y, image::Luma([mask.get_pixel(x, y)[0].min(below)]));
        }
    }

    let mut dilated = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let above = if y > 0 { eroded.get_pixel(x, y - 1)[0] } else { 0 };
            dilated.put_pixel(x, y, image::Luma([eroded.get_pixel(x, y)[0].max(above)]));
        }
    }

    dilated
}

/// Trace outer contours and keep the ones that look like glyphs, ordered by
/// their leftmost pixel
fn trace_components(binary: &GrayImage, config: &ExtractionConfig) -> Vec<Vec<Point>> {
    let contours: Vec<Contour<i32>> = find_contours(binary);

    let mut components: Vec<Vec<Point>> = contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| {
            c.points
                .iter()
                .map(|p| Point::new(p.x as f64, p.y as f64))
                .collect::<Vec<Point>>()
        })
        .filter(|points| {
            let Some(bounds) = bounding_box(points) else {
                return false;
            };
            let height_px = bounds.height() + 1.0;
            polygon_area(points) >= config.min_component_area
                && height_px >= config.min_component_height
        })
        .collect();

    components.sort_by(|a, b| {
        let ax = bounding_box(a).map_or(f64::INFINITY, |bb| bb.min_x);
        let bx = bounding_box(b).map_or(f64::INFINITY, |bb| bb.min_x);
        ax.total_cmp(&bx)
    });
    components
}

/// Shoelace area of a closed contour. Degenerate contours score zero.
fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum.abs() / 2.0
}

/// Split a component into per-character samples.
///
/// Components no wider than a single glyph pass through whole. Wider ones are
/// cut into equal vertical bands, one per estimated character; bands with too
/// few points are dropped as slicing artifacts.
fn split_component(points: &[Point], config: &ExtractionConfig) -> Vec<CharacterSample> {
    let Some(bounds) = bounding_box(points) else {
        return Vec::new();
    };
    let width_px = bounds.width() + 1.0;
    let height_px = bounds.height() + 1.0;
    let aspect = width_px / height_px;

    if aspect <= config.split_aspect_threshold {
        return CharacterSample::from_points(points.to_vec())
            .into_iter()
            .collect();
    }

    let count = estimate_char_count(aspect, config.split_char_aspect);
    let step = width_px / count as f64;
    debug!(
        "Splitting component (aspect {:.2}) into {} band(s)",
        aspect, count
    );

    let mut samples = Vec::new();
    for i in 0..count {
        let start = bounds.min_x + i as f64 * step;
        let end = start + step;
        let last = i == count - 1;

        let band: Vec<Point> = points
            .iter()
            .filter(|p| p.x >= start && (p.x < end || (last && p.x <= end)))
            .copied()
            .collect();

        if band.len() > config.min_band_points {
            if let Some(sample) = CharacterSample::from_points(band) {
                samples.push(sample);
            }
        }
    }
    samples
}

/// Estimate how many characters a wide component holds from its aspect ratio.
///
/// The quotient is biased up by an epsilon so exact half ratios round to the
/// larger count despite inexact binary representation of the char aspect.
pub(crate) fn estimate_char_count(aspect: f64, char_aspect: f64) -> usize {
    (((aspect / char_aspect) + 1e-9).round() as usize).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Luma};
    use std::io::Cursor;

    /// White canvas with black filled rectangles, encoded as PNG
    fn png_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Vec<u8> {
        let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
        for &(x0, y0, w, h) in rects {
            for y in y0..(y0 + h).min(height) {
                for x in x0..(x0 + w).min(width) {
                    img.put_pixel(x, y, Luma([0u8]));
                }
            }
        }

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_single_glyph_component() {
        let bytes = png_with_rects(200, 100, &[(40, 20, 30, 60)]);
        let samples = extract(&bytes, &ExtractionConfig::default());

        assert_eq!(samples.len(), 1);
        let bounds = bounding_box(&samples[0].points).unwrap();
        assert!(bounds.min_x >= 38.0 && bounds.min_x <= 42.0);
    }

    #[test]
    fn test_separated_glyphs_keep_reading_order() {
        let bytes = png_with_rects(300, 100, &[(200, 20, 30, 60), (20, 20, 30, 60)]);
        let samples = extract(&bytes, &ExtractionConfig::default());

        assert_eq!(samples.len(), 2);
        assert!(samples[0].min_x < samples[1].min_x);
    }

    #[test]
    fn test_wide_component_splits_into_bands() {
        // 120x60 rect: aspect ~2.0, estimated three characters wide
        let bytes = png_with_rects(300, 100, &[(40, 20, 120, 60)]);
        let samples = extract(&bytes, &ExtractionConfig::default());

        assert_eq!(samples.len(), 3);
        assert!(samples[0].min_x < samples[1].min_x);
        assert!(samples[1].min_x < samples[2].min_x);
    }

    #[test]
    fn test_noise_components_dropped() {
        // A glyph plus a speck too small to pass the noise floor
        let bytes = png_with_rects(200, 100, &[(40, 20, 30, 60), (150, 50, 4, 4)]);
        let samples = extract(&bytes, &ExtractionConfig::default());
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_horizontal_line_removed_by_opening() {
        // 1px strike-through line spanning the canvas
        let bytes = png_with_rects(200, 100, &[(40, 20, 30, 60), (0, 80, 200, 1)]);
        let samples = extract(&bytes, &ExtractionConfig::default());
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_small_image_upscaled_before_morphology() {
        // At native size an 8x12 glyph would die to the noise floor; the 3x
        // upscale lifts it past both area and height minimums
        let bytes = png_with_rects(60, 20, &[(10, 4, 8, 12)]);
        let samples = extract(&bytes, &ExtractionConfig::default());
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_undecodable_bytes_yield_empty() {
        let samples = extract(b"definitely not an image", &ExtractionConfig::default());
        assert!(samples.is_empty());
    }

    #[test]
    fn test_estimate_char_count() {
        // Exact double-width at char aspect 0.80 estimates three glyphs
        assert_eq!(estimate_char_count(2.0, 0.80), 3);
        assert_eq!(estimate_char_count(1.6, 0.80), 2);
        assert_eq!(estimate_char_count(2.4, 0.80), 3);
        // Floor of two even for marginal aspects
        assert_eq!(estimate_char_count(1.15, 0.80), 2);
    }

    #[test]
    fn test_polygon_area() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!((polygon_area(&square) - 100.0).abs() < 1e-9);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }
}
