//! Recognition Pipeline
//!
//! Ties the layers together: sniff the content type, extract character
//! clouds, normalize each into the canonical box, and classify against the
//! reference store.

use std::time::Instant;

use tracing::debug;

use crate::config::SolverConfig;
use crate::extract::{extract_characters, ContourSource};
use crate::geometry::{normalize, Point};
use crate::matching::classify_all;
use crate::store::ReferenceStore;

const PNG_MAGIC: &[u8] = b"\x89PNG";

/// Captcha recognizer configured once and reused across solves
#[derive(Debug, Clone)]
pub struct Recognizer {
    config: SolverConfig,
}

impl Recognizer {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solve a captcha whose content type is already resolved
    pub fn solve(&self, source: &ContourSource, store: &ReferenceStore) -> String {
        let started = Instant::now();

        let clouds = self.extract_normalized(source);
        let text = classify_all(&clouds, store, &self.config.matching);

        debug!(
            "Solved {} character(s) as {:?} in {:?}",
            clouds.len(),
            text,
            started.elapsed()
        );
        text
    }

    /// Sniff raw bytes into a source variant and solve
    pub fn solve_bytes(&self, bytes: &[u8], store: &ReferenceStore) -> String {
        let source = classify_content(bytes);
        self.solve(&source, store)
    }

    /// Extract characters and normalize each cloud into the canonical box.
    ///
    /// Degenerate shapes normalize to empty clouds and are dropped here, so
    /// the classifier only ever sees matchable characters.
    pub fn extract_normalized(&self, source: &ContourSource) -> Vec<Vec<Point>> {
        extract_characters(source, &self.config.extraction)
            .into_iter()
            .map(|sample| normalize(&sample.points, self.config.matching.normalize_size))
            .filter(|cloud| !cloud.is_empty())
            .collect()
    }
}

/// Decide whether raw bytes are a raster image or vector markup.
///
/// PNG magic wins outright; any other valid UTF-8 is treated as markup, and
/// everything else falls through to the raster decoder, which fails soft.
pub fn classify_content(bytes: &[u8]) -> ContourSource {
    if bytes.starts_with(PNG_MAGIC) {
        return ContourSource::Raster(bytes.to_vec());
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => ContourSource::Vector(text.to_string()),
        Err(_) => ContourSource::Raster(bytes.to_vec()),
    }
}
