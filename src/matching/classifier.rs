//! Nearest-neighbor classification
//!
//! Scans the labeled reference store for the entry closest to a normalized
//! character cloud. A best score above the rejection threshold (or an empty
//! store) yields the unknown sentinel instead of a guessed label.

use tracing::debug;

use crate::config::MatchingConfig;
use crate::geometry::Point;
use crate::matching::distance::symmetric_distance;
use crate::store::ReferenceStore;

/// Placeholder emitted for characters no reference entry matches
pub const UNKNOWN_SENTINEL: char = '?';

/// Best reference entry for a single character cloud
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub label: String,
    pub score: f64,
}

/// Find the closest reference entry, or `None` when the store is empty.
///
/// Ties keep the first entry encountered; scan order is the store's stable
/// entry order, so the winner is deterministic but otherwise meaningless.
pub fn best_match(
    cloud: &[Point],
    store: &ReferenceStore,
    config: &MatchingConfig,
) -> Option<MatchResult> {
    let mut best: Option<MatchResult> = None;

    for entry in store.entries() {
        let score = symmetric_distance(cloud, &entry.points, config.max_distance_points);
        if best.as_ref().map_or(true, |b| score < b.score) {
            best = Some(MatchResult {
                label: entry.label.clone(),
                score,
            });
        }
    }

    best
}

/// Classify a sequence of normalized character clouds into a text string.
///
/// Characters whose best score exceeds the rejection threshold become the
/// unknown sentinel. Output order follows input order.
pub fn classify_all(
    clouds: &[Vec<Point>],
    store: &ReferenceStore,
    config: &MatchingConfig,
) -> String {
    clouds
        .iter()
        .map(|cloud| match best_match(cloud, store, config) {
            Some(m) if m.score <= config.rejection_threshold => {
                debug!("Matched '{}' (score {:.2})", m.label, m.score);
                m.label
            }
            Some(m) => {
                debug!(
                    "Rejected best candidate '{}' (score {:.2} above threshold {:.2})",
                    m.label, m.score, config.rejection_threshold
                );
                UNKNOWN_SENTINEL.to_string()
            }
            None => {
                debug!("Reference store is empty, emitting sentinel");
                UNKNOWN_SENTINEL.to_string()
            }
        })
        .collect()
}
