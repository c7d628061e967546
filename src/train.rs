//! Training
//!
//! Builds the reference database from a directory of labeled captcha files
//! (filename stem = expected text) and supports appending single
//! already-labeled samples.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::solver::{classify_content, Recognizer};
use crate::store::{ReferenceEntry, ReferenceStore};

/// Outcome counters for a database rebuild
#[derive(Debug, Default)]
pub struct TrainSummary {
    pub files_ok: usize,
    pub files_skipped: usize,
    pub samples_added: usize,
}

/// Rebuild the reference database from a directory of labeled captchas.
///
/// The existing database content is replaced. Files whose extracted character
/// count does not match the label length are skipped with a warning; a
/// per-file failure never aborts the rebuild.
pub fn rebuild_database(
    labeled_dir: &Path,
    store: &mut ReferenceStore,
    recognizer: &Recognizer,
) -> Result<TrainSummary> {
    let mut files: Vec<_> = std::fs::read_dir(labeled_dir)
        .with_context(|| format!("Failed to read {}", labeled_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
        })
        .collect();
    files.sort();

    store.clear()?;

    let mut summary = TrainSummary::default();
    for path in files {
        let Some(label) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!("Skipping {}: unreadable file name", path.display());
            summary.files_skipped += 1;
            continue;
        };
        let label = label.to_uppercase();

        let content = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.files_skipped += 1;
                continue;
            }
        };

        match ingest_labeled(&content, &label, store, recognizer) {
            Ok(added) => {
                summary.files_ok += 1;
                summary.samples_added += added;
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.files_skipped += 1;
            }
        }
    }

    store.persist()?;
    info!(
        "Training complete: {} file(s) ingested, {} skipped, {} sample(s) stored",
        summary.files_ok, summary.files_skipped, summary.samples_added
    );
    Ok(summary)
}

/// Extract a labeled captcha and append one entry per character.
///
/// Fails when the extracted character count does not match the label length
/// or when any character normalizes to a degenerate cloud, since a mismatch
/// means the labels would be assigned to the wrong shapes.
fn ingest_labeled(
    content: &[u8],
    label: &str,
    store: &mut ReferenceStore,
    recognizer: &Recognizer,
) -> Result<usize> {
    let source = classify_content(content);
    let clouds = recognizer.extract_normalized(&source);

    let chars: Vec<char> = label.chars().collect();
    if clouds.len() != chars.len() {
        bail!(
            "label '{}' has {} character(s) but {} shape(s) were extracted",
            label,
            chars.len(),
            clouds.len()
        );
    }

    for (cloud, ch) in clouds.iter().zip(&chars) {
        if cloud.is_empty() {
            bail!("character '{}' produced a degenerate shape", ch);
        }
    }

    let added = clouds.len();
    for (cloud, ch) in clouds.into_iter().zip(chars) {
        store.insert(ReferenceEntry {
            label: ch.to_string(),
            points: cloud,
        });
    }

    Ok(added)
}

/// Append a single captcha known to contain exactly one character
pub fn add_sample(
    content: &[u8],
    label: &str,
    store: &mut ReferenceStore,
    recognizer: &Recognizer,
) -> Result<()> {
    if label.chars().count() != 1 {
        bail!("expected a single-character label, got '{}'", label);
    }
    let label = label.to_uppercase();

    let added = ingest_labeled(content, &label, store, recognizer)?;
    store.persist()?;
    info!("Added {} sample for label '{}'", added, label);
    Ok(())
}
