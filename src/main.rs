//! captcha-toolkit - Geometric captcha text recognizer
//!
//! Extracts character shapes from captcha images or markup and matches them
//! against a labeled reference set by point-cloud distance. No ML, no OCR
//! engine, just geometry.

mod config;
mod extract;
mod fetch;
mod geometry;
mod matching;
mod solver;
mod store;
mod train;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::SolverConfig;
use crate::solver::Recognizer;
use crate::store::{ReferenceStore, SharedStore};

/// Geometric captcha text recognizer
#[derive(Parser, Debug)]
#[command(name = "captcha-toolkit")]
#[command(about = "Solve text captchas by point-cloud shape matching")]
struct Args {
    /// Reference database file (defaults to the platform data directory)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Configuration file (defaults to built-in tuning constants)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a captcha from a local file or a URL
    Solve {
        /// Captcha file (image or markup)
        path: Option<PathBuf>,

        /// Fetch the captcha from a URL instead
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Rebuild the reference database from a directory of labeled captchas
    Train {
        /// Directory of captcha files named after their text
        dir: PathBuf,
    },
    /// Add a single-character captcha to the reference database
    Add {
        /// Captcha file containing exactly one character
        path: PathBuf,

        /// The character it shows
        #[arg(short, long)]
        label: String,
    },
    /// Print reference database statistics
    Stats,
    /// Render the shapes extracted from a captcha as ASCII art
    Show {
        /// Captcha file (image or markup)
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let config = load_or_create_config(args.config.as_deref())?;
    let recognizer = Recognizer::new(config);

    let db_path = match args.database {
        Some(path) => path,
        None => store::default_database_path()?,
    };
    let store: SharedStore = Arc::new(RwLock::new(ReferenceStore::load(&db_path)));

    match args.command {
        Command::Solve { path, url } => {
            let content = match (path, url) {
                (Some(path), None) => std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, Some(url)) => fetch::fetch_content(&url)?,
                (Some(_), Some(_)) => bail!("Pass either a file or --url, not both"),
                (None, None) => bail!("Pass a captcha file or --url"),
            };

            let text = recognizer.solve_bytes(&content, &store.read());
            println!("{}", text);
        }
        Command::Train { dir } => {
            let mut store = store.write();
            let summary = train::rebuild_database(&dir, &mut store, &recognizer)?;
            println!(
                "Ingested {} file(s) ({} skipped), {} reference sample(s) stored",
                summary.files_ok, summary.files_skipped, summary.samples_added
            );
        }
        Command::Add { path, label } => {
            let content = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let mut store = store.write();
            train::add_sample(&content, &label, &mut store, &recognizer)?;
            println!("Added '{}' ({} entries total)", label.to_uppercase(), store.entry_count());
        }
        Command::Stats => {
            let store = store.read();
            print_stats(&store);
        }
        Command::Show { path } => {
            let content = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let source = solver::classify_content(&content);
            let clouds = recognizer.extract_normalized(&source);
            if clouds.is_empty() {
                warn!("No character shapes found in {}", path.display());
            }
            for (i, cloud) in clouds.iter().enumerate() {
                println!("--- character {} ({} points) ---", i + 1, cloud.len());
                println!("{}", geometry::render_ascii(cloud, 40, 20));
            }
        }
    }

    Ok(())
}

/// Load the configuration file, creating it with defaults on first run
fn load_or_create_config(path: Option<&std::path::Path>) -> Result<SolverConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => store::get_config_dir()?.join("config.toml"),
    };

    if path.exists() {
        let config = config::load_config(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    } else {
        let config = SolverConfig::default();
        config::save_config(&config, &path)
            .with_context(|| format!("Failed to write default config to {}", path.display()))?;
        info!("Created default configuration at {}", path.display());
        Ok(config)
    }
}

fn print_stats(store: &ReferenceStore) {
    println!("Reference entries: {}", store.entry_count());
    if let Some(path) = store.path() {
        println!("Database: {}", path.display());
    }

    let mut counts: Vec<(String, usize)> = Vec::new();
    for entry in store.entries() {
        match counts.iter_mut().find(|(label, _)| *label == entry.label) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.label.clone(), 1)),
        }
    }
    counts.sort();

    for (label, n) in counts {
        println!("  {}: {} sample(s)", label, n);
    }
}
