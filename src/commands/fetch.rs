// src/commands/fetch.rs

//! Fetch command - acquire a recipe's sources

use super::load_generator;
use crate::cli::RecipeArgs;
use anyhow::{Context, Result};
use pkgcook::SourceFetcher;
use std::path::Path;
use tracing::info;

/// Fetch every source of a recipe into `<dir>/sources`
pub fn cmd_fetch(recipe: &RecipeArgs, dir: &str, progress: bool) -> Result<()> {
    let generator = load_generator(recipe)?;
    let dir = Path::new(dir);

    println!("Fetching {} source(s)...", generator.sources().len());
    SourceFetcher::new(generator.recipe_dir())?
        .with_progress(progress)
        .fetch_all(generator.sources(), dir)
        .with_context(|| "Failed to fetch sources")?;

    println!("\n[COMPLETE] Fetched {} source(s):", generator.sources().len());
    for source in generator.sources() {
        println!("  - {}", dir.join(source.dest()).display());
    }
    info!("Fetched sources into {}", dir.display());

    Ok(())
}
