// src/commands/source.rs

//! Source command - bundle a recipe's inputs without building

use super::load_generator;
use crate::cli::RecipeArgs;
use anyhow::{Context, Result};
use pkgcook::Kitchen;
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

/// Fetch sources and write the unbuilt working tree as a gzip tar
///
/// The bundle holds `sources/`, the build script and package metadata, so a
/// build can be reproduced offline.
pub fn cmd_source(recipe: &RecipeArgs, out: &str) -> Result<()> {
    let generator = load_generator(recipe)?;

    let file = File::create(out).with_context(|| format!("Failed to create {}", out))?;
    Kitchen::with_defaults()
        .package_source(&generator, BufWriter::new(file))
        .with_context(|| "Failed to package sources")?;

    println!("[COMPLETE] Wrote source bundle: {}", out);
    info!("Packaged {} source(s) into {}", generator.sources().len(), out);
    Ok(())
}
