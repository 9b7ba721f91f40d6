// src/commands/cook.rs

//! Cook command - build packages from recipes

use super::load_generator;
use crate::cli::{RecipeArgs, RuleArgs};
use anyhow::{Context, Result};
use pkgcook::{FetchMode, Kitchen, KitchenConfig};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Command-line overrides for the kitchen configuration
pub struct CookOptions<'a> {
    pub config: Option<&'a str>,
    pub jobs: Option<u32>,
    pub deferred: bool,
    pub keep_builddir: bool,
    pub tree: Option<&'a str>,
}

/// Cook every output package of a recipe
///
/// Archives land in `out_dir` as `<pkg>.tar.gz`, or, with `tree`, the whole
/// built working tree is written to that single file.
pub fn cmd_cook(
    recipe: &RecipeArgs,
    rules: &RuleArgs,
    out_dir: &str,
    options: CookOptions<'_>,
) -> Result<()> {
    let generator = load_generator(recipe)?;
    let config = kitchen_config(rules, &options)?;

    println!(
        "Cooking {} package(s) version {} with {} parallel jobs...",
        generator.packages().len(),
        generator.version(),
        config.jobs
    );
    let kitchen = Kitchen::new(config);

    if let Some(tree) = options.tree {
        let file = File::create(tree).with_context(|| format!("Failed to create {}", tree))?;
        kitchen
            .cook_tree(&generator, BufWriter::new(file))
            .with_context(|| "Failed to cook recipe")?;
        println!("\n[COMPLETE] Wrote build tree: {}", tree);
        return Ok(());
    }

    let result = kitchen
        .cook(&generator)
        .with_context(|| "Failed to cook recipe")?;

    let out_dir = Path::new(out_dir);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    println!("\n[COMPLETE] Cooked:");
    for (name, bytes) in &result.packages {
        let path = out_dir.join(format!("{name}.tar.gz"));
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  - {}", path.display());
    }

    if let Some(dir) = &result.build_dir {
        println!("\nBuild directory kept at {}", dir.display());
    }

    info!("Successfully cooked {} package(s)", result.packages.len());
    Ok(())
}

fn kitchen_config(rules: &RuleArgs, options: &CookOptions<'_>) -> Result<KitchenConfig> {
    let mut config = match options.config {
        Some(path) => KitchenConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load kitchen config: {}", path))?,
        None => KitchenConfig::default(),
    };

    if let Some(jobs) = options.jobs {
        config.jobs = jobs;
    }
    if options.deferred {
        config.fetch = FetchMode::Deferred;
    }
    if rules.single_shell {
        config.single_shell = true;
    }
    if let Some(installer) = &rules.installer {
        config.installer = Some(installer.clone());
    }
    config.keep_builddir |= options.keep_builddir;

    config.validate()?;
    Ok(config)
}
