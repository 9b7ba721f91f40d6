// src/commands/check.rs

//! Check command - expand a recipe without building it

use super::load_generator;
use crate::cli::RecipeArgs;
use anyhow::{Context, Result};

/// Parse, validate and expand a recipe, then print the resolved generator
///
/// Prints JSON unless `summary` asks for the human-readable form.
pub fn cmd_check(recipe: &RecipeArgs, summary: bool) -> Result<()> {
    let generator = load_generator(recipe)?;

    if !summary {
        let out = generator
            .to_json()
            .with_context(|| "Failed to serialize expanded recipe")?;
        println!("{}", out);
        return Ok(());
    }

    println!("Version: {}", generator.version());
    println!("Arch:    {}", generator.arch());

    println!("\nPackages:");
    for package in generator.packages() {
        if package.dependencies().is_empty() {
            println!("  {}", package.name());
        } else {
            println!("  {} -> {}", package.name(), package.dependencies().join(", "));
        }
    }

    if !generator.tools().is_empty() {
        println!("\nTools:");
        for tool in generator.tools() {
            println!("  {} {}", tool.name, tool.version);
        }
    }

    println!("\nSources:");
    for source in generator.sources() {
        println!("  {} -> {}", source, source.dest().display());
    }

    if !generator.build_dependencies().is_empty() {
        println!("\nBuild dependencies: {}", generator.build_dependencies().join(" "));
    }

    println!("\nScript:");
    for line in generator.script() {
        println!("  {}", line);
    }

    println!("\n[OK] Recipe expands cleanly");
    Ok(())
}
