// src/commands/mod.rs
//! Command handlers for the pkgcook CLI

mod check;
mod cook;
mod fetch;
mod generate;
mod source;
mod tools;

pub use check::cmd_check;
pub use cook::{cmd_cook, CookOptions};
pub use fetch::cmd_fetch;
pub use generate::cmd_generate;
pub use source::cmd_source;
pub use tools::cmd_tools;

use crate::cli::RecipeArgs;
use anyhow::{Context, Result};
use pkgcook::recipe::{parse_recipe_file, validate_recipe};
use pkgcook::{PackageGenerator, Preprocessor, ToolRegistry};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read, validate and expand the recipe named by `args`
///
/// `file:` sources resolve against the recipe's own directory, so the
/// directory is made absolute before expansion.
pub(crate) fn load_generator(args: &RecipeArgs) -> Result<PackageGenerator> {
    let path = Path::new(&args.recipe);
    let mut recipe = parse_recipe_file(path)
        .with_context(|| format!("Failed to parse recipe: {}", path.display()))?;

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        warn!("{}", warning);
    }

    if let Some(arch) = &args.arch {
        recipe.arch = arch.clone();
    } else if recipe.arch.trim().is_empty() {
        recipe.arch = std::env::consts::ARCH.to_string();
    }
    debug!("Target architecture: {}", recipe.arch);

    let recipe_dir = recipe_dir(path)?;
    let registry = ToolRegistry::with_builtins();
    Preprocessor::new(&registry)
        .with_recipe_dir(&recipe_dir)
        .preprocess(&recipe)
        .with_context(|| format!("Failed to expand recipe: {}", path.display()))
}

fn recipe_dir(path: &Path) -> Result<PathBuf> {
    let absolute = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}
