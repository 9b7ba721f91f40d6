// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::recipe::format::RawRecipe;
use std::path::Path;

/// Parse a recipe from YAML bytes
///
/// Parsing is all-or-nothing: on failure no recipe value exists at all.
pub fn parse_recipe(content: &[u8]) -> Result<RawRecipe> {
    serde_yaml::from_slice(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<RawRecipe> {
    let content = std::fs::read(path).map_err(|e| {
        Error::IoError(format!(
            "Failed to read recipe file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_recipe(&content)
}

/// Serialize a recipe back to YAML
pub fn to_yaml(recipe: &RawRecipe) -> Result<String> {
    serde_yaml::to_string(recipe).map_err(Error::from)
}

/// Validate a recipe for completeness without expanding templates
///
/// Hard problems are errors; soft problems come back as warnings.
pub fn validate_recipe(recipe: &RawRecipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.version.trim().is_empty() {
        return Err(Error::InvalidRecipe("recipe version cannot be empty".to_string()));
    }
    recipe.packages()?;

    if recipe.sources.is_empty() {
        warnings.push("Recipe has no sources".to_string());
    }
    if recipe.script.is_empty() {
        warnings.push("Recipe has an empty build script".to_string());
    }
    for source in &recipe.sources {
        if source.trim_start().starts_with("http://") {
            warnings.push(format!("Source {} uses insecure http and will be rejected", source));
        }
    }

    Ok(warnings)
}
