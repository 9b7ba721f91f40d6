// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use pkgcook::{parse_recipe, PackageGenerator, Preprocessor, ToolRegistry};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Expand a recipe given as YAML with the built-in tools
pub fn generator(yaml: &str) -> PackageGenerator {
    let recipe = parse_recipe(yaml.as_bytes()).unwrap();
    Preprocessor::new(&ToolRegistry::with_builtins())
        .preprocess(&recipe)
        .unwrap()
}

/// Expand a recipe whose `file:` sources live in `dir`
pub fn generator_in(dir: &Path, yaml: &str) -> PackageGenerator {
    let recipe = parse_recipe(yaml.as_bytes()).unwrap();
    Preprocessor::new(&ToolRegistry::with_builtins())
        .with_recipe_dir(dir)
        .preprocess(&recipe)
        .unwrap()
}

/// Recipe directory holding a single local source file
///
/// Returns (TempDir, file name) - keep the TempDir alive to prevent cleanup.
pub fn recipe_dir_with_file(name: &str, content: &str) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(name), content).unwrap();
    (dir, name.to_string())
}

/// Whether a GNU make is available to run builds
pub fn have_make() -> bool {
    which::which("make").is_ok()
}

/// Lines of `path`, or none when it does not exist
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
