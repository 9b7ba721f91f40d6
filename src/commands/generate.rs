// src/commands/generate.rs

//! Generate command - write the Makefile for a recipe

use super::load_generator;
use crate::cli::{RecipeArgs, RuleArgs};
use anyhow::{Context, Result};
use pkgcook::{RuleConfig, RuleGenerator};
use std::io::Write;
use tracing::info;

/// Expand a recipe and write its rule file to `out` ("-" for stdout)
pub fn cmd_generate(recipe: &RecipeArgs, rules: &RuleArgs, out: &str) -> Result<()> {
    let generator = load_generator(recipe)?;

    let config = RuleConfig {
        single_shell: rules.single_shell,
        installer: rules.installer.clone(),
    };
    let makefile = RuleGenerator::new(config)
        .render(&generator)
        .with_context(|| "Failed to generate rules")?;

    if out == "-" {
        std::io::stdout()
            .lock()
            .write_all(makefile.as_bytes())
            .with_context(|| "Failed to write rules to stdout")?;
    } else {
        std::fs::write(out, &makefile).with_context(|| format!("Failed to write {}", out))?;
        info!("Wrote rules for {} package(s) to {}", generator.packages().len(), out);
    }

    Ok(())
}
