// src/cli/mod.rs
//! CLI definitions for pkgcook
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `generate` - Expand a recipe and write its Makefile
//! - `fetch` - Fetch a recipe's sources into a directory
//! - `cook` - Build every output package of a recipe
//! - `source` - Bundle a recipe's fetched sources and build files
//! - `check` - Parse, validate and expand a recipe without building
//! - `tools` - List the registered build tools

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pkgcook")]
#[command(author = "pkgcook Contributors")]
#[command(version)]
#[command(about = "Cook declarative package recipes into package archives", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command that reads a recipe
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Path to the recipe file
    #[arg(short = 'i', long = "in", default_value = "recipe.yaml")]
    pub recipe: String,

    /// Target architecture (defaults to the recipe's, then the host's)
    #[arg(long)]
    pub arch: Option<String>,
}

/// Options that shape the generated rules
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// Run the build script in a single shell session
    #[arg(long)]
    pub single_shell: bool,

    /// Command prefix used to install build dependencies (e.g. "apk add")
    #[arg(long)]
    pub installer: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand a recipe and write the Makefile that builds it
    Generate {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        rules: RuleArgs,

        /// Output file ("-" for stdout)
        #[arg(short, long, default_value = "-")]
        out: String,
    },

    /// Fetch a recipe's sources into <dir>/sources
    Fetch {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Working directory to fetch into
        #[arg(short, long, default_value = ".")]
        dir: String,

        /// Show download progress
        #[arg(long)]
        progress: bool,
    },

    /// Build every output package of a recipe
    Cook {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        rules: RuleArgs,

        /// Directory the package archives are written to
        #[arg(short, long, default_value = ".")]
        out_dir: String,

        /// Kitchen configuration file (TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Number of parallel build jobs (default: config, then CPU count)
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Leave fetching to the generated fetch rules
        #[arg(long)]
        deferred: bool,

        /// Keep the build directory after completion
        #[arg(long)]
        keep_builddir: bool,

        /// Write the whole built tree as one gzip tar instead of per-package archives
        #[arg(long)]
        tree: Option<String>,
    },

    /// Bundle fetched sources, script and metadata as a gzip tar
    Source {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Output file
        #[arg(short, long)]
        out: String,
    },

    /// Expand a recipe and print the result as JSON, without building it
    Check {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// List registered build tools and the template functions they add
    Tools,
}
