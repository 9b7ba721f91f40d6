// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::CookOptions;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate { recipe, rules, out }) => {
            commands::cmd_generate(&recipe, &rules, &out)
        }
        Some(Commands::Fetch {
            recipe,
            dir,
            progress,
        }) => commands::cmd_fetch(&recipe, &dir, progress),
        Some(Commands::Cook {
            recipe,
            rules,
            out_dir,
            config,
            jobs,
            deferred,
            keep_builddir,
            tree,
        }) => commands::cmd_cook(
            &recipe,
            &rules,
            &out_dir,
            CookOptions {
                config: config.as_deref(),
                jobs,
                deferred,
                keep_builddir,
                tree: tree.as_deref(),
            },
        ),
        Some(Commands::Source { recipe, out }) => commands::cmd_source(&recipe, &out),
        Some(Commands::Check { recipe, summary }) => commands::cmd_check(&recipe, summary),
        Some(Commands::Tools) => commands::cmd_tools(),
        None => {
            // No command given, print help
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
