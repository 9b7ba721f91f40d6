// src/commands/tools.rs

//! Tools command - list registered build tools

use anyhow::Result;
use pkgcook::ToolRegistry;

pub fn cmd_tools() -> Result<()> {
    let registry = ToolRegistry::with_builtins();

    for tool in registry.tools() {
        println!("{} {}", tool.name(), tool.version());
        if !tool.description().is_empty() {
            println!("  {}", tool.description());
        }
        if !tool.dependencies().is_empty() {
            println!("  depends: {}", tool.dependencies().join(" "));
        }
        let functions = tool.functions().names();
        if !functions.is_empty() {
            println!("  functions: {}", functions.join(" "));
        }
    }

    Ok(())
}
