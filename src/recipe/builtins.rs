// src/recipe/builtins.rs

//! Template functions every recipe gets
//!
//! These emit script fragments. A fragment may span several lines; the
//! preprocessor splits the expanded script on newlines, so each line becomes
//! its own build step.

use crate::layout::OUT_DIR;
use crate::recipe::format::RawRecipe;
use crate::rules::escape::shell_quote;
use crate::template::{expect_args, string_arg, words, FunctionMap, Value};

/// Build the built-in namespace for one recipe
///
/// `configure`, `make` and `arch` capture values from the recipe, so the map
/// is built per recipe rather than shared.
pub fn builtin_functions(recipe: &RawRecipe) -> FunctionMap {
    let mut funcs = FunctionMap::with_helpers();

    // Script lines are plain shell; the generated Makefile exports MAKE
    let make_flags = recipe.data.make_flags.clone();
    funcs.insert("make", move |args: &[Value]| {
        let mut line = vec!["${MAKE:-make}".to_string()];
        line.extend(make_flags.iter().cloned());
        line.extend(words(args));
        Ok(Value::String(line.join(" ")))
    });

    let configure_flags = recipe.data.configure_flags.clone();
    funcs.insert("configure", move |args: &[Value]| {
        let mut line = vec!["./configure".to_string()];
        line.extend(configure_flags.iter().cloned());
        line.extend(words(args));
        Ok(Value::String(line.join(" ")))
    });

    funcs.insert("extract", |args: &[Value]| {
        expect_args(args, 3, "extract")?;
        let name = string_arg(args, 0, "extract")?;
        let version = string_arg(args, 1, "extract")?;
        let ext = string_arg(args, 2, "extract")?;
        let unpacked = format!("{name}-{version}");
        Ok(Value::String(format!(
            "tar -xf {}\nmv {} {}",
            shell_quote(&format!("sources/{unpacked}.{ext}")),
            shell_quote(&unpacked),
            shell_quote(&name)
        )))
    });

    funcs.insert("pkmv", |args: &[Value]| {
        expect_args(args, 3, "pkmv")?;
        let file = string_arg(args, 0, "pkmv")?;
        let from = string_arg(args, 1, "pkmv")?;
        let to = string_arg(args, 2, "pkmv")?;
        move_between(&file, &from, &to).map(Value::String)
    });

    funcs.insert("manpages", |args: &[Value]| {
        expect_args(args, 2, "manpages")?;
        let from = string_arg(args, 0, "manpages")?;
        let to = string_arg(args, 1, "manpages")?;
        move_between("usr/share/man", &from, &to).map(Value::String)
    });

    funcs.insert("headers", |args: &[Value]| {
        expect_args(args, 2, "headers")?;
        let from = string_arg(args, 0, "headers")?;
        let to = string_arg(args, 1, "headers")?;
        move_between("usr/include", &from, &to).map(Value::String)
    });

    let recipe_arch = recipe.arch.clone();
    funcs.insert("arch", move |args: &[Value]| {
        let name = match args {
            [] => recipe_arch.clone(),
            [_] => string_arg(args, 0, "arch")?,
            _ => return Err(format!("arch expects at most 1 argument, got {}", args.len())),
        };
        canonical_arch(&name)
            .map(Value::from)
            .ok_or_else(|| format!("unknown architecture {name:?}"))
    });

    funcs
}

/// Canonical triple component for a logical architecture name
pub fn canonical_arch(name: &str) -> Option<&'static str> {
    match name {
        "x86_64" | "amd64" => Some("x86_64"),
        "x86" | "386" | "i686" => Some("i686"),
        "aarch64" | "arm64" => Some("aarch64"),
        "arm" => Some("arm"),
        "riscv64" => Some("riscv64"),
        "ppc64le" => Some("powerpc64le"),
        _ => None,
    }
}

/// `mkdir -p` the destination parent, then move `path` from one output tree to another
fn move_between(path: &str, from: &str, to: &str) -> Result<String, String> {
    let path = path.trim_matches('/');
    if path.is_empty() || path.split('/').any(|part| part == "..") {
        return Err(format!("invalid path {path:?}"));
    }
    for pkg in [from, to] {
        if pkg.is_empty() || pkg.contains('/') || pkg.starts_with('.') {
            return Err(format!("invalid package name {pkg:?}"));
        }
    }

    let dest_dir = match path.rsplit_once('/') {
        Some((parent, _)) => format!("{OUT_DIR}/{to}/{parent}"),
        None => format!("{OUT_DIR}/{to}"),
    };
    Ok(format!(
        "mkdir -p {}\nmv {} {}",
        shell_quote(&dest_dir),
        shell_quote(&format!("{OUT_DIR}/{from}/{path}")),
        shell_quote(&format!("{OUT_DIR}/{to}/{path}"))
    ))
}
