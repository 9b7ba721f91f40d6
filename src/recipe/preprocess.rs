// src/recipe/preprocess.rs

//! Template expansion of a raw recipe
//!
//! Every templated field (sources, build dependencies, per-package
//! dependencies and the script) is rendered against the raw recipe with the
//! built-in functions plus those of every requested tool. The result is a
//! [`PackageGenerator`]: fully concrete and immutable.
//!
//! Any failure aborts the whole pass; no partially expanded generator is
//! ever returned.

use crate::error::{Error, Result};
use crate::pkginfo::PackageInfo;
use crate::recipe::builtins::builtin_functions;
use crate::recipe::format::RawRecipe;
use crate::source::Source;
use crate::template::{self, FunctionMap, Value};
use crate::tools::{Tool, ToolRegistry};
use crate::version::parse_version;
use semver::Version;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One output package after expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    name: String,
    dependencies: Vec<String>,
}

impl Package {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// What a tool contributed, kept for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: Version,
    pub dependencies: Vec<String>,
}

/// A fully expanded recipe
#[derive(Debug, Clone, Serialize)]
pub struct PackageGenerator {
    packages: Vec<Package>,
    tools: Vec<ToolInfo>,
    version: Version,
    sources: Vec<Source>,
    script: Vec<String>,
    build_dependencies: Vec<String>,
    arch: String,
    recipe_dir: PathBuf,
}

impl PackageGenerator {
    /// Output packages, sorted by name
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Sources in recipe order
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Script lines; each is one build step
    pub fn script(&self) -> &[String] {
        &self.script
    }

    /// Recipe build dependencies followed by tool dependencies
    pub fn build_dependencies(&self) -> &[String] {
        &self.build_dependencies
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn recipe_dir(&self) -> &Path {
        &self.recipe_dir
    }

    /// Metadata record for one package
    pub fn package_info(&self, package: &Package) -> PackageInfo {
        PackageInfo::new(&package.name, &self.version.to_string(), &package.dependencies)
    }

    /// Script as a standalone shell file
    ///
    /// Script lines are plain shell, so this runs with `sh` outside make.
    pub fn script_file(&self) -> String {
        let mut text = String::from("#!/bin/sh\nset -e\n");
        for line in &self.script {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Pretty JSON, for `pkgcook check`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Expands raw recipes using a tool registry
pub struct Preprocessor<'r> {
    registry: &'r ToolRegistry,
    recipe_dir: PathBuf,
}

impl<'r> Preprocessor<'r> {
    pub fn new(registry: &'r ToolRegistry) -> Self {
        Self {
            registry,
            recipe_dir: PathBuf::from("."),
        }
    }

    /// Directory `file:` sources are relative to
    pub fn with_recipe_dir(mut self, dir: &Path) -> Self {
        self.recipe_dir = dir.to_path_buf();
        self
    }

    /// Expand every templated field of `recipe`
    pub fn preprocess(&self, recipe: &RawRecipe) -> Result<PackageGenerator> {
        let tools = self.resolve_tools(&recipe.tools)?;
        let funcs = merged_functions(recipe, &tools);

        let version = parse_version(&recipe.version)?;
        let packages = recipe.packages()?;

        let context = serde_json::to_value(recipe)
            .map_err(|e| Error::InvalidRecipe(format!("Failed to build template context: {e}")))?;
        let expander = Expander {
            context: &context,
            funcs: &funcs,
        };

        let mut sources = Vec::with_capacity(recipe.sources.len());
        for (i, text) in recipe.sources.iter().enumerate() {
            let expanded = expander.expand(&format!("sources[{i}]"), text)?;
            let source = Source::parse(&expanded)?;
            if sources
                .iter()
                .any(|s: &Source| s.file_name() == source.file_name())
            {
                return Err(Error::InvalidRecipe(format!(
                    "sources[{i}]: another source already writes sources/{}",
                    source.file_name()
                )));
            }
            sources.push(source);
        }

        let mut build_dependencies = expander.expand_list("build_dependencies", &recipe.build_dependencies)?;
        for tool in &tools {
            build_dependencies.extend(tool.dependencies().iter().cloned());
        }

        let mut expanded_packages = Vec::with_capacity(packages.len());
        for (name, deps) in packages.iter() {
            let dependencies = expander.expand_list(&format!("packages.{name}.dependencies"), deps)?;
            expanded_packages.push(Package {
                name: name.to_string(),
                dependencies,
            });
        }

        let script = expander
            .expand("script", &recipe.script.join("\n"))?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        let tools = tools
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                version: tool.version().clone(),
                dependencies: tool.dependencies().to_vec(),
            })
            .collect();

        info!(
            "Preprocessed recipe: {} package(s), {} source(s), version {}",
            expanded_packages.len(),
            sources.len(),
            version
        );

        Ok(PackageGenerator {
            packages: expanded_packages,
            tools,
            version,
            sources,
            script,
            build_dependencies,
            arch: recipe.arch.clone(),
            recipe_dir: self.recipe_dir.clone(),
        })
    }

    /// Look up requested tools in recipe order; repeats are ignored
    fn resolve_tools(&self, names: &[String]) -> Result<Vec<Arc<dyn Tool>>> {
        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(names.len());
        for name in names {
            if tools.iter().any(|t| t.name() == name) {
                debug!("Tool {} requested more than once", name);
                continue;
            }
            tools.push(self.registry.lookup(name)?);
        }
        Ok(tools)
    }
}

/// Built-ins first, then each tool in order; later names shadow earlier ones
fn merged_functions(recipe: &RawRecipe, tools: &[Arc<dyn Tool>]) -> FunctionMap {
    let mut funcs = builtin_functions(recipe);
    for tool in tools {
        for name in funcs.merge(tool.functions()) {
            debug!("Tool {} shadows template function {}", tool.name(), name);
        }
    }
    funcs
}

struct Expander<'a> {
    context: &'a Value,
    funcs: &'a FunctionMap,
}

impl Expander<'_> {
    fn expand(&self, field: &str, text: &str) -> Result<String> {
        template::expand(text, self.context, self.funcs).map_err(|e| Error::Template {
            field: field.to_string(),
            message: e.to_string(),
        })
    }

    /// Expand each entry; entries that render blank are dropped
    fn expand_list(&self, field: &str, items: &[String]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let expanded = self.expand(&format!("{field}[{i}]"), item)?;
            let trimmed = expanded.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
        Ok(out)
    }
}
