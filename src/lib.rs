// src/lib.rs

//! pkgcook: declarative package recipes to built packages
//!
//! A recipe names output packages, a version, sources and a build script.
//! pkgcook turns it into packages in four stages:
//!
//! - Recipe: YAML parsed into a [`RawRecipe`]
//! - Preprocess: template expansion against the recipe and its tools,
//!   yielding an immutable [`PackageGenerator`]
//! - Fetch: concurrent acquisition of `https`, `git` and `file` sources
//! - Rules: a Makefile whose targets produce `out/<pkg>.tar.gz`
//!
//! The [`Kitchen`] drives the stages and runs `make` over the result.

mod error;
pub mod hash;
pub mod kitchen;
pub mod layout;
pub mod pkginfo;
pub mod recipe;
pub mod rules;
pub mod source;
pub mod template;
pub mod tools;
pub mod version;

pub use error::{Error, Result};
pub use kitchen::{CookResult, FetchMode, Kitchen, KitchenConfig};
pub use pkginfo::PackageInfo;
pub use recipe::{
    parse_recipe, parse_recipe_file, Package, PackageGenerator, Preprocessor, RawRecipe,
};
pub use rules::{RuleConfig, RuleGenerator};
pub use source::{Source, SourceFetcher, SourceKind};
pub use tools::{StaticTool, Tool, ToolRegistry};
pub use version::parse_version;
