// src/recipe/mod.rs

//! Recipes: parsing and template expansion
//!
//! A recipe describes how to build one or more output packages from one set
//! of upstream sources:
//!
//! ```yaml
//! packages:
//!   foo: [libc]
//!   foo-man:
//! version: 1.0.0
//! tools: [autotools]
//! sources:
//!   - https://example.com/foo-{{ .version }}.tar.gz
//! script:
//!   - '{{ extract "foo" .version "tar.gz" }}'
//!   - cd foo && {{ autoreconf }} && {{ configure }}
//!   - cd foo && {{ make }} && {{ make "install" "DESTDIR=$PWD/../out/foo" }}
//!   - '{{ manpages "foo" "foo-man" }}'
//! ```
//!
//! Script lines are shell text. They are escaped for make only when the
//! build rule is emitted.
//!
//! Parsing yields a [`RawRecipe`]; the [`Preprocessor`] expands it into an
//! immutable [`PackageGenerator`] that fetching and rule generation consume.

mod builtins;
mod format;
pub mod parser;
mod preprocess;

pub use builtins::canonical_arch;
pub use format::{Packages, RawRecipe, RecipeData};
pub use parser::{parse_recipe, parse_recipe_file, to_yaml, validate_recipe};
pub use preprocess::{Package, PackageGenerator, Preprocessor, ToolInfo};
