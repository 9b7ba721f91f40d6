// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are YAML documents. Every templated field is kept as raw text here;
//! expansion happens in the preprocessor.
//!
//! Two schema revisions are accepted and both normalise into [`Packages`]:
//!
//! ```yaml
//! # early schema: comma-separated names sharing one dependency list
//! name: foo, foo-man
//! dependencies: [libc]
//!
//! # later schema: explicit per-package dependency lists
//! packages:
//!   foo: [libc]
//!   foo-man:
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A recipe exactly as authored, before template expansion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRecipe {
    /// Output package name(s), comma separated (early schema)
    #[serde(default, alias = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Output package name → dependency templates (later schema)
    #[serde(default, alias = "Packages", skip_serializing_if = "BTreeMap::is_empty")]
    pub packages: BTreeMap<String, Option<Vec<String>>>,

    /// Names of tools from the registry
    #[serde(default, alias = "Tools")]
    pub tools: Vec<String>,

    /// Semantic version of the packaged software
    #[serde(default, alias = "Version", deserialize_with = "scalar_string")]
    pub version: String,

    /// Source location templates
    #[serde(default, alias = "Sources")]
    pub sources: Vec<String>,

    /// Build script, one template line per entry
    #[serde(default, alias = "Script")]
    pub script: Vec<String>,

    /// Dependency templates shared by every package (early schema)
    #[serde(default, alias = "Dependencies")]
    pub dependencies: Vec<String>,

    /// Build-time dependency templates
    #[serde(default, alias = "BuildDependencies", alias = "builddependencies")]
    pub build_dependencies: Vec<String>,

    /// Target architecture, usually filled in by the front end
    #[serde(default, alias = "Arch")]
    pub arch: String,

    /// Extra values available to templates
    #[serde(default, alias = "Data")]
    pub data: RecipeData,
}

impl RawRecipe {
    /// Normalise both package schemas into one name → dependencies map
    ///
    /// Dependency lists are still unexpanded templates.
    pub fn packages(&self) -> Result<Packages> {
        let mut packages = Packages::default();

        match (&self.name, self.packages.is_empty()) {
            (Some(_), false) => {
                return Err(Error::InvalidRecipe(
                    "recipe declares both `name` and `packages`".to_string(),
                ));
            }
            (None, true) => {
                return Err(Error::InvalidRecipe(
                    "recipe declares no output packages".to_string(),
                ));
            }
            (Some(names), true) => {
                for name in names.split(',') {
                    packages.insert(name.trim(), self.dependencies.clone())?;
                }
            }
            (None, false) => {
                if !self.dependencies.is_empty() {
                    return Err(Error::InvalidRecipe(
                        "top-level `dependencies` cannot be combined with `packages`".to_string(),
                    ));
                }
                for (name, deps) in &self.packages {
                    packages.insert(name, deps.clone().unwrap_or_default())?;
                }
            }
        }

        Ok(packages)
    }
}

/// Accept `version: 3` as well as `version: "3"`
///
/// Integers keep their text. YAML reads an unquoted `1.10` as the float 1.1,
/// so fractional numbers are rejected instead of silently renumbered.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        serde_yaml::Value::Number(n) => Err(D::Error::custom(format!(
            "version {n} was read as a number; quote it, e.g. version: \"{n}\""
        ))),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a version string, found {other:?}"
        ))),
    }
}

/// Typed data bag exposed to templates as `.data`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeData {
    /// Flags passed to `./configure` by the `configure` template function
    #[serde(default, alias = "ConfigureFlags")]
    pub configure_flags: Vec<String>,

    /// Flags appended by the `make` template function
    #[serde(default, alias = "MakeFlags")]
    pub make_flags: Vec<String>,

    /// Free-form values, referenced as `.data.variables.<key>`
    #[serde(default, alias = "Variables")]
    pub variables: BTreeMap<String, String>,
}

/// Output packages of a recipe, keyed by name
///
/// Names are unique and iterate in sorted order, which keeps every derived
/// artifact deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packages {
    entries: BTreeMap<String, Vec<String>>,
}

impl Packages {
    fn insert(&mut self, name: &str, dependencies: Vec<String>) -> Result<()> {
        validate_package_name(name)?;
        if self.entries.contains_key(name) {
            return Err(Error::InvalidRecipe(format!(
                "package {name:?} declared more than once"
            )));
        }
        self.entries.insert(name.to_string(), dependencies);
        Ok(())
    }

    /// Iterate over (name, dependency templates)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.as_slice()))
    }

    /// Package names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Package names become directory names under `out/`
fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRecipe("empty package name".to_string()));
    }
    if name.starts_with('.')
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(Error::InvalidRecipe(format!(
            "invalid package name {name:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with_name(name: &str) -> RawRecipe {
        RawRecipe {
            name: Some(name.to_string()),
            dependencies: vec!["libc".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_comma_separated_names() {
        let packages = recipe_with_name("foo, foo-man ,foo-dev").packages().unwrap();
        assert_eq!(packages.names(), vec!["foo", "foo-dev", "foo-man"]);
        for (_, deps) in packages.iter() {
            assert_eq!(deps, ["libc".to_string()]);
        }
    }

    #[test]
    fn test_package_map_null_deps_is_empty() {
        let mut recipe = RawRecipe::default();
        recipe.packages.insert("foo".to_string(), Some(vec!["libc".to_string()]));
        recipe.packages.insert("foo-man".to_string(), None);

        let packages = recipe.packages().unwrap();
        let collected: Vec<_> = packages.iter().collect();
        assert_eq!(collected[0], ("foo", &["libc".to_string()][..]));
        assert_eq!(collected[1].0, "foo-man");
        assert!(collected[1].1.is_empty());
    }

    #[test]
    fn test_both_schemas_rejected() {
        let mut recipe = recipe_with_name("foo");
        recipe.packages.insert("bar".to_string(), None);
        assert!(matches!(recipe.packages(), Err(Error::InvalidRecipe(_))));
    }

    #[test]
    fn test_no_packages_rejected() {
        assert!(RawRecipe::default().packages().is_err());
    }

    #[test]
    fn test_duplicate_and_bad_names_rejected() {
        assert!(recipe_with_name("foo,foo").packages().is_err());
        assert!(recipe_with_name("foo,,bar").packages().is_err());
        assert!(recipe_with_name("../etc").packages().is_err());
        assert!(recipe_with_name(".hidden").packages().is_err());
    }
}
