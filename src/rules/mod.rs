// src/rules/mod.rs

//! Build rule graph
//!
//! The rule graph is the contract handed to the external build runner. It
//! renders as a GNU make file; targets are derived only from package and
//! source names, so rendering the same generator twice gives identical bytes.
//!
//! # Targets
//!
//! | Target                  | Prerequisites                                   |
//! |-------------------------|-------------------------------------------------|
//! | `all` (phony)           | every `out/<pkg>.tar.gz`                        |
//! | `sources`, `out`        | -                                               |
//! | `out/<pkg>`             | `\| out`                                        |
//! | `sources/<file>`        | `\| sources`                                    |
//! | `.builddeps.list`       | -                                               |
//! | `.builddeps.installed`  | `.builddeps.list`                               |
//! | `out/<pkg>/.pkginfo`    | `\| out/<pkg>`                                  |
//! | `.build.done`           | `.builddeps.installed`, sources, `\| out/<pkg>` |
//! | `out/<pkg>.tar.gz`      | `.build.done`, `out/<pkg>/.pkginfo`             |

pub mod escape;
mod generator;

pub use generator::{RuleConfig, RuleGenerator};

use std::fmt::Write;

/// One make rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub target: String,
    pub prerequisites: Vec<String>,
    /// Listed after `|`: must exist, but their timestamps never trigger a rebuild
    pub order_only: Vec<String>,
    /// Recipe lines, already escaped for make
    pub recipe: Vec<String>,
    pub phony: bool,
}

impl Rule {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            prerequisites: Vec::new(),
            order_only: Vec::new(),
            recipe: Vec::new(),
            phony: false,
        }
    }

    pub fn phony(mut self) -> Self {
        self.phony = true;
        self
    }

    pub fn prerequisite(mut self, prerequisite: impl Into<String>) -> Self {
        self.prerequisites.push(prerequisite.into());
        self
    }

    pub fn order_only(mut self, prerequisite: impl Into<String>) -> Self {
        self.order_only.push(prerequisite.into());
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.recipe.push(line.into());
        self
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.target);
        out.push(':');
        for prerequisite in &self.prerequisites {
            out.push(' ');
            out.push_str(prerequisite);
        }
        if !self.order_only.is_empty() {
            out.push_str(" |");
            for prerequisite in &self.order_only {
                out.push(' ');
                out.push_str(prerequisite);
            }
        }
        out.push('\n');
        for line in &self.recipe {
            out.push('\t');
            out.push_str(line);
            out.push('\n');
        }
    }
}

/// An ordered set of rules plus the variables they use
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleGraph {
    /// Exported to every recipe's environment
    pub variables: Vec<(String, String)>,
    pub rules: Vec<Rule>,
    /// Run each recipe in one shell invocation
    pub single_shell: bool,
}

impl RuleGraph {
    pub fn rule(&self, target: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.target == target)
    }

    /// Targets in definition order
    pub fn targets(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.target.as_str()).collect()
    }

    /// Render as a GNU make file; the first rule is the default goal
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Generated by pkgcook. Do not edit.\n\n");
        out.push_str("SHELL := /bin/sh\n");
        if self.single_shell {
            out.push_str(".ONESHELL:\n");
            out.push_str(".SHELLFLAGS := -ec\n");
        }
        out.push_str(".DELETE_ON_ERROR:\n");
        // Build scripts call `${MAKE:-make}` so they also run outside make
        out.push_str("export MAKE\n");

        if !self.variables.is_empty() {
            out.push('\n');
            for (name, value) in &self.variables {
                let _ = writeln!(out, "export {name} := {value}");
            }
        }

        let phony: Vec<&str> = self
            .rules
            .iter()
            .filter(|r| r.phony)
            .map(|r| r.target.as_str())
            .collect();
        if !phony.is_empty() {
            let _ = writeln!(out, "\n.PHONY: {}", phony.join(" "));
        }

        for rule in &self.rules {
            out.push('\n');
            rule.render(&mut out);
        }
        out
    }
}
