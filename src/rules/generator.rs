// src/rules/generator.rs

//! Rule graph generation from an expanded recipe

use super::escape::{escape_dollars, make_ident, recipe_word};
use super::{Rule, RuleGraph};
use crate::error::{Error, Result};
use crate::layout::{
    archive_path, package_dir, pkginfo_path, BUILDDEPS_LIST, BUILDDEPS_SENTINEL, BUILD_SENTINEL,
    OUT_DIR, SOURCES_DIR,
};
use crate::recipe::PackageGenerator;
use crate::source::{Source, SourceKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options that change the generated rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Run the whole build script in one shell (`.ONESHELL:`), so `cd` and
    /// exported variables carry over between lines
    pub single_shell: bool,

    /// Shell command prefix that installs build dependencies; the
    /// dependency names are appended as arguments. `None` skips installation.
    pub installer: Option<String>,
}

/// Turns a [`PackageGenerator`] into a [`RuleGraph`]
#[derive(Debug, Clone, Default)]
pub struct RuleGenerator {
    config: RuleConfig,
}

impl RuleGenerator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Build the rule graph for a generator
    pub fn generate(&self, generator: &PackageGenerator) -> Result<RuleGraph> {
        for package in generator.packages() {
            check_target_name("package", package.name())?;
        }
        for source in generator.sources() {
            check_target_name("source", source.file_name())?;
        }

        let packages: Vec<&str> = generator.packages().iter().map(|p| p.name()).collect();
        let mut graph = RuleGraph {
            single_shell: self.config.single_shell,
            ..Default::default()
        };

        for package in generator.packages() {
            let encoded = generator.package_info(package).to_base64()?;
            graph.variables.push((pkginfo_var(package.name()), encoded));
        }

        let mut all = Rule::new("all").phony();
        for name in &packages {
            all = all.prerequisite(archive_path(name));
        }
        graph.rules.push(all);

        graph.rules.push(Rule::new(SOURCES_DIR).line("mkdir -p $@"));
        graph.rules.push(Rule::new(OUT_DIR).line("mkdir -p $@"));
        for name in &packages {
            graph
                .rules
                .push(Rule::new(package_dir(name)).order_only(OUT_DIR).line("mkdir -p $@"));
        }

        for source in generator.sources() {
            graph.rules.push(self.fetch_rule(source, generator)?);
        }

        graph.rules.push(builddeps_list_rule(generator.build_dependencies()));
        graph.rules.push(self.install_rule());

        for name in &packages {
            graph.rules.push(
                Rule::new(pkginfo_path(name))
                    .order_only(package_dir(name))
                    .line(format!("echo \"$${}\" | base64 -d > $@", pkginfo_var(name))),
            );
        }

        let mut build = Rule::new(BUILD_SENTINEL).prerequisite(BUILDDEPS_SENTINEL);
        for source in generator.sources() {
            build = build.prerequisite(source_target(source));
        }
        for name in &packages {
            build = build.order_only(package_dir(name));
        }
        // Script lines are shell text; make must not expand their `$`
        for line in generator.script() {
            build = build.line(escape_dollars(line));
        }
        // The script may have changed directory in single-shell mode
        graph.rules.push(build.line("touch \"$(CURDIR)/$@\""));

        for name in &packages {
            graph.rules.push(
                Rule::new(archive_path(name))
                    .prerequisite(BUILD_SENTINEL)
                    .prerequisite(pkginfo_path(name))
                    .line(format!("tar -czf $@ -C {} .", recipe_word(&package_dir(name)))),
            );
        }

        debug!(
            "Generated {} rules for {} package(s)",
            graph.rules.len(),
            packages.len()
        );
        Ok(graph)
    }

    /// Generate and render in one step
    pub fn render(&self, generator: &PackageGenerator) -> Result<String> {
        Ok(self.generate(generator)?.render())
    }

    fn fetch_rule(&self, source: &Source, generator: &PackageGenerator) -> Result<Rule> {
        let rule = Rule::new(source_target(source)).order_only(SOURCES_DIR);
        let url = recipe_word(&source.fetch_url());

        Ok(match source.kind() {
            SourceKind::Https { sha256 } => {
                let rule = rule.line(format!("curl -fsSL --proto =https -o $@ {url}"));
                match sha256 {
                    Some(digest) => rule.line(format!(
                        "printf '%s  %s\\n' {} $@ | sha256sum -c -",
                        recipe_word(digest)
                    )),
                    None => rule,
                }
            }
            SourceKind::Git { reference } => {
                let rule = rule.line(format!("git clone -- {url} $@"));
                match reference {
                    Some(reference) => rule.line(format!(
                        "git -C $@ checkout {}",
                        recipe_word(reference)
                    )),
                    None => rule,
                }
            }
            SourceKind::File => {
                let path = source
                    .local_path(generator.recipe_dir())
                    .ok_or_else(|| Error::GenerationError(format!("{source} has no local path")))?;
                rule.line(format!("cp {} $@", recipe_word(&path.to_string_lossy())))
            }
        })
    }

    fn install_rule(&self) -> Rule {
        let rule = Rule::new(BUILDDEPS_SENTINEL).prerequisite(BUILDDEPS_LIST);
        let rule = match &self.config.installer {
            Some(installer) => rule.line(format!(
                "if [ -s $< ]; then {} $$(cat $<); fi",
                escape_dollars(installer)
            )),
            None => rule.line("@echo 'No installer configured; assuming build dependencies are present'"),
        };
        rule.line("touch $@")
    }
}

fn builddeps_list_rule(dependencies: &[String]) -> Rule {
    let rule = Rule::new(BUILDDEPS_LIST);
    if dependencies.is_empty() {
        return rule.line(": > $@");
    }
    let words: Vec<String> = dependencies.iter().map(|d| recipe_word(d)).collect();
    rule.line(format!("printf '%s\\n' {} > $@", words.join(" ")))
}

/// Exported variable holding a package's encoded metadata
pub fn pkginfo_var(package: &str) -> String {
    format!("PKGINFO_{}", make_ident(package))
}

fn source_target(source: &Source) -> String {
    format!("{SOURCES_DIR}/{}", source.file_name())
}

/// Names used as make targets may not contain make or shell metacharacters
fn check_target_name(kind: &str, name: &str) -> Result<()> {
    let safe = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._+-@,~".contains(c));
    if !safe {
        return Err(Error::GenerationError(format!(
            "{kind} name {name:?} cannot be used as a make target"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{parse_recipe, Preprocessor};
    use crate::tools::ToolRegistry;
    use std::path::Path;

    fn generator(yaml: &str) -> PackageGenerator {
        let registry = ToolRegistry::with_builtins();
        let recipe = parse_recipe(yaml.as_bytes()).unwrap();
        Preprocessor::new(&registry)
            .with_recipe_dir(Path::new("/recipes/foo"))
            .preprocess(&recipe)
            .unwrap()
    }

    const SINGLE: &str = r#"
name: foo
version: 1.0.0
sources: ['https://example.com/a.tar.gz']
script: [make, make install]
dependencies: [libc]
"#;

    #[test]
    fn test_single_package_rules() {
        let graph = RuleGenerator::default().generate(&generator(SINGLE)).unwrap();

        assert_eq!(
            graph.targets(),
            vec![
                "all",
                "sources",
                "out",
                "out/foo",
                "sources/a.tar.gz",
                ".builddeps.list",
                ".builddeps.installed",
                "out/foo/.pkginfo",
                ".build.done",
                "out/foo.tar.gz",
            ]
        );

        let fetch = graph.rule("sources/a.tar.gz").unwrap();
        assert_eq!(fetch.order_only, ["sources"]);
        assert_eq!(
            fetch.recipe,
            ["curl -fsSL --proto =https -o $@ https://example.com/a.tar.gz"]
        );

        let build = graph.rule(".build.done").unwrap();
        assert_eq!(build.prerequisites, [".builddeps.installed", "sources/a.tar.gz"]);
        assert_eq!(build.order_only, ["out/foo"]);
        assert_eq!(build.recipe[..2], ["make", "make install"]);

        let archive = graph.rule("out/foo.tar.gz").unwrap();
        assert_eq!(archive.prerequisites, [".build.done", "out/foo/.pkginfo"]);

        let (name, value) = &graph.variables[0];
        assert_eq!(name, "PKGINFO_foo");
        let info = crate::pkginfo::PackageInfo::new("foo", "1.0.0", &["libc".to_string()]);
        assert_eq!(value, &info.to_base64().unwrap());
    }

    #[test]
    fn test_split_packages_share_build() {
        let generator = generator(
            r#"
packages:
  foo: [libc]
  foo-man:
version: 1.0.0
script: ["make install DESTDIR=$PWD/out/foo", '{{ manpages "foo" "foo-man" }}']
"#,
        );
        let graph = RuleGenerator::default().generate(&generator).unwrap();
        let targets = graph.targets();

        let archives: Vec<_> = targets.iter().filter(|t| t.ends_with(".tar.gz")).collect();
        assert_eq!(archives, [&"out/foo.tar.gz", &"out/foo-man.tar.gz"]);
        assert_eq!(targets.iter().filter(|t| t.ends_with(".pkginfo")).count(), 2);
        assert_eq!(targets.iter().filter(|t| **t == ".build.done").count(), 1);
        assert_eq!(targets.iter().filter(|t| **t == ".builddeps.installed").count(), 1);

        let text = graph.render();
        assert!(text.contains("export PKGINFO_foo_2dman := "));
        assert!(text.contains("echo \"$$PKGINFO_foo_2dman\" | base64 -d > $@"));
        assert!(text.contains("\tmake install DESTDIR=$$PWD/out/foo\n"));
    }

    #[test]
    fn test_script_dollars_are_escaped() {
        let generator = generator(
            "name: foo\nversion: 1.0.0\nscript: ['export V=hi', 'echo $V ${V} $(pwd)', '{{ make }}']\n",
        );
        assert_eq!(generator.script()[1], "echo $V ${V} $(pwd)");

        let graph = RuleGenerator::default().generate(&generator).unwrap();
        assert_eq!(
            graph.rule(".build.done").unwrap().recipe,
            [
                "export V=hi",
                "echo $$V $${V} $$(pwd)",
                "$${MAKE:-make}",
                "touch \"$(CURDIR)/$@\"",
            ]
        );
        assert!(graph.render().contains("\nexport MAKE\n"));
    }

    #[test]
    fn test_regeneration_is_identical() {
        let generator = generator(SINGLE);
        let rules = RuleGenerator::new(RuleConfig {
            single_shell: true,
            installer: Some("apk add".to_string()),
        });
        assert_eq!(rules.render(&generator).unwrap(), rules.render(&generator).unwrap());
    }

    #[test]
    fn test_git_and_file_fetch_rules() {
        let generator = generator(
            r#"
name: foo
version: 1.0.0
sources:
  - git://example.com/foo.git?tag=v1.2.3
  - file:patches/fix.patch
"#,
        );
        let graph = RuleGenerator::default().generate(&generator).unwrap();
        assert_eq!(
            graph.rule("sources/foo").unwrap().recipe,
            [
                "git clone -- git://example.com/foo.git $@",
                "git -C $@ checkout v1.2.3"
            ]
        );
        assert_eq!(
            graph.rule("sources/fix.patch").unwrap().recipe,
            ["cp /recipes/foo/patches/fix.patch $@"]
        );
    }

    #[test]
    fn test_pinned_download_is_verified() {
        let digest = "0123456789abcdef".repeat(4);
        let generator = generator(&format!(
            "name: foo\nversion: 1.0.0\nsources: ['https://example.com/a.tar.gz#sha256={digest}']\n"
        ));
        let graph = RuleGenerator::default().generate(&generator).unwrap();
        let recipe = &graph.rule("sources/a.tar.gz").unwrap().recipe;
        assert_eq!(recipe.len(), 2);
        assert_eq!(recipe[1], format!("printf '%s  %s\\n' {digest} $@ | sha256sum -c -"));
    }

    #[test]
    fn test_installer_and_single_shell() {
        let generator = generator("name: foo\nversion: 1.0.0\nbuild_dependencies: [gcc, zlib]\n");
        let rules = RuleGenerator::new(RuleConfig {
            single_shell: true,
            installer: Some("apk add".to_string()),
        });
        let graph = rules.generate(&generator).unwrap();
        assert!(graph.single_shell);
        assert_eq!(
            graph.rule(".builddeps.list").unwrap().recipe,
            ["printf '%s\\n' gcc zlib > $@"]
        );
        assert_eq!(
            graph.rule(".builddeps.installed").unwrap().recipe,
            ["if [ -s $< ]; then apk add $$(cat $<); fi", "touch $@"]
        );
        assert!(graph.render().contains(".ONESHELL:"));
    }
}
