// tests/pipeline.rs

//! Recipe to rule graph, without running a build

mod common;

use common::generator;
use pkgcook::layout::pkginfo_path;
use pkgcook::{parse_recipe, Error, PackageInfo, Preprocessor, RuleConfig, RuleGenerator, ToolRegistry};

const SINGLE: &str = r#"
packages:
  foo: [libc]
version: 1.0.0
sources:
  - https://example.com/a.tar.gz
script:
  - make
  - make install
"#;

const SPLIT: &str = r#"
packages:
  foo: [libc]
  foo-man:
version: '2.1'
tools: [make]
build_dependencies: [gcc]
script:
  - '{{ make }}'
  - '{{ manpages "foo" "foo-man" }}'
"#;

fn preprocess_err(yaml: &str) -> Error {
    let recipe = parse_recipe(yaml.as_bytes()).unwrap();
    Preprocessor::new(&ToolRegistry::with_builtins())
        .preprocess(&recipe)
        .unwrap_err()
}

#[test]
fn test_single_package_scenario() {
    let generator = generator(SINGLE);

    assert_eq!(generator.sources().len(), 1);
    assert_eq!(generator.sources()[0].scheme(), "https");
    assert_eq!(generator.sources()[0].file_name(), "a.tar.gz");

    let graph = RuleGenerator::default().generate(&generator).unwrap();

    let fetch = graph.rule("sources/a.tar.gz").expect("fetch rule");
    assert!(fetch.recipe[0].contains("https://example.com/a.tar.gz"));

    let build = graph.rule(".build.done").expect("build rule");
    assert!(build.prerequisites.contains(&"sources/a.tar.gz".to_string()));
    assert_eq!(&build.recipe[..2], ["make", "make install"]);

    let meta = graph.rule(&pkginfo_path("foo")).expect("metadata rule");
    assert!(meta.recipe[0].contains("PKGINFO_foo"));
    let (_, encoded) = graph
        .variables
        .iter()
        .find(|(name, _)| name == "PKGINFO_foo")
        .unwrap();
    assert_eq!(
        encoded,
        &PackageInfo::new("foo", "1.0.0", &["libc".to_string()])
            .to_base64()
            .unwrap()
    );

    let archive = graph.rule("out/foo.tar.gz").expect("archive rule");
    assert_eq!(archive.prerequisites, [".build.done", "out/foo/.pkginfo"]);

    let all = graph.rule("all").unwrap();
    assert!(all.phony);
    assert_eq!(all.prerequisites, ["out/foo.tar.gz"]);
}

#[test]
fn test_split_package_scenario() {
    let generator = generator(SPLIT);
    let graph = RuleGenerator::default().generate(&generator).unwrap();
    let targets = graph.targets();

    let archives: Vec<_> = targets.iter().filter(|t| t.ends_with(".tar.gz")).collect();
    assert_eq!(archives, [&"out/foo.tar.gz", &"out/foo-man.tar.gz"]);
    let metadata: Vec<_> = targets.iter().filter(|t| t.ends_with(".pkginfo")).collect();
    assert_eq!(metadata.len(), 2);
    assert_eq!(targets.iter().filter(|t| **t == ".build.done").count(), 1);
    assert_eq!(targets.iter().filter(|t| **t == ".builddeps.installed").count(), 1);

    // Build dependencies: the recipe's own, then the tool's
    assert_eq!(generator.build_dependencies(), ["gcc", "make"]);

    let build = graph.rule(".build.done").unwrap();
    assert_eq!(build.prerequisites, [".builddeps.installed"]);
    assert!(build.recipe.iter().any(|l| l == "$${MAKE:-make}"));
    assert_eq!(generator.script()[0], "${MAKE:-make}");
    assert!(
        build
            .recipe
            .iter()
            .any(|l| l == "mv out/foo/usr/share/man out/foo-man/usr/share/man")
    );
}

#[test]
fn test_regeneration_is_byte_identical() {
    let rules = RuleGenerator::new(RuleConfig {
        single_shell: true,
        installer: Some("apk add".to_string()),
    });
    let first = rules.render(&generator(SPLIT)).unwrap();
    let second = rules.render(&generator(SPLIT)).unwrap();
    assert_eq!(first, second);
    assert!(first.contains(".ONESHELL:"));
    assert!(first.contains("apk add $$(cat $<)"));
}

#[test]
fn test_template_fields_are_expanded() {
    let generator = generator(
        r#"
name: foo
version: 3.4.1
tools: [autotools]
data:
  configure_flags: [--disable-nls]
sources:
  - https://example.com/foo-{{ .version }}.tar.gz
script:
  - '{{ extract "foo" .version "tar.gz" }}'
  - cd foo && {{ autoreconf }} && {{ configure "--prefix=/usr" }}
"#,
    );

    assert_eq!(generator.sources()[0].file_name(), "foo-3.4.1.tar.gz");
    assert_eq!(
        generator.script(),
        [
            "tar -xf sources/foo-3.4.1.tar.gz",
            "mv foo-3.4.1 foo",
            "cd foo && autoreconf -fi && ./configure --disable-nls --prefix=/usr",
        ]
    );
    assert_eq!(generator.build_dependencies(), ["autoconf", "automake", "libtool", "make"]);
}

#[test]
fn test_source_schemes() {
    match preprocess_err("name: foo\nversion: 1.0.0\nsources: ['http://example.com/a.tar.gz']\n") {
        Error::InsecureScheme(scheme) => assert_eq!(scheme, "http"),
        other => panic!("expected InsecureScheme, got {other:?}"),
    }
    match preprocess_err("name: foo\nversion: 1.0.0\nsources: ['ftp://example.com/a.tar.gz']\n") {
        Error::UnsupportedScheme(scheme) => assert_eq!(scheme, "ftp"),
        other => panic!("expected UnsupportedScheme, got {other:?}"),
    }

    let generator = generator("name: foo\nversion: 1.0.0\nsources: ['git://example.com/foo.git?tag=v1.0.0']\n");
    let graph = RuleGenerator::default().generate(&generator).unwrap();
    let fetch = graph.rule("sources/foo").expect("git fetch rule");
    assert_eq!(
        fetch.recipe,
        [
            "git clone -- git://example.com/foo.git $@",
            "git -C $@ checkout v1.0.0",
        ]
    );
}

#[test]
fn test_bad_recipes_are_rejected() {
    assert!(matches!(
        parse_recipe(b"version: [1, 2\n"),
        Err(Error::ParseError(_))
    ));
    assert!(parse_recipe(b"name: foo\nversion: 1.0.0\nflavour: spicy\n").is_err());

    assert!(matches!(
        preprocess_err("name: foo\nversion: 1.0.0\ntools: [scons]\n"),
        Error::ToolNotFound(_)
    ));
    assert!(matches!(
        preprocess_err("name: foo\nversion: not-a-version\n"),
        Error::InvalidVersion { .. }
    ));
    assert!(matches!(
        preprocess_err("name: foo\nversion: 1.0.0\nscript: ['{{ nosuch }}']\n"),
        Error::Template { .. }
    ));
}
