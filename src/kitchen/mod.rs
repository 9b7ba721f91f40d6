// src/kitchen/mod.rs

//! Kitchen: where expanded recipes are cooked into packages
//!
//! The Kitchen owns the driver side of the pipeline:
//! - Preparing a working directory (layout, manifests, rule file)
//! - Fetching sources eagerly, or leaving it to the fetch rules
//! - Running the build runner against the rule file
//! - Handing back package archives, or the whole working tree
//!
//! Every cook runs in its own scratch directory, removed afterwards unless
//! `keep_builddir` is set.

mod archive;
mod config;
mod workdir;

pub use archive::write_tree;
pub use config::{CookResult, FetchMode, KitchenConfig};

use crate::error::{Error, Result};
use crate::layout::{archive_path, MAKEFILE};
use crate::recipe::PackageGenerator;
use crate::rules::RuleGenerator;
use crate::source::SourceFetcher;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    config: KitchenConfig,
}

impl Kitchen {
    /// Create a new Kitchen with the given configuration
    pub fn new(config: KitchenConfig) -> Self {
        Self { config }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Lay out `dir` for building `generator`
    ///
    /// Creates the directory skeleton and `.builddeps.list`, fetches sources
    /// and writes the eager manifests when fetching eagerly, then writes the
    /// rule file.
    pub fn prepare(&self, generator: &PackageGenerator, dir: &Path) -> Result<()> {
        self.prepare_with(generator, dir, self.config.fetch)
    }

    fn prepare_with(&self, generator: &PackageGenerator, dir: &Path, fetch: FetchMode) -> Result<()> {
        info!("Preparing {} ({:?} fetch)", dir.display(), fetch);

        // Rules first: a generator that cannot be expressed fails before any I/O
        let makefile = RuleGenerator::new(self.config.rule_config()).render(generator)?;

        workdir::init_dirs(dir, generator)?;
        workdir::write_builddeps(dir, generator)?;

        if fetch == FetchMode::Eager {
            SourceFetcher::new(generator.recipe_dir())?
                .with_progress(self.config.progress)
                .fetch_all(generator.sources(), dir)?;
            workdir::write_eager_files(dir, generator)?;
        }

        let path = dir.join(MAKEFILE);
        fs::write(&path, makefile)
            .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", path.display())))?;
        Ok(())
    }

    /// Build every output package and return the archives
    pub fn cook(&self, generator: &PackageGenerator) -> Result<CookResult> {
        let scratch = scratch_dir()?;
        let dir = scratch.path();

        let outcome = self.prepare(generator, dir).and_then(|()| self.run_make(dir));
        let log = match outcome {
            Ok(log) => log,
            Err(e) => return Err(self.fail(scratch, e)),
        };

        let mut packages = BTreeMap::new();
        for package in generator.packages() {
            let path = dir.join(archive_path(package.name()));
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    let error = Error::IoError(format!(
                        "Build produced no archive for {}: {e}",
                        package.name()
                    ));
                    return Err(self.fail(scratch, error));
                }
            };
            info!("Packaged {} ({} bytes)", package.name(), bytes.len());
            packages.insert(package.name().to_string(), bytes);
        }

        let build_dir = self.finish(scratch);
        Ok(CookResult {
            packages,
            log,
            build_dir,
        })
    }

    /// Build, then stream the working tree (minus the rule file) as a gzip tar
    ///
    /// Returns the build log.
    pub fn cook_tree<W: Write>(&self, generator: &PackageGenerator, writer: W) -> Result<String> {
        let scratch = scratch_dir()?;
        let result = self
            .prepare(generator, scratch.path())
            .and_then(|()| self.run_make(scratch.path()))
            .and_then(|log| {
                archive::write_tree(scratch.path(), writer, &[MAKEFILE])?;
                Ok(log)
            });
        match result {
            Ok(log) => {
                self.finish(scratch);
                Ok(log)
            }
            Err(e) => Err(self.fail(scratch, e)),
        }
    }

    /// Fetch eagerly and stream the unbuilt working tree (minus the rule file)
    pub fn package_source<W: Write>(&self, generator: &PackageGenerator, writer: W) -> Result<()> {
        let scratch = scratch_dir()?;
        let result = self
            .prepare_with(generator, scratch.path(), FetchMode::Eager)
            .and_then(|()| archive::write_tree(scratch.path(), writer, &[MAKEFILE]));
        match result {
            Ok(_) => {
                self.finish(scratch);
                Ok(())
            }
            Err(e) => Err(self.fail(scratch, e)),
        }
    }

    /// Run the build runner in `dir`; returns its combined output
    pub fn run_make(&self, dir: &Path) -> Result<String> {
        let make = which::which(&self.config.make).map_err(|e| {
            Error::ConfigError(format!("Build runner {:?} not found: {e}", self.config.make))
        })?;

        // One file for both streams keeps the output interleaved and cannot
        // fill a pipe while we wait
        let mut log_file = tempfile::tempfile()?;
        let stderr = log_file.try_clone()?;

        let mut command = Command::new(&make);
        command
            .arg(format!("-j{}", self.config.jobs))
            .arg("-f")
            .arg(MAKEFILE)
            .arg("all")
            .current_dir(dir)
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(log_file.try_clone()?)
            .stderr(stderr);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a timeout also reaches the recipe shells
            command.process_group(0);
        }
        debug!("Running {:?} in {}", command, dir.display());

        let mut child = command
            .spawn()
            .map_err(|e| Error::CommandFailed(format!("Failed to spawn {}: {e}", make.display())))?;

        let status = match self.config.timeout() {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => Some(status),
                None => {
                    kill_runner(&mut child);
                    None
                }
            },
            None => Some(child.wait()?),
        };

        let log = read_log(&mut log_file)?;
        match status {
            Some(status) if status.success() => {
                info!("Build finished");
                Ok(log)
            }
            Some(status) => {
                warn!("Build runner exited with {}", status);
                Err(Error::BuildFailed { output: log })
            }
            None => {
                let secs = self.config.timeout_secs.unwrap_or_default();
                warn!("Build runner killed after {} seconds", secs);
                Err(Error::BuildFailed {
                    output: format!("{log}\nbuild timed out after {secs} seconds"),
                })
            }
        }
    }

    /// Drop the scratch directory, or keep it when configured to
    fn finish(&self, scratch: TempDir) -> Option<PathBuf> {
        if self.config.keep_builddir {
            let path = scratch.keep();
            info!("Keeping build directory {}", path.display());
            Some(path)
        } else {
            None
        }
    }

    /// Finish after a failure; a kept directory is named in the error
    fn fail(&self, scratch: TempDir, error: Error) -> Error {
        let Some(path) = self.finish(scratch) else {
            return error;
        };
        match error {
            Error::BuildFailed { output } => Error::BuildFailed {
                output: format!("{output}\nbuild directory kept at {}", path.display()),
            },
            error => {
                warn!("Build directory kept at {} after: {}", path.display(), error);
                error
            }
        }
    }
}

/// Kill the build runner together with every process it started
fn kill_runner(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        // The runner leads its own process group; see `run_make`
        if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
            debug!("Failed to kill process group {}: {}", child.id(), e);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("pkgcook-")
        .tempdir()
        .map_err(|e| Error::IoError(format!("Failed to create build directory: {e}")))
}

fn read_log(file: &mut File) -> Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{parse_recipe, Preprocessor};
    use crate::tools::ToolRegistry;

    fn generator(yaml: &str) -> PackageGenerator {
        let recipe = parse_recipe(yaml.as_bytes()).unwrap();
        Preprocessor::new(&ToolRegistry::with_builtins())
            .preprocess(&recipe)
            .unwrap()
    }

    #[test]
    fn test_deferred_prepare_writes_rules_only() {
        let dir = TempDir::new().unwrap();
        let kitchen = Kitchen::new(KitchenConfig {
            fetch: FetchMode::Deferred,
            ..Default::default()
        });
        let generator = generator("name: foo\nversion: 1.0.0\nsources: ['https://example.com/a.tar.gz']\n");
        kitchen.prepare(&generator, dir.path()).unwrap();

        assert!(dir.path().join("Makefile").is_file());
        assert!(dir.path().join(".builddeps.list").is_file());
        assert!(dir.path().join("out/foo").is_dir());
        assert!(!dir.path().join("sources/a.tar.gz").exists());
        assert!(!dir.path().join(".pkglist").exists());
    }

    #[test]
    fn test_missing_runner_is_config_error() {
        let dir = TempDir::new().unwrap();
        let kitchen = Kitchen::new(KitchenConfig {
            make: "definitely-not-a-make-program".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            kitchen.run_make(dir.path()),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_keep_builddir() {
        let kitchen = Kitchen::new(KitchenConfig {
            keep_builddir: true,
            ..Default::default()
        });
        let scratch = scratch_dir().unwrap();
        let kept = kitchen.finish(scratch).unwrap();
        assert!(kept.is_dir());
        fs::remove_dir_all(kept).unwrap();

        let scratch = scratch_dir().unwrap();
        let path = scratch.path().to_path_buf();
        assert!(Kitchen::with_defaults().finish(scratch).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_failure_names_kept_builddir() {
        let kitchen = Kitchen::new(KitchenConfig {
            keep_builddir: true,
            ..Default::default()
        });
        let scratch = scratch_dir().unwrap();
        let path = scratch.path().to_path_buf();
        let error = kitchen.fail(scratch, Error::BuildFailed { output: "boom".to_string() });

        match error {
            Error::BuildFailed { output } => {
                assert!(output.starts_with("boom\n"));
                assert!(output.ends_with(&format!("build directory kept at {}", path.display())));
            }
            other => panic!("expected BuildFailed, got {other:?}"),
        }
        assert!(path.is_dir());
        fs::remove_dir_all(path).unwrap();

        let scratch = scratch_dir().unwrap();
        let path = scratch.path().to_path_buf();
        let error = Kitchen::with_defaults().fail(scratch, Error::BuildFailed { output: "boom".to_string() });
        assert!(matches!(error, Error::BuildFailed { output } if output == "boom"));
        assert!(!path.exists());
    }
}
